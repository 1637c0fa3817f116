// Index loading.
//
// A `.json` file is the serde rendition of the object model. Anything else is
// decoded as a SCIP protobuf and converted into the same model.

use std::path::Path;

use charter_graphs::index::{Document, Index, Occurrence, SymbolInformation, SymbolRoles};
use charter_graphs::SourceRange;
use protobuf::Message;
use scip::types::{self, symbol_information};
use tracing::{debug, info, instrument};

use crate::error::LoadError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexFormat {
    Scip,
    Json,
}

impl IndexFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Scip,
        }
    }
}

#[instrument(skip_all, fields(path = %path.display()))]
pub fn load_index(path: &Path) -> Result<Index, LoadError> {
    if !path.exists() {
        return Err(LoadError::NotFound(path.display().to_string()));
    }
    let bytes = std::fs::read(path)?;
    let index = match IndexFormat::from_path(path) {
        IndexFormat::Json => serde_json::from_slice(&bytes)?,
        IndexFormat::Scip => decode_scip(&bytes)?,
    };
    info!(
        documents = index.documents.len(),
        occurrences = index.occurrence_count(),
        "Index loaded"
    );
    Ok(index)
}

/// Decode a SCIP protobuf payload into the object model.
pub fn decode_scip(bytes: &[u8]) -> Result<Index, LoadError> {
    let raw = types::Index::parse_from_bytes(bytes)?;
    debug!(documents = raw.documents.len(), "SCIP payload decoded");
    let documents = raw
        .documents
        .into_iter()
        .map(convert_document)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Index { documents })
}

fn convert_document(doc: types::Document) -> Result<Document, LoadError> {
    let path = doc.relative_path;
    let occurrences = doc
        .occurrences
        .into_iter()
        .map(|occ| convert_occurrence(occ, &path))
        .collect::<Result<Vec<_>, _>>()?;
    let symbols = doc.symbols.into_iter().map(convert_symbol).collect();
    Ok(Document {
        relative_path: path,
        occurrences,
        symbols,
    })
}

fn convert_occurrence(occ: types::Occurrence, path: &str) -> Result<Occurrence, LoadError> {
    let range = SourceRange::from_scip(&occ.range, path).map_err(LoadError::Occurrence)?;
    let enclosing_range = if occ.enclosing_range.is_empty() {
        None
    } else {
        Some(SourceRange::from_scip(&occ.enclosing_range, path).map_err(LoadError::Occurrence)?)
    };
    Ok(Occurrence {
        symbol: occ.symbol,
        roles: SymbolRoles(occ.symbol_roles),
        range,
        enclosing_range,
    })
}

fn convert_symbol(info: types::SymbolInformation) -> SymbolInformation {
    let kind = match info.kind.enum_value() {
        Ok(kind) if kind != symbol_information::Kind::UnspecifiedKind => format!("{kind:?}"),
        _ => String::new(),
    };
    SymbolInformation {
        symbol: info.symbol,
        kind,
        display_name: Some(info.display_name).filter(|n| !n.is_empty()),
    }
}

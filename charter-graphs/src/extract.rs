// Occurrence extraction: the single scan over every document.
//
// Each occurrence is classified as a scoped definition (definition role plus
// an enclosing range) or a candidate reference. Parameters and local bindings
// carry the definition role without a body and therefore never own calls.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::index::{DocOccurrence, Document, Index, SymbolInformation, SymbolOccurrences};
use crate::symbol::{self, DescriptorSuffix, SymbolError};

/// Which non-definition occurrences count as candidate call sites.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReferencePolicy {
    /// Only references whose innermost descriptor is a method.
    #[default]
    #[serde(rename = "methods")]
    MethodsOnly,
    /// Every non-definition occurrence.
    #[serde(rename = "any")]
    AnyOccurrence,
}

impl ReferencePolicy {
    pub fn accepts(self, suffix: DescriptorSuffix) -> bool {
        match self {
            Self::MethodsOnly => suffix.is_call_like(),
            Self::AnyOccurrence => true,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::MethodsOnly => "methods",
            Self::AnyOccurrence => "any",
        }
    }
}

impl fmt::Display for ReferencePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReferencePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "methods" => Ok(Self::MethodsOnly),
            "any" => Ok(Self::AnyOccurrence),
            other => Err(format!("Unknown reference policy: {other}. Use: methods, any")),
        }
    }
}

/// An occurrence skipped because its symbol could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedSymbol {
    pub symbol: String,
    pub document: String,
    pub reason: String,
}

/// Diagnostic counters. None of these affect the call graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractStats {
    pub documents: usize,
    pub occurrences: usize,
    pub locals_skipped: usize,
    pub definitions: usize,
    pub references: usize,
    pub skipped: Vec<SkippedSymbol>,
    /// Symbol-table kinds across the merged symbol tables.
    pub kind_counts: BTreeMap<String, usize>,
    /// Innermost descriptor suffix of every classified occurrence.
    pub suffix_counts: BTreeMap<String, usize>,
}

impl ExtractStats {
    fn merge(&mut self, other: ExtractStats) {
        self.documents += other.documents;
        self.occurrences += other.occurrences;
        self.locals_skipped += other.locals_skipped;
        self.definitions += other.definitions;
        self.references += other.references;
        self.skipped.extend(other.skipped);
        for (suffix, count) in other.suffix_counts {
            *self.suffix_counts.entry(suffix).or_default() += count;
        }
    }
}

/// One document's scoped definitions and candidate references.
#[derive(Debug)]
pub struct DocumentPartition<'a> {
    pub document: &'a Document,
    /// Keyed by symbol; a repeated definition in the same document replaces the earlier one.
    pub definitions: BTreeMap<&'a str, DocOccurrence<'a>>,
    /// Candidate references in occurrence order.
    pub references: Vec<DocOccurrence<'a>>,
}

/// Output of the extraction scan over a whole index.
#[derive(Debug, Default)]
pub struct ExtractedElements<'a> {
    /// Definition registry: at most one scoped definition per symbol.
    pub definitions: HashMap<&'a str, DocOccurrence<'a>>,
    /// Candidate references across every document, grouped by target symbol.
    pub references: SymbolOccurrences<'a>,
    pub symbols: HashMap<&'a str, &'a SymbolInformation>,
    pub partitions: Vec<DocumentPartition<'a>>,
    pub stats: ExtractStats,
}

/// Classify the occurrences of a single document.
pub fn extract_document(
    document: &Document,
    policy: ReferencePolicy,
) -> (DocumentPartition<'_>, ExtractStats) {
    let mut stats = ExtractStats {
        documents: 1,
        ..Default::default()
    };
    let mut partition = DocumentPartition {
        document,
        definitions: BTreeMap::new(),
        references: Vec::new(),
    };
    let mut suffixes: HashMap<&str, Result<DescriptorSuffix, SymbolError>> = HashMap::new();

    for occurrence in &document.occurrences {
        stats.occurrences += 1;
        let symbol = occurrence.symbol.as_str();
        if symbol.is_empty() || symbol::is_local_symbol(symbol) {
            stats.locals_skipped += 1;
            continue;
        }

        let suffix = match suffixes
            .entry(symbol)
            .or_insert_with(|| symbol::symbol_suffix(symbol))
        {
            Ok(suffix) => *suffix,
            Err(e) => {
                debug!(symbol, document = %document.relative_path, error = %e, "Skipping unparseable symbol");
                stats.skipped.push(SkippedSymbol {
                    symbol: symbol.to_string(),
                    document: document.relative_path.clone(),
                    reason: e.to_string(),
                });
                continue;
            }
        };

        let doc_occ = DocOccurrence::new(document, occurrence);
        if occurrence.is_scoped_definition() {
            if partition.definitions.insert(symbol, doc_occ).is_some() {
                debug!(symbol, document = %document.relative_path, "Definition repeated in document");
            }
            stats.definitions += 1;
        } else if policy.accepts(suffix) {
            partition.references.push(doc_occ);
            stats.references += 1;
        } else {
            continue;
        }
        *stats.suffix_counts.entry(suffix.to_string()).or_default() += 1;
    }

    debug!(
        document = %document.relative_path,
        definitions = partition.definitions.len(),
        references = partition.references.len(),
        "Document extracted"
    );
    (partition, stats)
}

/// Scan every document and build the definition registry and reference map.
///
/// Documents are classified independently (in parallel when `parallel` is set)
/// and merged in index order, so the result does not depend on scheduling.
#[instrument(skip_all, name = "extract_occurrences")]
pub fn extract_index(index: &Index, policy: ReferencePolicy, parallel: bool) -> ExtractedElements<'_> {
    let per_document: Vec<_> = if parallel {
        index
            .documents
            .par_iter()
            .map(|d| extract_document(d, policy))
            .collect()
    } else {
        index
            .documents
            .iter()
            .map(|d| extract_document(d, policy))
            .collect()
    };

    let mut elements = ExtractedElements::default();
    for (partition, stats) in per_document {
        for (&symbol, &definition) in &partition.definitions {
            elements.definitions.insert(symbol, definition);
        }
        for reference in &partition.references {
            elements
                .references
                .entry(reference.symbol())
                .or_default()
                .push(*reference);
        }
        elements.stats.merge(stats);
        elements.partitions.push(partition);
    }

    for document in &index.documents {
        for info in &document.symbols {
            elements.symbols.insert(info.symbol.as_str(), info);
        }
    }
    for info in elements.symbols.values() {
        let kind = if info.kind.is_empty() {
            "Unspecified"
        } else {
            info.kind.as_str()
        };
        *elements.stats.kind_counts.entry(kind.to_string()).or_default() += 1;
    }

    if !elements.stats.skipped.is_empty() {
        warn!(
            count = elements.stats.skipped.len(),
            "Skipped occurrences with unparseable symbols"
        );
    }
    info!(
        documents = elements.stats.documents,
        definitions = elements.definitions.len(),
        referenced_symbols = elements.references.len(),
        policy = %policy,
        "Occurrence extraction complete"
    );

    elements
}

// Integration test utilities and index fixtures for Charter.

use std::path::{Path, PathBuf};

use charter_graphs::{Document, Index, Occurrence, SourceRange, SymbolInformation};
use protobuf::Message;

/// Caller in [`two_document_index`].
pub const CALLER: &str = "scip-go gomod example v1.0.0 `example/pkg`/a().";
/// Callee in [`two_document_index`].
pub const CALLEE: &str = "scip-go gomod example v1.0.0 `example/pkg`/b().";
/// A library call that never resolves to a tracked definition.
pub const LIBRARY_CALL: &str = "scip-go gomod std v1.22 fmt/Println().";

/// SCIP symbol id for a Go function `name` in package `pkg`.
pub fn go_func(pkg: &str, name: &str) -> String {
    format!("scip-go gomod example v1.0.0 `example/{pkg}`/{name}().")
}

/// Incrementally builds one document's occurrences.
#[derive(Debug)]
pub struct DocumentBuilder {
    document: Document,
}

impl DocumentBuilder {
    pub fn new(path: &str) -> Self {
        Self {
            document: Document::new(path),
        }
    }

    /// A function whose name sits on `start` and whose body spans `start..=end`.
    #[must_use]
    pub fn function(mut self, symbol: &str, start: u32, end: u32) -> Self {
        self.document.occurrences.push(Occurrence::definition(
            symbol,
            SourceRange::new(start, 5, start, 6),
            Some(SourceRange::new(start, 0, end, 1)),
        ));
        self.document.symbols.push(SymbolInformation {
            symbol: symbol.to_string(),
            kind: "Function".to_string(),
            display_name: None,
        });
        self
    }

    /// A one-character reference to `symbol` at `line:character`.
    #[must_use]
    pub fn call(mut self, symbol: &str, line: u32, character: u32) -> Self {
        self.document.occurrences.push(Occurrence::reference(
            symbol,
            SourceRange::new(line, character, line, character + 1),
        ));
        self
    }

    pub fn build(self) -> Document {
        self.document
    }
}

#[derive(Debug, Default)]
pub struct IndexBuilder {
    documents: Vec<Document>,
}

impl IndexBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn document(mut self, document: DocumentBuilder) -> Self {
        self.documents.push(document.build());
        self
    }

    pub fn build(self) -> Index {
        Index {
            documents: self.documents,
        }
    }
}

/// `pkg/a.go` holds `a` (lines 0–5) calling `b` at 2:1 and a library
/// function at 3:1; `pkg/b.go` holds `b` (lines 0–2).
pub fn two_document_index() -> Index {
    IndexBuilder::new()
        .document(
            DocumentBuilder::new("pkg/a.go")
                .function(CALLER, 0, 5)
                .call(CALLEE, 2, 1)
                .call(LIBRARY_CALL, 3, 1),
        )
        .document(DocumentBuilder::new("pkg/b.go").function(CALLEE, 0, 2))
        .build()
}

/// `ping` and `pong` call each other; `serve` calls `ping`.
pub fn mutual_recursion_index() -> Index {
    let ping = go_func("net", "ping");
    let pong = go_func("net", "pong");
    let serve = go_func("net", "serve");
    IndexBuilder::new()
        .document(
            DocumentBuilder::new("net/ping.go")
                .function(&ping, 0, 3)
                .call(&pong, 1, 1)
                .function(&pong, 5, 8)
                .call(&ping, 6, 1),
        )
        .document(
            DocumentBuilder::new("net/serve.go")
                .function(&serve, 0, 4)
                .call(&ping, 2, 1),
        )
        .build()
}

/// Encode `index` as a SCIP protobuf payload.
pub fn to_scip_bytes(index: &Index) -> Vec<u8> {
    let documents = index
        .documents
        .iter()
        .map(|doc| scip::types::Document {
            relative_path: doc.relative_path.clone(),
            occurrences: doc
                .occurrences
                .iter()
                .map(|occ| scip::types::Occurrence {
                    range: scip_range(occ.range),
                    symbol: occ.symbol.clone(),
                    symbol_roles: occ.roles.0,
                    enclosing_range: occ.enclosing_range.map(scip_range).unwrap_or_default(),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        })
        .collect();
    let raw = scip::types::Index {
        documents,
        ..Default::default()
    };
    raw.write_to_bytes().expect("encode SCIP index")
}

fn scip_range(range: SourceRange) -> Vec<i32> {
    let n = |v: u32| i32::try_from(v).expect("range fits in i32");
    if range.start_line == range.end_line {
        vec![n(range.start_line), n(range.start_character), n(range.end_character)]
    } else {
        vec![
            n(range.start_line),
            n(range.start_character),
            n(range.end_line),
            n(range.end_character),
        ]
    }
}

/// Write `index` under `dir` as `file_name`, SCIP or JSON by extension.
pub fn write_index(dir: &Path, file_name: &str, index: &Index) -> PathBuf {
    let path = dir.join(file_name);
    let bytes = if Path::new(file_name)
        .extension()
        .is_some_and(|e| e.eq_ignore_ascii_case("json"))
    {
        serde_json::to_vec(index).expect("serialize index")
    } else {
        to_scip_bytes(index)
    };
    std::fs::write(&path, bytes).expect("write index");
    path
}

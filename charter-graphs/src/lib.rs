pub mod call_graph;
pub mod extract;
pub mod filter;
pub mod index;
pub mod rank;
pub mod scope;
pub mod symbol;
pub mod tree;

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

pub use call_graph::{BuildContext, CallGraph, CallGraphNode};
pub use extract::{ExtractStats, ExtractedElements, ReferencePolicy};
pub use index::{DocOccurrence, Document, Index, Occurrence, SymbolInformation, SymbolRoles};
pub use tree::{CallForest, CallTreeNode};

/// Error type for the call graph engine.
///
/// Every variant is fatal for the batch: a partial call graph is never emitted.
#[derive(thiserror::Error, Debug)]
pub enum GraphError {
    #[error("Duplicate definition of {symbol} while merging {document}")]
    DuplicateDefinition { symbol: String, document: String },

    #[error("Definition not registered for {symbol}")]
    MissingDefinition { symbol: String },

    #[error("No call graph node for {symbol}")]
    MissingNode { symbol: String },

    #[error("Malformed range in {document}: {values:?}")]
    MalformedRange { document: String, values: Vec<i32> },
}

pub type Result<T> = std::result::Result<T, GraphError>;

// ── Position and range types ───────────────────────────────────────

/// A zero-based (line, character) source position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

/// Half-open source span, line-major.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceRange {
    pub start_line: u32,
    pub start_character: u32,
    pub end_line: u32,
    pub end_character: u32,
}

impl SourceRange {
    pub const fn new(start_line: u32, start_character: u32, end_line: u32, end_character: u32) -> Self {
        Self {
            start_line,
            start_character,
            end_line,
            end_character,
        }
    }

    /// Decode the SCIP wire encoding: `[line, start, end]` for single-line
    /// spans or `[start_line, start, end_line, end]`.
    pub fn from_scip(values: &[i32], document: &str) -> Result<Self> {
        let malformed = || GraphError::MalformedRange {
            document: document.to_string(),
            values: values.to_vec(),
        };
        let coords: Vec<u32> = values
            .iter()
            .map(|&v| u32::try_from(v))
            .collect::<std::result::Result<_, _>>()
            .map_err(|_| malformed())?;

        match coords.as_slice() {
            &[line, start, end] => Ok(Self::new(line, start, line, end)),
            &[start_line, start, end_line, end] => Ok(Self::new(start_line, start, end_line, end)),
            _ => Err(malformed()),
        }
    }

    pub fn start(&self) -> Position {
        Position {
            line: self.start_line,
            character: self.start_character,
        }
    }

    pub fn end(&self) -> Position {
        Position {
            line: self.end_line,
            character: self.end_character,
        }
    }

    /// Inclusive containment: `self.start <= other.start && self.end >= other.end`.
    pub fn contains(&self, other: &SourceRange) -> bool {
        self.start() <= other.start() && self.end() >= other.end()
    }

    /// Ordering by start position only. Ranges sharing a start compare equal.
    pub fn cmp_start(&self, other: &SourceRange) -> Ordering {
        self.start().cmp(&other.start())
    }
}

// Decoded symbol index: documents, occurrences, and symbol metadata.
//
// This is the object model the analysis consumes. Decoding from the SCIP
// protobuf lives in `charter-core`; JSON renditions deserialize directly.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::SourceRange;

// ── Roles ─────────────────────────────────────────────────────────────

/// Bitmask of occurrence roles, bit-compatible with SCIP `SymbolRole`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SymbolRoles(pub i32);

impl SymbolRoles {
    pub const DEFINITION: Self = Self(0x1);
    pub const IMPORT: Self = Self(0x2);
    pub const WRITE_ACCESS: Self = Self(0x4);
    pub const READ_ACCESS: Self = Self(0x8);
    pub const GENERATED: Self = Self(0x10);
    pub const TEST: Self = Self(0x20);
    pub const FORWARD_DEFINITION: Self = Self(0x40);

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn is_definition(self) -> bool {
        self.contains(Self::DEFINITION)
    }
}

impl std::ops::BitOr for SymbolRoles {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

// ── Occurrences and documents ─────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occurrence {
    pub symbol: String,
    #[serde(default)]
    pub roles: SymbolRoles,
    pub range: SourceRange,
    /// Full body span; present only on definitions with a lexical body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enclosing_range: Option<SourceRange>,
}

impl Occurrence {
    pub fn reference(symbol: impl Into<String>, range: SourceRange) -> Self {
        Self {
            symbol: symbol.into(),
            roles: SymbolRoles::empty(),
            range,
            enclosing_range: None,
        }
    }

    pub fn definition(
        symbol: impl Into<String>,
        range: SourceRange,
        enclosing_range: Option<SourceRange>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            roles: SymbolRoles::DEFINITION,
            range,
            enclosing_range,
        }
    }

    /// A definition with a body: the only kind that can own call sites.
    pub fn is_scoped_definition(&self) -> bool {
        self.roles.is_definition() && self.enclosing_range.is_some()
    }
}

/// Best-effort symbol metadata. Indexers frequently leave `kind` empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolInformation {
    pub symbol: String,
    #[serde(default)]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub relative_path: String,
    #[serde(default)]
    pub occurrences: Vec<Occurrence>,
    #[serde(default)]
    pub symbols: Vec<SymbolInformation>,
}

impl Document {
    pub fn new(relative_path: impl Into<String>) -> Self {
        Self {
            relative_path: relative_path.into(),
            occurrences: Vec::new(),
            symbols: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Index {
    #[serde(default)]
    pub documents: Vec<Document>,
}

impl Index {
    pub fn occurrence_count(&self) -> usize {
        self.documents.iter().map(|d| d.occurrences.len()).sum()
    }
}

// ── Borrowed occurrence handles ───────────────────────────────────────

/// Occurrences grouped by symbol, in symbol order.
pub type SymbolOccurrences<'a> = BTreeMap<&'a str, Vec<DocOccurrence<'a>>>;

/// An occurrence together with the document that owns it.
#[derive(Clone, Copy)]
pub struct DocOccurrence<'a> {
    pub document: &'a Document,
    pub occurrence: &'a Occurrence,
}

impl<'a> DocOccurrence<'a> {
    pub fn new(document: &'a Document, occurrence: &'a Occurrence) -> Self {
        Self {
            document,
            occurrence,
        }
    }

    pub fn symbol(&self) -> &'a str {
        &self.occurrence.symbol
    }

    pub fn path(&self) -> &'a str {
        &self.document.relative_path
    }

    pub fn range(&self) -> SourceRange {
        self.occurrence.range
    }

    /// Same document, same symbol, same range.
    pub fn location_eq(&self, other: &DocOccurrence<'_>) -> bool {
        self.path() == other.path()
            && self.symbol() == other.symbol()
            && self.range() == other.range()
    }

    pub fn call_site(&self) -> CallSite<'a> {
        CallSite {
            document: self.path(),
            symbol: self.symbol(),
            range: self.range(),
        }
    }
}

impl fmt::Debug for DocOccurrence<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = self.range();
        write!(
            f,
            "{}@{}:{}:{}",
            self.symbol(),
            self.path(),
            r.start_line,
            r.start_character
        )
    }
}

impl PartialEq for DocOccurrence<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.location_eq(other)
    }
}

impl Eq for DocOccurrence<'_> {}

/// Identity of one call site: where it is and what it targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallSite<'a> {
    pub document: &'a str,
    pub symbol: &'a str,
    pub range: SourceRange,
}

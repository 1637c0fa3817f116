// Lexical scope resolution: which definition body encloses each reference.
//
// Definitions and references of one document are both sorted by start
// position and swept together. Definitions open onto a stack as the sweep
// passes their start; a reference pops every scope that does not contain it
// and lands in the innermost one that does. Ranges come from a single syntax
// tree, so definition bodies nest properly and a popped scope never reopens.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashMap, HashSet};

use rayon::prelude::*;
use tracing::{debug, instrument};

use crate::extract::DocumentPartition;
use crate::index::{DocOccurrence, SymbolOccurrences};
use crate::{GraphError, Result, SourceRange};

/// References enclosed by each scoped definition. Every scoped definition has
/// an entry, empty when its body contains no candidate references.
pub type EnclosedReferences<'a> = SymbolOccurrences<'a>;

#[derive(Debug, Clone, Copy)]
struct Scope<'a> {
    symbol: &'a str,
    range: SourceRange,
}

#[derive(Debug, Default)]
struct ScopeStack<'a> {
    items: Vec<Scope<'a>>,
}

impl<'a> ScopeStack<'a> {
    fn push(&mut self, scope: Scope<'a>) {
        self.items.push(scope);
    }

    /// Close scopes until the top one contains `range`. `None` means the
    /// position is outside every open scope.
    fn innermost_containing(&mut self, range: &SourceRange) -> Option<&'a str> {
        while let Some(top) = self.items.last() {
            if top.range.contains(range) {
                return Some(top.symbol);
            }
            self.items.pop();
        }
        None
    }
}

/// Scope resolution result for one document.
#[derive(Debug)]
pub struct DocumentScopes<'a> {
    pub document: &'a str,
    /// The scoped definitions owning the `enclosed` entries.
    pub definitions: BTreeMap<&'a str, DocOccurrence<'a>>,
    pub enclosed: EnclosedReferences<'a>,
    /// References outside every definition body (module-level code).
    pub unscoped: usize,
}

/// Merged scope resolution over the whole index.
#[derive(Debug, Default)]
pub struct ScopeResolution<'a> {
    pub enclosed: EnclosedReferences<'a>,
    /// Tracked definitions: for each `enclosed` key, the body its entry came from.
    pub definitions: HashMap<&'a str, DocOccurrence<'a>>,
    pub unscoped: usize,
}

/// Assign each candidate reference in a document to its innermost enclosing definition.
pub fn resolve_document<'a>(partition: &DocumentPartition<'a>) -> DocumentScopes<'a> {
    let mut definitions: Vec<Scope<'a>> = partition
        .definitions
        .iter()
        .filter_map(|(&symbol, def)| {
            def.occurrence
                .enclosing_range
                .map(|range| Scope { symbol, range })
        })
        .collect();
    // Co-starting scopes: the wider one opens first so the narrower sits on top.
    definitions.sort_by(|a, b| {
        a.range
            .cmp_start(&b.range)
            .then_with(|| b.range.end().cmp(&a.range.end()))
            .then_with(|| a.symbol.cmp(b.symbol))
    });

    let mut references: Vec<DocOccurrence<'a>> = partition.references.clone();
    references.sort_by(|a, b| {
        a.range()
            .cmp_start(&b.range())
            .then_with(|| a.range().end().cmp(&b.range().end()))
            .then_with(|| a.symbol().cmp(b.symbol()))
    });

    let mut enclosed: EnclosedReferences<'a> =
        definitions.iter().map(|d| (d.symbol, Vec::new())).collect();
    let mut stack = ScopeStack::default();
    let mut next_definition = 0;
    let mut unscoped = 0;

    for reference in references {
        let range = reference.range();
        while let Some(def) = definitions.get(next_definition) {
            if def.range.start() > range.start() {
                break;
            }
            stack.push(*def);
            next_definition += 1;
        }

        match stack.innermost_containing(&range) {
            Some(owner) => enclosed.entry(owner).or_default().push(reference),
            None => unscoped += 1,
        }
    }

    DocumentScopes {
        document: partition.document.relative_path.as_str(),
        definitions: partition.definitions.clone(),
        enclosed,
        unscoped,
    }
}

/// Fold per-document results into one map.
///
/// A body holding calls cannot span documents, so two documents both
/// enclosing references for one symbol means the index is inconsistent and
/// the batch must stop. Bodies without calls (stubs, declarations repeated in
/// another file) never collide: the first one seen tracks the symbol until a
/// body with calls replaces it.
pub fn merge_scopes<'a>(
    scopes: impl IntoIterator<Item = DocumentScopes<'a>>,
) -> Result<ScopeResolution<'a>> {
    let mut merged = ScopeResolution::default();
    let mut populated: HashSet<&'a str> = HashSet::new();
    for doc in scopes {
        merged.unscoped += doc.unscoped;
        for (symbol, refs) in doc.enclosed {
            let definition = doc.definitions.get(symbol).copied();
            if refs.is_empty() {
                match merged.enclosed.entry(symbol) {
                    Entry::Vacant(slot) => {
                        slot.insert(refs);
                        if let Some(definition) = definition {
                            merged.definitions.insert(symbol, definition);
                        }
                    }
                    Entry::Occupied(_) => {
                        debug!(symbol, document = doc.document, "Ignoring repeated body without calls");
                    }
                }
                continue;
            }

            if !populated.insert(symbol) {
                return Err(GraphError::DuplicateDefinition {
                    symbol: symbol.to_string(),
                    document: doc.document.to_string(),
                });
            }
            merged.enclosed.insert(symbol, refs);
            if let Some(definition) = definition {
                merged.definitions.insert(symbol, definition);
            }
        }
    }
    Ok(merged)
}

/// Resolve scopes for every document and merge them in document order.
#[instrument(skip_all, name = "resolve_scopes")]
pub fn resolve_all<'a>(
    partitions: &[DocumentPartition<'a>],
    parallel: bool,
) -> Result<ScopeResolution<'a>> {
    let per_document: Vec<DocumentScopes<'a>> = if parallel {
        partitions.par_iter().map(resolve_document).collect()
    } else {
        partitions.iter().map(resolve_document).collect()
    };
    let merged = merge_scopes(per_document)?;
    debug!(
        definitions = merged.enclosed.len(),
        unscoped = merged.unscoped,
        "Scope resolution complete"
    );
    Ok(merged)
}

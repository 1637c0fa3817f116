// Callable-to-callable edge filtering.
//
// Only references whose target is itself a tracked definition become call
// edges. Calls into libraries, builtins, or symbols without a body are dropped.

use tracing::debug;

use crate::index::SymbolOccurrences;
use crate::scope::EnclosedReferences;

/// The adjacency used for graph construction.
#[derive(Debug, Default)]
pub struct CallEdges<'a> {
    /// Per caller, enclosed references whose target is a tracked definition.
    pub calls: SymbolOccurrences<'a>,
    /// The global reference map restricted to tracked targets, including
    /// references outside any definition body.
    pub tracked_references: SymbolOccurrences<'a>,
    /// Enclosed references removed because their target is untracked.
    pub dropped: usize,
}

impl CallEdges<'_> {
    pub fn edge_count(&self) -> usize {
        self.calls.values().map(Vec::len).sum()
    }

    /// References to tracked definitions made from outside any definition body.
    pub fn unscoped_tracked_references(&self) -> usize {
        let tracked: usize = self.tracked_references.values().map(Vec::len).sum();
        tracked.saturating_sub(self.edge_count())
    }
}

pub fn filter_edges<'a>(
    enclosed: &EnclosedReferences<'a>,
    references: &SymbolOccurrences<'a>,
) -> CallEdges<'a> {
    let mut dropped = 0;
    let calls: SymbolOccurrences<'a> = enclosed
        .iter()
        .map(|(&caller, refs)| {
            let kept: Vec<_> = refs
                .iter()
                .filter(|r| enclosed.contains_key(r.symbol()))
                .copied()
                .collect();
            dropped += refs.len() - kept.len();
            (caller, kept)
        })
        .collect();

    let tracked_references: SymbolOccurrences<'a> = references
        .iter()
        .filter(|(target, _)| calls.contains_key(*target))
        .map(|(&target, refs)| (target, refs.clone()))
        .collect();

    debug!(
        callers = calls.len(),
        dropped,
        tracked_targets = tracked_references.len(),
        "Filtered call edges"
    );

    CallEdges {
        calls,
        tracked_references,
        dropped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SourceRange;
    use crate::index::{DocOccurrence, Document, Occurrence};

    #[test]
    fn keeps_only_edges_to_tracked_definitions() {
        let doc = Document {
            relative_path: "a.py".into(),
            occurrences: vec![
                Occurrence::reference("b", SourceRange::new(1, 0, 1, 1)),
                Occurrence::reference("print", SourceRange::new(2, 0, 2, 5)),
                Occurrence::reference("b", SourceRange::new(9, 0, 9, 1)),
            ],
            symbols: Vec::new(),
        };
        let occ = |i: usize| DocOccurrence::new(&doc, &doc.occurrences[i]);

        let enclosed: EnclosedReferences<'_> = [("a", vec![occ(0), occ(1)]), ("b", vec![])]
            .into_iter()
            .collect();
        let references: SymbolOccurrences<'_> = [("b", vec![occ(0), occ(2)]), ("print", vec![occ(1)])]
            .into_iter()
            .collect();

        let edges = filter_edges(&enclosed, &references);
        assert_eq!(edges.calls["a"], vec![occ(0)]);
        assert!(edges.calls["b"].is_empty());
        assert_eq!(edges.dropped, 1);
        assert_eq!(edges.edge_count(), 1);

        assert!(edges.tracked_references.contains_key("b"));
        assert!(!edges.tracked_references.contains_key("print"));
        assert_eq!(edges.unscoped_tracked_references(), 1);
    }
}

// Call graph construction from filtered call edges.
//
// Each tracked definition becomes a node whose `calls` are the call-site
// occurrences inside its body. Expansion is depth-first on an explicit stack.
// Cycles terminate because a call site is expanded at most once per top-level
// build; the edge itself is always recorded.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashMap, HashSet};

use tracing::{debug, instrument};

use crate::index::{CallSite, DocOccurrence, SymbolOccurrences};
use crate::{GraphError, Result};

/// A definition and the call sites lexically inside its body, in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallGraphNode<'a> {
    pub definition: DocOccurrence<'a>,
    pub calls: Vec<DocOccurrence<'a>>,
}

impl<'a> CallGraphNode<'a> {
    pub fn symbol(&self) -> &'a str {
        self.definition.symbol()
    }
}

/// The built call graph, immutable once constructed.
#[derive(Debug, Default)]
pub struct CallGraph<'a> {
    nodes: BTreeMap<&'a str, CallGraphNode<'a>>,
    /// Reverse index: target symbol → call sites in other nodes.
    callers: BTreeMap<&'a str, Vec<DocOccurrence<'a>>>,
}

impl<'a> CallGraph<'a> {
    /// Build a node for every definition in `calls`, in symbol order.
    #[instrument(skip_all, name = "build_call_graph")]
    pub fn build(
        definitions: &HashMap<&'a str, DocOccurrence<'a>>,
        calls: &SymbolOccurrences<'a>,
    ) -> Result<Self> {
        let mut ctx = BuildContext::new(definitions, calls);
        for &symbol in calls.keys() {
            if !ctx.is_built(symbol) {
                ctx.build_root(symbol)?;
            }
        }
        let graph = ctx.finish();
        debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "Call graph built"
        );
        Ok(graph)
    }

    pub fn node(&self, symbol: &str) -> Option<&CallGraphNode<'a>> {
        self.nodes.get(symbol)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &CallGraphNode<'a>> {
        self.nodes.values()
    }

    pub fn symbols(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.nodes.keys().copied()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.nodes.values().map(|n| n.calls.len()).sum()
    }

    /// Call sites in other nodes that target `symbol`. Self-calls are not listed.
    pub fn callers(&self, symbol: &str) -> &[DocOccurrence<'a>] {
        self.callers.get(symbol).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_called(&self, symbol: &str) -> bool {
        !self.callers(symbol).is_empty()
    }
}

/// Request-scoped state for one graph build: the memo of finished nodes and
/// the reverse index. Per-root visited call sites live in `build_root`.
#[derive(Debug)]
pub struct BuildContext<'a, 'g> {
    definitions: &'g HashMap<&'a str, DocOccurrence<'a>>,
    calls: &'g SymbolOccurrences<'a>,
    nodes: BTreeMap<&'a str, CallGraphNode<'a>>,
    callers: BTreeMap<&'a str, Vec<DocOccurrence<'a>>>,
}

struct Frame<'a, 'g> {
    definition: DocOccurrence<'a>,
    pending: &'g [DocOccurrence<'a>],
    next: usize,
    calls: Vec<DocOccurrence<'a>>,
}

impl<'a, 'g> BuildContext<'a, 'g> {
    pub fn new(
        definitions: &'g HashMap<&'a str, DocOccurrence<'a>>,
        calls: &'g SymbolOccurrences<'a>,
    ) -> Self {
        Self {
            definitions,
            calls,
            nodes: BTreeMap::new(),
            callers: BTreeMap::new(),
        }
    }

    pub fn is_built(&self, symbol: &str) -> bool {
        self.nodes.contains_key(symbol)
    }

    /// Expand `root` and everything reachable from it that is not built yet.
    pub fn build_root(&mut self, root: &'a str) -> Result<()> {
        let mut visited: HashSet<CallSite<'a>> = HashSet::new();
        let mut stack: Vec<Frame<'a, 'g>> = Vec::new();
        if let Some(frame) = self.open(root)? {
            stack.push(frame);
        }

        while let Some(frame) = stack.last_mut() {
            let Some(&call) = frame.pending.get(frame.next) else {
                if let Some(done) = stack.pop() {
                    self.finish_node(done);
                }
                continue;
            };
            frame.next += 1;
            frame.calls.push(call);
            let caller = frame.definition.symbol();

            let target = call.symbol();
            if !self.nodes.contains_key(target)
                && target != caller
                && visited.insert(call.call_site())
            {
                if let Some(child) = self.open(target)? {
                    stack.push(child);
                }
            }
        }
        Ok(())
    }

    pub fn finish(self) -> CallGraph<'a> {
        CallGraph {
            nodes: self.nodes,
            callers: self.callers,
        }
    }

    fn open(&self, symbol: &'a str) -> Result<Option<Frame<'a, 'g>>> {
        let calls: &'g SymbolOccurrences<'a> = self.calls;
        let Some(pending) = calls.get(symbol) else {
            return Ok(None);
        };
        let definition = self.definitions.get(symbol).copied().ok_or_else(|| {
            GraphError::MissingDefinition {
                symbol: symbol.to_string(),
            }
        })?;
        Ok(Some(Frame {
            definition,
            pending: pending.as_slice(),
            next: 0,
            calls: Vec::with_capacity(pending.len()),
        }))
    }

    // A symbol re-entered through a different call site on the same path is
    // built twice with identical calls; the first finished copy is kept.
    fn finish_node(&mut self, frame: Frame<'a, 'g>) {
        let symbol = frame.definition.symbol();
        if let Entry::Vacant(slot) = self.nodes.entry(symbol) {
            for call in frame.calls.iter().filter(|c| c.symbol() != symbol) {
                self.callers.entry(call.symbol()).or_default().push(*call);
            }
            slot.insert(CallGraphNode {
                definition: frame.definition,
                calls: frame.calls,
            });
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SourceRange;
    use crate::index::{Document, Occurrence};

    /// Documents holding one definition per symbol followed by call sites.
    struct Fixture {
        doc: Document,
        defs: usize,
    }

    impl Fixture {
        fn new(defs: &[&str], calls: &[&str]) -> Self {
            let mut occurrences = Vec::new();
            for (i, sym) in defs.iter().enumerate() {
                let line = u32::try_from(i).unwrap() * 10;
                occurrences.push(Occurrence::definition(
                    *sym,
                    SourceRange::new(line, 4, line, 8),
                    Some(SourceRange::new(line, 0, line + 9, 0)),
                ));
            }
            for (i, sym) in calls.iter().enumerate() {
                let line = 1000 + u32::try_from(i).unwrap();
                occurrences.push(Occurrence::reference(*sym, SourceRange::new(line, 0, line, 3)));
            }
            Self {
                doc: Document {
                    relative_path: "fixture.py".into(),
                    occurrences,
                    symbols: Vec::new(),
                },
                defs: defs.len(),
            }
        }

        fn definitions(&self) -> HashMap<&str, DocOccurrence<'_>> {
            self.doc
                .occurrences
                .iter()
                .filter(|o| o.is_scoped_definition())
                .map(|o| (o.symbol.as_str(), DocOccurrence::new(&self.doc, o)))
                .collect()
        }

        fn call(&self, i: usize) -> DocOccurrence<'_> {
            DocOccurrence::new(&self.doc, &self.doc.occurrences[self.defs + i])
        }
    }

    fn edges<'a>(entries: Vec<(&'a str, Vec<DocOccurrence<'a>>)>) -> SymbolOccurrences<'a> {
        entries.into_iter().collect()
    }

    #[test]
    fn self_recursion_terminates() {
        let f = Fixture::new(&["a"], &["a"]);
        let calls = edges(vec![("a", vec![f.call(0)])]);
        let graph = CallGraph::build(&f.definitions(), &calls).unwrap();

        assert_eq!(graph.node_count(), 1);
        assert_eq!(graph.node("a").unwrap().calls, vec![f.call(0)]);
        assert!(!graph.is_called("a"));
    }

    #[test]
    fn mutual_recursion_builds_both_nodes() {
        // calls[0]: a → b, calls[1]: b → a
        let f = Fixture::new(&["a", "b"], &["b", "a"]);
        let calls = edges(vec![("a", vec![f.call(0)]), ("b", vec![f.call(1)])]);
        let graph = CallGraph::build(&f.definitions(), &calls).unwrap();

        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.node("a").unwrap().calls, vec![f.call(0)]);
        assert_eq!(graph.node("b").unwrap().calls, vec![f.call(1)]);
        assert_eq!(graph.callers("a"), &[f.call(1)]);
        assert_eq!(graph.callers("b"), &[f.call(0)]);
    }

    #[test]
    fn records_edges_to_already_built_nodes() {
        // a → c, b → c
        let f = Fixture::new(&["a", "b", "c"], &["c", "c"]);
        let calls = edges(vec![
            ("a", vec![f.call(0)]),
            ("b", vec![f.call(1)]),
            ("c", vec![]),
        ]);
        let graph = CallGraph::build(&f.definitions(), &calls).unwrap();

        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.callers("c").len(), 2);
        assert!(!graph.is_called("a"));
        assert!(!graph.is_called("b"));
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn call_order_follows_source_order() {
        let f = Fixture::new(&["a", "b", "c"], &["c", "b", "c"]);
        let calls = edges(vec![
            ("a", vec![f.call(0), f.call(1), f.call(2)]),
            ("b", vec![]),
            ("c", vec![]),
        ]);
        let graph = CallGraph::build(&f.definitions(), &calls).unwrap();
        let targets: Vec<_> = graph
            .node("a")
            .unwrap()
            .calls
            .iter()
            .map(DocOccurrence::symbol)
            .collect();
        assert_eq!(targets, vec!["c", "b", "c"]);
    }

    #[test]
    fn missing_definition_is_fatal() {
        let f = Fixture::new(&[], &["ghost"]);
        let calls = edges(vec![("ghost", vec![])]);
        let err = CallGraph::build(&f.definitions(), &calls).unwrap_err();
        assert!(matches!(err, GraphError::MissingDefinition { symbol } if symbol == "ghost"));
    }

    #[test]
    fn deep_chains_do_not_exhaust_the_stack() {
        let symbols: Vec<String> = (0..20_000).map(|i| format!("f{i}")).collect();
        let refs: Vec<&str> = symbols.iter().skip(1).map(String::as_str).collect();
        let defs: Vec<&str> = symbols.iter().map(String::as_str).collect();
        let f = Fixture::new(&defs, &refs);

        let mut calls: SymbolOccurrences<'_> = SymbolOccurrences::new();
        for (i, sym) in defs.iter().enumerate() {
            let callees = if i + 1 < defs.len() {
                vec![f.call(i)]
            } else {
                vec![]
            };
            calls.insert(*sym, callees);
        }

        let graph = CallGraph::build(&f.definitions(), &calls).unwrap();
        assert_eq!(graph.node_count(), symbols.len());
        assert!(!graph.is_called("f0"));
        assert!(graph.is_called("f19999"));
    }
}

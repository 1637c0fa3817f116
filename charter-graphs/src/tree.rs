// Call forest serialization.
//
// Each root becomes a nested record tree: the node's definition location,
// the call site that reached it (for non-roots), and one child per call.
// Within one root's traversal a call site is emitted once; distinct call
// sites to the same callee are each expanded, so heavy fan-in can repeat
// subtrees.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::call_graph::{CallGraph, CallGraphNode};
use crate::index::{CallSite, DocOccurrence};
use crate::rank;
use crate::{GraphError, Result, SourceRange};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefinitionLocation {
    pub document: String,
    pub range: SourceRange,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enclosing_range: Option<SourceRange>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceLocation {
    pub document: String,
    pub range: SourceRange,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallTreeNode {
    pub symbol: String,
    pub definition_node: DefinitionLocation,
    /// The call site that reached this node; absent on roots.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_node: Option<ReferenceLocation>,
    /// Longest call chain below this node; set on roots only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depth: Option<usize>,
    #[serde(default)]
    pub children: Vec<CallTreeNode>,
}

impl CallTreeNode {
    fn leaf(node: &CallGraphNode<'_>, caller: Option<DocOccurrence<'_>>) -> Self {
        let definition = node.definition;
        Self {
            symbol: definition.symbol().to_string(),
            definition_node: DefinitionLocation {
                document: definition.path().to_string(),
                range: definition.range(),
                enclosing_range: definition.occurrence.enclosing_range,
            },
            reference_node: caller.map(|c| ReferenceLocation {
                document: c.path().to_string(),
                range: c.range(),
            }),
            depth: None,
            children: Vec::new(),
        }
    }

    /// Number of records in this subtree, including this one.
    pub fn size(&self) -> usize {
        let mut count = 0;
        let mut pending = vec![self];
        while let Some(node) = pending.pop() {
            count += 1;
            pending.extend(&node.children);
        }
        count
    }
}

/// Depth-ordered roots, serialized as a bare array.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallForest {
    pub roots: Vec<CallTreeNode>,
}

impl CallForest {
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

struct TreeFrame<'g, 'a> {
    record: CallTreeNode,
    calls: &'g [DocOccurrence<'a>],
    next: usize,
}

fn open_frame<'g, 'a>(
    graph: &'g CallGraph<'a>,
    symbol: &str,
    caller: Option<DocOccurrence<'a>>,
) -> Result<TreeFrame<'g, 'a>> {
    let node = graph.node(symbol).ok_or_else(|| GraphError::MissingNode {
        symbol: symbol.to_string(),
    })?;
    Ok(TreeFrame {
        record: CallTreeNode::leaf(node, caller),
        calls: &node.calls,
        next: 0,
    })
}

/// Build the record tree rooted at `symbol`.
///
/// `visited` holds the call sites already emitted in the current root's
/// traversal; callers pass a fresh set per root.
pub fn to_tree<'a>(
    graph: &CallGraph<'a>,
    symbol: &str,
    caller: Option<DocOccurrence<'a>>,
    visited: &mut HashSet<CallSite<'a>>,
) -> Result<CallTreeNode> {
    let mut stack = vec![open_frame(graph, symbol, caller)?];
    let mut finished = None;

    while let Some(frame) = stack.last_mut() {
        let calls = frame.calls;
        if let Some(&call) = calls.get(frame.next) {
            frame.next += 1;
            if visited.insert(call.call_site()) {
                stack.push(open_frame(graph, call.symbol(), Some(call))?);
            }
            continue;
        }

        if let Some(done) = stack.pop() {
            match stack.last_mut() {
                Some(parent) => parent.record.children.push(done.record),
                None => finished = Some(done.record),
            }
        }
    }

    finished.ok_or_else(|| GraphError::MissingNode {
        symbol: symbol.to_string(),
    })
}

/// Serialize every root, deepest call tree first.
#[instrument(skip_all, name = "build_forest")]
pub fn build_forest(graph: &CallGraph<'_>) -> Result<CallForest> {
    let ranked = rank::ranked_roots(graph);
    let mut roots = Vec::with_capacity(ranked.len());
    for root in ranked {
        let mut visited = HashSet::new();
        let mut tree = to_tree(graph, &root.symbol, None, &mut visited)?;
        tree.depth = Some(root.depth);
        roots.push(tree);
    }
    debug!(roots = roots.len(), "Call forest serialized");
    Ok(CallForest { roots })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{Document, Occurrence, SymbolOccurrences};
    use std::collections::HashMap;

    fn fixture() -> Document {
        // main (0..10) calls helper twice and log once; helper (12..20) calls log.
        Document {
            relative_path: "src/app.py".into(),
            occurrences: vec![
                Occurrence::definition(
                    "main",
                    SourceRange::new(0, 4, 0, 8),
                    Some(SourceRange::new(0, 0, 10, 0)),
                ),
                Occurrence::reference("helper", SourceRange::new(1, 4, 1, 10)),
                Occurrence::reference("log", SourceRange::new(2, 4, 2, 7)),
                Occurrence::reference("helper", SourceRange::new(3, 4, 3, 10)),
                Occurrence::definition(
                    "helper",
                    SourceRange::new(12, 4, 12, 10),
                    Some(SourceRange::new(12, 0, 20, 0)),
                ),
                Occurrence::reference("log", SourceRange::new(13, 4, 13, 7)),
                Occurrence::definition("log", SourceRange::new(22, 4, 22, 7), None),
            ],
            symbols: Vec::new(),
        }
    }

    fn graph(doc: &Document) -> CallGraph<'_> {
        let at = |i: usize| DocOccurrence::new(doc, &doc.occurrences[i]);
        let definitions: HashMap<&str, DocOccurrence<'_>> =
            [("main", at(0)), ("helper", at(4)), ("log", at(6))]
                .into_iter()
                .collect();
        let calls: SymbolOccurrences<'_> = [
            ("main", vec![at(1), at(2), at(3)]),
            ("helper", vec![at(5)]),
            ("log", vec![]),
        ]
        .into_iter()
        .collect();
        CallGraph::build(&definitions, &calls).unwrap()
    }

    #[test]
    fn expands_each_call_site() {
        let doc = fixture();
        let graph = graph(&doc);
        let forest = build_forest(&graph).unwrap();

        assert_eq!(forest.roots.len(), 1);
        let root = &forest.roots[0];
        assert_eq!(root.symbol, "main");
        assert_eq!(root.depth, Some(2));
        assert!(root.reference_node.is_none());

        let children: Vec<_> = root.children.iter().map(|c| c.symbol.as_str()).collect();
        assert_eq!(children, vec!["helper", "log", "helper"]);
        // The second helper expansion finds its inner call site already emitted.
        assert_eq!(root.children[0].children.len(), 1);
        assert!(root.children[2].children.is_empty());
        assert_eq!(root.size(), 5);

        let reference = root.children[2].reference_node.as_ref().unwrap();
        assert_eq!(reference.document, "src/app.py");
        assert_eq!(reference.range, SourceRange::new(3, 4, 3, 10));
    }

    #[test]
    fn omits_absent_fields_when_serialized() {
        let doc = fixture();
        let graph = graph(&doc);
        let forest = build_forest(&graph).unwrap();
        let value = serde_json::to_value(&forest).unwrap();

        let root = &value[0];
        assert!(root.get("reference_node").is_none());
        assert_eq!(root["definition_node"]["enclosing_range"]["end_line"], 10);
        let log = &root["children"][1];
        assert!(log["definition_node"].get("enclosing_range").is_none());
        assert!(log.get("depth").is_none());
        assert_eq!(log["reference_node"]["range"]["start_character"], 4);
    }

    #[test]
    fn cyclic_graph_emits_each_call_site_once() {
        let doc = Document {
            relative_path: "c.py".into(),
            occurrences: vec![
                Occurrence::definition(
                    "a",
                    SourceRange::new(0, 0, 0, 1),
                    Some(SourceRange::new(0, 0, 5, 0)),
                ),
                Occurrence::reference("b", SourceRange::new(1, 0, 1, 1)),
                Occurrence::definition(
                    "b",
                    SourceRange::new(6, 0, 6, 1),
                    Some(SourceRange::new(6, 0, 9, 0)),
                ),
                Occurrence::reference("a", SourceRange::new(7, 0, 7, 1)),
            ],
            symbols: Vec::new(),
        };
        let at = |i: usize| DocOccurrence::new(&doc, &doc.occurrences[i]);
        let definitions: HashMap<&str, DocOccurrence<'_>> =
            [("a", at(0)), ("b", at(2))].into_iter().collect();
        let calls: SymbolOccurrences<'_> =
            [("a", vec![at(1)]), ("b", vec![at(3)])].into_iter().collect();
        let graph = CallGraph::build(&definitions, &calls).unwrap();

        let tree = to_tree(&graph, "a", None, &mut HashSet::new()).unwrap();
        // a → b → a, then the a → b site is already emitted.
        assert_eq!(tree.size(), 3);
        assert_eq!(tree.children[0].children[0].symbol, "a");
        assert!(tree.children[0].children[0].children.is_empty());
    }

    #[test]
    fn unknown_root_is_an_error() {
        let doc = fixture();
        let graph = graph(&doc);
        let err = to_tree(&graph, "nope", None, &mut HashSet::new()).unwrap_err();
        assert!(matches!(err, GraphError::MissingNode { .. }));
    }

    #[test]
    fn forest_round_trips_through_json() {
        let doc = fixture();
        let graph = graph(&doc);
        let forest = build_forest(&graph).unwrap();
        let json = forest.to_json_pretty().unwrap();
        let back: CallForest = serde_json::from_str(&json).unwrap();
        assert_eq!(back, forest);
    }

    #[test]
    fn forest_snapshot() {
        let doc = fixture();
        let graph = graph(&doc);
        let forest = build_forest(&graph).unwrap();
        insta::assert_json_snapshot!(forest);
    }
}

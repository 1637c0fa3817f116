// Root selection and depth ranking.
//
// A root is a node no other node calls. Depth is the longest call chain below
// a node; a call site is followed at most once per depth computation, so a
// cycle adds one level past its re-entry point instead of looping.

use std::cmp::Reverse;
use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::call_graph::CallGraph;
use crate::index::{CallSite, DocOccurrence};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedRoot {
    pub symbol: String,
    pub depth: usize,
}

/// Nodes never called from another node, in symbol order.
pub fn roots<'a>(graph: &CallGraph<'a>) -> Vec<&'a str> {
    graph.symbols().filter(|s| !graph.is_called(s)).collect()
}

struct DepthFrame<'g, 'a> {
    calls: &'g [DocOccurrence<'a>],
    next: usize,
    deepest_child: usize,
}

/// Longest call chain starting at `symbol`: 0 for a node without calls.
pub fn call_depth(graph: &CallGraph<'_>, symbol: &str) -> usize {
    let Some(node) = graph.node(symbol) else {
        return 0;
    };
    if node.calls.is_empty() {
        return 0;
    }

    let mut visited: HashSet<CallSite<'_>> = HashSet::new();
    let mut stack = vec![DepthFrame {
        calls: &node.calls,
        next: 0,
        deepest_child: 0,
    }];
    let mut depth = 0;

    while let Some(frame) = stack.last_mut() {
        let calls = frame.calls;
        if let Some(call) = calls.get(frame.next) {
            frame.next += 1;
            if !visited.insert(call.call_site()) {
                continue;
            }
            if let Some(child) = graph.node(call.symbol()).filter(|n| !n.calls.is_empty()) {
                stack.push(DepthFrame {
                    calls: &child.calls,
                    next: 0,
                    deepest_child: 0,
                });
            }
            continue;
        }

        let finished = frame.deepest_child + 1;
        stack.pop();
        match stack.last_mut() {
            Some(parent) => parent.deepest_child = parent.deepest_child.max(finished),
            None => depth = finished,
        }
    }

    depth
}

/// Roots ordered by depth, deepest first; equal depths by symbol.
pub fn ranked_roots(graph: &CallGraph<'_>) -> Vec<RankedRoot> {
    let mut ranked: Vec<RankedRoot> = roots(graph)
        .into_iter()
        .map(|symbol| RankedRoot {
            symbol: symbol.to_string(),
            depth: call_depth(graph, symbol),
        })
        .collect();
    ranked.sort_by_key(|r| (Reverse(r.depth), r.symbol.clone()));
    ranked
}

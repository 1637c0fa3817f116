// Pipeline orchestrator: Extract → Resolve → Filter → Build → Rank/Serialize.

use std::time::Instant;

use charter_graphs::extract::{self, ExtractStats};
use charter_graphs::rank::RankedRoot;
use charter_graphs::{CallForest, CallGraph, Index, filter, scope, tree};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::config::CharterConfig;
use crate::error::Result;
use crate::progress::{NoopReporter, ProgressReporter};

const STAGES: [&str; 5] = [
    "Extracting occurrences",
    "Resolving scopes",
    "Filtering call edges",
    "Building call graph",
    "Serializing call trees",
];

/// Counters gathered over one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineStats {
    pub extract: ExtractStats,
    /// Candidate references outside every tracked definition body.
    pub unscoped_references: usize,
    /// Enclosed references whose target is not a tracked definition.
    pub dropped_references: usize,
    /// References to tracked definitions made from outside any body.
    pub unscoped_tracked_references: usize,
    pub nodes: usize,
    pub edges: usize,
    pub roots: usize,
    pub max_depth: usize,
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineResult {
    pub forest: CallForest,
    pub stats: PipelineStats,
}

impl PipelineResult {
    /// Roots in output order with their depths.
    pub fn ranked_roots(&self) -> Vec<RankedRoot> {
        self.forest
            .roots
            .iter()
            .map(|root| RankedRoot {
                symbol: root.symbol.clone(),
                depth: root.depth.unwrap_or_default(),
            })
            .collect()
    }
}

/// Runs the call graph stages over a decoded index.
pub struct CallGraphPipeline {
    config: CharterConfig,
    reporter: Box<dyn ProgressReporter>,
}

impl std::fmt::Debug for CallGraphPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallGraphPipeline")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl CallGraphPipeline {
    pub fn new(config: CharterConfig) -> Self {
        Self {
            config,
            reporter: Box::new(NoopReporter),
        }
    }

    #[must_use]
    pub fn with_reporter(mut self, reporter: Box<dyn ProgressReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn config(&self) -> &CharterConfig {
        &self.config
    }

    #[instrument(skip_all, name = "call_graph_pipeline")]
    pub fn run(&self, index: &Index) -> Result<PipelineResult> {
        let start = Instant::now();
        let policy = self.config.analysis.reference_policy;
        let parallel = self.config.analysis.parallel;
        let mut stages = STAGES.iter();
        let mut next_stage = || {
            if let Some(stage) = stages.next() {
                self.reporter.advance(1);
                self.reporter.message(stage);
            }
        };

        self.reporter.start("call graph", Some(STAGES.len() as u64));
        info!(
            documents = index.documents.len(),
            policy = %policy,
            parallel,
            "Call graph pipeline starting"
        );

        next_stage();
        let elements = extract::extract_index(index, policy, parallel);

        next_stage();
        let resolution = scope::resolve_all(&elements.partitions, parallel)?;

        next_stage();
        let edges = filter::filter_edges(&resolution.enclosed, &elements.references);

        next_stage();
        let graph = CallGraph::build(&resolution.definitions, &edges.calls)?;

        next_stage();
        let forest = tree::build_forest(&graph)?;
        self.reporter.finish();

        let stats = PipelineStats {
            extract: elements.stats,
            unscoped_references: resolution.unscoped,
            dropped_references: edges.dropped,
            unscoped_tracked_references: edges.unscoped_tracked_references(),
            nodes: graph.node_count(),
            edges: graph.edge_count(),
            roots: forest.roots.len(),
            max_depth: forest
                .roots
                .iter()
                .filter_map(|r| r.depth)
                .max()
                .unwrap_or_default(),
            elapsed_ms: u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
        };
        info!(
            nodes = stats.nodes,
            edges = stats.edges,
            roots = stats.roots,
            max_depth = stats.max_depth,
            elapsed_ms = stats.elapsed_ms,
            "Call graph pipeline complete"
        );

        Ok(PipelineResult { forest, stats })
    }
}

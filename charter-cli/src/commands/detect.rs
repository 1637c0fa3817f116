use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use tracing::info;

use charter_core::pipeline::CallGraphPipeline;
use charter_core::progress::IndicatifReporter;

use super::AnalysisArgs;

#[derive(Args, Debug)]
pub struct DetectArgs {
    #[command(flatten)]
    pub analysis: AnalysisArgs,

    /// Where to write the call graph JSON
    #[arg(long, default_value = "call_graph.json")]
    pub output_file: PathBuf,

    /// Write compact JSON instead of pretty-printed
    #[arg(long)]
    pub compact: bool,
}

pub fn run(args: &DetectArgs, quiet: bool) -> anyhow::Result<()> {
    let config = args.analysis.resolve_config()?;
    let pretty = config.output.pretty && !args.compact;
    let index = args.analysis.load_index()?;

    let reporter = if quiet {
        IndicatifReporter::hidden()
    } else {
        IndicatifReporter::new()
    };
    let result = CallGraphPipeline::new(config)
        .with_reporter(Box::new(reporter))
        .run(&index)?;

    let json = if pretty {
        serde_json::to_string_pretty(&result.forest)
    } else {
        serde_json::to_string(&result.forest)
    }
    .context("Failed to serialize call graph")?;

    if let Some(parent) = args.output_file.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Cannot create output directory: {}", parent.display()))?;
    }
    std::fs::write(&args.output_file, json)
        .with_context(|| format!("Cannot write output: {}", args.output_file.display()))?;

    info!(
        output = %args.output_file.display(),
        roots = result.stats.roots,
        "Call graph written"
    );
    if !quiet {
        println!(
            "Wrote {} call trees ({} nodes, {} edges, max depth {}) to {}",
            result.stats.roots,
            result.stats.nodes,
            result.stats.edges,
            result.stats.max_depth,
            args.output_file.display()
        );
    }
    Ok(())
}

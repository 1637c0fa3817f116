use std::fmt::Write;

use clap::Args;

use charter_core::pipeline::{CallGraphPipeline, PipelineResult};

use super::AnalysisArgs;

#[derive(Args, Debug)]
pub struct StatsArgs {
    #[command(flatten)]
    pub analysis: AnalysisArgs,

    /// Show the top N roots by depth
    #[arg(long, default_value = "10")]
    pub top: usize,

    /// Output format: text, json
    #[arg(long, default_value = "text", value_parser = ["text", "json"])]
    pub format: String,
}

pub fn run(args: &StatsArgs) -> anyhow::Result<()> {
    let config = args.analysis.resolve_config()?;
    let index = args.analysis.load_index()?;
    let result = CallGraphPipeline::new(config).run(&index)?;

    let output = match args.format.as_str() {
        "json" => render_json(&result, args.top)?,
        _ => render_text(&result, args.top),
    };
    print!("{output}");
    Ok(())
}

fn render_json(result: &PipelineResult, top: usize) -> anyhow::Result<String> {
    let roots: Vec<_> = result.ranked_roots().into_iter().take(top).collect();
    let value = serde_json::json!({
        "stats": result.stats,
        "top_roots": roots,
    });
    Ok(format!("{}\n", serde_json::to_string_pretty(&value)?))
}

fn render_text(result: &PipelineResult, top: usize) -> String {
    let stats = &result.stats;
    let extract = &stats.extract;
    let mut out = String::new();

    let _ = writeln!(out, "Extraction:");
    let _ = writeln!(out, "  Documents:        {:>8}", extract.documents);
    let _ = writeln!(out, "  Occurrences:      {:>8}", extract.occurrences);
    let _ = writeln!(out, "  Locals skipped:   {:>8}", extract.locals_skipped);
    let _ = writeln!(out, "  Definitions:      {:>8}", extract.definitions);
    let _ = writeln!(out, "  References:       {:>8}", extract.references);
    let _ = writeln!(out, "  Unparseable:      {:>8}", extract.skipped.len());
    if !extract.kind_counts.is_empty() {
        let mut kinds: Vec<_> = extract.kind_counts.iter().collect();
        kinds.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        let _ = writeln!(out, "  Symbol kinds:");
        for (kind, count) in kinds {
            let _ = writeln!(out, "    {kind:<20} {count:>6}");
        }
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "Call graph:");
    let _ = writeln!(out, "  Nodes:            {:>8}", stats.nodes);
    let _ = writeln!(out, "  Edges:            {:>8}", stats.edges);
    let _ = writeln!(out, "  Roots:            {:>8}", stats.roots);
    let _ = writeln!(out, "  Max depth:        {:>8}", stats.max_depth);
    let _ = writeln!(out, "  Unscoped refs:    {:>8}", stats.unscoped_references);
    let _ = writeln!(out, "  Untracked calls:  {:>8}", stats.dropped_references);
    let _ = writeln!(out, "  Elapsed:          {:>6}ms", stats.elapsed_ms);
    let _ = writeln!(out);

    let roots: Vec<_> = result.ranked_roots().into_iter().take(top).collect();
    let _ = writeln!(out, "Top {} roots by depth:", roots.len());
    let _ = writeln!(out, "{:<4} {:>6}  Symbol", "#", "Depth");
    let _ = writeln!(out, "{:-<80}", "");
    for (i, root) in roots.iter().enumerate() {
        let _ = writeln!(out, "{:<4} {:>6}  {}", i + 1, root.depth, root.symbol);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use charter_core::config::CharterConfig;

    fn result() -> PipelineResult {
        CallGraphPipeline::new(CharterConfig::default())
            .run(&charter_test::two_document_index())
            .unwrap()
    }

    #[test]
    fn text_lists_roots_by_depth() {
        let text = render_text(&result(), 10);
        assert!(text.contains("Top 1 roots by depth:"));
        assert!(text.contains(charter_test::CALLER));
        assert!(!text.contains(&format!("  {}\n", charter_test::CALLEE)));
    }

    #[test]
    fn json_truncates_to_top() {
        let json = render_json(&result(), 0).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["top_roots"].as_array().map(Vec::len), Some(0));
        assert_eq!(value["stats"]["nodes"], 2);
    }
}

pub mod detect;
pub mod stats;

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Subcommand};
use tracing::debug;

use charter_core::config::{CONFIG_FILE_NAME, CharterConfig};
use charter_core::load;
use charter_graphs::{Index, ReferencePolicy};

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Detect the call graph of an index and write it as JSON
    Detect(detect::DetectArgs),
    /// Print extraction and call graph statistics for an index
    Stats(stats::StatsArgs),
}

pub fn run(cmd: Command, quiet: bool) -> anyhow::Result<()> {
    match cmd {
        Command::Detect(args) => detect::run(&args, quiet),
        Command::Stats(args) => stats::run(&args),
    }
}

/// Input and analysis flags shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct AnalysisArgs {
    /// SCIP index to analyze (`.json` files are read as the JSON rendition)
    #[arg(long, default_value = "index.scip")]
    pub input_file: PathBuf,

    /// Configuration file (default: charter.toml next to the index, if present)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Reference policy: methods, any (overrides the configuration)
    #[arg(long)]
    pub policy: Option<ReferencePolicy>,

    /// Process documents on a single thread
    #[arg(long)]
    pub no_parallel: bool,
}

impl AnalysisArgs {
    /// Configuration from file, then command-line overrides.
    pub fn resolve_config(&self) -> anyhow::Result<CharterConfig> {
        let mut config = match &self.config {
            Some(path) => CharterConfig::load(path)
                .with_context(|| format!("Cannot load config: {}", path.display()))?,
            None => {
                let path = default_config_path(&self.input_file);
                CharterConfig::load_or_default(&path)
                    .with_context(|| format!("Cannot load config: {}", path.display()))?
            }
        };

        if let Some(policy) = self.policy {
            config.analysis.reference_policy = policy;
        }
        if self.no_parallel {
            config.analysis.parallel = false;
        }
        debug!(?config, "Resolved configuration");
        Ok(config)
    }

    pub fn load_index(&self) -> anyhow::Result<Index> {
        load::load_index(&self.input_file)
            .with_context(|| format!("Cannot read index: {}", self.input_file.display()))
    }
}

fn default_config_path(input: &Path) -> PathBuf {
    input
        .parent()
        .map_or_else(|| PathBuf::from(CONFIG_FILE_NAME), |dir| dir.join(CONFIG_FILE_NAME))
}

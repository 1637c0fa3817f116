use clap::Parser;

use charter_core::error::{CharterError, ConfigError, LoadError};

mod commands;

#[derive(Parser, Debug)]
#[command(
    name = "charter",
    version,
    about = "Detect static call graphs from SCIP code indices"
)]
struct Cli {
    #[command(subcommand)]
    command: commands::Command,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    quiet: bool,
}

/// Classify an error into a process exit code.
///
///   0: success
///   1: general/unknown error
///   2: configuration error
///   3: index not found or undecodable
///   4: call graph invariant violated
fn classify_exit_code(err: &anyhow::Error) -> i32 {
    for cause in err.chain() {
        if let Some(e) = cause.downcast_ref::<CharterError>() {
            return match e {
                CharterError::Config(_) => 2,
                CharterError::Load(_) => 3,
                CharterError::Graph(_) => 4,
            };
        }
        if cause.downcast_ref::<ConfigError>().is_some() {
            return 2;
        }
        if cause.downcast_ref::<LoadError>().is_some() {
            return 3;
        }
        if cause.downcast_ref::<charter_graphs::GraphError>().is_some() {
            return 4;
        }
    }

    let lower = format!("{err:#}").to_lowercase();
    if lower.contains("config") {
        2
    } else if lower.contains("index file not found") || lower.contains("cannot read index") {
        3
    } else {
        1
    }
}

fn main() {
    let cli = Cli::parse();

    let filter = match (cli.quiet, cli.verbose) {
        (true, _) => "error",
        (_, 0) => "warn",
        (_, 1) => "info",
        (_, 2) => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .init();

    match commands::run(cli.command, cli.quiet) {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(classify_exit_code(&e));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn exit_code_missing_index() {
        let err = anyhow::Error::new(LoadError::NotFound("index.scip".into()))
            .context("Cannot read index: index.scip");
        assert_eq!(classify_exit_code(&err), 3);
    }

    #[test]
    fn exit_code_config() {
        let err: anyhow::Result<()> = Err(ConfigError::Parse("expected `=`".into()))
            .context("Cannot load config: charter.toml");
        assert_eq!(classify_exit_code(&err.unwrap_err()), 2);
    }

    #[test]
    fn exit_code_invariant_violation() {
        let err = anyhow::Error::new(CharterError::Graph(
            charter_graphs::GraphError::DuplicateDefinition {
                symbol: "pkg/a().".into(),
                document: "b.go".into(),
            },
        ));
        assert_eq!(classify_exit_code(&err), 4);
    }

    #[test]
    fn exit_code_by_message() {
        let err = anyhow::anyhow!("Cannot parse config: bad toml");
        assert_eq!(classify_exit_code(&err), 2);
    }

    #[test]
    fn exit_code_general() {
        let err = anyhow::anyhow!("Something unexpected happened");
        assert_eq!(classify_exit_code(&err), 1);
    }
}

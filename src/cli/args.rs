//! CLI argument definitions using clap
//!
//! Commands:
//! - chartstep run --spec <path> --data <path> [--config <path>]
//! - chartstep check --spec <path> [--config <path>]
//! - chartstep apply --data <path> --op <json> [--config <path>]

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// chartstep - step-by-step interpreter for chart explanation operations
#[derive(Parser, Debug)]
#[command(name = "chartstep")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Execute every stage of an operation spec and print one JSON line per stage
    Run {
        /// Path to configuration file (defaults apply when omitted)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Path to the operation spec JSON
        #[arg(long)]
        spec: PathBuf,

        /// Path to the base dataset JSON
        #[arg(long)]
        data: PathBuf,

        /// Path to a JSON object of stage captions
        #[arg(long)]
        captions: Option<PathBuf>,

        /// Also print every adapter call after the stages
        #[arg(long)]
        transcript: bool,
    },

    /// Parse an operation spec and list its stages
    Check {
        /// Path to configuration file (defaults apply when omitted)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Path to the operation spec JSON
        #[arg(long)]
        spec: PathBuf,
    },

    /// Apply a single operation to the base dataset
    Apply {
        /// Path to configuration file (defaults apply when omitted)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Path to the base dataset JSON
        #[arg(long)]
        data: PathBuf,

        /// Operation as JSON text, e.g. '{"op":"count"}'
        #[arg(long)]
        op: String,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run() {
        let cli = Cli::try_parse_from([
            "chartstep", "run", "--spec", "ops.json", "--data", "data.json", "--transcript",
        ])
        .unwrap();
        match cli.command {
            Command::Run {
                spec,
                config,
                transcript,
                ..
            } => {
                assert_eq!(spec, PathBuf::from("ops.json"));
                assert!(config.is_none());
                assert!(transcript);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_apply_requires_op() {
        assert!(Cli::try_parse_from(["chartstep", "apply", "--data", "d.json"]).is_err());
    }
}

//! CLI module for chartstep
//!
//! Provides command-line interface for:
//! - run: Execute an operation spec stage by stage
//! - check: Parse a spec and list its stages
//! - apply: Apply one operation to a base dataset

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{apply, check, load_config, load_dataset, load_spec, run, run_command};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{read_file, read_json_file, write_line, write_response};

/// Parse arguments and run the selected command
pub fn execute() -> CliResult<()> {
    let cli = Cli::parse_args();
    run_command(cli.command)
}

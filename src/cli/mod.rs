//! CLI module for formtree
//!
//! Provides command-line interface for:
//! - compile: compile a schema document, report diagnostics
//! - inspect: dump the compiled node table
//! - check: validate a data document against a compiled schema

mod args;
mod commands;
mod errors;

pub use args::{Cli, Command};
pub use commands::{check, compile, inspect};
pub use errors::{CliError, CliResult};

/// Parse arguments and dispatch to the selected command.
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    match cli.command {
        Command::Compile { schema } => compile(&schema),
        Command::Inspect { schema } => inspect(&schema),
        Command::Check { schema, data } => check(&schema, &data),
    }
}

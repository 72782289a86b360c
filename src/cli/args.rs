//! CLI argument definitions using clap
//!
//! Commands:
//! - formtree compile <schema.json>
//! - formtree inspect <schema.json>
//! - formtree check <schema.json> <data.json>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// formtree - JSON-Schema compilation and reactive binding
#[derive(Parser, Debug)]
#[command(name = "formtree")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compile a schema document and report diagnostics
    Compile {
        /// Path to the schema document
        schema: PathBuf,
    },

    /// Compile a schema document and dump the node table
    Inspect {
        /// Path to the schema document
        schema: PathBuf,
    },

    /// Compile a schema, then validate a data document against it
    Check {
        /// Path to the schema document
        schema: PathBuf,
        /// Path to the data document
        data: PathBuf,
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
    fn test_parse_compile() {
        let cli = Cli::try_parse_from(["formtree", "compile", "schema.json"]).unwrap();
        assert!(matches!(cli.command, Command::Compile { .. }));
    }

    #[test]
    fn test_parse_check() {
        let cli = Cli::try_parse_from(["formtree", "check", "schema.json", "data.json"]).unwrap();
        match cli.command {
            Command::Check { schema, data } => {
                assert_eq!(schema, PathBuf::from("schema.json"));
                assert_eq!(data, PathBuf::from("data.json"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_missing_argument_rejected() {
        assert!(Cli::try_parse_from(["formtree", "check", "schema.json"]).is_err());
        assert!(Cli::try_parse_from(["formtree"]).is_err());
    }
}

//! CLI-specific error types
//!
//! Every CLI error terminates the process with a non-zero exit code.

use thiserror::Error;

use crate::compile::PipelineError;
use crate::schema::{BuildError, SourceError};
use crate::validate::CheckError;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// CLI errors
#[derive(Debug, Error)]
pub enum CliError {
    /// Schema document loading failed
    #[error(transparent)]
    Source(#[from] SourceError),

    /// The schema root cannot be a schema
    #[error(transparent)]
    Build(#[from] BuildError),

    /// Pipeline misconfiguration
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    /// Validator construction failed
    #[error(transparent)]
    Check(#[from] CheckError),

    /// A data document could not be loaded
    #[error("failed to load data document '{path}': {reason}")]
    Data {
        /// Offending path
        path: String,
        /// Underlying reason
        reason: String,
    },

    /// Compilation collected errors
    #[error("schema compiled with {count} error(s)")]
    SchemaErrors {
        /// Number of collected errors
        count: usize,
    },

    /// Instance validation found violations
    #[error("data document has {count} violation(s)")]
    DataInvalid {
        /// Number of violations
        count: usize,
    },
}

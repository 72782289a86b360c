//! Schema construction and document-source errors

use thiserror::Error;

/// Tree construction errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BuildError {
    /// The document root is not a schema
    #[error("schema root must be an object or boolean schema, got {found}")]
    InvalidRoot {
        /// JSON type of the rejected root
        found: String,
    },
}

/// Schema document loading errors
#[derive(Debug, Error)]
pub enum SourceError {
    /// Filesystem failure
    #[error("failed to read '{path}': {reason}")]
    Io {
        /// Offending path
        path: String,
        /// Underlying reason
        reason: String,
    },

    /// The file is not valid JSON
    #[error("invalid JSON in '{path}': {reason}")]
    Parse {
        /// Offending path
        path: String,
        /// Parser message
        reason: String,
    },

    /// The parsed value cannot be a schema document
    #[error("'{path}' is not a schema document: {reason}")]
    InvalidDocument {
        /// Offending path
        path: String,
        /// What was wrong
        reason: String,
    },
}

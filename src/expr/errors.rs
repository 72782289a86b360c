//! Expression errors
//!
//! A parse error is fatal to the keyword being compiled (the slot falls
//! back to its default program). An evaluation error is caught per call
//! by the owning node's accessor and replaced with a neutral fallback.

use thiserror::Error;

/// Result type for expression operations
pub type ExprResult<T> = Result<T, ExprError>;

/// Expression compile/evaluation errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExprError {
    /// Malformed expression source
    #[error("parse error at offset {offset}: {message}")]
    Parse {
        /// Byte offset into the source text
        offset: usize,
        /// What went wrong
        message: String,
    },

    /// Runtime failure during evaluation
    #[error("evaluation error: {0}")]
    Eval(String),
}

impl ExprError {
    /// Create a parse error
    pub fn parse(offset: usize, message: impl Into<String>) -> Self {
        ExprError::Parse {
            offset,
            message: message.into(),
        }
    }

    /// Create an evaluation error
    pub fn eval(message: impl Into<String>) -> Self {
        ExprError::Eval(message.into())
    }
}

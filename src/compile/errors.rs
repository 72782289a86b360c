//! Compilation error types
//!
//! A [`PipelineError`] is fatal at pipeline construction. A
//! [`CompileError`] is collected per run and never blocks sibling steps
//! or nodes.

use thiserror::Error;

/// Pipeline configuration errors, detected once at construction
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PipelineError {
    /// Step `after` declarations form a cycle within a phase
    #[error("cyclic step dependency among: {names}")]
    CyclicSteps {
        /// The step names involved
        names: String,
    },
}

/// One failed step application, recorded with its node pointer
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{pointer} [{step}]: {message}")]
pub struct CompileError {
    /// Schema pointer of the node the step was applied to
    pub pointer: String,
    /// The step that failed
    pub step: String,
    /// What went wrong
    pub message: String,
}

impl CompileError {
    /// Create a compile error
    pub fn new(
        pointer: impl Into<String>,
        step: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            pointer: pointer.into(),
            step: step.into(),
            message: message.into(),
        }
    }
}

//! Observability subsystem for formtree
//!
//! Provides:
//! - Structured logging (JSON)
//! - Collected compilation diagnostics
//!
//! # Principles
//!
//! 1. Observability is read-only
//! 2. No side effects on compilation or evaluation
//! 3. No async or background threads
//! 4. Deterministic output

mod logger;

pub use logger::{Logger, Severity};

use std::fmt;

/// A collected diagnostic from compilation or evaluation.
///
/// Diagnostics mirror what the logger emits, so embedders that cannot
/// scrape process output still see every warning and error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Severity of the event
    pub severity: Severity,
    /// Schema pointer of the node the event belongs to
    pub pointer: String,
    /// Step name or keyword that produced the event
    pub origin: String,
    /// Human-readable message
    pub message: String,
}

impl Diagnostic {
    /// Create a warning diagnostic
    pub fn warning(
        pointer: impl Into<String>,
        origin: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity: Severity::Warn,
            pointer: pointer.into(),
            origin: origin.into(),
            message: message.into(),
        }
    }

    /// Create an error diagnostic
    pub fn error(
        pointer: impl Into<String>,
        origin: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity: Severity::Error,
            pointer: pointer.into(),
            origin: origin.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} ({}): {}",
            self.severity, self.pointer, self.origin, self.message
        )
    }
}

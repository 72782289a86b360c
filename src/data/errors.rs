//! Data write errors
//!
//! Only a rejected write is an error; everything the propagator can
//! repair (missing intermediate containers) is repaired instead.

use thiserror::Error;

/// A rejected pointer-addressed write
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WriteError {
    /// The target is the document root itself
    #[error("cannot write at the document root")]
    RootWrite,

    /// The pointer is not absolute
    #[error("write pointer '{0}' is not absolute")]
    NotAbsolute(String),

    /// The pointer depth disagrees with the schema ancestry
    #[error("pointer depth {actual} disagrees with schema depth {expected}")]
    DepthMismatch {
        /// Depth implied by the supplied schema node
        expected: usize,
        /// Segment count of the write pointer
        actual: usize,
    },

    /// A present, non-container value blocks the descent
    #[error("cannot descend through non-container value at '{0}'")]
    NotAContainer(String),

    /// An array step whose segment is not an index
    #[error("segment at '{pointer}' does not index an array")]
    InvalidIndex {
        /// Pointer of the offending segment
        pointer: String,
    },
}

//! Live data binding and propagation
//!
//! The data walker attaches tree-position metadata to a live document
//! through an out-of-band side table; the update propagator performs
//! pointer-addressed writes with cascading materialization and
//! dependent-refresh scheduling.

mod errors;
mod propagate;
mod walker;

pub use errors::WriteError;
pub use propagate::Propagator;
pub use walker::{DataMeta, DataTree};

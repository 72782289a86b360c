//! Compilation step contract
//!
//! A step is a named unit of work producing one node property. It
//! belongs to a phase, may declare steps it must follow within that
//! phase, and exposes an `appliable` guard that doubles as the
//! idempotency check (typically "property not already present").

use crate::observability::Diagnostic;
use crate::schema::{NodeId, SchemaTree};
use crate::tracker::TrackerTable;

/// The ordered stages of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    /// Legacy keyword-spelling rewrites
    Upgrade,
    /// Classification (type inference and derived flags)
    Pre,
    /// Expression compilation
    Post,
}

impl Phase {
    /// All phases in execution order
    pub const ALL: [Phase; 3] = [Phase::Upgrade, Phase::Pre, Phase::Post];

    /// Phase name
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Upgrade => "upgrade",
            Phase::Pre => "pre",
            Phase::Post => "post",
        }
    }
}

/// Mutable state a step applies against.
pub struct StepContext<'a> {
    /// The tree under compilation
    pub tree: &'a mut SchemaTree,
    /// The compiler-owned tracker table
    pub trackers: &'a mut TrackerTable,
    /// Collected non-fatal warnings
    pub warnings: &'a mut Vec<Diagnostic>,
}

/// A named unit of compilation work.
pub trait CompilationStep {
    /// The property this step produces
    fn name(&self) -> &'static str;

    /// The phase this step runs in
    fn phase(&self) -> Phase;

    /// Step names this one must follow within its phase
    fn after(&self) -> &'static [&'static str] {
        &[]
    }

    /// Whether `apply` should run for this node. Serves as the
    /// idempotency guard.
    fn appliable(&self, tree: &SchemaTree, id: NodeId) -> bool;

    /// Apply the step to one node. An error is recorded against the
    /// node and step, and blocks nothing else.
    fn apply(&self, cx: &mut StepContext<'_>, id: NodeId) -> Result<(), String>;
}

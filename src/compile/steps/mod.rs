//! The standard step roster
//!
//! Upgrade phase: legacy keyword rewrites. Pre phase: type inference
//! and classification flags. Post phase: expression compilation.

mod classify;
mod expressions;
mod upgrade;

pub use classify::{BasetypeStep, EnumArrayStep, EnumStep, HomogeneousStep, NullAllowedStep};
pub use expressions::ExpressionStep;
pub use upgrade::{
    AdditionalPropertiesStep, DependenciesStep, IdAnchorStep, NullableStep, TupleItemsStep,
};

use super::step::CompilationStep;

/// Every standard step, in registration (not execution) order; the
/// pipeline's topological sort fixes execution order per phase.
pub fn standard_steps() -> Vec<Box<dyn CompilationStep>> {
    let mut steps: Vec<Box<dyn CompilationStep>> = vec![
        Box::new(NullableStep),
        Box::new(IdAnchorStep),
        Box::new(DependenciesStep),
        Box::new(TupleItemsStep),
        Box::new(AdditionalPropertiesStep),
        Box::new(HomogeneousStep),
        Box::new(EnumArrayStep),
        Box::new(EnumStep),
        Box::new(NullAllowedStep),
        Box::new(BasetypeStep),
    ];
    for step in ExpressionStep::roster() {
        steps.push(Box::new(step));
    }
    steps
}

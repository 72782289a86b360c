//! Phase-ordered step execution
//!
//! Phases run `upgrade → pre → post`. Within each phase the schema
//! tree is walked depth-first; at each node every step of the phase is
//! offered the node. Step order inside a phase is fixed once, at
//! pipeline construction, by a DFS topological sort over the declared
//! `after` edges; a cycle is a fatal configuration error.

use super::errors::{CompileError, PipelineError};
use super::step::{CompilationStep, Phase, StepContext};
use crate::observability::{Diagnostic, Logger};
use crate::schema::SchemaTree;
use crate::tracker::TrackerTable;

/// The configured pipeline: steps sorted per phase.
pub struct Pipeline {
    phases: Vec<Vec<Box<dyn CompilationStep>>>,
}

impl Pipeline {
    /// The standard pipeline.
    pub fn standard() -> Result<Pipeline, PipelineError> {
        Pipeline::new(super::steps::standard_steps())
    }

    /// Build a pipeline from an arbitrary step set.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::CyclicSteps`] when `after` declarations
    /// form a cycle within a phase.
    pub fn new(steps: Vec<Box<dyn CompilationStep>>) -> Result<Pipeline, PipelineError> {
        let mut buckets: Vec<Vec<Box<dyn CompilationStep>>> =
            Phase::ALL.iter().map(|_| Vec::new()).collect();
        for step in steps {
            let slot = Phase::ALL
                .iter()
                .position(|p| *p == step.phase())
                .unwrap_or(0);
            buckets[slot].push(step);
        }

        let mut phases = Vec::with_capacity(buckets.len());
        for bucket in buckets {
            phases.push(topological_sort(bucket)?);
        }
        Ok(Pipeline { phases })
    }

    /// Number of configured steps.
    pub fn step_count(&self) -> usize {
        self.phases.iter().map(Vec::len).sum()
    }

    /// Run every phase over the whole tree, collecting per-step errors.
    ///
    /// An error from one step application never blocks sibling steps or
    /// nodes.
    pub fn run(
        &self,
        tree: &mut SchemaTree,
        trackers: &mut TrackerTable,
        warnings: &mut Vec<Diagnostic>,
    ) -> Vec<CompileError> {
        let mut errors = Vec::new();
        let order = tree.walk_order();

        for (phase, steps) in Phase::ALL.iter().zip(&self.phases) {
            for &id in &order {
                for step in steps {
                    if !step.appliable(tree, id) {
                        continue;
                    }
                    let mut cx = StepContext {
                        tree: &mut *tree,
                        trackers: &mut *trackers,
                        warnings: &mut *warnings,
                    };
                    if let Err(message) = step.apply(&mut cx, id) {
                        let pointer = tree.node(id).pointer().to_string();
                        errors.push(CompileError::new(pointer, step.name(), message));
                    }
                }
            }
            Logger::trace("COMPILE_PHASE_COMPLETE", &[("phase", phase.as_str())]);
        }

        errors
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    OnStack,
    Done,
}

/// DFS topological sort with a recursion-stack cycle check. Steps with
/// no ordering constraints keep their registration order relative to
/// each other.
fn topological_sort(
    steps: Vec<Box<dyn CompilationStep>>,
) -> Result<Vec<Box<dyn CompilationStep>>, PipelineError> {
    let names: Vec<&'static str> = steps.iter().map(|s| s.name()).collect();
    let mut marks = vec![Mark::Unvisited; steps.len()];
    let mut order: Vec<usize> = Vec::with_capacity(steps.len());

    fn visit(
        index: usize,
        steps: &[Box<dyn CompilationStep>],
        names: &[&'static str],
        marks: &mut [Mark],
        order: &mut Vec<usize>,
    ) -> Result<(), PipelineError> {
        marks[index] = Mark::OnStack;
        for dependency in steps[index].after() {
            // A dependency outside this phase imposes no ordering here
            let Some(dep_index) = names.iter().position(|n| n == dependency) else {
                continue;
            };
            match marks[dep_index] {
                Mark::OnStack => {
                    return Err(PipelineError::CyclicSteps {
                        names: format!("{} -> {}", names[index], names[dep_index]),
                    });
                }
                Mark::Unvisited => visit(dep_index, steps, names, marks, order)?,
                Mark::Done => {}
            }
        }
        marks[index] = Mark::Done;
        order.push(index);
        Ok(())
    }

    for index in 0..steps.len() {
        if marks[index] == Mark::Unvisited {
            visit(index, &steps, &names, &mut marks, &mut order)?;
        }
    }

    let mut slots: Vec<Option<Box<dyn CompilationStep>>> = steps.into_iter().map(Some).collect();
    Ok(order
        .into_iter()
        .filter_map(|index| slots[index].take())
        .collect())
}

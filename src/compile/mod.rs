//! Compilation pipeline subsystem
//!
//! [`Compiler`] owns the configured pipeline and the one-shot tracker
//! table of each run. Compilation always runs to completion: structural
//! problems abort only the step application that hit them, and the
//! result carries the collected errors and warnings alongside the tree.

mod errors;
mod pipeline;
mod step;
pub mod steps;

pub use errors::{CompileError, PipelineError};
pub use pipeline::Pipeline;
pub use step::{CompilationStep, Phase, StepContext};

use serde_json::Value;

use crate::observability::{Diagnostic, Logger};
use crate::schema::{build_tree, BuildError, Dialect, SchemaTree};
use crate::tracker::TrackerTable;

/// Compiler configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompilerConfig {
    /// Force a dialect instead of auto-detecting from `$schema`
    pub dialect: Option<Dialect>,
}

/// The outcome of one compilation run.
#[derive(Debug)]
pub struct Compiled {
    /// The compiled tree (usable even when errors were collected)
    pub tree: SchemaTree,
    /// The dialect the document was compiled under
    pub dialect: Dialect,
    /// Collected step errors, none of which aborted the run
    pub errors: Vec<CompileError>,
    /// Collected warnings (pruned tracker edges, unresolved references)
    pub warnings: Vec<Diagnostic>,
}

impl Compiled {
    /// Whether compilation finished without collecting any error.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Compiles raw schema documents into annotated trees.
pub struct Compiler {
    config: CompilerConfig,
    pipeline: Pipeline,
}

impl Compiler {
    /// A compiler with the standard pipeline and default configuration.
    pub fn new() -> Result<Self, PipelineError> {
        Self::with_config(CompilerConfig::default())
    }

    /// A compiler with the standard pipeline and explicit configuration.
    pub fn with_config(config: CompilerConfig) -> Result<Self, PipelineError> {
        Ok(Self {
            config,
            pipeline: Pipeline::standard()?,
        })
    }

    /// A compiler with a custom step set.
    pub fn with_steps(
        config: CompilerConfig,
        steps: Vec<Box<dyn CompilationStep>>,
    ) -> Result<Self, PipelineError> {
        Ok(Self {
            config,
            pipeline: Pipeline::new(steps)?,
        })
    }

    /// Compile one raw schema document.
    ///
    /// The tracker table lives and dies inside this call: it is built
    /// while expressions compile, cycle-broken once the whole tree has
    /// compiled, and discarded before returning. Two compilations share
    /// no mutable state.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError`] only when the document root cannot be a
    /// schema; everything else is collected in the result.
    pub fn compile(&self, document: &Value) -> Result<Compiled, BuildError> {
        let dialect = self
            .config
            .dialect
            .unwrap_or_else(|| Dialect::detect(document));

        let mut tree = build_tree(document)?;
        let mut trackers = TrackerTable::new();
        let mut warnings = Vec::new();

        let errors = self.pipeline.run(&mut tree, &mut trackers, &mut warnings);
        warnings.extend(trackers.break_cycles(&mut tree));

        Logger::info(
            "COMPILE_COMPLETE",
            &[
                ("errors", &errors.len().to_string()),
                ("nodes", &tree.len().to_string()),
                ("warnings", &warnings.len().to_string()),
            ],
        );

        Ok(Compiled {
            tree,
            dialect,
            errors,
            warnings,
        })
    }
}

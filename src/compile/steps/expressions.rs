//! Post-phase steps: dynamic-expression compilation
//!
//! One step per expression keyword, each producing that keyword's
//! compiled slot. While a source string compiles, its pointer
//! back-references are scanned and registered with the dependency
//! tracker; unresolvable references are logged and skipped without
//! aborting the rest of the node.
//!
//! A malformed source is fatal for that keyword only: the slot falls
//! back to the keyword-specific default program and the error is
//! collected, so the remainder of the tree stays usable.

use serde_json::Value;

use super::super::step::{CompilationStep, Phase, StepContext};
use crate::expr::{CompiledExpr, Family};
use crate::observability::{Diagnostic, Logger};
use crate::schema::{NodeId, SchemaTree};

/// The expression keyword roster: keyword, family, and the default the
/// slot falls back to when the source is malformed.
const KEYWORDS: &[(&str, Family)] = &[
    ("visible", Family::Predicate),
    ("readonly", Family::Predicate),
    ("requiredIf", Family::Predicate),
    ("filter", Family::Predicate),
    ("case", Family::Predicate),
    ("rank", Family::Value),
    ("dynamic", Family::Value),
    ("initialize", Family::Value),
    ("change", Family::Value),
    ("from", Family::Value),
    ("abstract", Family::Template),
];

/// The default program a keyword slot falls back to.
fn default_program(keyword: &str) -> CompiledExpr {
    match keyword {
        "visible" | "filter" | "case" => CompiledExpr::constant(Value::Bool(true)),
        "readonly" | "requiredIf" => CompiledExpr::constant(Value::Bool(false)),
        "abstract" => CompiledExpr::constant(Value::String(String::new())),
        _ => CompiledExpr::constant(Value::Null),
    }
}

/// Compiles one expression keyword into its node slot.
pub struct ExpressionStep {
    keyword: &'static str,
    family: Family,
}

impl ExpressionStep {
    /// One step per keyword in the roster.
    pub fn roster() -> Vec<ExpressionStep> {
        KEYWORDS
            .iter()
            .map(|&(keyword, family)| ExpressionStep { keyword, family })
            .collect()
    }
}

impl CompilationStep for ExpressionStep {
    fn name(&self) -> &'static str {
        self.keyword
    }

    fn phase(&self) -> Phase {
        Phase::Post
    }

    fn appliable(&self, tree: &SchemaTree, id: NodeId) -> bool {
        let node = tree.node(id);
        node.raw().contains_key(self.keyword) && node.exprs.slot(self.keyword).is_none()
    }

    fn apply(&self, cx: &mut StepContext<'_>, id: NodeId) -> Result<(), String> {
        let raw_value = cx
            .tree
            .node(id)
            .raw()
            .get(self.keyword)
            .cloned()
            .unwrap_or(Value::Null);

        if let Some(source) = raw_value.as_str() {
            register_references(cx, id, self.keyword, source);
        }

        match CompiledExpr::compile(self.family, &raw_value) {
            Ok(compiled) => {
                cx.tree.node_mut(id).exprs.set_slot(self.keyword, compiled);
                Ok(())
            }
            Err(err) => {
                cx.tree
                    .node_mut(id)
                    .exprs
                    .set_slot(self.keyword, default_program(self.keyword));
                Err(err.to_string())
            }
        }
    }
}

/// Register each pointer back-reference of an expression source with
/// the dependency tracker: the target node learns it must notify the
/// owning node on change.
fn register_references(cx: &mut StepContext<'_>, owner: NodeId, keyword: &str, source: &str) {
    let owner_pointer = cx.tree.node(owner).pointer().to_string();

    for token in crate::expr::pointer_refs(source) {
        match cx.tree.resolve_schema_at(owner, &token) {
            Some(target) if target != owner => {
                let target_pointer = cx.tree.node(target).pointer().to_string();
                cx.tree.node_mut(target).add_tracker(owner_pointer.clone());
                cx.trackers.add_edge(&target_pointer, &owner_pointer);
            }
            // A node's own change already refreshes it
            Some(_) => {}
            None => {
                Logger::warn(
                    "TRACKER_REF_UNRESOLVED",
                    &[
                        ("keyword", keyword),
                        ("pointer", &owner_pointer),
                        ("reference", &token),
                    ],
                );
                cx.warnings.push(Diagnostic::warning(
                    owner_pointer.clone(),
                    keyword,
                    format!("unresolved reference '{}'", token),
                ));
            }
        }
    }
}

//! Upgrade-phase steps: legacy keyword-spelling rewrites
//!
//! These are pure structural rewrites of the node's keyword map. They
//! precede type inference, so inference only ever sees the modern
//! spellings. Child links were fixed at build time and are unaffected.

use serde_json::{Map, Value};

use super::super::step::{CompilationStep, Phase, StepContext};
use crate::schema::{NodeId, SchemaTree};

/// `nullable: true` → type union with null, recorded as `_nullable`.
pub struct NullableStep;

impl CompilationStep for NullableStep {
    fn name(&self) -> &'static str {
        "_nullable"
    }

    fn phase(&self) -> Phase {
        Phase::Upgrade
    }

    fn appliable(&self, tree: &SchemaTree, id: NodeId) -> bool {
        let raw = tree.node(id).raw();
        raw.contains_key("nullable") && !raw.contains_key("_nullable")
    }

    fn apply(&self, cx: &mut StepContext<'_>, id: NodeId) -> Result<(), String> {
        let raw = &mut cx.tree.node_mut(id).raw;
        let nullable = raw
            .remove("nullable")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        if !nullable {
            return Ok(());
        }
        raw.insert("_nullable".to_string(), Value::Bool(true));
        let rewritten = match raw.get("type") {
            Some(Value::String(name)) => Some(Value::Array(vec![
                Value::String(name.clone()),
                Value::String("null".into()),
            ])),
            Some(Value::Array(names)) if !names.iter().any(|n| n.as_str() == Some("null")) => {
                let mut names = names.clone();
                names.push(Value::String("null".into()));
                Some(Value::Array(names))
            }
            _ => None,
        };
        if let Some(union) = rewritten {
            raw.insert("type".to_string(), union);
        }
        Ok(())
    }
}

/// Compound `$id` (`base#anchor`) → `$id` base plus `$anchor`.
pub struct IdAnchorStep;

impl CompilationStep for IdAnchorStep {
    fn name(&self) -> &'static str {
        "$anchor"
    }

    fn phase(&self) -> Phase {
        Phase::Upgrade
    }

    fn appliable(&self, tree: &SchemaTree, id: NodeId) -> bool {
        let raw = tree.node(id).raw();
        if raw.contains_key("$anchor") {
            return false;
        }
        raw.get("$id")
            .and_then(Value::as_str)
            .is_some_and(|s| s.find('#').is_some_and(|at| at + 1 < s.len()))
    }

    fn apply(&self, cx: &mut StepContext<'_>, id: NodeId) -> Result<(), String> {
        let raw = &mut cx.tree.node_mut(id).raw;
        let compound = raw
            .get("$id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| "missing $id".to_string())?;
        let (base, anchor) = compound
            .split_once('#')
            .ok_or_else(|| "missing fragment".to_string())?;
        raw.insert("$anchor".to_string(), Value::String(anchor.to_string()));
        if base.is_empty() {
            raw.remove("$id");
        } else {
            raw.insert("$id".to_string(), Value::String(base.to_string()));
        }
        Ok(())
    }
}

/// `dependencies` → `dependentRequired` / `dependentSchemas`.
pub struct DependenciesStep;

impl CompilationStep for DependenciesStep {
    fn name(&self) -> &'static str {
        "dependentRequired"
    }

    fn phase(&self) -> Phase {
        Phase::Upgrade
    }

    fn appliable(&self, tree: &SchemaTree, id: NodeId) -> bool {
        tree.node(id).raw().contains_key("dependencies")
    }

    fn apply(&self, cx: &mut StepContext<'_>, id: NodeId) -> Result<(), String> {
        let raw = &mut cx.tree.node_mut(id).raw;
        let Some(Value::Object(entries)) = raw.remove("dependencies") else {
            return Err("'dependencies' must be an object".to_string());
        };
        let mut required = Map::new();
        let mut schemas = Map::new();
        for (name, dependency) in entries {
            match dependency {
                Value::Array(_) => {
                    required.insert(name, dependency);
                }
                Value::Object(_) | Value::Bool(_) => {
                    schemas.insert(name, dependency);
                }
                other => {
                    return Err(format!(
                        "'dependencies/{}' must be an array or schema, got {}",
                        name,
                        json_type(&other)
                    ));
                }
            }
        }
        if !required.is_empty() {
            raw.insert("dependentRequired".to_string(), Value::Object(required));
        }
        if !schemas.is_empty() {
            raw.insert("dependentSchemas".to_string(), Value::Object(schemas));
        }
        Ok(())
    }
}

/// Tuple-form `items` → `prefixItems`.
pub struct TupleItemsStep;

impl CompilationStep for TupleItemsStep {
    fn name(&self) -> &'static str {
        "prefixItems"
    }

    fn phase(&self) -> Phase {
        Phase::Upgrade
    }

    fn appliable(&self, tree: &SchemaTree, id: NodeId) -> bool {
        let raw = tree.node(id).raw();
        matches!(raw.get("items"), Some(Value::Array(_))) && !raw.contains_key("prefixItems")
    }

    fn apply(&self, cx: &mut StepContext<'_>, id: NodeId) -> Result<(), String> {
        let raw = &mut cx.tree.node_mut(id).raw;
        let tuple = raw.remove("items").ok_or_else(|| "missing items".to_string())?;
        raw.insert("prefixItems".to_string(), tuple);
        Ok(())
    }
}

/// `additionalProperties: false` → `unevaluatedProperties: false`.
pub struct AdditionalPropertiesStep;

impl CompilationStep for AdditionalPropertiesStep {
    fn name(&self) -> &'static str {
        "unevaluatedProperties"
    }

    fn phase(&self) -> Phase {
        Phase::Upgrade
    }

    fn appliable(&self, tree: &SchemaTree, id: NodeId) -> bool {
        let raw = tree.node(id).raw();
        raw.get("additionalProperties") == Some(&Value::Bool(false))
            && !raw.contains_key("unevaluatedProperties")
    }

    fn apply(&self, cx: &mut StepContext<'_>, id: NodeId) -> Result<(), String> {
        let raw = &mut cx.tree.node_mut(id).raw;
        raw.remove("additionalProperties");
        raw.insert("unevaluatedProperties".to_string(), Value::Bool(false));
        Ok(())
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

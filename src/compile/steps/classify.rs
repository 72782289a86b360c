//! Pre-phase steps: type inference and derived classification flags
//!
//! `basetype` and `nullAllowed` are fixed exactly once per node; the
//! `appliable` guards make a second application impossible. The flag
//! steps (`isenum`, `isenumarray`, `homogeneous`) read only the raw
//! keyword maps, so parent nodes never depend on a child's compiled
//! state.

use serde_json::{Map, Value};

use super::super::step::{CompilationStep, Phase, StepContext};
use crate::infer;
use crate::infer::Basetype;
use crate::schema::{Items, NodeId, SchemaTree};

/// Infer and fix the node's `basetype`.
pub struct BasetypeStep;

impl CompilationStep for BasetypeStep {
    fn name(&self) -> &'static str {
        "basetype"
    }

    fn phase(&self) -> Phase {
        Phase::Pre
    }

    fn appliable(&self, tree: &SchemaTree, id: NodeId) -> bool {
        tree.node(id).basetype.is_none()
    }

    fn apply(&self, cx: &mut StepContext<'_>, id: NodeId) -> Result<(), String> {
        let result = infer::infer(&cx.tree.node(id).raw);
        let node = cx.tree.node_mut(id);
        match result {
            Ok((basetype, _)) => {
                node.basetype = Some(basetype);
                Ok(())
            }
            Err(err) => {
                // Most permissive single type keeps the node usable
                node.basetype = Some(Basetype::String);
                Err(err.to_string())
            }
        }
    }
}

/// Fix the node's `nullAllowed` from the inferred set.
pub struct NullAllowedStep;

impl CompilationStep for NullAllowedStep {
    fn name(&self) -> &'static str {
        "nullAllowed"
    }

    fn phase(&self) -> Phase {
        Phase::Pre
    }

    fn after(&self) -> &'static [&'static str] {
        &["basetype"]
    }

    fn appliable(&self, tree: &SchemaTree, id: NodeId) -> bool {
        tree.node(id).null_allowed.is_none()
    }

    fn apply(&self, cx: &mut StepContext<'_>, id: NodeId) -> Result<(), String> {
        let raw = &cx.tree.node(id).raw;
        let combined = infer::infer_set(raw);
        let null_allowed = combined.contains(Basetype::Null)
            || raw.get("_nullable") == Some(&Value::Bool(true));
        cx.tree.node_mut(id).null_allowed = Some(null_allowed);
        Ok(())
    }
}

/// Whether a keyword map describes an enumeration: `enum`, `const`, or
/// a `oneOf` whose every branch carries `const`.
fn is_enum_map(raw: &Map<String, Value>) -> bool {
    if raw.contains_key("enum") || raw.contains_key("const") {
        return true;
    }
    match raw.get("oneOf") {
        Some(Value::Array(branches)) if !branches.is_empty() => branches
            .iter()
            .all(|b| b.as_object().is_some_and(|m| m.contains_key("const"))),
        _ => false,
    }
}

/// Mark enumeration nodes.
pub struct EnumStep;

impl CompilationStep for EnumStep {
    fn name(&self) -> &'static str {
        "isenum"
    }

    fn phase(&self) -> Phase {
        Phase::Pre
    }

    fn after(&self) -> &'static [&'static str] {
        &["basetype"]
    }

    fn appliable(&self, tree: &SchemaTree, id: NodeId) -> bool {
        let node = tree.node(id);
        !node.isenum && is_enum_map(&node.raw)
    }

    fn apply(&self, cx: &mut StepContext<'_>, id: NodeId) -> Result<(), String> {
        cx.tree.node_mut(id).isenum = true;
        Ok(())
    }
}

/// Mark arrays whose single item schema is an enumeration.
pub struct EnumArrayStep;

impl CompilationStep for EnumArrayStep {
    fn name(&self) -> &'static str {
        "isenumarray"
    }

    fn phase(&self) -> Phase {
        Phase::Pre
    }

    fn after(&self) -> &'static [&'static str] {
        &["basetype", "isenum"]
    }

    fn appliable(&self, tree: &SchemaTree, id: NodeId) -> bool {
        let node = tree.node(id);
        if node.isenumarray || node.basetype() != Basetype::Array {
            return false;
        }
        match node.items {
            Items::Single(item) => is_enum_map(&tree.node(item).raw),
            _ => false,
        }
    }

    fn apply(&self, cx: &mut StepContext<'_>, id: NodeId) -> Result<(), String> {
        cx.tree.node_mut(id).isenumarray = true;
        Ok(())
    }
}

/// Mark arrays whose elements all share one concrete item schema (the
/// item schema is not a `oneOf` list).
pub struct HomogeneousStep;

impl CompilationStep for HomogeneousStep {
    fn name(&self) -> &'static str {
        "homogeneous"
    }

    fn phase(&self) -> Phase {
        Phase::Pre
    }

    fn after(&self) -> &'static [&'static str] {
        &["basetype"]
    }

    fn appliable(&self, tree: &SchemaTree, id: NodeId) -> bool {
        let node = tree.node(id);
        if node.homogeneous || node.basetype() != Basetype::Array {
            return false;
        }
        match node.items {
            Items::Single(item) => tree.node(item).one_of.is_empty(),
            _ => false,
        }
    }

    fn apply(&self, cx: &mut StepContext<'_>, id: NodeId) -> Result<(), String> {
        cx.tree.node_mut(id).homogeneous = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::Compiler;
    use serde_json::json;

    fn compile(document: Value) -> crate::compile::Compiled {
        Compiler::new().unwrap().compile(&document).unwrap()
    }

    #[test]
    fn test_basetype_and_null_allowed() {
        let compiled = compile(json!({
            "type": "object",
            "properties": {
                "name": {"type": ["string", "null"]},
                "age": {"type": "integer"}
            }
        }));
        assert!(compiled.errors.is_empty());

        let tree = &compiled.tree;
        let name = tree.node(tree.find("/name").unwrap());
        assert_eq!(name.basetype(), Basetype::String);
        assert!(name.null_allowed());

        let age = tree.node(tree.find("/age").unwrap());
        assert_eq!(age.basetype(), Basetype::Integer);
        assert!(!age.null_allowed());
    }

    #[test]
    fn test_inference_error_collected_not_fatal() {
        let compiled = compile(json!({
            "type": "object",
            "properties": {
                "bad": {"type": ["string", "number"]},
                "good": {"type": "boolean"}
            }
        }));
        assert_eq!(compiled.errors.len(), 1);
        assert_eq!(compiled.errors[0].pointer, "/bad");
        assert_eq!(compiled.errors[0].step, "basetype");

        // The sibling still classified
        let tree = &compiled.tree;
        let good = tree.node(tree.find("/good").unwrap());
        assert_eq!(good.basetype(), Basetype::Boolean);
        // The failing node fell back to string
        let bad = tree.node(tree.find("/bad").unwrap());
        assert_eq!(bad.basetype(), Basetype::String);
    }

    #[test]
    fn test_isenum_variants() {
        let compiled = compile(json!({
            "type": "object",
            "properties": {
                "color": {"type": "string", "enum": ["red", "green"]},
                "fixed": {"const": 42},
                "titled": {"oneOf": [
                    {"const": "a", "title": "A"},
                    {"const": "b", "title": "B"}
                ]},
                "plain": {"type": "string"}
            }
        }));
        let tree = &compiled.tree;
        assert!(tree.node(tree.find("/color").unwrap()).isenum());
        assert!(tree.node(tree.find("/fixed").unwrap()).isenum());
        assert!(tree.node(tree.find("/titled").unwrap()).isenum());
        assert!(!tree.node(tree.find("/plain").unwrap()).isenum());
    }

    #[test]
    fn test_isenumarray() {
        let compiled = compile(json!({
            "type": "object",
            "properties": {
                "tags": {"type": "array", "items": {"type": "string", "enum": ["a", "b"]}},
                "names": {"type": "array", "items": {"type": "string"}}
            }
        }));
        let tree = &compiled.tree;
        assert!(tree.node(tree.find("/tags").unwrap()).isenumarray());
        assert!(!tree.node(tree.find("/names").unwrap()).isenumarray());
    }

    #[test]
    fn test_homogeneous() {
        let compiled = compile(json!({
            "type": "object",
            "properties": {
                "plain": {"type": "array", "items": {"type": "number"}},
                "mixed": {"type": "array", "items": {"oneOf": [
                    {"type": "object", "properties": {"kind": {"const": "a"}}},
                    {"type": "object", "properties": {"kind": {"const": "b"}}}
                ]}}
            }
        }));
        let tree = &compiled.tree;
        assert!(tree.node(tree.find("/plain").unwrap()).homogeneous());
        assert!(!tree.node(tree.find("/mixed").unwrap()).homogeneous());
    }
}

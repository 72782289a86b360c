//! Update propagator: pointer-addressed writes with cascading
//! materialization and dependent-refresh scheduling
//!
//! Writing at an absolute pointer whose intermediate containers are
//! missing succeeds by materializing each absent/null container as an
//! empty object or array per its governing schema, tagging it in the
//! side table, and assigning the terminal value last. Every touched
//! pointer with a registered consumer is scheduled for refresh, and the
//! written node's `trackers` are signaled.

use std::collections::BTreeSet;

use serde_json::{json, Value};

use super::errors::WriteError;
use super::walker::DataTree;
use crate::infer::Basetype;
use crate::pointer;
use crate::schema::{NodeId, SchemaTree};

/// Schedules refreshes for pointer-addressed writes.
#[derive(Debug, Clone, Default)]
pub struct Propagator {
    consumers: BTreeSet<String>,
}

impl Propagator {
    /// A propagator with no registered consumers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a consumer at an exact pointer.
    pub fn register_consumer(&mut self, pointer: impl Into<String>) {
        self.consumers.insert(pointer.into());
    }

    /// Remove a consumer.
    pub fn unregister_consumer(&mut self, pointer: &str) {
        self.consumers.remove(pointer);
    }

    /// Number of registered consumers.
    pub fn consumer_count(&self) -> usize {
        self.consumers.len()
    }

    /// Write `value` at `pointer`, cascading creation of missing
    /// intermediate containers.
    ///
    /// Returns the refresh set: every touched pointer with a registered
    /// consumer, plus the written node's `trackers`.
    ///
    /// # Errors
    ///
    /// Rejected when the target is the document root, the pointer is
    /// not absolute, the segment count disagrees with the supplied
    /// schema node's ancestry, or a present scalar blocks the descent.
    pub fn write(
        &self,
        data: &mut DataTree,
        tree: &SchemaTree,
        node: NodeId,
        pointer: &str,
        value: Value,
    ) -> Result<Vec<String>, WriteError> {
        if pointer.is_empty() {
            return Err(WriteError::RootWrite);
        }
        if !pointer.starts_with('/') {
            return Err(WriteError::NotAbsolute(pointer.to_string()));
        }
        let segments = pointer::segments(pointer)
            .ok_or_else(|| WriteError::NotAbsolute(pointer.to_string()))?;

        let expected = data_depth(tree.node(node).pointer());
        if segments.len() != expected {
            return Err(WriteError::DepthMismatch {
                expected,
                actual: segments.len(),
            });
        }

        // The root container itself may need materializing
        if data.value().is_null() {
            *data.root_mut() = empty_container(tree, Some(tree.root()));
        }

        let mut touched = vec![String::new()];
        let mut current = String::new();

        let (intermediates, last) = segments.split_at(segments.len() - 1);
        for raw_segment in intermediates {
            let segment = pointer::unescape_segment(raw_segment);
            let child_pointer = format!("{}/{}", current, raw_segment);
            let child_schema = tree.resolve_schema(&child_pointer);

            let container = pointer::resolve_mut(data.root_mut(), &current)
                .ok_or_else(|| WriteError::NotAContainer(current.clone()))?;

            match container {
                Value::Object(map) => {
                    match map.get(&segment) {
                        None | Some(Value::Null) => {
                            map.insert(segment, empty_container(tree, child_schema));
                        }
                        Some(Value::Object(_)) | Some(Value::Array(_)) => {}
                        Some(_) => return Err(WriteError::NotAContainer(child_pointer)),
                    }
                }
                Value::Array(elements) => {
                    let index: usize = segment.parse().map_err(|_| WriteError::InvalidIndex {
                        pointer: child_pointer.clone(),
                    })?;
                    while elements.len() <= index {
                        elements.push(Value::Null);
                    }
                    match &elements[index] {
                        Value::Null => {
                            elements[index] = empty_container(tree, child_schema);
                        }
                        Value::Object(_) | Value::Array(_) => {}
                        _ => return Err(WriteError::NotAContainer(child_pointer)),
                    }
                }
                _ => return Err(WriteError::NotAContainer(current)),
            }

            touched.push(child_pointer.clone());
            current = child_pointer;
        }

        // Terminal assignment happens last
        let segment = pointer::unescape_segment(&last[0]);
        let container = pointer::resolve_mut(data.root_mut(), &current)
            .ok_or_else(|| WriteError::NotAContainer(current.clone()))?;
        match container {
            Value::Object(map) => {
                map.insert(segment, value);
            }
            Value::Array(elements) => {
                let index: usize = segment.parse().map_err(|_| WriteError::InvalidIndex {
                    pointer: pointer.to_string(),
                })?;
                while elements.len() <= index {
                    elements.push(Value::Null);
                }
                elements[index] = value;
            }
            _ => return Err(WriteError::NotAContainer(current)),
        }
        touched.push(pointer.to_string());

        // Re-tag the side table (materialized intermediates included)
        data.rewalk(tree);

        let mut refresh: Vec<String> = touched
            .into_iter()
            .filter(|p| self.consumers.contains(p))
            .collect();
        for tracker in tree.node(node).trackers() {
            if !refresh.iter().any(|p| p == tracker) {
                refresh.push(tracker.clone());
            }
        }
        Ok(refresh)
    }
}

/// An empty container typed by its governing schema (object unless the
/// schema says array).
fn empty_container(tree: &SchemaTree, schema: Option<NodeId>) -> Value {
    match schema.map(|id| tree.node(id).basetype()) {
        Some(Basetype::Array) => json!([]),
        _ => json!({}),
    }
}

/// Number of data levels a schema pointer spans: combinator and `not`
/// segments occupy no data level.
fn data_depth(schema_pointer: &str) -> usize {
    let Some(segments) = pointer::segments(schema_pointer) else {
        return 0;
    };
    let mut depth = 0;
    let mut i = 0;
    while i < segments.len() {
        match segments[i].as_str() {
            "oneOf" | "anyOf" | "allOf" => i += 2,
            "not" => i += 1,
            _ => {
                depth += 1;
                i += 1;
            }
        }
    }
    depth
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::Compiler;
    use serde_json::json;

    fn nested_schema() -> crate::compile::Compiled {
        Compiler::new()
            .unwrap()
            .compile(&json!({
                "type": "object",
                "properties": {
                    "a": {
                        "type": "object",
                        "properties": {
                            "b": {
                                "type": "object",
                                "properties": {"c": {"type": "string"}}
                            }
                        }
                    }
                }
            }))
            .unwrap()
    }

    #[test]
    fn test_write_cascades_materialization() {
        let compiled = nested_schema();
        let mut data = DataTree::bind(&compiled.tree, json!({}));
        let propagator = Propagator::new();
        let node = compiled.tree.find("/a/b/c").unwrap();

        propagator
            .write(&mut data, &compiled.tree, node, "/a/b/c", json!("v"))
            .unwrap();

        assert_eq!(data.value(), &json!({"a": {"b": {"c": "v"}}}));
        // Materialized intermediates are tagged
        assert_eq!(data.meta("/a").unwrap().schema, compiled.tree.find("/a"));
        assert_eq!(data.meta("/a/b").unwrap().schema, compiled.tree.find("/a/b"));
    }

    #[test]
    fn test_write_through_present_null() {
        let compiled = nested_schema();
        let mut data = DataTree::bind(&compiled.tree, json!({"a": null}));
        let propagator = Propagator::new();
        let node = compiled.tree.find("/a/b/c").unwrap();

        propagator
            .write(&mut data, &compiled.tree, node, "/a/b/c", json!("v"))
            .unwrap();
        assert_eq!(data.value_at("/a/b/c"), Some(&json!("v")));
    }

    #[test]
    fn test_array_intermediate_materializes_as_array() {
        let compiled = Compiler::new()
            .unwrap()
            .compile(&json!({
                "type": "object",
                "properties": {
                    "rows": {"type": "array", "items": {
                        "type": "object",
                        "properties": {"x": {"type": "number"}}
                    }}
                }
            }))
            .unwrap();
        let mut data = DataTree::bind(&compiled.tree, json!({}));
        let propagator = Propagator::new();
        let node = compiled.tree.resolve_schema("/rows/0/x").unwrap();

        propagator
            .write(&mut data, &compiled.tree, node, "/rows/1/x", json!(5))
            .unwrap();

        // The array was materialized and padded to the index
        assert_eq!(data.value(), &json!({"rows": [null, {"x": 5}]}));
    }

    #[test]
    fn test_root_write_rejected() {
        let compiled = nested_schema();
        let mut data = DataTree::bind(&compiled.tree, json!({}));
        let propagator = Propagator::new();
        let root = compiled.tree.root();

        let err = propagator
            .write(&mut data, &compiled.tree, root, "", json!({}))
            .unwrap_err();
        assert_eq!(err, WriteError::RootWrite);
    }

    #[test]
    fn test_relative_pointer_rejected() {
        let compiled = nested_schema();
        let mut data = DataTree::bind(&compiled.tree, json!({}));
        let propagator = Propagator::new();
        let node = compiled.tree.find("/a/b/c").unwrap();

        let err = propagator
            .write(&mut data, &compiled.tree, node, "1/c", json!(1))
            .unwrap_err();
        assert!(matches!(err, WriteError::NotAbsolute(_)));
    }

    #[test]
    fn test_depth_mismatch_rejected() {
        let compiled = nested_schema();
        let mut data = DataTree::bind(&compiled.tree, json!({}));
        let propagator = Propagator::new();
        let node = compiled.tree.find("/a/b/c").unwrap();

        let err = propagator
            .write(&mut data, &compiled.tree, node, "/a/b", json!(1))
            .unwrap_err();
        assert_eq!(
            err,
            WriteError::DepthMismatch {
                expected: 3,
                actual: 2
            }
        );
    }

    #[test]
    fn test_scalar_blocks_descent() {
        let compiled = nested_schema();
        let mut data = DataTree::bind(&compiled.tree, json!({"a": 7}));
        let propagator = Propagator::new();
        let node = compiled.tree.find("/a/b/c").unwrap();

        let err = propagator
            .write(&mut data, &compiled.tree, node, "/a/b/c", json!("v"))
            .unwrap_err();
        assert_eq!(err, WriteError::NotAContainer("/a".to_string()));
    }

    #[test]
    fn test_consumers_scheduled_for_refresh() {
        let compiled = nested_schema();
        let mut data = DataTree::bind(&compiled.tree, json!({}));
        let mut propagator = Propagator::new();
        propagator.register_consumer("/a/b");
        propagator.register_consumer("/a/b/c");
        propagator.register_consumer("/unrelated");
        let node = compiled.tree.find("/a/b/c").unwrap();

        let refresh = propagator
            .write(&mut data, &compiled.tree, node, "/a/b/c", json!("v"))
            .unwrap();
        assert_eq!(refresh, vec!["/a/b", "/a/b/c"]);
    }

    #[test]
    fn test_trackers_signaled() {
        let compiled = Compiler::new()
            .unwrap()
            .compile(&json!({
                "type": "object",
                "properties": {
                    "price": {"type": "number"},
                    "total": {"type": "number", "dynamic": "`/price` * 2"}
                }
            }))
            .unwrap();
        let mut data = DataTree::bind(&compiled.tree, json!({}));
        let propagator = Propagator::new();
        let price = compiled.tree.find("/price").unwrap();

        let refresh = propagator
            .write(&mut data, &compiled.tree, price, "/price", json!(10))
            .unwrap();
        assert_eq!(refresh, vec!["/total"]);
    }
}

//! Explicit schema tree construction
//!
//! The builder re-types every nested schema reachable via `properties`,
//! `items` (single or tuple), `prefixItems`, `oneOf`/`anyOf`/`allOf`,
//! and `not` into arena nodes, without altering keyword values. It runs
//! before any compilation step; pointers are assigned here, in one
//! pre-order pass, and never recomputed.
//!
//! Keyword values that cannot hold a subschema (for example a numeric
//! `properties` entry) are left in the raw map for the validator
//! collaborator to flag; the builder does not fail on them.

use serde_json::{Map, Value};

use super::errors::BuildError;
use super::types::{Items, NodeId, SchemaNode, SchemaTree};
use crate::pointer;

/// Build a schema tree from a raw parsed document.
///
/// # Errors
///
/// Returns [`BuildError`] when the root is not an object or boolean
/// schema.
pub fn build_tree(raw: &Value) -> Result<SchemaTree, BuildError> {
    let root_map = schema_map(raw).ok_or_else(|| BuildError::InvalidRoot {
        found: type_name(raw).to_string(),
    })?;

    let mut tree = SchemaTree::default();
    add_node(&mut tree, root_map, String::new(), None);
    Ok(tree)
}

/// Interpret a value as a subschema keyword map.
///
/// Boolean schemas normalize to `{}` (true) and `{"not": {}}` (false).
fn schema_map(value: &Value) -> Option<Map<String, Value>> {
    match value {
        Value::Object(map) => Some(map.clone()),
        Value::Bool(true) => Some(Map::new()),
        Value::Bool(false) => {
            let mut map = Map::new();
            map.insert("not".to_string(), Value::Object(Map::new()));
            Some(map)
        }
        _ => None,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn add_node(
    tree: &mut SchemaTree,
    raw: Map<String, Value>,
    pointer: String,
    parent: Option<NodeId>,
) -> NodeId {
    let id = NodeId(tree.nodes.len());
    tree.nodes
        .push(SchemaNode::new(id, parent, pointer.clone(), raw));
    tree.index.insert(pointer.clone(), id);

    // Children are built from a snapshot of the keyword map; upgrade
    // steps later rewrite keywords in place without moving children.
    let raw = tree.nodes[id.0].raw.clone();

    if let Some(Value::Object(properties)) = raw.get("properties") {
        let mut children = Vec::with_capacity(properties.len());
        for (name, sub) in properties {
            if let Some(map) = schema_map(sub) {
                let child_pointer = format!("{}/{}", pointer, pointer::escape_segment(name));
                let child = add_node(tree, map, child_pointer, Some(id));
                children.push((name.clone(), child));
            }
        }
        tree.nodes[id.0].properties = children;
    }

    // Tuple schemas: prefixItems, or the legacy array form of items
    let tuple = match (raw.get("prefixItems"), raw.get("items")) {
        (Some(Value::Array(list)), _) => Some(list),
        (None, Some(Value::Array(list))) => Some(list),
        _ => None,
    };
    if let Some(list) = tuple {
        let mut entries = Vec::with_capacity(list.len());
        for (index, sub) in list.iter().enumerate() {
            if let Some(map) = schema_map(sub) {
                let child_pointer = format!("{}/{}", pointer, index);
                entries.push(add_node(tree, map, child_pointer, Some(id)));
            }
        }
        tree.nodes[id.0].items = Items::Tuple(entries);
    } else if let Some(sub) = raw.get("items") {
        if let Some(map) = schema_map(sub) {
            let child_pointer = format!("{}/-", pointer);
            let child = add_node(tree, map, child_pointer, Some(id));
            tree.nodes[id.0].items = Items::Single(child);
        }
    }

    for keyword in ["oneOf", "anyOf", "allOf"] {
        if let Some(Value::Array(branches)) = raw.get(keyword) {
            let mut children = Vec::with_capacity(branches.len());
            for (index, sub) in branches.iter().enumerate() {
                if let Some(map) = schema_map(sub) {
                    let child_pointer = format!("{}/{}/{}", pointer, keyword, index);
                    children.push(add_node(tree, map, child_pointer, Some(id)));
                }
            }
            match keyword {
                "oneOf" => tree.nodes[id.0].one_of = children,
                "anyOf" => tree.nodes[id.0].any_of = children,
                _ => tree.nodes[id.0].all_of = children,
            }
        }
    }

    if let Some(sub) = raw.get("not") {
        if let Some(map) = schema_map(sub) {
            let child_pointer = format!("{}/not", pointer);
            let child = add_node(tree, map, child_pointer, Some(id));
            tree.nodes[id.0].not = Some(child);
        }
    }

    id
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_build_assigns_pointers_preorder() {
        let tree = build_tree(&json!({
            "type": "object",
            "properties": {
                "a": {"type": "string"},
                "b": {
                    "type": "object",
                    "properties": {"c": {"type": "number"}}
                }
            }
        }))
        .unwrap();

        let pointers: Vec<&str> = tree.iter().map(|n| n.pointer()).collect();
        assert_eq!(pointers, vec!["", "/a", "/b", "/b/c"]);
    }

    #[test]
    fn test_build_items_single() {
        let tree = build_tree(&json!({
            "type": "array",
            "items": {"type": "string"}
        }))
        .unwrap();
        let item = tree.find("/-").unwrap();
        assert_eq!(tree.node(item).parent(), Some(tree.root()));
        assert!(matches!(tree.node(tree.root()).items(), Items::Single(_)));
    }

    #[test]
    fn test_build_tuple_items() {
        let tree = build_tree(&json!({
            "prefixItems": [{"type": "string"}, {"type": "number"}]
        }))
        .unwrap();
        assert!(tree.find("/0").is_some());
        assert!(tree.find("/1").is_some());
        match tree.node(tree.root()).items() {
            Items::Tuple(entries) => assert_eq!(entries.len(), 2),
            other => panic!("expected tuple items, got {:?}", other),
        }
    }

    #[test]
    fn test_build_legacy_tuple_items() {
        let tree = build_tree(&json!({
            "items": [{"type": "string"}, {"type": "number"}]
        }))
        .unwrap();
        assert!(matches!(tree.node(tree.root()).items(), Items::Tuple(_)));
    }

    #[test]
    fn test_build_combinators_and_not() {
        let tree = build_tree(&json!({
            "oneOf": [{"type": "string"}, {"type": "number"}],
            "not": {"type": "null"}
        }))
        .unwrap();
        assert!(tree.find("/oneOf/0").is_some());
        assert!(tree.find("/oneOf/1").is_some());
        assert!(tree.find("/not").is_some());
        assert_eq!(tree.node(tree.root()).one_of().len(), 2);
    }

    #[test]
    fn test_boolean_subschemas() {
        let tree = build_tree(&json!({
            "properties": {"open": true, "closed": false}
        }))
        .unwrap();
        assert!(tree.find("/open").is_some());
        // A false schema normalizes to {"not": {}}
        let closed = tree.find("/closed").unwrap();
        assert!(tree.node(closed).raw().contains_key("not"));
    }

    #[test]
    fn test_escaped_property_names() {
        let tree = build_tree(&json!({
            "properties": {"a/b": {"type": "string"}}
        }))
        .unwrap();
        assert!(tree.find("/a~1b").is_some());
    }

    #[test]
    fn test_invalid_root_rejected() {
        assert!(build_tree(&json!(42)).is_err());
        assert!(build_tree(&json!("schema")).is_err());
    }

    #[test]
    fn test_non_schema_property_values_skipped() {
        let tree = build_tree(&json!({
            "properties": {"good": {"type": "string"}, "bad": 5}
        }))
        .unwrap();
        assert!(tree.find("/good").is_some());
        assert!(tree.find("/bad").is_none());
    }
}

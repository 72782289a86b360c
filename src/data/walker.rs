//! Data walker: binds a live document to its compiled schema
//!
//! The document stays a plain `serde_json::Value` — fully serializable,
//! no hidden fields. Tree-position metadata (owning schema, parent
//! pointer, key) lives in an out-of-band side table keyed by absolute
//! pointer, one entry per composite value.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::expr::Sandbox;
use crate::observability::Logger;
use crate::pointer;
use crate::schema::{Items, NodeId, SchemaTree};

/// Position metadata of one composite data node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataMeta {
    /// The owning schema node; `None` is an error state (an element of
    /// a heterogeneous array no `case` branch accepted)
    pub schema: Option<NodeId>,
    /// Pointer of the parent container (`None` for the root)
    pub parent: Option<String>,
    /// Property name or array index under the parent
    pub key: String,
}

/// A live document bound to a compiled schema tree.
#[derive(Debug, Clone)]
pub struct DataTree {
    root: Value,
    meta: BTreeMap<String, DataMeta>,
}

impl DataTree {
    /// Walk a document in lock-step with the schema and bind it.
    pub fn bind(tree: &SchemaTree, value: Value) -> DataTree {
        let mut data = DataTree {
            root: value,
            meta: BTreeMap::new(),
        };
        data.rewalk(tree);
        data
    }

    /// The underlying document.
    pub fn value(&self) -> &Value {
        &self.root
    }

    /// Resolve a value inside the document.
    pub fn value_at(&self, pointer: &str) -> Option<&Value> {
        pointer::resolve(&self.root, pointer)
    }

    /// Position metadata for a composite value.
    pub fn meta(&self, pointer: &str) -> Option<&DataMeta> {
        self.meta.get(pointer)
    }

    /// Number of side-table entries.
    pub fn meta_len(&self) -> usize {
        self.meta.len()
    }

    pub(crate) fn root_mut(&mut self) -> &mut Value {
        &mut self.root
    }

    /// Rebuild the side table from scratch. Called after any write that
    /// may have replaced composite values.
    pub fn rewalk(&mut self, tree: &SchemaTree) {
        let mut meta = BTreeMap::new();
        walk_value(
            tree,
            &self.root,
            &self.root,
            String::new(),
            Some(tree.root()),
            None,
            String::new(),
            &mut meta,
        );
        self.meta = meta;
    }
}

#[allow(clippy::too_many_arguments)]
fn walk_value(
    tree: &SchemaTree,
    root: &Value,
    value: &Value,
    pointer: String,
    schema: Option<NodeId>,
    parent: Option<String>,
    key: String,
    out: &mut BTreeMap<String, DataMeta>,
) {
    match value {
        Value::Object(map) => {
            out.insert(
                pointer.clone(),
                DataMeta {
                    schema,
                    parent,
                    key,
                },
            );
            for (name, child) in map {
                let child_schema = schema.and_then(|s| {
                    tree.node(s)
                        .properties()
                        .iter()
                        .find(|(n, _)| n == name)
                        .map(|(_, id)| *id)
                });
                let child_pointer =
                    format!("{}/{}", pointer, pointer::escape_segment(name));
                walk_value(
                    tree,
                    root,
                    child,
                    child_pointer,
                    child_schema,
                    Some(pointer.clone()),
                    name.clone(),
                    out,
                );
            }
        }
        Value::Array(elements) => {
            out.insert(
                pointer.clone(),
                DataMeta {
                    schema,
                    parent,
                    key,
                },
            );
            for (index, element) in elements.iter().enumerate() {
                let child_pointer = format!("{}/{}", pointer, index);
                let child_schema =
                    element_schema(tree, root, schema, index, element, &child_pointer);
                walk_value(
                    tree,
                    root,
                    element,
                    child_pointer,
                    child_schema,
                    Some(pointer.clone()),
                    index.to_string(),
                    out,
                );
            }
        }
        _ => {}
    }
}

/// Resolve the concrete schema of one array element.
///
/// Homogeneous arrays share the single item schema. A heterogeneous
/// array (item schema given as a `oneOf` list) binds each element to
/// the first branch whose `case` predicate accepts it; no match leaves
/// the element without a schema.
fn element_schema(
    tree: &SchemaTree,
    root: &Value,
    array_schema: Option<NodeId>,
    index: usize,
    _element: &Value,
    element_pointer: &str,
) -> Option<NodeId> {
    let array_node = tree.node(array_schema?);
    match array_node.items() {
        Items::Single(item) => {
            let item_node = tree.node(*item);
            if item_node.one_of().is_empty() {
                return Some(*item);
            }
            for &branch in item_node.one_of() {
                let branch_node = tree.node(branch);
                let sandbox =
                    Sandbox::at_pointer(root, element_pointer).with_schema(branch_node.view());
                if branch_node.case(&sandbox) == Some(true) {
                    return Some(branch);
                }
            }
            Logger::warn(
                "CASE_UNMATCHED",
                &[("pointer", element_pointer)],
            );
            None
        }
        Items::Tuple(entries) => entries.get(index).copied(),
        Items::Missing => None,
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
    fn test_bind_objects() {
        let compiled = compile(json!({
            "type": "object",
            "properties": {
                "person": {
                    "type": "object",
                    "properties": {"name": {"type": "string"}}
                }
            }
        }));
        let data = DataTree::bind(&compiled.tree, json!({"person": {"name": "Ada"}}));

        let root_meta = data.meta("").unwrap();
        assert_eq!(root_meta.schema, Some(compiled.tree.root()));
        assert_eq!(root_meta.parent, None);

        let person_meta = data.meta("/person").unwrap();
        assert_eq!(person_meta.schema, compiled.tree.find("/person"));
        assert_eq!(person_meta.parent.as_deref(), Some(""));
        assert_eq!(person_meta.key, "person");

        // Scalars carry no side-table entry
        assert!(data.meta("/person/name").is_none());
        assert_eq!(data.value_at("/person/name"), Some(&json!("Ada")));
    }

    #[test]
    fn test_document_stays_plain() {
        let compiled = compile(json!({
            "type": "object",
            "properties": {"a": {"type": "object", "properties": {}}}
        }));
        let original = json!({"a": {}});
        let data = DataTree::bind(&compiled.tree, original.clone());
        // Binding never alters the serializable shape
        assert_eq!(data.value(), &original);
    }

    #[test]
    fn test_homogeneous_array_elements_share_schema() {
        let compiled = compile(json!({
            "type": "object",
            "properties": {
                "rows": {"type": "array", "items": {
                    "type": "object",
                    "properties": {"x": {"type": "number"}}
                }}
            }
        }));
        let data = DataTree::bind(&compiled.tree, json!({"rows": [{"x": 1}, {"x": 2}]}));

        let item = compiled.tree.find("/rows/-");
        assert_eq!(data.meta("/rows/0").unwrap().schema, item);
        assert_eq!(data.meta("/rows/1").unwrap().schema, item);
    }

    #[test]
    fn test_heterogeneous_first_case_wins() {
        let compiled = compile(json!({
            "type": "object",
            "properties": {
                "shapes": {"type": "array", "items": {"oneOf": [
                    {
                        "type": "object",
                        "case": "value.kind == 'circle'",
                        "properties": {"kind": {"type": "string"}, "r": {"type": "number"}}
                    },
                    {
                        "type": "object",
                        "case": "value.kind == 'rect'",
                        "properties": {"kind": {"type": "string"}, "w": {"type": "number"}}
                    }
                ]}}
            }
        }));
        let data = DataTree::bind(
            &compiled.tree,
            json!({"shapes": [{"kind": "rect", "w": 3}, {"kind": "circle", "r": 1}]}),
        );

        assert_eq!(
            data.meta("/shapes/0").unwrap().schema,
            compiled.tree.find("/shapes/-/oneOf/1")
        );
        assert_eq!(
            data.meta("/shapes/1").unwrap().schema,
            compiled.tree.find("/shapes/-/oneOf/0")
        );
    }

    #[test]
    fn test_heterogeneous_no_match_is_error_state() {
        let compiled = compile(json!({
            "type": "object",
            "properties": {
                "shapes": {"type": "array", "items": {"oneOf": [
                    {
                        "type": "object",
                        "case": "value.kind == 'circle'",
                        "properties": {"kind": {"type": "string"}}
                    }
                ]}}
            }
        }));
        let data = DataTree::bind(
            &compiled.tree,
            json!({"shapes": [{"kind": "hexagon"}]}),
        );
        assert_eq!(data.meta("/shapes/0").unwrap().schema, None);
    }

    #[test]
    fn test_unguarded_branch_is_catch_all() {
        let compiled = compile(json!({
            "type": "object",
            "properties": {
                "entries": {"type": "array", "items": {"oneOf": [
                    {
                        "type": "object",
                        "case": "value.kind == 'a'",
                        "properties": {"kind": {"type": "string"}}
                    },
                    {
                        "type": "object",
                        "properties": {"kind": {"type": "string"}}
                    }
                ]}}
            }
        }));
        let data = DataTree::bind(
            &compiled.tree,
            json!({"entries": [{"kind": "other"}]}),
        );
        assert_eq!(
            data.meta("/entries/0").unwrap().schema,
            compiled.tree.find("/entries/-/oneOf/1")
        );
    }

    #[test]
    fn test_tuple_elements() {
        let compiled = compile(json!({
            "type": "object",
            "properties": {
                "pair": {"type": "array", "prefixItems": [
                    {"type": "object", "properties": {}},
                    {"type": "object", "properties": {}}
                ]}
            }
        }));
        let data = DataTree::bind(&compiled.tree, json!({"pair": [{}, {}, {}]}));
        assert_eq!(
            data.meta("/pair/0").unwrap().schema,
            compiled.tree.find("/pair/0")
        );
        assert_eq!(
            data.meta("/pair/1").unwrap().schema,
            compiled.tree.find("/pair/1")
        );
        // Past the tuple: no schema
        assert_eq!(data.meta("/pair/2").unwrap().schema, None);
    }
}

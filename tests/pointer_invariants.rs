//! Pointer Resolution Invariant Tests
//!
//! - Missing segments are "not found", never a panic, and distinct
//!   from a present null
//! - Escapes decode per segment
//! - Relative pointers ascend from the addressed value's parent
//! - Schema-space resolution understands item and combinator segments

use formtree::compile::Compiler;
use formtree::pointer;
use serde_json::{json, Value};

// =============================================================================
// Absolute Resolution
// =============================================================================

/// /a/b where /a is null resolves to "not found", never throws.
#[test]
fn test_resolution_through_null_is_not_found() {
    let doc = json!({"a": null});
    assert_eq!(pointer::resolve(&doc, "/a/b"), None);
    // The null itself is found
    assert_eq!(pointer::resolve(&doc, "/a"), Some(&Value::Null));
}

/// Missing properties and out-of-range indexes are "not found".
#[test]
fn test_missing_segments() {
    let doc = json!({"a": {"b": [1]}});
    assert_eq!(pointer::resolve(&doc, "/x"), None);
    assert_eq!(pointer::resolve(&doc, "/a/c"), None);
    assert_eq!(pointer::resolve(&doc, "/a/b/5"), None);
}

/// Indexing through a scalar is "not found".
#[test]
fn test_scalar_descent_is_not_found() {
    let doc = json!({"a": 42});
    assert_eq!(pointer::resolve(&doc, "/a/0"), None);
    assert_eq!(pointer::resolve(&doc, "/a/b/c"), None);
}

/// The empty pointer resolves to the document itself.
#[test]
fn test_empty_pointer_is_root() {
    let doc = json!({"a": 1});
    assert_eq!(pointer::resolve(&doc, ""), Some(&doc));
}

/// ~1 and ~0 unescape inside segments.
#[test]
fn test_escaped_segments() {
    let doc = json!({"a/b": 1, "~tilde": 2});
    assert_eq!(pointer::resolve(&doc, "/a~1b"), Some(&json!(1)));
    assert_eq!(pointer::resolve(&doc, "/~0tilde"), Some(&json!(2)));
}

// =============================================================================
// Relative Resolution
// =============================================================================

/// Relative pointer "1/d" evaluated at "/a/b/c" resolves to "/a/d".
#[test]
fn test_relative_one_up() {
    assert_eq!(
        pointer::relative_to_absolute("/a/b/c", "1/d"),
        Some("/a/d".to_string())
    );
}

/// Relative pointer "0/d" evaluated at "/a/b/c" names a sibling.
#[test]
fn test_relative_sibling() {
    assert_eq!(
        pointer::relative_to_absolute("/a/b/c", "0/d"),
        Some("/a/b/d".to_string())
    );
}

/// A bare "0" denotes the addressed value itself.
#[test]
fn test_relative_current_value() {
    assert_eq!(
        pointer::relative_to_absolute("/a/b/c", "0"),
        Some("/a/b/c".to_string())
    );
}

/// Running out of ancestors is "not found".
#[test]
fn test_relative_out_of_ancestors() {
    assert_eq!(pointer::relative_to_absolute("/a", "1/d"), None);
    assert_eq!(pointer::relative_to_absolute("", "0"), None);
    assert_eq!(pointer::relative_to_absolute("/a/b", "5/x"), None);
}

// =============================================================================
// Pointer Splitting
// =============================================================================

/// A pointer splits into (parent, key) with numeric coercion of an
/// integer final key.
#[test]
fn test_split_numeric_coercion() {
    let (parent, key) = pointer::split("/rows/3").unwrap();
    assert_eq!(parent, "/rows");
    assert_eq!(key, pointer::Key::Index(3));

    let (parent, key) = pointer::split("/rows/03x").unwrap();
    assert_eq!(parent, "/rows");
    assert_eq!(key, pointer::Key::Name("03x".to_string()));
}

// =============================================================================
// Schema-Space Resolution
// =============================================================================

/// Data-shaped pointers resolve through item and property segments in
/// schema space.
#[test]
fn test_schema_space_resolution() {
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
    let tree = &compiled.tree;

    let x = tree.find("/rows/-/x").unwrap();
    // A concrete element index maps to the same item schema
    assert_eq!(tree.resolve_schema("/rows/0/x"), Some(x));
    assert_eq!(tree.resolve_schema("/rows/42/x"), Some(x));
    assert_eq!(tree.resolve_schema("/rows/0/missing"), None);
}

/// Combinator branches resolve by keyword segment and index.
#[test]
fn test_schema_space_combinators() {
    let compiled = Compiler::new()
        .unwrap()
        .compile(&json!({
            "oneOf": [
                {"type": "object", "properties": {"a": {"type": "string"}}},
                {"type": "number"}
            ]
        }))
        .unwrap();
    let tree = &compiled.tree;

    assert!(tree.resolve_schema("/oneOf/0").is_some());
    assert!(tree.resolve_schema("/oneOf/0/a").is_some());
    assert!(tree.resolve_schema("/oneOf/2").is_none());
}

//! Compilation Determinism Tests
//!
//! - The same document compiles the same way every time
//! - Two independent compilations produce structurally distinct trees
//!   whose classification fields are value-equal
//! - Upgrade rewrites are pure, deterministic structural rewrites
//! - The upgraded document reassembles deterministically

use formtree::compile::{Compiled, Compiler};
use serde_json::{json, Value};

// =============================================================================
// Helper Functions
// =============================================================================

fn compile(document: &Value) -> Compiled {
    Compiler::new().unwrap().compile(document).unwrap()
}

fn sample_document() -> Value {
    json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "type": "object",
        "properties": {
            "kind": {"type": "string", "enum": ["person", "company"]},
            "name": {"type": "string", "nullable": true, "visible": "`/kind` == 'person'"},
            "score": {"oneOf": [{"type": "integer"}, {"type": "number"}]},
            "tags": {"type": "array", "items": {"type": "string"}},
            "legacy": {
                "type": "object",
                "additionalProperties": false,
                "dependencies": {"card": ["number"]},
                "properties": {
                    "card": {"type": "string"},
                    "number": {"type": "string"}
                }
            }
        }
    })
}

// =============================================================================
// Determinism Tests
// =============================================================================

/// Compiling the same document twice yields value-equal classification
/// on structurally distinct trees.
#[test]
fn test_independent_compilations_value_equal() {
    let document = sample_document();
    let first = compile(&document);
    let second = compile(&document);

    assert_eq!(first.tree.len(), second.tree.len());
    for (a, b) in first.tree.iter().zip(second.tree.iter()) {
        assert_eq!(a.pointer(), b.pointer());
        assert_eq!(a.basetype(), b.basetype());
        assert_eq!(a.null_allowed(), b.null_allowed());
        assert_eq!(a.isenum(), b.isenum());
        assert_eq!(a.isenumarray(), b.isenumarray());
        assert_eq!(a.homogeneous(), b.homogeneous());
        assert_eq!(a.trackers(), b.trackers());
    }
    assert_eq!(first.errors, second.errors);
    assert_eq!(first.dialect, second.dialect);
}

/// Error collection is deterministic across repeated runs.
#[test]
fn test_errors_deterministic() {
    let document = json!({
        "type": "object",
        "properties": {
            "bad1": {"type": ["string", "number"]},
            "bad2": {"allOf": [{"type": "array"}, {"type": "object"}]}
        }
    });
    let baseline = compile(&document);
    assert_eq!(baseline.errors.len(), 2);
    for _ in 0..10 {
        let run = compile(&document);
        assert_eq!(run.errors, baseline.errors);
    }
}

/// The source document is never mutated by compilation.
#[test]
fn test_source_document_untouched() {
    let document = sample_document();
    let before = document.clone();
    let _ = compile(&document);
    assert_eq!(document, before);
}

// =============================================================================
// Upgrade Rewrite Tests
// =============================================================================

/// All five legacy spellings rewrite in one pass, visible in the
/// reassembled document.
#[test]
fn test_upgrades_visible_in_reassembled_document() {
    let compiled = compile(&sample_document());
    let upgraded = compiled.tree.to_document();

    // nullable -> type union with null plus marker
    assert_eq!(
        upgraded["properties"]["name"]["type"],
        json!(["string", "null"])
    );
    assert_eq!(upgraded["properties"]["name"]["_nullable"], json!(true));
    assert!(upgraded["properties"]["name"].get("nullable").is_none());

    // dependencies -> dependentRequired
    let legacy = &upgraded["properties"]["legacy"];
    assert_eq!(legacy["dependentRequired"], json!({"card": ["number"]}));
    assert!(legacy.get("dependencies").is_none());

    // additionalProperties:false -> unevaluatedProperties:false
    assert_eq!(legacy["unevaluatedProperties"], json!(false));
    assert!(legacy.get("additionalProperties").is_none());
}

/// Tuple items reassemble under prefixItems.
#[test]
fn test_tuple_items_upgrade_reassembled() {
    let compiled = compile(&json!({
        "type": "object",
        "properties": {
            "pair": {"type": "array", "items": [{"type": "string"}, {"type": "number"}]}
        }
    }));
    let upgraded = compiled.tree.to_document();
    let pair = &upgraded["properties"]["pair"];
    assert!(pair.get("items").is_none());
    assert_eq!(pair["prefixItems"][0]["type"], json!("string"));
    assert_eq!(pair["prefixItems"][1]["type"], json!("number"));
}

/// A compound $id splits into base and anchor.
#[test]
fn test_compound_id_upgrade() {
    let compiled = compile(&json!({
        "$id": "https://example.com/schemas/person#root",
        "type": "object"
    }));
    let upgraded = compiled.tree.to_document();
    assert_eq!(upgraded["$id"], json!("https://example.com/schemas/person"));
    assert_eq!(upgraded["$anchor"], json!("root"));
}

// =============================================================================
// Classification Snapshot Tests
// =============================================================================

/// The sample document classifies as expected end to end.
#[test]
fn test_sample_classification() {
    use formtree::infer::Basetype;

    let compiled = compile(&sample_document());
    assert!(compiled.is_clean());
    let tree = &compiled.tree;

    let kind = tree.node(tree.find("/kind").unwrap());
    assert_eq!(kind.basetype(), Basetype::String);
    assert!(kind.isenum());
    assert_eq!(kind.trackers(), &["/name"]);

    let name = tree.node(tree.find("/name").unwrap());
    assert!(name.null_allowed());

    let score = tree.node(tree.find("/score").unwrap());
    assert_eq!(score.basetype(), Basetype::Integer);

    let tags = tree.node(tree.find("/tags").unwrap());
    assert_eq!(tags.basetype(), Basetype::Array);
    assert!(tags.homogeneous());
    assert!(!tags.isenumarray());
}

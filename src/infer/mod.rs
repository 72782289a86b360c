//! Type inference over schema keyword families
//!
//! Each keyword family independently contributes a type set; the final
//! set is the intersection of the universal set with every contribution.
//! Rules:
//!
//! - `type` contributes its declared set; `const`/`enum` contribute the
//!   runtime-type set of the listed value(s) (an integral numeric
//!   constant contributes `integer`).
//! - Presence of any array-only keyword forces `{array}`; string-only
//!   keywords force `{string}`; number-only force `{number}`;
//!   object-only force `{object}`.
//! - `allOf` contributes the intersection of branch sets; `anyOf`/`oneOf`
//!   the union (an unconstrained branch contributes the universal set);
//!   `not` the complement of its branch set.
//! - If any contribution asserted `integer`, remaining `number` members
//!   narrow to `integer` before the final intersection.
//!
//! The final set must be a single type, optionally paired with `null`.
//! Anything else is an inference error, collected by the pipeline and
//! non-fatal to the rest of the tree.

mod typeset;

pub use typeset::{Basetype, TypeSet};

use serde_json::{Map, Value};
use thiserror::Error;

/// Keywords that only constrain arrays
const ARRAY_KEYWORDS: &[&str] = &[
    "items",
    "prefixItems",
    "additionalItems",
    "unevaluatedItems",
    "minItems",
    "maxItems",
    "uniqueItems",
    "contains",
    "minContains",
    "maxContains",
];

/// Keywords that only constrain strings
const STRING_KEYWORDS: &[&str] = &[
    "minLength",
    "maxLength",
    "pattern",
    "format",
    "contentEncoding",
    "contentMediaType",
    "mask",
];

/// Keywords that only constrain numbers
const NUMBER_KEYWORDS: &[&str] = &[
    "minimum",
    "maximum",
    "exclusiveMinimum",
    "exclusiveMaximum",
    "multipleOf",
    "precision",
];

/// Keywords that only constrain objects
const OBJECT_KEYWORDS: &[&str] = &[
    "properties",
    "required",
    "additionalProperties",
    "patternProperties",
    "minProperties",
    "maxProperties",
    "propertyNames",
    "dependentRequired",
    "dependentSchemas",
    "unevaluatedProperties",
];

/// A failed inference: the combined type set does not name exactly one
/// primitive type (optionally paired with null).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InferError {
    /// The contributions have an empty intersection
    #[error("no primitive type satisfies every keyword constraint")]
    EmptyTypeSet,
    /// The combined set keeps more than one non-null candidate
    #[error("ambiguous type: {candidates}")]
    AmbiguousType {
        /// Display form of the surviving set
        candidates: String,
    },
}

/// Runtime type of a JSON value, as a singleton set.
///
/// An integral numeric value counts as `integer`.
fn runtime_type(value: &Value) -> TypeSet {
    match value {
        Value::Null => TypeSet::of(Basetype::Null),
        Value::Bool(_) => TypeSet::of(Basetype::Boolean),
        Value::Number(n) => {
            let integral = n.as_i64().is_some()
                || n.as_u64().is_some()
                || n.as_f64().is_some_and(|f| f.fract() == 0.0 && f.is_finite());
            if integral {
                TypeSet::of(Basetype::Integer)
            } else {
                TypeSet::of(Basetype::Number)
            }
        }
        Value::String(_) => TypeSet::of(Basetype::String),
        Value::Array(_) => TypeSet::of(Basetype::Array),
        Value::Object(_) => TypeSet::of(Basetype::Object),
    }
}

/// The inferred set for an arbitrary subschema value.
///
/// A boolean `true` schema (or anything unconstrained) contributes the
/// universal set; a boolean `false` schema contributes the empty set.
fn branch_set(branch: &Value) -> TypeSet {
    match branch {
        Value::Bool(true) => TypeSet::UNIVERSAL,
        Value::Bool(false) => TypeSet::EMPTY,
        Value::Object(map) => infer_set(map),
        _ => TypeSet::UNIVERSAL,
    }
}

/// Collect the per-family contributions of one keyword map.
///
/// Absent families contribute nothing; a present family that computes an
/// empty set still contributes it (this is how an unsatisfiable `allOf`
/// surfaces as an inference error).
fn contributions(raw: &Map<String, Value>) -> Vec<TypeSet> {
    let mut out = Vec::new();

    if let Some(t) = raw.get("type") {
        let mut set = TypeSet::EMPTY;
        match t {
            Value::String(name) => {
                if let Some(bt) = Basetype::parse(name) {
                    set = set.with(bt);
                }
            }
            Value::Array(names) => {
                for name in names {
                    if let Some(bt) = name.as_str().and_then(Basetype::parse) {
                        set = set.with(bt);
                    }
                }
            }
            _ => {}
        }
        out.push(set);
    }

    if let Some(value) = raw.get("const") {
        out.push(runtime_type(value));
    }

    if let Some(Value::Array(values)) = raw.get("enum") {
        let mut set = TypeSet::EMPTY;
        for value in values {
            set = set.union(runtime_type(value));
        }
        out.push(set);
    }

    if ARRAY_KEYWORDS.iter().any(|k| raw.contains_key(*k)) {
        out.push(TypeSet::of(Basetype::Array));
    }
    if STRING_KEYWORDS.iter().any(|k| raw.contains_key(*k)) {
        out.push(TypeSet::of(Basetype::String));
    }
    if NUMBER_KEYWORDS.iter().any(|k| raw.contains_key(*k)) {
        out.push(TypeSet::of(Basetype::Number));
    }
    if OBJECT_KEYWORDS.iter().any(|k| raw.contains_key(*k)) {
        out.push(TypeSet::of(Basetype::Object));
    }

    if let Some(Value::Array(branches)) = raw.get("allOf") {
        let mut set = TypeSet::UNIVERSAL;
        for branch in branches {
            set = set.intersect(branch_set(branch));
        }
        out.push(set);
    }

    for keyword in ["anyOf", "oneOf"] {
        if let Some(Value::Array(branches)) = raw.get(keyword) {
            let mut set = TypeSet::EMPTY;
            for branch in branches {
                set = set.union(branch_set(branch));
            }
            out.push(set);
        }
    }

    if let Some(branch) = raw.get("not") {
        out.push(branch_set(branch).complement());
    }

    out
}

/// Combine the contributions of one keyword map into a single set,
/// applying integer-dominance narrowing. Used both for whole-node
/// inference and for combinator branches.
pub fn infer_set(raw: &Map<String, Value>) -> TypeSet {
    let sets = contributions(raw);
    if sets.is_empty() {
        return TypeSet::UNIVERSAL;
    }
    let integer_asserted = sets.iter().any(|s| s.contains(Basetype::Integer));
    let mut combined = TypeSet::UNIVERSAL;
    for set in sets {
        let set = if integer_asserted {
            set.narrow_number_to_integer()
        } else {
            set
        };
        combined = combined.intersect(set);
    }
    combined
}

/// Infer the basetype and nullability of one keyword map.
///
/// # Errors
///
/// Returns [`InferError`] when the combined set is empty, keeps more
/// than two members, or keeps exactly two members neither of which is
/// `null`.
pub fn infer(raw: &Map<String, Value>) -> Result<(Basetype, bool), InferError> {
    let combined = infer_set(raw);

    if combined.is_empty() {
        return Err(InferError::EmptyTypeSet);
    }

    let null_allowed = combined.contains(Basetype::Null);
    let non_null = combined.without(Basetype::Null);

    match non_null.len() {
        0 => Ok((Basetype::Null, true)),
        1 => Ok((non_null.members()[0], null_allowed)),
        _ => Err(InferError::AmbiguousType {
            candidates: combined.to_string(),
        }),
    }
}

//! Schema tree subsystem for formtree
//!
//! A raw parsed JSON-Schema document becomes an arena of typed nodes
//! via explicit construction ([`build_tree`]); the compilation pipeline
//! then annotates each node in place, exactly once per step.
//!
//! # Design Principles
//!
//! - Explicit construction, never re-typing a foreign value
//! - Pointers assigned once, in pre-order, never recomputed
//! - `basetype`/`nullAllowed` fixed exactly once
//! - A new document always builds a new tree (no incremental re-use)

mod builder;
mod errors;
mod source;
mod types;

pub use builder::build_tree;
pub use errors::{BuildError, SourceError};
pub use source::{load_file, Dialect, SchemaSource};
pub use types::{Items, NodeId, SchemaNode, SchemaTree};

/// The fixed custom-keyword whitelist.
///
/// These keywords extend the JSON-Schema vocabulary; exporting the list
/// lets embedders configure a generic validator so it does not reject
/// them.
pub const CUSTOM_KEYWORDS: &[&str] = &[
    "root",
    "parent",
    "basetype",
    "pointer",
    "nullAllowed",
    "transient",
    "trackers",
    "target",
    "enumFetch",
    "isenum",
    "filter",
    "isenumarray",
    "homogeneous",
    "requiredIf",
    "field",
    "from",
    "order",
    "abstract",
    "case",
    "visible",
    "readonly",
    "collapsed",
    "rank",
    "dynamic",
    "initialize",
    "change",
    "_nullable",
    "assets",
    "preview",
    "mimetype",
    "mask",
    "tab",
    "group",
    "precision",
];

//! formtree - A strict, deterministic JSON-Schema compilation and
//! reactive-binding engine
//!
//! A JSON-Schema document (draft-07/2019-09/2020-12 plus a fixed
//! custom-keyword set) compiles into a schema tree that drives
//! conditional visibility, computed summaries, and reactive
//! recomputation over a live, pointer-addressed data document.
//!
//! Rendering, styling, and draft instance validation are external
//! collaborators; the latter is reached through the narrow contract in
//! [`validate`].

pub mod cli;
pub mod compile;
pub mod data;
pub mod expr;
pub mod infer;
pub mod observability;
pub mod pointer;
pub mod schema;
pub mod tracker;
pub mod validate;

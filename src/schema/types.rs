//! Compiled schema tree types
//!
//! The tree is an arena: nodes live in one `Vec` and refer to each
//! other by [`NodeId`]. Construction is explicit — a raw parsed
//! document is never re-typed in place — and each node's `pointer` is
//! assigned once by the builder and never recomputed.
//!
//! Pointer assignment is data-shaped for property chains and uses
//! reserved segments for the rest: `/-` for the single item schema,
//! `/oneOf/i` (resp. `anyOf`, `allOf`) for combinator branches, `/not`
//! for the negated branch, and the plain index for tuple entries.

use serde_json::{json, Map, Value};

use crate::expr::{CompiledExpr, Sandbox};
use crate::infer::Basetype;
use crate::observability::Logger;
use crate::pointer;

/// Index of a node inside its [`SchemaTree`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Arena index
    pub fn index(self) -> usize {
        self.0
    }
}

/// Item schemas of an array node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Items {
    /// No item schema
    #[default]
    Missing,
    /// One schema for every element
    Single(NodeId),
    /// Positional tuple schemas (`prefixItems` / legacy tuple `items`)
    Tuple(Vec<NodeId>),
}

/// Compiled expression slots of one node.
///
/// A slot stays `None` when the keyword is absent; the node accessors
/// substitute the keyword-specific default, so every slot is always
/// callable.
#[derive(Debug, Clone, Default)]
pub(crate) struct ExprSlots {
    pub visible: Option<CompiledExpr>,
    pub readonly: Option<CompiledExpr>,
    pub required_if: Option<CompiledExpr>,
    pub filter: Option<CompiledExpr>,
    pub case: Option<CompiledExpr>,
    pub rank: Option<CompiledExpr>,
    pub dynamic: Option<CompiledExpr>,
    pub initialize: Option<CompiledExpr>,
    pub change: Option<CompiledExpr>,
    /// The compiled `abstract` template (summary text)
    pub summary: Option<CompiledExpr>,
    pub from: Option<CompiledExpr>,
}

impl ExprSlots {
    /// Borrow the slot for a keyword. Unknown keywords map to `None`.
    pub(crate) fn slot(&self, keyword: &str) -> Option<&CompiledExpr> {
        match keyword {
            "visible" => self.visible.as_ref(),
            "readonly" => self.readonly.as_ref(),
            "requiredIf" => self.required_if.as_ref(),
            "filter" => self.filter.as_ref(),
            "case" => self.case.as_ref(),
            "rank" => self.rank.as_ref(),
            "dynamic" => self.dynamic.as_ref(),
            "initialize" => self.initialize.as_ref(),
            "change" => self.change.as_ref(),
            "abstract" => self.summary.as_ref(),
            "from" => self.from.as_ref(),
            _ => None,
        }
    }

    /// Fill the slot for a keyword. Unknown keywords are ignored.
    pub(crate) fn set_slot(&mut self, keyword: &str, compiled: CompiledExpr) {
        let slot = match keyword {
            "visible" => &mut self.visible,
            "readonly" => &mut self.readonly,
            "requiredIf" => &mut self.required_if,
            "filter" => &mut self.filter,
            "case" => &mut self.case,
            "rank" => &mut self.rank,
            "dynamic" => &mut self.dynamic,
            "initialize" => &mut self.initialize,
            "change" => &mut self.change,
            "abstract" => &mut self.summary,
            "from" => &mut self.from,
            _ => return,
        };
        *slot = Some(compiled);
    }
}

/// One (sub)schema of the compiled tree.
#[derive(Debug, Clone)]
pub struct SchemaNode {
    pub(crate) id: NodeId,
    pub(crate) parent: Option<NodeId>,
    pub(crate) pointer: String,
    pub(crate) raw: Map<String, Value>,

    pub(crate) properties: Vec<(String, NodeId)>,
    pub(crate) items: Items,
    pub(crate) one_of: Vec<NodeId>,
    pub(crate) any_of: Vec<NodeId>,
    pub(crate) all_of: Vec<NodeId>,
    pub(crate) not: Option<NodeId>,

    pub(crate) basetype: Option<Basetype>,
    pub(crate) null_allowed: Option<bool>,
    pub(crate) isenum: bool,
    pub(crate) isenumarray: bool,
    pub(crate) homogeneous: bool,

    pub(crate) exprs: ExprSlots,
    pub(crate) trackers: Vec<String>,
}

impl SchemaNode {
    pub(crate) fn new(
        id: NodeId,
        parent: Option<NodeId>,
        pointer: String,
        raw: Map<String, Value>,
    ) -> Self {
        SchemaNode {
            id,
            parent,
            pointer,
            raw,
            properties: Vec::new(),
            items: Items::Missing,
            one_of: Vec::new(),
            any_of: Vec::new(),
            all_of: Vec::new(),
            not: None,
            basetype: None,
            null_allowed: None,
            isenum: false,
            isenumarray: false,
            homogeneous: false,
            exprs: ExprSlots::default(),
            trackers: Vec::new(),
        }
    }

    /// Arena id of this node
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Parent node, if any
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Absolute schema pointer, fixed at build time
    pub fn pointer(&self) -> &str {
        &self.pointer
    }

    /// The node's keyword map (after upgrade rewrites)
    pub fn raw(&self) -> &Map<String, Value> {
        &self.raw
    }

    /// Property children in declaration order
    pub fn properties(&self) -> &[(String, NodeId)] {
        &self.properties
    }

    /// Item schema(s)
    pub fn items(&self) -> &Items {
        &self.items
    }

    /// `oneOf` branches
    pub fn one_of(&self) -> &[NodeId] {
        &self.one_of
    }

    /// `anyOf` branches
    pub fn any_of(&self) -> &[NodeId] {
        &self.any_of
    }

    /// `allOf` branches
    pub fn all_of(&self) -> &[NodeId] {
        &self.all_of
    }

    /// `not` branch
    pub fn not_branch(&self) -> Option<NodeId> {
        self.not
    }

    /// The inferred primitive type. Nodes that failed inference fall
    /// back to `string`, the most permissive single type.
    pub fn basetype(&self) -> Basetype {
        self.basetype.unwrap_or(Basetype::String)
    }

    /// Whether `null` is an allowed value
    pub fn null_allowed(&self) -> bool {
        self.null_allowed.unwrap_or(false)
    }

    /// Whether this node is an enumeration (`enum`, `const`, or all
    /// `oneOf` branches carrying `const`)
    pub fn isenum(&self) -> bool {
        self.isenum
    }

    /// Whether this node is an array of enumerated items
    pub fn isenumarray(&self) -> bool {
        self.isenumarray
    }

    /// Whether this array node has one item schema for all elements
    pub fn homogeneous(&self) -> bool {
        self.homogeneous
    }

    /// Pointers to notify when this node's value changes
    pub fn trackers(&self) -> &[String] {
        &self.trackers
    }

    /// Append a tracker pointer, keeping the list ordered and
    /// duplicate-free.
    pub(crate) fn add_tracker(&mut self, pointer: String) {
        if !self.trackers.contains(&pointer) {
            self.trackers.push(pointer);
        }
    }

    /// Plain-object view of this node for the expression sandbox.
    pub fn view(&self) -> Value {
        let mut view = json!({
            "pointer": self.pointer,
            "basetype": self.basetype().as_str(),
            "nullAllowed": self.null_allowed(),
            "isenum": self.isenum,
            "isenumarray": self.isenumarray,
            "homogeneous": self.homogeneous,
        });
        if let Some(title) = self.raw.get("title") {
            view["title"] = title.clone();
        }
        view
    }

    // ------------------------------------------------------------------
    // Consumer contract: compiled expression accessors.
    //
    // Predicates return the tri-state Option<bool> (None is a preserved
    // null). A runtime error is caught, logged with the owning pointer
    // and keyword, and replaced by the keyword default.
    // ------------------------------------------------------------------

    /// `visible` predicate (default: true)
    pub fn visible(&self, sandbox: &Sandbox<'_>) -> Option<bool> {
        self.predicate(&self.exprs.visible, "visible", true, sandbox)
    }

    /// `readonly` predicate (default: false)
    pub fn readonly(&self, sandbox: &Sandbox<'_>) -> Option<bool> {
        self.predicate(&self.exprs.readonly, "readonly", false, sandbox)
    }

    /// `requiredIf` predicate (default: false)
    pub fn required_if(&self, sandbox: &Sandbox<'_>) -> Option<bool> {
        self.predicate(&self.exprs.required_if, "requiredIf", false, sandbox)
    }

    /// `filter` predicate (default: true)
    pub fn filter(&self, sandbox: &Sandbox<'_>) -> Option<bool> {
        self.predicate(&self.exprs.filter, "filter", true, sandbox)
    }

    /// `case` predicate (default: true, so an unguarded branch is a
    /// catch-all in first-match-wins selection)
    pub fn case(&self, sandbox: &Sandbox<'_>) -> Option<bool> {
        self.predicate(&self.exprs.case, "case", true, sandbox)
    }

    /// `rank` value expression (default: null)
    pub fn rank(&self, sandbox: &Sandbox<'_>) -> Value {
        self.value(&self.exprs.rank, "rank", sandbox)
    }

    /// `dynamic` value expression (default: null)
    pub fn dynamic(&self, sandbox: &Sandbox<'_>) -> Value {
        self.value(&self.exprs.dynamic, "dynamic", sandbox)
    }

    /// `initialize` value expression (default: null)
    pub fn initialize(&self, sandbox: &Sandbox<'_>) -> Value {
        self.value(&self.exprs.initialize, "initialize", sandbox)
    }

    /// `change` value expression (default: null)
    pub fn change(&self, sandbox: &Sandbox<'_>) -> Value {
        self.value(&self.exprs.change, "change", sandbox)
    }

    /// `from` cross-reference expression (default: null)
    pub fn from(&self, sandbox: &Sandbox<'_>) -> Value {
        self.value(&self.exprs.from, "from", sandbox)
    }

    /// The `abstract` summary template (default: empty string)
    pub fn summary(&self, sandbox: &Sandbox<'_>) -> String {
        match &self.exprs.summary {
            None => String::new(),
            Some(expr) => match expr.eval_template(sandbox) {
                Ok(text) => text,
                Err(err) => {
                    self.log_runtime_error("abstract", &err.to_string());
                    String::new()
                }
            },
        }
    }

    fn predicate(
        &self,
        slot: &Option<CompiledExpr>,
        keyword: &'static str,
        default: bool,
        sandbox: &Sandbox<'_>,
    ) -> Option<bool> {
        match slot {
            None => Some(default),
            Some(expr) => match expr.eval_predicate(sandbox) {
                Ok(result) => result,
                Err(err) => {
                    self.log_runtime_error(keyword, &err.to_string());
                    Some(default)
                }
            },
        }
    }

    fn value(
        &self,
        slot: &Option<CompiledExpr>,
        keyword: &'static str,
        sandbox: &Sandbox<'_>,
    ) -> Value {
        match slot {
            None => Value::Null,
            Some(expr) => match expr.eval_value(sandbox) {
                Ok(result) => result,
                Err(err) => {
                    self.log_runtime_error(keyword, &err.to_string());
                    Value::Null
                }
            },
        }
    }

    fn log_runtime_error(&self, keyword: &str, message: &str) {
        Logger::error(
            "EXPR_RUNTIME_ERROR",
            &[
                ("keyword", keyword),
                ("message", message),
                ("pointer", &self.pointer),
            ],
        );
    }
}

/// The compiled schema tree.
#[derive(Debug, Clone, Default)]
pub struct SchemaTree {
    pub(crate) nodes: Vec<SchemaNode>,
    pub(crate) index: std::collections::BTreeMap<String, NodeId>,
}

impl SchemaTree {
    /// The root node id
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree is empty (never true after a successful build)
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Borrow a node
    pub fn node(&self, id: NodeId) -> &SchemaNode {
        &self.nodes[id.0]
    }

    /// Mutably borrow a node
    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut SchemaNode {
        &mut self.nodes[id.0]
    }

    /// All nodes in build (pre-order) sequence
    pub fn iter(&self) -> impl Iterator<Item = &SchemaNode> {
        self.nodes.iter()
    }

    /// Exact pointer lookup
    pub fn find(&self, pointer: &str) -> Option<NodeId> {
        self.index.get(pointer).copied()
    }

    /// Number of schema ancestors above a node (the root has zero).
    pub fn ancestor_depth(&self, id: NodeId) -> usize {
        let mut depth = 0;
        let mut current = self.node(id).parent;
        while let Some(parent) = current {
            depth += 1;
            current = self.node(parent).parent;
        }
        depth
    }

    /// Depth-first pre-order walk: node, properties, items, oneOf,
    /// anyOf, allOf, not.
    pub fn walk_order(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        if !self.nodes.is_empty() {
            self.walk_into(self.root(), &mut order);
        }
        order
    }

    fn walk_into(&self, id: NodeId, order: &mut Vec<NodeId>) {
        order.push(id);
        let node = self.node(id);
        let mut children: Vec<NodeId> = Vec::new();
        children.extend(node.properties.iter().map(|(_, id)| *id));
        match &node.items {
            Items::Missing => {}
            Items::Single(item) => children.push(*item),
            Items::Tuple(items) => children.extend(items.iter().copied()),
        }
        children.extend(node.one_of.iter().copied());
        children.extend(node.any_of.iter().copied());
        children.extend(node.all_of.iter().copied());
        children.extend(node.not.iter().copied());
        for child in children {
            self.walk_into(child, order);
        }
    }

    /// Resolve an absolute pointer in schema space.
    ///
    /// Property segments descend into `properties`; a numeric segment
    /// or `-` descends into the item schema (by position for tuples);
    /// `oneOf`/`anyOf`/`allOf` followed by an index select a combinator
    /// branch; `not` selects the negated branch.
    pub fn resolve_schema(&self, pointer: &str) -> Option<NodeId> {
        if let Some(found) = self.find(pointer) {
            return Some(found);
        }
        let segs = pointer::segments(pointer)?;
        let mut current = self.root();
        let mut i = 0;
        while i < segs.len() {
            let seg = pointer::unescape_segment(&segs[i]);
            let node = self.node(current);
            if let Some((_, child)) = node.properties.iter().find(|(name, _)| *name == seg) {
                current = *child;
            } else if seg == "not" {
                current = node.not?;
            } else if matches!(seg.as_str(), "oneOf" | "anyOf" | "allOf") {
                let branch_index: usize = segs.get(i + 1)?.parse().ok()?;
                let branches = match seg.as_str() {
                    "oneOf" => &node.one_of,
                    "anyOf" => &node.any_of,
                    _ => &node.all_of,
                };
                current = *branches.get(branch_index)?;
                i += 1;
            } else if seg == "-" || seg.bytes().all(|b| b.is_ascii_digit()) {
                current = match &node.items {
                    Items::Single(item) => *item,
                    Items::Tuple(items) if seg != "-" => {
                        *items.get(seg.parse::<usize>().ok()?)?
                    }
                    _ => return None,
                };
            } else {
                return None;
            }
            i += 1;
        }
        Some(current)
    }

    /// Reassemble the (upgraded) schema document from the tree.
    ///
    /// Structural keywords are rebuilt from the child nodes, so the
    /// result reflects every upgrade rewrite at every depth.
    pub fn to_document(&self) -> Value {
        if self.nodes.is_empty() {
            return Value::Object(Map::new());
        }
        self.node_document(self.root())
    }

    fn node_document(&self, id: NodeId) -> Value {
        let node = self.node(id);
        let mut doc = node.raw.clone();

        if !node.properties.is_empty() {
            let mut properties = Map::new();
            for (name, child) in &node.properties {
                properties.insert(name.clone(), self.node_document(*child));
            }
            doc.insert("properties".to_string(), Value::Object(properties));
        }

        match &node.items {
            Items::Missing => {}
            Items::Single(item) => {
                doc.insert("items".to_string(), self.node_document(*item));
            }
            Items::Tuple(entries) => {
                let rebuilt: Vec<Value> =
                    entries.iter().map(|e| self.node_document(*e)).collect();
                // Tuple schemas always serialize under the modern spelling
                if matches!(doc.get("items"), Some(Value::Array(_))) {
                    doc.remove("items");
                }
                doc.insert("prefixItems".to_string(), Value::Array(rebuilt));
            }
        }

        for (keyword, branches) in [
            ("oneOf", &node.one_of),
            ("anyOf", &node.any_of),
            ("allOf", &node.all_of),
        ] {
            if !branches.is_empty() {
                let rebuilt: Vec<Value> =
                    branches.iter().map(|b| self.node_document(*b)).collect();
                doc.insert(keyword.to_string(), Value::Array(rebuilt));
            }
        }

        if let Some(not) = node.not {
            doc.insert("not".to_string(), self.node_document(not));
        }

        Value::Object(doc)
    }

    /// Resolve a pointer (absolute or relative) in schema space,
    /// evaluated at `at`.
    pub fn resolve_schema_at(&self, at: NodeId, pointer: &str) -> Option<NodeId> {
        if pointer::is_relative(pointer) {
            let base = self.node(at).pointer.clone();
            let absolute = pointer::relative_to_absolute(&base, pointer)?;
            self.resolve_schema(&absolute)
        } else {
            self.resolve_schema(pointer)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::build_tree;
    use serde_json::json;

    fn tree() -> SchemaTree {
        build_tree(&json!({
            "type": "object",
            "properties": {
                "a": {"type": "object", "properties": {"b": {"type": "string"}}},
                "list": {"type": "array", "items": {"type": "number"}}
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_find_by_pointer() {
        let tree = tree();
        assert!(tree.find("/a/b").is_some());
        assert!(tree.find("/a/x").is_none());
        assert_eq!(tree.find(""), Some(tree.root()));
    }

    #[test]
    fn test_resolve_schema_through_items() {
        let tree = tree();
        let item = tree.find("/list/-").unwrap();
        assert_eq!(tree.resolve_schema("/list/-"), Some(item));
        // Numeric data-shaped segments land on the item schema too
        assert_eq!(tree.resolve_schema("/list/0"), Some(item));
        assert_eq!(tree.resolve_schema("/list/7"), Some(item));
    }

    #[test]
    fn test_resolve_schema_relative() {
        let tree = tree();
        let b = tree.find("/a/b").unwrap();
        let list = tree.find("/list").unwrap();
        assert_eq!(tree.resolve_schema_at(b, "1/list"), Some(list));
        assert_eq!(tree.resolve_schema_at(b, "0"), Some(b));
    }

    #[test]
    fn test_ancestor_depth() {
        let tree = tree();
        assert_eq!(tree.ancestor_depth(tree.root()), 0);
        assert_eq!(tree.ancestor_depth(tree.find("/a/b").unwrap()), 2);
    }

    #[test]
    fn test_accessor_defaults() {
        let tree = tree();
        let node = tree.node(tree.find("/a/b").unwrap());
        let sb = Sandbox::empty();
        assert_eq!(node.visible(&sb), Some(true));
        assert_eq!(node.readonly(&sb), Some(false));
        assert_eq!(node.required_if(&sb), Some(false));
        assert_eq!(node.filter(&sb), Some(true));
        assert_eq!(node.case(&sb), Some(true));
        assert_eq!(node.dynamic(&sb), Value::Null);
        assert_eq!(node.summary(&sb), "");
    }

    #[test]
    fn test_add_tracker_dedupes() {
        let mut tree = tree();
        let id = tree.find("/a/b").unwrap();
        tree.node_mut(id).add_tracker("/x".to_string());
        tree.node_mut(id).add_tracker("/x".to_string());
        tree.node_mut(id).add_tracker("/y".to_string());
        assert_eq!(tree.node(id).trackers(), &["/x", "/y"]);
    }

    #[test]
    fn test_view_fields() {
        let tree = tree();
        let view = tree.node(tree.find("/a/b").unwrap()).view();
        assert_eq!(view["pointer"], "/a/b");
        assert_eq!(view["basetype"], "string");
        assert_eq!(view["nullAllowed"], false);
    }
}

//! Dependency tracker graph
//!
//! While expressions compile, every resolvable pointer back-reference
//! adds an edge tracked-pointer → dependent-pointer, mirrored into the
//! tracked node's `trackers` list. The table is owned by the compiler
//! instance — never module-level state — and after the whole tree
//! compiles one cycle-breaking pass runs and the table is discarded.
//!
//! Cycle breaking deletes exactly the edges that close a cycle: a DFS
//! with a recursion stack prunes every back edge from its source node's
//! `trackers`, logging a warning naming both pointers.

use std::collections::BTreeMap;

use crate::observability::{Diagnostic, Logger};
use crate::schema::SchemaTree;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Grey,
    Black,
}

/// One-shot pointer → dependents table for a single compilation.
#[derive(Debug, Default)]
pub struct TrackerTable {
    edges: BTreeMap<String, Vec<String>>,
}

impl TrackerTable {
    /// An empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `dependent` must be notified when `tracked` changes.
    pub fn add_edge(&mut self, tracked: &str, dependent: &str) {
        let targets = self.edges.entry(tracked.to_string()).or_default();
        if !targets.iter().any(|t| t == dependent) {
            targets.push(dependent.to_string());
        }
    }

    /// Number of tracked pointers
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// Whether the table holds no edges
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Break every cycle in the graph, pruning the closing edges from
    /// both the table and the tree nodes' `trackers` lists.
    ///
    /// Returns one warning diagnostic per pruned edge. After this
    /// returns, following `trackers` from any node terminates.
    pub fn break_cycles(&mut self, tree: &mut SchemaTree) -> Vec<Diagnostic> {
        let mut colors: BTreeMap<String, Color> = BTreeMap::new();
        let mut warnings = Vec::new();

        let roots: Vec<String> = self.edges.keys().cloned().collect();
        for root in roots {
            if colors.get(&root).copied().unwrap_or(Color::White) == Color::White {
                self.visit(&root, &mut colors, tree, &mut warnings);
            }
        }
        warnings
    }

    fn visit(
        &mut self,
        current: &str,
        colors: &mut BTreeMap<String, Color>,
        tree: &mut SchemaTree,
        warnings: &mut Vec<Diagnostic>,
    ) {
        colors.insert(current.to_string(), Color::Grey);

        let targets = self.edges.get(current).cloned().unwrap_or_default();
        for target in targets {
            match colors.get(&target).copied().unwrap_or(Color::White) {
                Color::Grey => self.prune(current, &target, tree, warnings),
                Color::White => self.visit(&target, colors, tree, warnings),
                Color::Black => {}
            }
        }

        colors.insert(current.to_string(), Color::Black);
    }

    /// Delete the edge `tracked` → `dependent`.
    fn prune(
        &mut self,
        tracked: &str,
        dependent: &str,
        tree: &mut SchemaTree,
        warnings: &mut Vec<Diagnostic>,
    ) {
        if let Some(targets) = self.edges.get_mut(tracked) {
            targets.retain(|t| t != dependent);
        }
        if let Some(id) = tree.find(tracked) {
            tree.node_mut(id).trackers.retain(|t| t != dependent);
        }
        Logger::warn(
            "TRACKER_CYCLE_BROKEN",
            &[("dependent", dependent), ("tracked", tracked)],
        );
        warnings.push(Diagnostic::warning(
            tracked,
            "trackers",
            format!(
                "dependency cycle broken: dropped notification of '{}'",
                dependent
            ),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::build_tree;
    use serde_json::json;

    fn three_node_tree() -> SchemaTree {
        build_tree(&json!({
            "type": "object",
            "properties": {
                "a": {"type": "string"},
                "b": {"type": "string"},
                "c": {"type": "string"}
            }
        }))
        .unwrap()
    }

    fn install(tree: &mut SchemaTree, table: &mut TrackerTable, tracked: &str, dependent: &str) {
        table.add_edge(tracked, dependent);
        let id = tree.find(tracked).unwrap();
        tree.node_mut(id).add_tracker(dependent.to_string());
    }

    #[test]
    fn test_add_edge_dedupes() {
        let mut table = TrackerTable::new();
        table.add_edge("/a", "/b");
        table.add_edge("/a", "/b");
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_acyclic_graph_untouched() {
        let mut tree = three_node_tree();
        let mut table = TrackerTable::new();
        install(&mut tree, &mut table, "/a", "/b");
        install(&mut tree, &mut table, "/b", "/c");

        let warnings = table.break_cycles(&mut tree);
        assert!(warnings.is_empty());
        assert_eq!(tree.node(tree.find("/a").unwrap()).trackers(), &["/b"]);
        assert_eq!(tree.node(tree.find("/b").unwrap()).trackers(), &["/c"]);
    }

    #[test]
    fn test_three_node_cycle_loses_exactly_one_edge() {
        let mut tree = three_node_tree();
        let mut table = TrackerTable::new();
        install(&mut tree, &mut table, "/a", "/b");
        install(&mut tree, &mut table, "/b", "/c");
        install(&mut tree, &mut table, "/c", "/a");

        let warnings = table.break_cycles(&mut tree);
        assert_eq!(warnings.len(), 1);

        let remaining: usize = ["/a", "/b", "/c"]
            .iter()
            .map(|p| tree.node(tree.find(p).unwrap()).trackers().len())
            .sum();
        assert_eq!(remaining, 2);

        // Following trackers from any node terminates
        for start in ["/a", "/b", "/c"] {
            let mut seen = vec![start.to_string()];
            let mut current = start.to_string();
            loop {
                let node = tree.node(tree.find(&current).unwrap());
                match node.trackers().first() {
                    Some(next) => {
                        assert!(!seen.contains(next), "cycle survived at {}", next);
                        seen.push(next.clone());
                        current = next.clone();
                    }
                    None => break,
                }
            }
        }
    }

    #[test]
    fn test_self_cycle_pruned() {
        let mut tree = three_node_tree();
        let mut table = TrackerTable::new();
        install(&mut tree, &mut table, "/a", "/a");

        let warnings = table.break_cycles(&mut tree);
        assert_eq!(warnings.len(), 1);
        assert!(tree.node(tree.find("/a").unwrap()).trackers().is_empty());
    }

    #[test]
    fn test_two_independent_cycles() {
        let mut tree = three_node_tree();
        let mut table = TrackerTable::new();
        install(&mut tree, &mut table, "/a", "/b");
        install(&mut tree, &mut table, "/b", "/a");
        install(&mut tree, &mut table, "/c", "/c");

        let warnings = table.break_cycles(&mut tree);
        assert_eq!(warnings.len(), 2);
    }
}

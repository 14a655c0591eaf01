//! Pathfinding and target resolution (spec.md §4.3). Dijkstra via a small
//! binary heap — no graph-library dependency, matching the fact that
//! none of the example repos reach for one for a bespoke graph shape.

use navplane_core::{Action, Edge, EdgeId, Error, Node, NodeId, Result};
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};

use crate::model::{Graph, GraphEdge};

#[derive(Clone)]
pub struct PathStep {
    pub edge: GraphEdge,
}

#[derive(Clone)]
pub struct Path {
    pub steps: Vec<PathStep>,
}

impl Path {
    pub fn total_weight(&self) -> u32 {
        self.steps.iter().map(|s| s.edge.weight).sum()
    }
}

#[derive(Eq, PartialEq)]
struct HeapEntry {
    cost: u32,
    node: NodeId,
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other.cost.cmp(&self.cost)
    }
}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Dijkstra shortest path between two nodes already known in the graph
/// (spec.md §4.3). Returns `Error::PathNotFound` when no route exists.
pub fn shortest_path(graph: &Graph, from: &NodeId, to: &NodeId) -> Result<Path> {
    if from == to {
        return Ok(Path { steps: vec![] });
    }

    let mut dist: HashMap<NodeId, u32> = HashMap::new();
    let mut prev: HashMap<NodeId, GraphEdge> = HashMap::new();
    let mut heap = BinaryHeap::new();

    dist.insert(from.clone(), 0);
    heap.push(HeapEntry { cost: 0, node: from.clone() });

    while let Some(HeapEntry { cost, node }) = heap.pop() {
        if &node == to {
            break;
        }
        if cost > *dist.get(&node).unwrap_or(&u32::MAX) {
            continue;
        }
        for edge in graph.edges_from(&node) {
            let next_cost = cost + edge.weight;
            if next_cost < *dist.get(&edge.target).unwrap_or(&u32::MAX) {
                dist.insert(edge.target.clone(), next_cost);
                prev.insert(edge.target.clone(), edge.clone());
                heap.push(HeapEntry { cost: next_cost, node: edge.target.clone() });
            }
        }
    }

    if !dist.contains_key(to) {
        return Err(Error::PathNotFound {
            from: from.to_string(),
            to: to.to_string(),
        });
    }

    let mut steps = Vec::new();
    let mut current = to.clone();
    while &current != from {
        let edge = prev
            .get(&current)
            .cloned()
            .ok_or_else(|| Error::PathNotFound { from: from.to_string(), to: to.to_string() })?;
        current = edge.source.clone();
        steps.push(PathStep { edge });
    }
    steps.reverse();
    Ok(Path { steps })
}

/// Resolve a user-facing target label to a single node id (spec.md §4.3).
/// Errors with `AmbiguousTarget` if more than one node shares the label,
/// case-insensitively.
pub fn resolve_target_label(graph: &Graph, label: &str) -> Result<NodeId> {
    let matches: Vec<&NodeId> = graph
        .nodes
        .values()
        .filter(|n| n.label.eq_ignore_ascii_case(label))
        .map(|n| &n.node_id)
        .collect();

    match matches.len() {
        0 => Err(Error::PathNotFound { from: "?".to_string(), to: label.to_string() }),
        1 => Ok(matches[0].clone()),
        _ => Err(Error::AmbiguousTarget(label.to_string())),
    }
}

/// Pick a single entry point to start a path from (spec.md §4.3). Errors
/// with `NoEntryPoint` if the graph has none.
pub fn pick_entry_point(graph: &Graph) -> Result<NodeId> {
    graph.entry_points().into_iter().next().ok_or(Error::NoEntryPoint)
}

/// One action set selected into a tree's KPI validation sequence.
#[derive(Clone, Debug)]
pub struct ValidationStep {
    pub edge_id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
    pub label: String,
    pub actions: Vec<Action>,
    pub is_reverse: bool,
}

/// Validation-sequence helper (spec.md §4.3): given a tree's raw nodes and
/// edges, produce an ordered list of action sets such that every unique
/// action-set label with an associated KPI reference (a non-empty
/// `kpi_references`, or `use_verifications_for_kpi` paired with the
/// destination node's verifications) appears exactly once, forward
/// direction preferred over reverse. Seeds batch edge validation by an
/// external runner.
pub fn validation_sequence(nodes: &[Node], edges: &[Edge]) -> Vec<ValidationStep> {
    let nodes_by_id: HashMap<&NodeId, &Node> = nodes.iter().map(|n| (&n.node_id, n)).collect();

    let mut forward = Vec::new();
    let mut reverse = Vec::new();

    for edge in edges {
        for (index, set) in edge.action_sets.iter().enumerate() {
            if set.label.is_empty() {
                continue;
            }
            let is_reverse = index == 1;
            let (source, target) = if is_reverse {
                (edge.target_node_id.clone(), edge.source_node_id.clone())
            } else {
                (edge.source_node_id.clone(), edge.target_node_id.clone())
            };

            let has_kpi = !set.kpi_references.is_empty()
                || (set.use_verifications_for_kpi
                    && nodes_by_id.get(&target).map(|n| !n.verifications.is_empty()).unwrap_or(false));
            if !has_kpi {
                continue;
            }

            let step = ValidationStep {
                edge_id: edge.edge_id.clone(),
                source,
                target,
                label: set.label.clone(),
                actions: set.actions.clone(),
                is_reverse,
            };
            if is_reverse {
                reverse.push(step);
            } else {
                forward.push(step);
            }
        }
    }

    let mut seen_labels: HashSet<String> = HashSet::new();
    forward
        .into_iter()
        .chain(reverse)
        .filter(|step| seen_labels.insert(step.label.clone()))
        .collect()
}

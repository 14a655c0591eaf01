//! Tree and unified graph construction (spec.md §4.2), grounded exactly in
//! `navigation_graph.py`'s `create_networkx_graph` /
//! `create_unified_networkx_graph` / `_create_sibling_shortcuts`.

use navplane_core::{Edge, EdgeType, Error, Node, NodeId, Result, TreeId};
use std::collections::HashMap;

use crate::model::{Graph, GraphEdge};

/// Build one tree's navigable graph from its raw nodes/edges
/// (`create_networkx_graph` in the original).
pub fn build_tree_graph(nodes: Vec<Node>, edges: Vec<Edge>) -> Result<Graph> {
    let mut graph = Graph::new();
    for node in nodes {
        graph.add_node(node);
    }

    for edge in &edges {
        if !edge.action_sets.is_empty() && edge.default_action_set_id.is_none() {
            return Err(Error::NavigationTree(format!(
                "edge {} has action_sets but no default_action_set_id",
                edge.edge_id
            )));
        }
    }

    for edge in &edges {
        for resolved in resolve_edge(edge, &edges) {
            graph.add_edge(resolved);
        }
    }

    Ok(graph)
}

/// Resolve one raw `Edge` into zero, one, or two `GraphEdge`s (forward
/// and/or reverse), following `create_networkx_graph`'s inclusion rules.
fn resolve_edge(edge: &Edge, all_edges: &[Edge]) -> Vec<GraphEdge> {
    // An edge with no action sets at all (distinct from one action set with
    // empty actions) is still added as a forward placeholder — the
    // initial-setup use case where actions haven't been authored yet.
    if edge.action_sets.is_empty() {
        return vec![GraphEdge {
            edge_id: edge.edge_id.clone(),
            source: edge.source_node_id.clone(),
            target: edge.target_node_id.clone(),
            actions: vec![],
            weight: 1,
            edge_type: edge.edge_type,
            tree_id: None,
            is_virtual: false,
            is_conditional: false,
        }];
    }

    let default_set = edge.default_action_set();
    let has_forward_actions = default_set.map(|s| !s.actions.is_empty()).unwrap_or(false);
    let has_reverse_actions = edge
        .action_sets
        .get(1)
        .map(|s| !s.actions.is_empty())
        .unwrap_or(false);

    let is_conditional_edge = all_edges.iter().any(|other| {
        other.edge_id != edge.edge_id
            && other.source_node_id == edge.source_node_id
            && other.default_action_set_id == edge.default_action_set_id
            && other.default_action_set_id.is_some()
            && other.target_node_id != edge.target_node_id
    });

    if !has_forward_actions && !has_reverse_actions && !is_conditional_edge {
        return vec![];
    }

    let mut out = Vec::with_capacity(2);

    if has_forward_actions || is_conditional_edge {
        // "first sibling wins": a conditional edge with no actions of its
        // own borrows the first sibling's actions that has any.
        let actions = if has_forward_actions {
            default_set.map(|s| s.actions.clone()).unwrap_or_default()
        } else {
            all_edges
                .iter()
                .filter(|other| {
                    other.source_node_id == edge.source_node_id
                        && other.default_action_set_id == edge.default_action_set_id
                })
                .find_map(|other| other.default_action_set().filter(|s| !s.actions.is_empty()))
                .map(|s| s.actions.clone())
                .unwrap_or_default()
        };
        out.push(GraphEdge {
            edge_id: edge.edge_id.clone(),
            source: edge.source_node_id.clone(),
            target: edge.target_node_id.clone(),
            actions,
            weight: 1,
            edge_type: edge.edge_type,
            tree_id: None,
            is_virtual: false,
            is_conditional: is_conditional_edge,
        });
    }

    if has_reverse_actions {
        let actions = edge.action_sets[1].actions.clone();
        out.push(GraphEdge {
            edge_id: format!("{}_reverse", edge.edge_id).into(),
            source: edge.target_node_id.clone(),
            target: edge.source_node_id.clone(),
            actions,
            weight: 1,
            edge_type: edge.edge_type,
            tree_id: None,
            is_virtual: false,
            is_conditional: false,
        });
    }

    out
}

/// One loaded tree's raw data, keyed for unified-graph stitching.
#[derive(Clone, Debug)]
pub struct TreeData {
    pub tree_id: TreeId,
    pub parent_tree_id: Option<TreeId>,
    pub parent_node_id: Option<NodeId>,
    pub tree_depth: u32,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

/// Build the unified graph across every tree in a userinterface's
/// hierarchy (`create_unified_networkx_graph` in the original): per-tree
/// graphs, tagged with their tree_id, stitched with `ENTER_SUBTREE`/
/// `EXIT_SUBTREE` virtual edges at parent_node_id boundaries, then
/// decorated with sibling shortcuts.
pub fn build_unified_graph(trees: Vec<TreeData>) -> Result<Graph> {
    let mut unified = Graph::new();
    let mut entry_point_by_tree: HashMap<TreeId, NodeId> = HashMap::new();

    for tree in &trees {
        let tree_graph = build_tree_graph(tree.nodes.clone(), tree.edges.clone())?;
        for (node_id, mut node) in tree_graph.nodes {
            if node.is_entry_point() {
                entry_point_by_tree.entry(tree.tree_id.clone()).or_insert_with(|| node_id.clone());
            } else if !entry_point_by_tree.contains_key(&tree.tree_id) {
                // fall back to the tree's first node if none is marked (original_source: "else first node of that tree")
            }
            node.strip_temp_suffix();
            unified.add_node(node);
        }
        for bucket in tree_graph.forward.values() {
            for mut edge in bucket.clone() {
                edge.tree_id = Some(tree.tree_id.clone());
                unified.add_edge(edge);
            }
        }
        if !entry_point_by_tree.contains_key(&tree.tree_id) {
            if let Some(first) = tree.nodes.first() {
                entry_point_by_tree.insert(tree.tree_id.clone(), first.node_id.clone());
            }
        }
    }

    for tree in &trees {
        let (Some(parent_tree_id), Some(parent_node_id)) =
            (tree.parent_tree_id.clone(), tree.parent_node_id.clone())
        else {
            continue;
        };
        let Some(child_entry) = entry_point_by_tree.get(&tree.tree_id).cloned() else {
            continue;
        };

        unified.add_edge(GraphEdge {
            edge_id: format!("enter_subtree_{}_{}", parent_node_id, tree.tree_id).into(),
            source: parent_node_id.clone(),
            target: child_entry.clone(),
            actions: vec![navplane_core::Action::new(
                "enter_subtree",
                serde_json::json!({ "tree_id": tree.tree_id.as_str() }),
            )],
            weight: 1,
            edge_type: EdgeType::EnterSubtree,
            tree_id: Some(tree.tree_id.clone()),
            is_virtual: true,
            is_conditional: false,
        });

        unified.add_edge(GraphEdge {
            edge_id: format!("exit_subtree_{}_{}", tree.tree_id, parent_node_id).into(),
            source: child_entry,
            target: parent_node_id,
            actions: vec![navplane_core::Action::new(
                "exit_subtree",
                serde_json::json!({ "tree_id": parent_tree_id.as_str() }),
            )],
            weight: 1,
            edge_type: EdgeType::ExitSubtree,
            tree_id: Some(parent_tree_id),
            is_virtual: true,
            is_conditional: false,
        });
    }

    add_sibling_shortcuts(&mut unified, &trees);

    Ok(unified)
}

/// `_create_sibling_shortcuts` in the original: for every parent node with
/// two or more children whose connecting edge opts in via
/// `enable_sibling_shortcuts`, add a bidirectional shortcut edge between
/// every pair of such siblings that doesn't already have a direct edge.
fn add_sibling_shortcuts(graph: &mut Graph, trees: &[TreeData]) {
    let mut parent_children: HashMap<NodeId, Vec<(NodeId, Edge)>> = HashMap::new();

    for tree in trees {
        for edge in &tree.edges {
            if edge.sibling_shortcuts_enabled() {
                parent_children
                    .entry(edge.source_node_id.clone())
                    .or_default()
                    .push((edge.target_node_id.clone(), edge.clone()));
            }
        }
    }

    for (_parent, children) in parent_children {
        if children.len() < 2 {
            continue;
        }
        for i in 0..children.len() {
            for j in 0..children.len() {
                if i == j {
                    continue;
                }
                let (target_a, template) = &children[i];
                let (target_b, _) = &children[j];
                if graph.forward.get(target_a).map(|v| v.iter().any(|e| &e.target == target_b)).unwrap_or(false) {
                    continue;
                }
                graph.add_edge(GraphEdge {
                    edge_id: format!("shortcut_{}_{}", target_a, target_b).into(),
                    source: target_a.clone(),
                    target: target_b.clone(),
                    actions: template
                        .default_action_set()
                        .map(|s| s.actions.clone())
                        .unwrap_or_default(),
                    weight: 1,
                    edge_type: EdgeType::SiblingShortcut,
                    tree_id: None,
                    is_virtual: false,
                    is_conditional: false,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use navplane_core::{Action, ActionSet, NodeType, Position, Verification, VerificationPassCondition};

    fn plain_node(id: &str, label: &str, node_type: NodeType) -> Node {
        Node {
            node_id: id.into(),
            label: label.to_string(),
            node_type,
            position: Position::default(),
            data: serde_json::Value::Null,
            verifications: Vec::<Verification>::new(),
            verification_pass_condition: VerificationPassCondition::All,
            child_tree_id: None,
        }
    }

    fn set_with_actions(id: &str, commands: &[&str]) -> ActionSet {
        ActionSet {
            id: id.into(),
            label: String::new(),
            actions: commands.iter().map(|c| Action::new(*c, serde_json::Value::Null)).collect(),
            retry_actions: vec![],
            failure_actions: vec![],
            kpi_references: vec![],
            use_verifications_for_kpi: false,
            enable_sibling_shortcuts: false,
        }
    }

    #[test]
    fn edge_with_no_actions_and_not_conditional_is_skipped() {
        let nodes = vec![plain_node("a", "A", NodeType::Entry), plain_node("b", "B", NodeType::Screen)];
        let edge = Edge {
            edge_id: "e1".into(),
            source_node_id: "a".into(),
            target_node_id: "b".into(),
            action_sets: vec![set_with_actions("s1", &[])],
            default_action_set_id: Some("s1".into()),
            final_wait_time: 2000,
            edge_type: EdgeType::Navigation,
            enable_sibling_shortcuts: false,
            data: serde_json::Value::Null,
        };
        let graph = build_tree_graph(nodes, vec![edge]).unwrap();
        assert!(graph.edges_from(&"a".into()).is_empty());
    }

    #[test]
    fn edge_with_forward_and_reverse_actions_adds_both_directions() {
        let nodes = vec![plain_node("a", "A", NodeType::Entry), plain_node("b", "B", NodeType::Screen)];
        let edge = Edge {
            edge_id: "e1".into(),
            source_node_id: "a".into(),
            target_node_id: "b".into(),
            action_sets: vec![set_with_actions("s1", &["select"]), set_with_actions("s2", &["back"])],
            default_action_set_id: Some("s1".into()),
            final_wait_time: 2000,
            edge_type: EdgeType::Navigation,
            enable_sibling_shortcuts: false,
            data: serde_json::Value::Null,
        };
        let graph = build_tree_graph(nodes, vec![edge]).unwrap();
        assert_eq!(graph.edges_from(&"a".into()).len(), 1);
        assert_eq!(graph.edges_from(&"b".into()).len(), 1);
        assert_eq!(graph.edges_from(&"b".into())[0].edge_id.as_str(), "e1_reverse");
    }

    #[test]
    fn edge_with_no_action_sets_is_added_as_placeholder() {
        let nodes = vec![plain_node("a", "A", NodeType::Entry), plain_node("b", "B", NodeType::Screen)];
        let edge = Edge {
            edge_id: "e1".into(),
            source_node_id: "a".into(),
            target_node_id: "b".into(),
            action_sets: vec![],
            default_action_set_id: None,
            final_wait_time: 2000,
            edge_type: EdgeType::Navigation,
            enable_sibling_shortcuts: false,
            data: serde_json::Value::Null,
        };
        let graph = build_tree_graph(nodes, vec![edge]).unwrap();
        let edges = graph.edges_from(&"a".into());
        assert_eq!(edges.len(), 1);
        assert!(edges[0].actions.is_empty());
        assert_eq!(edges[0].target.as_str(), "b");
    }

    #[test]
    fn conditional_edge_without_own_actions_borrows_first_sibling() {
        let nodes = vec![
            plain_node("a", "A", NodeType::Entry),
            plain_node("b", "B", NodeType::Screen),
            plain_node("c", "C", NodeType::Screen),
        ];
        let edge_with_actions = Edge {
            edge_id: "e1".into(),
            source_node_id: "a".into(),
            target_node_id: "b".into(),
            action_sets: vec![set_with_actions("shared", &["select"])],
            default_action_set_id: Some("shared".into()),
            final_wait_time: 2000,
            edge_type: EdgeType::Navigation,
            enable_sibling_shortcuts: false,
            data: serde_json::Value::Null,
        };
        let conditional_edge = Edge {
            edge_id: "e2".into(),
            source_node_id: "a".into(),
            target_node_id: "c".into(),
            action_sets: vec![set_with_actions("shared", &[])],
            default_action_set_id: Some("shared".into()),
            final_wait_time: 2000,
            edge_type: EdgeType::Navigation,
            enable_sibling_shortcuts: false,
            data: serde_json::Value::Null,
        };
        let graph = build_tree_graph(nodes, vec![edge_with_actions, conditional_edge]).unwrap();
        let edges = graph.edges_from(&"a".into());
        assert_eq!(edges.len(), 2);
        let to_c = edges.iter().find(|e| e.target.as_str() == "c").unwrap();
        assert_eq!(to_c.actions.len(), 1);
        assert_eq!(to_c.actions[0].command, "select");
        assert!(to_c.is_conditional);
    }

    #[test]
    fn missing_default_action_set_id_with_action_sets_errors() {
        let nodes = vec![plain_node("a", "A", NodeType::Entry), plain_node("b", "B", NodeType::Screen)];
        let edge = Edge {
            edge_id: "e1".into(),
            source_node_id: "a".into(),
            target_node_id: "b".into(),
            action_sets: vec![set_with_actions("s1", &["select"])],
            default_action_set_id: None,
            final_wait_time: 2000,
            edge_type: EdgeType::Navigation,
            enable_sibling_shortcuts: false,
            data: serde_json::Value::Null,
        };
        assert!(build_tree_graph(nodes, vec![edge]).is_err());
    }
}

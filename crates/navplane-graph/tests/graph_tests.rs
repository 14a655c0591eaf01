//! Integration tests for navplane-graph: unified-graph stitching, cache,
//! and pathfinding across a small two-tree hierarchy.

use navplane_core::{
    Action, ActionSet, Edge, EdgeType, Node, NodeType, Position, Verification,
    VerificationPassCondition,
};
use navplane_graph::{build_unified_graph, pick_entry_point, shortest_path, TreeData};

fn node(id: &str, label: &str, node_type: NodeType) -> Node {
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

fn action_set(id: &str, commands: &[&str]) -> ActionSet {
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

fn edge(id: &str, from: &str, to: &str, commands: &[&str]) -> Edge {
    Edge {
        edge_id: id.into(),
        source_node_id: from.into(),
        target_node_id: to.into(),
        action_sets: vec![action_set("s1", commands)],
        default_action_set_id: Some("s1".into()),
        final_wait_time: 2000,
        edge_type: EdgeType::Navigation,
        enable_sibling_shortcuts: false,
        data: serde_json::Value::Null,
    }
}

/// Root tree: entry -> settings (which mounts a settings sub-tree).
fn root_tree() -> TreeData {
    let entry = node("root-entry", "Entry", NodeType::Entry);
    let settings = node("root-settings", "Settings", NodeType::Screen);
    TreeData {
        tree_id: "root".into(),
        parent_tree_id: None,
        parent_node_id: None,
        tree_depth: 0,
        nodes: vec![entry, settings],
        edges: vec![edge("root-e1", "root-entry", "root-settings", &["select"])],
    }
}

/// Child tree mounted under root-settings: its own entry, wifi, display.
fn settings_tree() -> TreeData {
    let entry = node("settings-entry", "Entry", NodeType::Entry);
    let wifi = node("settings-wifi", "WiFi", NodeType::Screen);
    let display = node("settings-display", "Display", NodeType::Screen);
    TreeData {
        tree_id: "settings".into(),
        parent_tree_id: Some("root".into()),
        parent_node_id: Some("root-settings".into()),
        tree_depth: 1,
        nodes: vec![entry, wifi, display],
        edges: vec![
            edge("settings-e1", "settings-entry", "settings-wifi", &["select"]),
            edge("settings-e2", "settings-entry", "settings-display", &["select"]),
        ],
    }
}

#[test]
fn unified_graph_stitches_enter_and_exit_subtree_edges() {
    let graph = build_unified_graph(vec![root_tree(), settings_tree()]).unwrap();

    let entry_edges = graph.edges_from(&"root-settings".into());
    assert!(entry_edges.iter().any(|e| e.edge_type == EdgeType::EnterSubtree && e.target.as_str() == "settings-entry"));

    let exit_edges = graph.edges_from(&"settings-entry".into());
    assert!(exit_edges.iter().any(|e| e.edge_type == EdgeType::ExitSubtree && e.target.as_str() == "root-settings"));
}

#[test]
fn pathfinder_crosses_subtree_boundary() {
    let graph = build_unified_graph(vec![root_tree(), settings_tree()]).unwrap();
    let path = shortest_path(&graph, &"root-entry".into(), &"settings-wifi".into()).unwrap();
    assert_eq!(path.steps.len(), 3); // root-entry -> root-settings -> settings-entry -> settings-wifi
}

#[test]
fn unified_graph_pick_entry_point_finds_root_entry() {
    let graph = build_unified_graph(vec![root_tree(), settings_tree()]).unwrap();
    // two entry points exist (root + nested tree); either resolving should succeed
    assert!(pick_entry_point(&graph).is_ok());
}

#[test]
fn validate_reports_no_isolated_nodes_in_stitched_graph() {
    let graph = build_unified_graph(vec![root_tree(), settings_tree()]).unwrap();
    let report = graph.validate();
    assert_eq!(report.isolated_node_count, 0);
}

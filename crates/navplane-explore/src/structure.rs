//! Phase 2a: structure creation (spec.md §4.5), grounded in
//! `phases/structure_creator.py`. Builds the node/edge set for the
//! selected items against the already-existing start node, for both the
//! click strategies (a flat fan-out of screen nodes) and the dpad strategy
//! (a dual-layer structure: Row 1 is a horizontal strip split into a left
//! arm and a right arm around the start node, each subsequent row chained
//! onto the previous row's last focus node by DOWN/UP), each focus node
//! optionally paired with a screen node reached by OK/BACK.

use navplane_core::{Action, ActionSet, Edge, EdgeType, Node, NodeId, NodeType, Position};

use crate::context::Strategy;
use crate::sanitize::temp_label;

fn remote_action(command: &str, params: serde_json::Value) -> Action {
    let mut action = Action::new(command, params);
    action.action_type = "remote".to_string();
    action
}

fn action_set(id: &str, actions: Vec<Action>) -> ActionSet {
    ActionSet {
        id: id.into(),
        label: String::new(),
        actions,
        retry_actions: vec![],
        failure_actions: vec![],
        kpi_references: vec![],
        use_verifications_for_kpi: false,
        enable_sibling_shortcuts: false,
    }
}

fn edge(id: String, source: &str, target: &str, forward: Action, reverse: Action) -> Edge {
    Edge {
        edge_id: id.into(),
        source_node_id: source.into(),
        target_node_id: target.into(),
        action_sets: vec![action_set("forward", vec![forward]), action_set("reverse", vec![reverse])],
        default_action_set_id: Some("forward".into()),
        final_wait_time: 2000,
        edge_type: EdgeType::Navigation,
        enable_sibling_shortcuts: false,
        data: serde_json::Value::Null,
    }
}

fn screen_node(node_id: &str, x: f64, y: f64) -> Node {
    Node {
        node_id: node_id.into(),
        label: temp_label(node_id),
        node_type: NodeType::Screen,
        position: Position { x, y },
        data: serde_json::Value::Null,
        verifications: vec![],
        verification_pass_condition: Default::default(),
        child_tree_id: None,
    }
}

/// Result of building one structure: every node/edge to persist.
pub struct Structure {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

/// Builds the click-strategy structure: one screen node per item, reached
/// directly from `start_node_id` by a tap and returned from by BACK
/// (`phases/structure_creator.py`'s non-TV branch).
pub fn build_click_structure(start_node_id: &str, items: &[String]) -> Structure {
    let mut nodes = Vec::new();
    let mut edges = Vec::new();
    for (idx, item) in items.iter().enumerate() {
        nodes.push(screen_node(item, 250.0 + (idx as f64 % 5.0) * 200.0, 300.0));
        edges.push(edge(
            format!("{start_node_id}_to_{item}_temp"),
            start_node_id,
            item,
            remote_action("tap", serde_json::json!({"text": item})),
            remote_action("key_event", serde_json::json!({"key": "BACK"})),
        ));
    }
    Structure { nodes, edges }
}

/// Appends a focus node's paired screen node, reached from the focus node
/// by OK and returned from by BACK.
fn push_screen_pair(nodes: &mut Vec<Node>, edges: &mut Vec<Edge>, focus_id: &str, item: &str, x: f64, y: f64) {
    nodes.push(screen_node(item, x, y + 200.0));
    edges.push(edge(
        format!("{focus_id}_to_{item}_temp"),
        focus_id,
        item,
        remote_action("select", serde_json::Value::Null),
        remote_action("key_event", serde_json::json!({"key": "BACK"})),
    ));
}

/// Chains one arm of Row 1 out from `start_node_id`, alternating RIGHT/LEFT
/// (or LEFT/RIGHT for the left arm) between consecutive focus nodes.
/// Returns the id of the arm's last focus node, if any.
fn build_arm(
    nodes: &mut Vec<Node>,
    edges: &mut Vec<Edge>,
    start_node_id: &str,
    items: &[String],
    outward: &str,
    inward: &str,
    x_sign: f64,
) -> Option<NodeId> {
    let mut previous: NodeId = start_node_id.into();
    let mut last = None;
    for (idx, item) in items.iter().enumerate() {
        let focus_id = format!("{start_node_id}_{item}");
        let x = 250.0 + x_sign * ((idx + 1) as f64) * 200.0;
        nodes.push(screen_node(&focus_id, x, 100.0));
        edges.push(edge(
            format!("{previous}_to_{focus_id}_temp"),
            previous.as_str(),
            &focus_id,
            remote_action(outward, serde_json::Value::Null),
            remote_action(inward, serde_json::Value::Null),
        ));
        push_screen_pair(nodes, edges, &focus_id, item, x, 100.0);
        previous = focus_id.clone().into();
        last = Some(previous.clone());
    }
    last
}

/// Builds the dpad dual-layer structure (`phases/structure_creator.py`'s
/// "Row 1: horizontal menu" branch, extended to its left-arm split and
/// multi-row chaining): Row 1 is a horizontal strip around `start_node_id`,
/// split into a left arm (the first `items_left_of_home` items) reached by
/// LEFT/RIGHT and a right arm reached by RIGHT/LEFT; any further rows
/// (vertical menus, one row per `lines` beyond the first) chain onto the
/// previous row's last focus node by DOWN/UP. Every focus node is paired
/// with a screen node reached by OK/BACK.
pub fn build_dpad_structure(start_node_id: &str, items: &[String], items_left_of_home: Option<u32>, lines: u32) -> Structure {
    let mut nodes = Vec::new();
    let mut edges = Vec::new();

    if items.is_empty() {
        return Structure { nodes, edges };
    }

    let rows = split_into_rows(items, lines);
    let mut rows = rows.into_iter();
    let row1 = rows.next().unwrap_or_default();

    let left_count = items_left_of_home.unwrap_or(0) as usize;
    let left_count = left_count.min(row1.len());
    let (left_items, right_items) = row1.split_at(left_count);

    let right_tail = build_arm(&mut nodes, &mut edges, start_node_id, right_items, "dpad_right", "dpad_left", 1.0);
    let left_tail = build_arm(&mut nodes, &mut edges, start_node_id, left_items, "dpad_left", "dpad_right", -1.0);

    let mut row_tail: NodeId = right_tail.or(left_tail).unwrap_or_else(|| start_node_id.into());
    for (row_idx, row) in rows.enumerate() {
        let mut previous = row_tail.clone();
        let y = 100.0 + ((row_idx + 1) as f64) * 200.0;
        for (idx, item) in row.iter().enumerate() {
            let focus_id = format!("{start_node_id}_{item}");
            let x = 250.0 + (idx as f64) * 200.0;
            let (outward, inward) = if idx == 0 {
                ("dpad_down", "dpad_up")
            } else {
                ("dpad_right", "dpad_left")
            };
            nodes.push(screen_node(&focus_id, x, y));
            edges.push(edge(
                format!("{previous}_to_{focus_id}_temp"),
                previous.as_str(),
                &focus_id,
                remote_action(outward, serde_json::Value::Null),
                remote_action(inward, serde_json::Value::Null),
            ));
            push_screen_pair(&mut nodes, &mut edges, &focus_id, item, x, y);
            previous = focus_id.into();
        }
        row_tail = previous;
    }

    Structure { nodes, edges }
}

/// Splits a flat item list into `lines` rows of roughly equal size,
/// preserving order. `lines < 1` is treated as 1 (a single row).
fn split_into_rows(items: &[String], lines: u32) -> Vec<Vec<String>> {
    let lines = lines.max(1) as usize;
    let chunk_size = ((items.len() + lines - 1) / lines).max(1);
    items.chunks(chunk_size).map(|chunk| chunk.to_vec()).collect()
}

pub fn build_structure(
    strategy: Strategy,
    start_node_id: &str,
    items: &[String],
    items_left_of_home: Option<u32>,
    lines: u32,
) -> Structure {
    match strategy {
        Strategy::DpadWithScreenshot => build_dpad_structure(start_node_id, items, items_left_of_home, lines),
        Strategy::ClickWithSelectors | Strategy::ClickWithText => build_click_structure(start_node_id, items),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn click_structure_pairs_tap_with_back() {
        let items = vec!["settings".to_string(), "search".to_string()];
        let s = build_click_structure("home", &items);
        assert_eq!(s.nodes.len(), 2);
        assert_eq!(s.edges.len(), 2);
        assert_eq!(s.edges[0].source_node_id.as_str(), "home");
        assert_eq!(s.edges[0].target_node_id.as_str(), "settings");
    }

    #[test]
    fn dpad_structure_creates_focus_and_screen_pairs() {
        let items = vec!["tv_guide".to_string()];
        let s = build_dpad_structure("home", &items, None, 1);
        assert_eq!(s.nodes.len(), 2);
        assert_eq!(s.edges.len(), 2);
        assert_eq!(s.nodes[0].node_id.as_str(), "home_tv_guide");
        assert_eq!(s.nodes[1].node_id.as_str(), "tv_guide");
    }

    #[test]
    fn dpad_structure_chains_consecutive_focus_nodes() {
        let items = vec!["a".to_string(), "b".to_string()];
        let s = build_dpad_structure("home", &items, None, 1);
        let focus_edges: Vec<_> = s.edges.iter().filter(|e| e.edge_id.as_str().contains("_to_home_")).collect();
        assert_eq!(focus_edges[0].source_node_id.as_str(), "home");
        let chain_edge = s.edges.iter().find(|e| e.source_node_id.as_str() == "home_a").unwrap();
        assert_eq!(chain_edge.target_node_id.as_str(), "home_b");
    }

    #[test]
    fn dpad_structure_splits_row_one_left_and_right_of_home() {
        let items = vec!["left1".to_string(), "right1".to_string(), "right2".to_string()];
        let s = build_dpad_structure("home", &items, Some(1), 1);

        let left_edge = s.edges.iter().find(|e| e.source_node_id.as_str() == "home" && e.target_node_id.as_str() == "home_left1").unwrap();
        assert_eq!(left_edge.action_sets[0].actions[0].action_type.as_str(), "remote");
        assert_eq!(left_edge.action_sets[0].actions[0].command, "dpad_left");
        assert_eq!(left_edge.action_sets[1].actions[0].command, "dpad_right");

        let right_edge = s.edges.iter().find(|e| e.source_node_id.as_str() == "home" && e.target_node_id.as_str() == "home_right1").unwrap();
        assert_eq!(right_edge.action_sets[0].actions[0].command, "dpad_right");

        let right_chain = s.edges.iter().find(|e| e.source_node_id.as_str() == "home_right1" && e.target_node_id.as_str() == "home_right2").unwrap();
        assert_eq!(right_chain.action_sets[0].actions[0].command, "dpad_right");
    }

    #[test]
    fn dpad_structure_chains_second_row_by_down_up() {
        let items = vec!["row1a".to_string(), "row1b".to_string(), "row2a".to_string(), "row2b".to_string()];
        let s = build_dpad_structure("home", &items, None, 2);

        let down_edge = s.edges.iter().find(|e| e.target_node_id.as_str() == "home_row2a").unwrap();
        assert_eq!(down_edge.source_node_id.as_str(), "home_row1b");
        assert_eq!(down_edge.action_sets[0].actions[0].command, "dpad_down");
        assert_eq!(down_edge.action_sets[1].actions[0].command, "dpad_up");

        let within_row_edge = s.edges.iter().find(|e| e.source_node_id.as_str() == "home_row2a" && e.target_node_id.as_str() == "home_row2b").unwrap();
        assert_eq!(within_row_edge.action_sets[0].actions[0].command, "dpad_right");
    }
}

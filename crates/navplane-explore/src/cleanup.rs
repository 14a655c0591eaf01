//! Phase 3: finalise or cancel (spec.md §4.5), grounded in
//! `phases/cleanup_manager.py`. Unlike the original (which renames
//! `node_id`/`edge_id` themselves), this strips the `_temp` suffix from
//! labels only — node/edge identity never changes, per
//! `Node::strip_temp_suffix` and spec.md §9.

use navplane_core::Node;

/// Strips the `_temp` suffix from every node whose label carries it;
/// returns how many were changed so the caller can report
/// `nodes_renamed` (spec.md §4.5 `finalize_structure`).
pub fn strip_temp_labels(nodes: &mut [Node]) -> usize {
    nodes.iter_mut().filter(|n| n.strip_temp_suffix()).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use navplane_core::{NodeType, Position, VerificationPassCondition};

    fn node(id: &str, label: &str) -> Node {
        Node {
            node_id: id.into(),
            label: label.to_string(),
            node_type: NodeType::Screen,
            position: Position::default(),
            data: serde_json::Value::Null,
            verifications: vec![],
            verification_pass_condition: VerificationPassCondition::All,
            child_tree_id: None,
        }
    }

    #[test]
    fn strips_only_temp_labels() {
        let mut nodes = vec![node("a", "a_temp"), node("b", "b")];
        let renamed = strip_temp_labels(&mut nodes);
        assert_eq!(renamed, 1);
        assert_eq!(nodes[0].label, "a");
        assert_eq!(nodes[0].node_id.as_str(), "a");
        assert_eq!(nodes[1].label, "b");
    }
}

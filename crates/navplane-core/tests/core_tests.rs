//! Integration tests for navplane-core: ids, types, config, error, persistence.

use navplane_core::*;

// ===========================================================================
// Ids
// ===========================================================================

#[test]
fn node_id_new_and_display() {
    let id = NodeId::new("n-1");
    assert_eq!(id.as_str(), "n-1");
    assert_eq!(format!("{}", id), "n-1");
}

#[test]
fn tree_id_equality_and_hash() {
    use std::collections::HashSet;
    let a = TreeId::new("same");
    let b = TreeId::new("same");
    let c = TreeId::new("different");
    assert_eq!(a, b);
    assert_ne!(a, c);
    let mut set = HashSet::new();
    set.insert(a.clone());
    assert!(set.contains(&b));
    assert!(!set.contains(&c));
}

#[test]
fn ids_from_string_and_str() {
    let a: NodeId = "hello".into();
    assert_eq!(a.as_str(), "hello");
    let b: NodeId = String::from("world").into();
    assert_eq!(b.as_str(), "world");
}

// ===========================================================================
// ControllerKind
// ===========================================================================

#[test]
fn controller_kind_serializes_lowercase() {
    assert_eq!(serde_json::to_string(&ControllerKind::Remote).unwrap(), r#""remote""#);
    assert_eq!(serde_json::to_string(&ControllerKind::Av).unwrap(), r#""av""#);
}

#[test]
fn controller_kind_all_has_seven() {
    assert_eq!(ControllerKind::ALL.len(), 7);
}

// ===========================================================================
// Node
// ===========================================================================

fn node(label: &str, node_type: NodeType) -> Node {
    Node {
        node_id: "n1".into(),
        label: label.to_string(),
        node_type,
        position: Position::default(),
        data: serde_json::Value::Null,
        verifications: vec![],
        verification_pass_condition: VerificationPassCondition::All,
        child_tree_id: None,
    }
}

#[test]
fn node_entry_point_by_label_or_type() {
    assert!(node("ENTRY", NodeType::Screen).is_entry_point());
    assert!(node("home", NodeType::Entry).is_entry_point());
    assert!(!node("home", NodeType::Screen).is_entry_point());
}

#[test]
fn node_serde_roundtrip() {
    let n = node("Home", NodeType::Screen);
    let json = serde_json::to_string(&n).unwrap();
    let back: Node = serde_json::from_str(&json).unwrap();
    assert_eq!(back.label, "Home");
    assert_eq!(back.node_id.as_str(), "n1");
}

// ===========================================================================
// Edge / ActionSet
// ===========================================================================

fn action_set(id: &str, shortcuts: bool) -> ActionSet {
    ActionSet {
        id: id.into(),
        label: String::new(),
        actions: vec![],
        retry_actions: vec![],
        failure_actions: vec![],
        kpi_references: vec![],
        use_verifications_for_kpi: false,
        enable_sibling_shortcuts: shortcuts,
    }
}

#[test]
fn edge_default_action_set_resolves_by_id() {
    let edge = Edge {
        edge_id: "e1".into(),
        source_node_id: "a".into(),
        target_node_id: "b".into(),
        action_sets: vec![action_set("s1", false), action_set("s2", false)],
        default_action_set_id: Some("s2".into()),
        final_wait_time: 2000,
        edge_type: EdgeType::Navigation,
        enable_sibling_shortcuts: false,
        data: serde_json::Value::Null,
    };
    assert_eq!(edge.default_action_set().unwrap().id.as_str(), "s2");
}

#[test]
fn edge_default_wait_time_is_2000() {
    let json = r#"{"edge_id":"e1","source_node_id":"a","target_node_id":"b","default_action_set_id":null}"#;
    let edge: Edge = serde_json::from_str(json).unwrap();
    assert_eq!(edge.final_wait_time, 2000);
    assert!(edge.action_sets.is_empty());
}

// ===========================================================================
// Action / Verification
// ===========================================================================

#[test]
fn action_new_constructor() {
    let a = Action::new("click", serde_json::json!({"x": 1}));
    assert_eq!(a.command, "click");
    assert!(a.validation_status.is_none());
}

// ===========================================================================
// ExecutionRecord
// ===========================================================================

#[test]
fn execution_record_starts_running() {
    let rec = ExecutionRecord::new(ExecutionId::new("ex-1"), TreeId::new("t1"));
    assert_eq!(rec.status, ExecutionStatus::Running);
    assert_eq!(rec.progress, 0);
}

// ===========================================================================
// HostConfig / DeviceConfig
// ===========================================================================

#[test]
fn host_config_default_url() {
    let cfg = HostConfig::default();
    assert_eq!(cfg.host_url(), "http://127.0.0.1:8080");
}

#[test]
fn device_config_from_env_indexed_missing_is_none() {
    assert!(DeviceConfig::from_env_indexed(999).is_none());
}

// ===========================================================================
// Error
// ===========================================================================

#[test]
fn error_status_codes_match_taxonomy() {
    assert_eq!(
        Error::PathNotFound { from: "a".into(), to: "b".into() }.status_code(),
        400
    );
    assert_eq!(Error::AmbiguousTarget("x".into()).status_code(), 400);
    assert_eq!(Error::NoEntryPoint.status_code(), 400);
    assert_eq!(Error::UserInterfaceNotFound("ui".into()).status_code(), 404);
    assert_eq!(Error::ExecutionNotFound("e1".into()).status_code(), 404);
    assert_eq!(Error::Internal("boom".into()).status_code(), 500);
}

#[test]
fn error_constructors() {
    let e = Error::controller("remote", "timed out");
    assert!(e.to_string().contains("remote"));
    assert!(e.to_string().contains("timed out"));

    let e = Error::invalid_transition("start_phase_2", "Phase1Running");
    assert!(matches!(e, Error::InvalidTransition { .. }));
}

#[test]
fn error_is_clone() {
    let e = Error::config("missing HOST_IP");
    let cloned = e.clone();
    assert_eq!(e.to_string(), cloned.to_string());
}

// ===========================================================================
// MemoryPersistence
// ===========================================================================

#[tokio::test]
async fn memory_persistence_round_trip() {
    let store = MemoryPersistence::new();
    let tree_id = TreeId::new("root");
    store.seed_root("ui-home", tree_id.clone()).await;
    store.seed_hierarchy(tree_id.clone(), vec![tree_id.clone()]).await;

    let resolved = store.load_root_tree_id("ui-home").await.unwrap();
    assert_eq!(resolved, tree_id);

    let hierarchy = store.load_tree_hierarchy(&tree_id).await.unwrap();
    assert_eq!(hierarchy, vec![tree_id.clone()]);

    store.upsert_node(&tree_id, node("Home", NodeType::Entry)).await.unwrap();
    let tree = store.load_full_tree(&tree_id).await.unwrap();
    assert_eq!(tree.nodes.len(), 1);

    store.delete_node(&tree_id, &NodeId::new("n1")).await.unwrap();
    let tree = store.load_full_tree(&tree_id).await.unwrap();
    assert!(tree.nodes.is_empty());
}

// ===========================================================================
// NullObjectStore
// ===========================================================================

#[tokio::test]
async fn null_object_store_upload() {
    let store = NullObjectStore;
    let result = store.upload("a/b.png", b"data", "image/png").await.unwrap();
    assert_eq!(result.url, "memory://a/b.png");
    assert_eq!(result.size_bytes, 4);
}

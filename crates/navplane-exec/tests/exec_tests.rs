//! Integration tests for navplane-exec: full load → pathfind → execute →
//! verify round trip against in-memory fixtures.

use std::sync::Arc;

use navplane_controllers::build_default_registry;
use navplane_core::{
    Action, ActionSet, Device, Edge, EdgeType, ExecutionStatus, FullTree, MemoryPersistence, Node,
    NodeType, Position, TeamId, TreeId, Verification, VerificationPassCondition,
};
use navplane_exec::{ExecutionRegistry, NavigationExecutor, NavigationTarget};
use navplane_graph::UnifiedGraphCache;

fn node(id: &str, node_type: NodeType) -> Node {
    Node {
        node_id: id.into(),
        label: id.to_string(),
        node_type,
        position: Position::default(),
        data: serde_json::Value::Null,
        verifications: vec![],
        verification_pass_condition: VerificationPassCondition::All,
        child_tree_id: None,
    }
}

fn node_with_verification(id: &str) -> Node {
    let mut n = node(id, NodeType::Screen);
    n.verifications = vec![Verification {
        command: "check_home_visible".to_string(),
        verification_type: "image".to_string(),
        params: serde_json::json!("home_icon"),
        expected: serde_json::json!("home_icon"),
    }];
    n
}

fn remote_action(command: &str) -> Action {
    let mut action = Action::new(command, serde_json::Value::Null);
    action.action_type = "remote".to_string();
    action
}

fn edge_with_retry(id: &str, from: &str, to: &str) -> Edge {
    Edge {
        edge_id: id.into(),
        source_node_id: from.into(),
        target_node_id: to.into(),
        action_sets: vec![ActionSet {
            id: "s1".into(),
            label: String::new(),
            actions: vec![remote_action("tap")],
            retry_actions: vec![remote_action("tap")],
            failure_actions: vec![],
            kpi_references: vec![],
            use_verifications_for_kpi: false,
            enable_sibling_shortcuts: false,
        }],
        default_action_set_id: Some("s1".into()),
        final_wait_time: 0,
        edge_type: EdgeType::Navigation,
        enable_sibling_shortcuts: false,
        data: serde_json::Value::Null,
    }
}

async fn build_executor() -> (NavigationExecutor, Arc<ExecutionRegistry>) {
    let controllers = Arc::new(build_default_registry("shield"));

    let persistence = Arc::new(MemoryPersistence::new());
    persistence.seed_root("ui-1", TreeId::new("root")).await;
    persistence.seed_hierarchy(TreeId::new("root"), vec![TreeId::new("root")]).await;
    persistence
        .seed_tree(
            TreeId::new("root"),
            FullTree {
                tree_id: Some(TreeId::new("root")),
                nodes: vec![node("entry", NodeType::Entry), node_with_verification("home")],
                edges: vec![edge_with_retry("e1", "entry", "home")],
            },
        )
        .await;

    let cache = Arc::new(UnifiedGraphCache::default());
    let executions = Arc::new(ExecutionRegistry::new());
    let executor = NavigationExecutor::new(controllers, persistence, cache, executions.clone());
    (executor, executions)
}

#[tokio::test]
async fn navigation_reaches_target_and_runs_node_verification() {
    let (executor, executions) = build_executor().await;
    let device = Device::new("dev-1", "Test Device", "pixel");

    let execution_id = executor
        .execute_navigation(
            device,
            "ui-1".to_string(),
            TeamId::new("team-a"),
            TreeId::new("root"),
            NavigationTarget::Label("home".to_string()),
            Some("entry".into()),
            None,
        )
        .await
        .unwrap();

    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    let status = executions.status(&execution_id).await.unwrap();
    assert_eq!(status.status, ExecutionStatus::Completed);
    assert_eq!(status.progress, 100);
}

#[tokio::test]
async fn verify_node_checks_registered_verification_controller() {
    let (executor, _executions) = build_executor().await;
    let device = Device::new("dev-1", "Test Device", "pixel");
    let outcome = executor
        .verify_node(&device, "ui-1", &TeamId::new("team-a"), &"home".into())
        .await
        .unwrap();
    assert!(outcome.success);
    assert_eq!(outcome.details.len(), 1);
}

#[tokio::test]
async fn load_navigation_tree_reuses_cache_on_second_call() {
    let (executor, _executions) = build_executor().await;
    let first = executor.load_navigation_tree("ui-1", &TeamId::new("team-a")).await.unwrap();
    assert!(!first.from_cache);
    let second = executor.load_navigation_tree("ui-1", &TeamId::new("team-a")).await.unwrap();
    assert!(second.from_cache);
}

#[tokio::test]
async fn unknown_userinterface_errors() {
    let (executor, _executions) = build_executor().await;
    let err = executor.load_navigation_tree("nope", &TeamId::new("team-a")).await.unwrap_err();
    assert!(err.is_not_found());
}

//! Navigation executor (spec.md §4.4), grounded in the teacher's
//! `agenticlaw-agent::runtime::AgentRuntime` — a singleton holding shared
//! registries, running background work, and reporting progress through a
//! record the caller polls rather than blocking on.

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use navplane_core::{
    Action, ControllerKind, Device, Edge, EdgeId, Error, NodeId, PersistenceBackend, Result,
    TeamId, TreeId, VerificationPassCondition,
};
use navplane_controllers::ControllerRegistry;
use navplane_graph::{
    build_unified_graph, pick_entry_point, resolve_target_label, shortest_path, Graph, TreeData,
    UnifiedGraphCache,
};

use crate::events::ExecutionEvent;
use crate::registry::ExecutionRegistry;
use crate::tasks::{spawn_tracked, CompletionCallback, TaskOutcome};

/// What `load_navigation_tree` resolved, mirroring spec.md §4.4's
/// `{nodes, edges, from_cache}` / `{from_cache:true}` pair.
pub struct LoadedGraph {
    pub graph: Arc<Graph>,
    pub from_cache: bool,
}

/// Either a known node id or a label to resolve against the loaded graph.
pub enum NavigationTarget {
    Node(NodeId),
    Label(String),
}

/// Outcome of a direct node verification (spec.md §4.4 `verify_node`).
#[derive(Clone, Debug, serde::Serialize)]
pub struct VerificationOutcome {
    pub success: bool,
    pub details: Vec<(String, bool)>,
}

fn edge_index_key(root_tree_id: &TreeId, team_id: &TeamId) -> String {
    format!("{}:{}", root_tree_id.as_str(), team_id.as_str())
}

/// Maps an `Action::action_type` string onto the controller family that
/// should execute it (spec.md §3 `Action`: `action_type (remote|web|av|…)`).
fn controller_kind_for(action_type: &str) -> Option<ControllerKind> {
    ControllerKind::ALL.into_iter().find(|k| k.as_str() == action_type)
}

/// One device's navigation executor (spec.md §4.4): owns the graph cache,
/// the execution record registry, and dispatches actions through the
/// shared `ControllerRegistry`.
pub struct NavigationExecutor {
    controllers: Arc<ControllerRegistry>,
    persistence: Arc<dyn PersistenceBackend>,
    cache: Arc<UnifiedGraphCache>,
    executions: Arc<ExecutionRegistry>,
    edge_catalog: DashMap<String, Arc<HashMap<EdgeId, Edge>>>,
}

impl NavigationExecutor {
    pub fn new(
        controllers: Arc<ControllerRegistry>,
        persistence: Arc<dyn PersistenceBackend>,
        cache: Arc<UnifiedGraphCache>,
        executions: Arc<ExecutionRegistry>,
    ) -> Self {
        Self { controllers, persistence, cache, executions, edge_catalog: DashMap::new() }
    }

    /// `load_navigation_tree`: resolve the root tree, reuse the cached
    /// unified graph if present, otherwise rebuild it from the full
    /// hierarchy (spec.md §4.4 steps 1-4).
    pub async fn load_navigation_tree(&self, userinterface_id: &str, team_id: &TeamId) -> Result<LoadedGraph> {
        let root_tree_id = self.persistence.load_root_tree_id(userinterface_id).await?;

        if let Some(graph) = self.cache.get(&root_tree_id, team_id.as_str()) {
            tracing::debug!(root_tree_id = %root_tree_id, "unified graph cache hit");
            return Ok(LoadedGraph { graph, from_cache: true });
        }

        tracing::info!(root_tree_id = %root_tree_id, "rebuilding unified graph");
        let tree_ids = self.persistence.load_tree_hierarchy(&root_tree_id).await?;
        let mut full_trees = Vec::with_capacity(tree_ids.len());
        for tree_id in &tree_ids {
            full_trees.push((tree_id.clone(), self.persistence.load_full_tree(tree_id).await?));
        }

        let tree_data = hierarchy_to_tree_data(&root_tree_id, full_trees.clone())?;
        let graph = build_unified_graph(tree_data)?;
        let graph = self.cache.populate(&root_tree_id, team_id.as_str(), graph);

        let mut by_id = HashMap::new();
        for (_, full) in full_trees {
            for edge in full.edges {
                by_id.insert(edge.edge_id.clone(), edge);
            }
        }
        self.edge_catalog.insert(edge_index_key(&root_tree_id, team_id), Arc::new(by_id));

        Ok(LoadedGraph { graph, from_cache: false })
    }

    /// `execute_navigation`: always asynchronous. Allocates the execution
    /// id and record synchronously, launches the walk in the background,
    /// and returns immediately (spec.md §4.4 step 1).
    pub async fn execute_navigation(
        &self,
        device: Device,
        userinterface_id: String,
        team_id: TeamId,
        tree_id: TreeId,
        target: NavigationTarget,
        current_node_id: Option<NodeId>,
        on_event: Option<Arc<dyn Fn(ExecutionEvent) + Send + Sync>>,
    ) -> Result<navplane_core::ExecutionId> {
        let execution_id = navplane_core::ExecutionId::new(uuid::Uuid::new_v4().to_string());
        tracing::info!(execution_id = %execution_id, userinterface_id = %userinterface_id, "execution started");
        let handle = self.executions.create(execution_id.clone(), tree_id.clone());
        if let Some(cb) = &on_event {
            cb(ExecutionEvent::Started { execution_id: execution_id.clone() });
        }

        let loaded = self.load_navigation_tree(&userinterface_id, &team_id).await?;
        let from_node = match current_node_id {
            Some(id) => id,
            None => pick_entry_point(&loaded.graph)?,
        };
        let to_node = match target {
            NavigationTarget::Node(id) => id,
            NavigationTarget::Label(label) => resolve_target_label(&loaded.graph, &label)?,
        };
        let path = shortest_path(&loaded.graph, &from_node, &to_node)?;

        let controllers = self.controllers.clone();
        let edge_catalog = self
            .edge_catalog
            .get(&edge_index_key(&tree_id, &team_id))
            .map(|e| e.clone())
            .unwrap_or_default();
        let graph = loaded.graph.clone();
        let exec_id_for_task = execution_id.clone();

        let callback: CompletionCallback = {
            let handle = handle.clone();
            Arc::new(move |_id, outcome| {
                let handle = handle.clone();
                tokio::spawn(async move {
                    match outcome {
                        TaskOutcome::Completed(value) => handle.complete(value).await,
                        TaskOutcome::Failed(message) => handle.fail(message).await,
                    }
                });
            })
        };

        spawn_tracked(execution_id.to_string(), callback, async move {
            walk_path(
                &device,
                &controllers,
                &graph,
                &path,
                &to_node,
                &edge_catalog,
                &handle,
                exec_id_for_task,
                on_event,
            )
            .await
            .map_err(|e| e.to_string())
        });

        Ok(execution_id)
    }

    /// `verify_node`: run a node's verifications directly, outside any
    /// path walk (spec.md §4.4).
    pub async fn verify_node(
        &self,
        device: &Device,
        userinterface_id: &str,
        team_id: &TeamId,
        node_id: &NodeId,
    ) -> Result<VerificationOutcome> {
        let loaded = self.load_navigation_tree(userinterface_id, team_id).await?;
        let node = loaded
            .graph
            .node(node_id)
            .ok_or_else(|| Error::NavigationTree(format!("node {node_id} not found in graph")))?;
        run_verifications(&self.controllers, device, node).await
    }

    pub async fn get_execution_status(&self, execution_id: &navplane_core::ExecutionId) -> Result<navplane_core::ExecutionRecord> {
        self.executions.status(execution_id).await
    }

    pub fn clear_preview_cache(&self, root_tree_id: &TreeId, team_id: &TeamId) {
        self.cache.invalidate(root_tree_id, team_id.as_str());
    }
}

/// Reconstruct `TreeData` (parent linkage + depth) from the raw hierarchy,
/// inferring parent_tree_id/parent_node_id by scanning for the node whose
/// `child_tree_id` names this tree (spec.md §3's `child_tree_id` mounting
/// convention), bounded by `MAX_TREE_DEPTH`.
fn hierarchy_to_tree_data(
    root_tree_id: &TreeId,
    trees: Vec<(TreeId, navplane_core::FullTree)>,
) -> Result<Vec<TreeData>> {
    let mut parent_of: HashMap<TreeId, (TreeId, NodeId)> = HashMap::new();
    for (tree_id, full) in &trees {
        for node in &full.nodes {
            if let Some(child_tree_id) = &node.child_tree_id {
                parent_of.insert(child_tree_id.clone(), (tree_id.clone(), node.node_id.clone()));
            }
        }
    }

    let mut out = Vec::with_capacity(trees.len());
    for (tree_id, full) in trees {
        let (parent_tree_id, parent_node_id) = match parent_of.get(&tree_id) {
            Some((pt, pn)) => (Some(pt.clone()), Some(pn.clone())),
            None => (None, None),
        };

        let mut depth = 0u32;
        let mut cursor = parent_tree_id.clone();
        while let Some(pt) = cursor {
            depth += 1;
            if depth > navplane_core::MAX_TREE_DEPTH {
                return Err(Error::NavigationTree(format!("tree hierarchy under {} exceeds max depth", root_tree_id)));
            }
            cursor = parent_of.get(&pt).map(|(gp, _)| gp.clone());
        }

        out.push(TreeData {
            tree_id,
            parent_tree_id,
            parent_node_id,
            tree_depth: depth,
            nodes: full.nodes,
            edges: full.edges,
        });
    }
    Ok(out)
}

/// The background walk: for each step, run the default action set with
/// retry/failure fallback, then verify the node just arrived at
/// (spec.md §4.4 step 2).
#[allow(clippy::too_many_arguments)]
async fn walk_path(
    device: &Device,
    controllers: &ControllerRegistry,
    graph: &Graph,
    path: &navplane_graph::Path,
    final_target: &NodeId,
    edge_catalog: &HashMap<EdgeId, Edge>,
    handle: &crate::registry::ExecutionHandle,
    execution_id: navplane_core::ExecutionId,
    on_event: Option<Arc<dyn Fn(ExecutionEvent) + Send + Sync>>,
) -> Result<serde_json::Value> {
    let total_steps = path.steps.len().max(1);

    for (i, step) in path.steps.iter().enumerate() {
        let edge = &step.edge;
        if let Some(cb) = &on_event {
            cb(ExecutionEvent::StepStarted { execution_id: execution_id.clone(), edge_id: edge.edge_id.clone() });
        }

        let raw_edge = edge_catalog.get(&edge.edge_id);
        let primary_result = run_actions(controllers, device, &edge.actions).await;
        if let Err(primary_err) = primary_result {
            let retry_actions = raw_edge.and_then(|e| e.default_action_set()).map(|s| s.retry_actions.clone()).unwrap_or_default();
            let failure_actions = raw_edge.and_then(|e| e.default_action_set()).map(|s| s.failure_actions.clone()).unwrap_or_default();

            if let Some(cb) = &on_event {
                cb(ExecutionEvent::StepRetried { execution_id: execution_id.clone(), edge_id: edge.edge_id.clone() });
            }
            let retry_result = if retry_actions.is_empty() { Err(primary_err.clone()) } else { run_actions(controllers, device, &retry_actions).await };

            if let Err(retry_err) = retry_result {
                let failure_result = if failure_actions.is_empty() { Err(retry_err) } else { run_actions(controllers, device, &failure_actions).await };
                if let Err(final_err) = failure_result {
                    tracing::warn!(execution_id = %execution_id, edge_id = %edge.edge_id, error = %final_err, "edge failed after retry and failure buckets");
                    if let Some(cb) = &on_event {
                        cb(ExecutionEvent::StepFailed {
                            execution_id: execution_id.clone(),
                            edge_id: edge.edge_id.clone(),
                            error: final_err.to_string(),
                        });
                    }
                    return Err(final_err);
                }
            }
        }

        let final_wait_ms = raw_edge.map(|e| e.final_wait_time).unwrap_or(0);
        if final_wait_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(final_wait_ms)).await;
        }

        let progress = (((i + 1) * 100) / total_steps) as u8;
        handle.set_progress(progress, format!("reached {}", edge.target)).await;
        if let Some(cb) = &on_event {
            cb(ExecutionEvent::StepSucceeded { execution_id: execution_id.clone(), edge_id: edge.edge_id.clone(), progress });
        }

        if let Some(node) = graph.node(&edge.target) {
            let outcome = run_verifications(controllers, device, node).await?;
            if let Some(cb) = &on_event {
                cb(ExecutionEvent::VerificationRan {
                    execution_id: execution_id.clone(),
                    node_id: node.node_id.clone(),
                    passed: outcome.success,
                });
            }
        }
    }

    if let Some(cb) = &on_event {
        cb(ExecutionEvent::Completed { execution_id: execution_id.clone() });
    }
    Ok(serde_json::json!({ "target_node_id": final_target.as_str(), "steps": path.steps.len() }))
}

async fn run_actions(controllers: &ControllerRegistry, device: &Device, actions: &[Action]) -> Result<()> {
    for action in actions {
        let kind = controller_kind_for(&action.action_type)
            .ok_or_else(|| Error::controller(action.action_type.clone(), "unknown controller kind for action_type"))?;
        let controller = controllers
            .get_controllers(kind)
            .into_iter()
            .next()
            .ok_or_else(|| Error::controller(kind.as_str(), "no controller registered for this kind"))?;
        controller.execute_action(action, device).await?;
        if let Some(wait_ms) = action.wait_time_ms {
            tokio::time::sleep(std::time::Duration::from_millis(wait_ms)).await;
        }
    }
    Ok(())
}

async fn run_verifications(controllers: &ControllerRegistry, device: &Device, node: &navplane_core::Node) -> Result<VerificationOutcome> {
    if node.verifications.is_empty() {
        return Ok(VerificationOutcome { success: true, details: vec![] });
    }

    let mut details = Vec::with_capacity(node.verifications.len());
    for verification in &node.verifications {
        let controller = controllers
            .get_controllers(ControllerKind::Verification)
            .into_iter()
            .find(|c| c.available_verification_types().contains(&verification.verification_type.as_str()));
        let passed = match controller {
            Some(c) => c.execute_verification(verification, device).await?,
            None => false,
        };
        details.push((verification.command.clone(), passed));
    }

    let success = match node.verification_pass_condition {
        VerificationPassCondition::All => details.iter().all(|(_, ok)| *ok),
        VerificationPassCondition::Any => details.iter().any(|(_, ok)| *ok),
    };

    Ok(VerificationOutcome { success, details })
}

#[cfg(test)]
mod tests {
    use super::*;
    use navplane_controllers::variants::remote::AndroidMobileController;
    use navplane_controllers::variants::verification::ImageVerificationController;
    use navplane_core::{
        Action, ActionSet, Edge, EdgeType, MemoryPersistence, Node, NodeType, Position,
        VerificationPassCondition,
    };

    fn plain_node(id: &str, node_type: NodeType) -> Node {
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

    fn remote_action(command: &str) -> Action {
        let mut action = Action::new(command, serde_json::Value::Null);
        action.action_type = "remote".to_string();
        action
    }

    fn nav_edge(id: &str, from: &str, to: &str) -> Edge {
        Edge {
            edge_id: id.into(),
            source_node_id: from.into(),
            target_node_id: to.into(),
            action_sets: vec![ActionSet {
                id: "s1".into(),
                label: String::new(),
                actions: vec![remote_action("tap")],
                retry_actions: vec![],
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

    #[tokio::test]
    async fn execute_navigation_walks_to_target_and_completes() {
        let mut registry = ControllerRegistry::new();
        registry.register(AndroidMobileController::new());
        registry.register(ImageVerificationController::new(None, "shield"));
        let controllers = Arc::new(registry);

        let persistence = Arc::new(MemoryPersistence::new());
        persistence.seed_root("ui-1", TreeId::new("root")).await;
        persistence.seed_hierarchy(TreeId::new("root"), vec![TreeId::new("root")]).await;
        persistence
            .seed_tree(
                TreeId::new("root"),
                navplane_core::FullTree {
                    tree_id: Some(TreeId::new("root")),
                    nodes: vec![plain_node("entry", NodeType::Entry), plain_node("home", NodeType::Screen)],
                    edges: vec![nav_edge("e1", "entry", "home")],
                },
            )
            .await;

        let cache = Arc::new(UnifiedGraphCache::default());
        let executions = Arc::new(ExecutionRegistry::new());
        let executor = NavigationExecutor::new(controllers, persistence, cache, executions.clone());

        let device = Device::new("dev-1", "Test Device", "pixel");
        let execution_id = executor
            .execute_navigation(
                device,
                "ui-1".to_string(),
                TeamId::new("team-a"),
                TreeId::new("root"),
                NavigationTarget::Node("home".into()),
                Some("entry".into()),
                None,
            )
            .await
            .unwrap();

        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        let status = executions.status(&execution_id).await.unwrap();
        assert_eq!(status.status, navplane_core::ExecutionStatus::Completed);
    }

    #[test]
    fn controller_kind_for_maps_known_strings() {
        assert_eq!(controller_kind_for("remote"), Some(ControllerKind::Remote));
        assert_eq!(controller_kind_for("nonsense"), None);
    }
}

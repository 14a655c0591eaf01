//! HTTP surface (spec.md §6): a thin axum router deserializing bodies,
//! calling into `navplane-exec`/`navplane-explore`, and serializing
//! `{success, ...}` / `{success:false, error}`, grounded in the teacher's
//! `agenticlaw-gateway::server` (`Router::new().route(...)`,
//! `Json(serde_json::json!({...}))`, `tower_http::cors::CorsLayer`).

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Path as AxumPath, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use navplane_controllers::ControllerRegistry;
use navplane_core::{
    Device, DeviceId, Edge, Error, ExecutionId, Node, PersistenceBackend, Result, TeamId, TreeId,
};
use navplane_exec::{ExecutionRegistry, NavigationExecutor, NavigationTarget};
use navplane_explore::{ApprovedVerification, ExplorationExecutor};
use navplane_graph::{pick_entry_point, resolve_target_label, shortest_path, TreeData, UnifiedGraphCache};
use navplane_llm::{AiPlanner, ScriptedPlanner};

use crate::auth::{bearer_token, GatewayAuth};

/// Bind address, port, and auth policy for one gateway process (spec.md §6).
#[derive(Clone, Debug)]
pub struct GatewayConfig {
    pub bind_ip: String,
    pub port: u16,
    pub auth_token: Option<String>,
    pub unified_cache_ttl_secs: Option<u64>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self { bind_ip: "127.0.0.1".to_string(), port: 8080, auth_token: None, unified_cache_ttl_secs: None }
    }
}

/// Everything the router's handlers reach into.
pub struct GatewayState {
    pub controllers: Arc<ControllerRegistry>,
    pub persistence: Arc<dyn PersistenceBackend>,
    pub cache: Arc<UnifiedGraphCache>,
    pub navigation: Arc<NavigationExecutor>,
    pub exploration: Arc<ExplorationExecutor>,
    pub devices: HashMap<DeviceId, Device>,
    pub auth: GatewayAuth,
}

impl GatewayState {
    fn device(&self, device_id: &str) -> Result<Device> {
        self.devices
            .get(&DeviceId::new(device_id))
            .cloned()
            .ok_or_else(|| Error::DeviceNotFound(device_id.to_string()))
    }
}

/// Builds the default planner and the lower-crate executors, then serves
/// the router on `config.bind_ip:config.port` (spec.md §10 crate layout:
/// the gateway is the one crate allowed to know about every layer below it).
pub async fn start_gateway(
    config: GatewayConfig,
    controllers: Arc<ControllerRegistry>,
    persistence: Arc<dyn PersistenceBackend>,
    devices: HashMap<DeviceId, Device>,
) -> anyhow::Result<()> {
    let ttl = config
        .unified_cache_ttl_secs
        .map(std::time::Duration::from_secs)
        .unwrap_or(navplane_graph::cache::DEFAULT_TTL);
    let cache = Arc::new(UnifiedGraphCache::new(ttl));
    let executions = Arc::new(ExecutionRegistry::new());
    let navigation = Arc::new(NavigationExecutor::new(
        controllers.clone(),
        persistence.clone(),
        cache.clone(),
        executions,
    ));

    // No HTTP-calling AI planner exists anywhere in the pack, and spec.md's
    // Non-goals exclude "OCR/AI model calls" — an empty scripted planner is
    // the ambient default (DESIGN.md Open Questions).
    let planner: Arc<dyn AiPlanner> = Arc::new(ScriptedPlanner::new("unconfigured", vec![]));
    let exploration = Arc::new(ExplorationExecutor::new(
        controllers.clone(),
        persistence.clone(),
        cache.clone(),
        planner,
        Some(navigation.clone()),
    ));

    let auth = GatewayAuth::from_optional_token(config.auth_token.clone());
    let state = Arc::new(GatewayState { controllers, persistence, cache, navigation, exploration, devices, auth });

    let app = build_router(state);

    let bind_addr: SocketAddr = format!("{}:{}", config.bind_ip, config.port).parse()?;
    info!("navplane gateway listening on {}", bind_addr);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

pub fn build_router(state: Arc<GatewayState>) -> Router {
    Router::new()
        .route("/host/navigation/execute/:tree_id", post(execute_navigation_handler))
        .route("/host/navigation/execution/:execution_id/status", get(execution_status_handler))
        .route("/host/navigation/preview/:tree_id/:target_node_id", get(preview_handler))
        .route("/host/navigation/cache/check/:tree_id", get(cache_check_handler))
        .route("/host/navigation/cache/update-node", post(cache_update_node_handler))
        .route("/host/navigation/cache/update-edge", post(cache_update_edge_handler))
        .route("/host/navigation/cache/populate/:tree_id", post(cache_populate_handler))
        .route("/host/navigation/cache/clear/:tree_id", post(cache_clear_handler))
        .route("/host/ai-generation/start-exploration", post(start_exploration_handler))
        .route("/host/ai-generation/exploration-status/:exploration_id", get(exploration_status_handler))
        .route("/host/ai-generation/continue-exploration", post(continue_exploration_handler))
        .route("/host/ai-generation/start-validation", post(start_validation_handler))
        .route("/host/ai-generation/validate-next-item", post(validate_next_item_handler))
        .route("/host/ai-generation/start-node-verification", post(start_node_verification_handler))
        .route("/host/ai-generation/approve-node-verifications", post(approve_node_verifications_handler))
        .route("/host/ai-generation/finalize-structure", post(finalize_structure_handler))
        .route("/host/ai-generation/cancel-exploration", post(cancel_exploration_handler))
        .route("/host/ai-generation/cleanup-temp", post(cleanup_temp_handler))
        .route("/host/script/execute", post(script_execute_handler))
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

fn ok_json<T: serde::Serialize>(value: T) -> Response {
    let mut body = serde_json::to_value(value).unwrap_or(serde_json::Value::Null);
    if let Some(obj) = body.as_object_mut() {
        obj.entry("success").or_insert(serde_json::Value::Bool(true));
    } else {
        body = serde_json::json!({ "success": true, "result": body });
    }
    (StatusCode::OK, Json(body)).into_response()
}

fn err_json(error: Error) -> Response {
    let status = StatusCode::from_u16(error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(serde_json::json!({ "success": false, "error": error.to_string() }))).into_response()
}

fn respond<T: serde::Serialize>(result: Result<T>) -> Response {
    match result {
        Ok(value) => ok_json(value),
        Err(error) => err_json(error),
    }
}

fn authorize(state: &GatewayState, headers: &HeaderMap) -> Result<()> {
    let header_value = headers.get(axum::http::header::AUTHORIZATION).and_then(|v| v.to_str().ok());
    state.auth.verify(bearer_token(header_value))
}

// ---------------------------------------------------------------------------
// Navigation
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct ExecuteNavigationBody {
    device_id: String,
    userinterface_name: String,
    #[serde(default)]
    target_node_id: Option<String>,
    #[serde(default)]
    target_node_label: Option<String>,
    #[serde(default)]
    current_node_id: Option<String>,
}

async fn execute_navigation_handler(
    State(state): State<Arc<GatewayState>>,
    headers: HeaderMap,
    AxumPath(tree_id): AxumPath<String>,
    Query(query): Query<HashMap<String, String>>,
    Json(body): Json<ExecuteNavigationBody>,
) -> Response {
    if let Err(e) = authorize(&state, &headers) {
        return err_json(e);
    }
    let result: Result<serde_json::Value> = async {
        let team_id = query.get("team_id").cloned().ok_or_else(|| Error::validation("team_id query param required"))?;
        let device = state.device(&body.device_id)?;
        let target = match (body.target_node_id, body.target_node_label) {
            (Some(id), _) => NavigationTarget::Node(id.into()),
            (None, Some(label)) => NavigationTarget::Label(label),
            (None, None) => return Err(Error::validation("target_node_id or target_node_label required")),
        };
        let execution_id = state
            .navigation
            .execute_navigation(
                device,
                body.userinterface_name,
                TeamId::new(team_id),
                TreeId::new(tree_id),
                target,
                body.current_node_id.map(Into::into),
                None,
            )
            .await?;
        Ok(serde_json::json!({ "execution_id": execution_id.as_str() }))
    }
    .await;
    respond(result)
}

async fn execution_status_handler(
    State(state): State<Arc<GatewayState>>,
    headers: HeaderMap,
    AxumPath(execution_id): AxumPath<String>,
) -> Response {
    if let Err(e) = authorize(&state, &headers) {
        return err_json(e);
    }
    let result = state.navigation.get_execution_status(&ExecutionId::new(execution_id)).await;
    respond(result)
}

async fn preview_handler(
    State(state): State<Arc<GatewayState>>,
    headers: HeaderMap,
    AxumPath((_tree_id, target_node_id)): AxumPath<(String, String)>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if let Err(e) = authorize(&state, &headers) {
        return err_json(e);
    }
    let result: Result<serde_json::Value> = async {
        let userinterface_name = query.get("userinterface_name").cloned().ok_or_else(|| Error::validation("userinterface_name query param required"))?;
        let team_id = query.get("team_id").cloned().ok_or_else(|| Error::validation("team_id query param required"))?;
        let loaded = state.navigation.load_navigation_tree(&userinterface_name, &TeamId::new(team_id)).await?;
        let from = match query.get("current_node_id") {
            Some(id) => id.clone().into(),
            None => pick_entry_point(&loaded.graph)?,
        };
        let to = resolve_target_label(&loaded.graph, &target_node_id).unwrap_or_else(|_| target_node_id.clone().into());
        let path = shortest_path(&loaded.graph, &from, &to)?;
        Ok(serde_json::json!({
            "steps": path.steps.len(),
            "total_weight": path.total_weight(),
            "from_cache": loaded.from_cache,
        }))
    }
    .await;
    respond(result)
}

async fn cache_check_handler(
    State(state): State<Arc<GatewayState>>,
    headers: HeaderMap,
    AxumPath(tree_id): AxumPath<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if let Err(e) = authorize(&state, &headers) {
        return err_json(e);
    }
    let team_id = match query.get("team_id") {
        Some(t) => t.clone(),
        None => return err_json(Error::validation("team_id query param required")),
    };
    let graph = state.cache.get(&TreeId::new(tree_id), &team_id);
    let body = match graph {
        Some(g) => serde_json::json!({ "exists": true, "nodes_count": g.node_count(), "edges_count": g.edge_count() }),
        None => serde_json::json!({ "exists": false, "nodes_count": 0, "edges_count": 0 }),
    };
    ok_json(body)
}

#[derive(Deserialize)]
struct UpdateNodeBody {
    tree_id: String,
    node: Node,
}

async fn cache_update_node_handler(
    State(state): State<Arc<GatewayState>>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
    Json(body): Json<UpdateNodeBody>,
) -> Response {
    if let Err(e) = authorize(&state, &headers) {
        return err_json(e);
    }
    let result: Result<serde_json::Value> = async {
        let team_id = query.get("team_id").cloned().ok_or_else(|| Error::validation("team_id query param required"))?;
        let tree_id = TreeId::new(body.tree_id);
        state.persistence.upsert_node(&tree_id, body.node).await?;
        state.cache.invalidate(&tree_id, &team_id);
        Ok(serde_json::json!({}))
    }
    .await;
    respond(result)
}

#[derive(Deserialize)]
struct UpdateEdgeBody {
    tree_id: String,
    edge: Edge,
}

async fn cache_update_edge_handler(
    State(state): State<Arc<GatewayState>>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
    Json(body): Json<UpdateEdgeBody>,
) -> Response {
    if let Err(e) = authorize(&state, &headers) {
        return err_json(e);
    }
    let result: Result<serde_json::Value> = async {
        let team_id = query.get("team_id").cloned().ok_or_else(|| Error::validation("team_id query param required"))?;
        let tree_id = TreeId::new(body.tree_id);
        state.persistence.upsert_edge(&tree_id, body.edge).await?;
        state.cache.invalidate(&tree_id, &team_id);
        Ok(serde_json::json!({}))
    }
    .await;
    respond(result)
}

#[derive(Deserialize)]
struct TreeDataDto {
    tree_id: String,
    #[serde(default)]
    parent_tree_id: Option<String>,
    #[serde(default)]
    parent_node_id: Option<String>,
    nodes: Vec<Node>,
    edges: Vec<Edge>,
}

#[derive(Deserialize)]
struct PopulateCacheBody {
    team_id: String,
    all_trees_data: Vec<TreeDataDto>,
    #[serde(default)]
    force_repopulate: bool,
}

async fn cache_populate_handler(
    State(state): State<Arc<GatewayState>>,
    headers: HeaderMap,
    AxumPath(tree_id): AxumPath<String>,
    Json(body): Json<PopulateCacheBody>,
) -> Response {
    if let Err(e) = authorize(&state, &headers) {
        return err_json(e);
    }
    let root_tree_id = TreeId::new(tree_id);
    if !body.force_repopulate && state.cache.get(&root_tree_id, &body.team_id).is_some() {
        return ok_json(serde_json::json!({ "populated": false, "reason": "already cached" }));
    }

    let mut depth_by_tree: HashMap<String, u32> = HashMap::new();
    let trees: Vec<TreeData> = body
        .all_trees_data
        .into_iter()
        .map(|t| {
            let depth = t
                .parent_tree_id
                .as_ref()
                .and_then(|p| depth_by_tree.get(p))
                .map(|d| d + 1)
                .unwrap_or(0);
            depth_by_tree.insert(t.tree_id.clone(), depth);
            TreeData {
                tree_id: TreeId::new(t.tree_id),
                parent_tree_id: t.parent_tree_id.map(TreeId::new),
                parent_node_id: t.parent_node_id.map(Into::into),
                tree_depth: depth,
                nodes: t.nodes,
                edges: t.edges,
            }
        })
        .collect();

    let result: Result<serde_json::Value> = async {
        let graph = navplane_graph::build_unified_graph(trees)?;
        let node_count = graph.node_count();
        let edge_count = graph.edge_count();
        state.cache.populate(&root_tree_id, &body.team_id, graph);
        Ok(serde_json::json!({ "populated": true, "nodes_count": node_count, "edges_count": edge_count }))
    }
    .await;
    respond(result)
}

async fn cache_clear_handler(
    State(state): State<Arc<GatewayState>>,
    headers: HeaderMap,
    AxumPath(tree_id): AxumPath<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if let Err(e) = authorize(&state, &headers) {
        return err_json(e);
    }
    let team_id = match query.get("team_id") {
        Some(t) => t.clone(),
        None => return err_json(Error::validation("team_id query param required")),
    };
    state.cache.invalidate(&TreeId::new(tree_id), &team_id);
    ok_json(serde_json::json!({}))
}

// ---------------------------------------------------------------------------
// Exploration lifecycle
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct StartExplorationBody {
    tree_id: String,
    device_id: String,
    userinterface_name: String,
    team_id: String,
    #[serde(default)]
    start_node: Option<String>,
    #[serde(default)]
    original_prompt: Option<String>,
}

async fn start_exploration_handler(
    State(state): State<Arc<GatewayState>>,
    headers: HeaderMap,
    Json(body): Json<StartExplorationBody>,
) -> Response {
    if let Err(e) = authorize(&state, &headers) {
        return err_json(e);
    }
    let result: Result<serde_json::Value> = async {
        let device = state.device(&body.device_id)?;
        let exploration_id = state
            .exploration
            .start_exploration(
                device,
                TreeId::new(body.tree_id),
                TeamId::new(body.team_id),
                body.userinterface_name,
                body.original_prompt.unwrap_or_default(),
                body.start_node.as_deref().unwrap_or("entry"),
            )
            .await?;
        Ok(serde_json::json!({ "exploration_id": exploration_id.as_str() }))
    }
    .await;
    respond(result)
}

async fn exploration_status_handler(
    State(state): State<Arc<GatewayState>>,
    headers: HeaderMap,
    AxumPath(_exploration_id): AxumPath<String>,
) -> Response {
    if let Err(e) = authorize(&state, &headers) {
        return err_json(e);
    }
    respond(state.exploration.get_exploration_status().await)
}

#[derive(Deserialize, Default)]
struct ContinueExplorationBody {
    #[serde(default)]
    selected_items: Option<Vec<String>>,
}

async fn continue_exploration_handler(
    State(state): State<Arc<GatewayState>>,
    headers: HeaderMap,
    body: Option<Json<ContinueExplorationBody>>,
) -> Response {
    if let Err(e) = authorize(&state, &headers) {
        return err_json(e);
    }
    let selected = body.map(|Json(b)| b.selected_items).unwrap_or(None);
    respond(state.exploration.continue_exploration(selected).await)
}

async fn start_validation_handler(State(state): State<Arc<GatewayState>>, headers: HeaderMap) -> Response {
    if let Err(e) = authorize(&state, &headers) {
        return err_json(e);
    }
    respond(state.exploration.start_validation().await.map(|count| serde_json::json!({ "total_items": count })))
}

#[derive(Deserialize)]
struct ValidateNextItemBody {
    device_id: String,
}

async fn validate_next_item_handler(
    State(state): State<Arc<GatewayState>>,
    headers: HeaderMap,
    Json(body): Json<ValidateNextItemBody>,
) -> Response {
    if let Err(e) = authorize(&state, &headers) {
        return err_json(e);
    }
    let result: Result<serde_json::Value> = async {
        let device = state.device(&body.device_id)?;
        let outcome = state.exploration.validate_next_item(&device).await?;
        serde_json::to_value(outcome).map_err(|e| Error::Internal(e.to_string()))
    }
    .await;
    respond(result)
}

async fn start_node_verification_handler(State(state): State<Arc<GatewayState>>, headers: HeaderMap) -> Response {
    if let Err(e) = authorize(&state, &headers) {
        return err_json(e);
    }
    respond(state.exploration.start_node_verification().await.map(|s| serde_json::json!({ "suggestions": s })))
}

#[derive(Deserialize)]
struct ApproveNodeVerificationsBody {
    approved: Vec<ApprovedVerification>,
}

async fn approve_node_verifications_handler(
    State(state): State<Arc<GatewayState>>,
    headers: HeaderMap,
    Json(body): Json<ApproveNodeVerificationsBody>,
) -> Response {
    if let Err(e) = authorize(&state, &headers) {
        return err_json(e);
    }
    respond(
        state
            .exploration
            .approve_node_verifications(body.approved)
            .await
            .map(|updated| serde_json::json!({ "updated": updated })),
    )
}

async fn finalize_structure_handler(State(state): State<Arc<GatewayState>>, headers: HeaderMap) -> Response {
    if let Err(e) = authorize(&state, &headers) {
        return err_json(e);
    }
    respond(state.exploration.finalize_structure().await)
}

async fn cancel_exploration_handler(State(state): State<Arc<GatewayState>>, headers: HeaderMap) -> Response {
    if let Err(e) = authorize(&state, &headers) {
        return err_json(e);
    }
    respond(state.exploration.cancel_exploration().await.map(|_| serde_json::json!({})))
}

/// Standalone temp-label stripping, independent of the finalize-structure
/// state transition (spec.md §6 lists this as its own route rather than an
/// alias for finalize).
async fn cleanup_temp_handler(State(state): State<Arc<GatewayState>>, headers: HeaderMap) -> Response {
    if let Err(e) = authorize(&state, &headers) {
        return err_json(e);
    }
    let result: Result<serde_json::Value> = async {
        let status = state.exploration.get_exploration_status().await?;
        let tree_id = status.context.tree_id.clone();
        let mut tree = state.persistence.load_full_tree(&tree_id).await?;
        let renamed = navplane_explore::cleanup::strip_temp_labels(&mut tree.nodes);
        for node in tree.nodes {
            state.persistence.upsert_node(&tree_id, node).await?;
        }
        Ok(serde_json::json!({ "nodes_renamed": renamed }))
    }
    .await;
    respond(result)
}

// ---------------------------------------------------------------------------
// Fire-and-forget script execution
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct ScriptExecuteBody {
    device_id: String,
    actions: Vec<navplane_core::Action>,
}

/// Dispatches a raw action list against a device without a navigation plan
/// and returns immediately; the original reports completion through an
/// async callback to an orchestrating server. No HTTP client dependency
/// exists in this crate's stack, so completion is logged instead of
/// POSTed back (DESIGN.md Open Questions).
async fn script_execute_handler(
    State(state): State<Arc<GatewayState>>,
    headers: HeaderMap,
    Json(body): Json<ScriptExecuteBody>,
) -> Response {
    if let Err(e) = authorize(&state, &headers) {
        return err_json(e);
    }
    let device = match state.device(&body.device_id) {
        Ok(d) => d,
        Err(e) => return err_json(e),
    };
    let controllers = state.controllers.clone();
    tokio::spawn(async move {
        for action in body.actions {
            let kind = match navplane_core::ControllerKind::ALL.into_iter().find(|k| k.as_str() == action.action_type) {
                Some(k) => k,
                None => {
                    tracing::warn!(action_type = %action.action_type, "script/execute: unknown controller kind");
                    continue;
                }
            };
            let Some(controller) = controllers.get_controllers(kind).into_iter().next() else {
                tracing::warn!(kind = %kind, "script/execute: no controller registered");
                continue;
            };
            if let Err(error) = controller.execute_action(&action, &device).await {
                tracing::warn!(%error, command = %action.command, "script/execute: action failed");
                return;
            }
        }
        tracing::info!(device_id = %device.device_id, "script/execute: run completed");
    });
    ok_json(serde_json::json!({ "accepted": true }))
}

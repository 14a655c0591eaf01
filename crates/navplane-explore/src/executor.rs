//! Exploration executor (spec.md §4.5), grounded in
//! `exploration_executor.py`: the device-bound collaborator that owns one
//! exploration at a time, orchestrates its phases, and exposes the
//! transition methods the HTTP layer calls. One lock — `run` — guards both
//! the phase state and the accumulated context, per spec.md §4.5's
//! "Thread safety: all writes to the context and state pass through a
//! single lock held by the exploration executor".

use std::sync::Arc;

use navplane_controllers::ControllerRegistry;
use navplane_core::{
    Device, Error, ExplorationId, NodeId, PersistenceBackend, Result, TeamId, TreeId,
};
use navplane_exec::{spawn_tracked, CompletionCallback, NavigationExecutor, NavigationTarget, TaskOutcome};
use navplane_graph::UnifiedGraphCache;
use navplane_llm::AiPlanner;
use tokio::sync::Mutex;

use crate::context::ExplorationContext;
use crate::state::{transition, ExplorationAction, ExplorationState};
use crate::structure::build_structure;
use crate::verification::{suggest_verifications, to_verification, ApprovedVerification, NodeVerificationData, VerificationSuggestion};
use crate::ExplorationEngine;

const SETTLING_DELAY_MS: u64 = 2000;

/// Everything mutable about one exploration run, guarded by one lock.
struct Run {
    exploration_id: Option<ExplorationId>,
    state: ExplorationState,
    context: Option<ExplorationContext>,
    items_to_validate: Vec<String>,
    current_validation_index: usize,
    captures: Vec<NodeVerificationData>,
    suggestions: Vec<VerificationSuggestion>,
    created_node_ids: Vec<NodeId>,
}

impl Default for Run {
    fn default() -> Self {
        Self {
            exploration_id: None,
            state: ExplorationState::Idle,
            context: None,
            items_to_validate: vec![],
            current_validation_index: 0,
            captures: vec![],
            suggestions: vec![],
            created_node_ids: vec![],
        }
    }
}

impl Run {
    fn require_context(&self) -> Result<&ExplorationContext> {
        self.context.as_ref().ok_or_else(|| Error::ExplorationNotFound("no active exploration".to_string()))
    }
}

/// Status payload for the polling endpoint (spec.md §6
/// `/exploration-status/{id}`).
#[derive(Clone, Debug, serde::Serialize)]
pub struct ExplorationStatus {
    pub exploration_id: ExplorationId,
    pub state: ExplorationState,
    pub context: crate::context::ContextSummary,
}

#[derive(Clone, Debug, serde::Serialize)]
pub struct StructureCreated {
    pub nodes_created: usize,
    pub edges_created: usize,
}

#[derive(Clone, Debug, serde::Serialize)]
pub struct ValidationOutcome {
    pub item: String,
    pub node_id: NodeId,
    pub success: bool,
    pub has_more: bool,
}

#[derive(Clone, Debug, serde::Serialize)]
pub struct FinalizeOutcome {
    pub nodes_renamed: usize,
}

pub struct ExplorationExecutor {
    controllers: Arc<ControllerRegistry>,
    persistence: Arc<dyn PersistenceBackend>,
    cache: Arc<UnifiedGraphCache>,
    engine: Arc<ExplorationEngine>,
    navigation: Option<Arc<NavigationExecutor>>,
    run: Arc<Mutex<Run>>,
}

impl ExplorationExecutor {
    pub fn new(
        controllers: Arc<ControllerRegistry>,
        persistence: Arc<dyn PersistenceBackend>,
        cache: Arc<UnifiedGraphCache>,
        planner: Arc<dyn AiPlanner>,
        navigation: Option<Arc<NavigationExecutor>>,
    ) -> Self {
        Self {
            controllers: controllers.clone(),
            persistence,
            cache,
            engine: Arc::new(ExplorationEngine::new(controllers, planner)),
            navigation,
            run: Arc::new(Mutex::new(Run::default())),
        }
    }

    /// Phase 0+1 (spec.md §4.5, §4.7): verifies the start node exists,
    /// then runs strategy detection and planning as a background task,
    /// returning the exploration id immediately.
    pub async fn start_exploration(
        &self,
        device: Device,
        tree_id: TreeId,
        team_id: TeamId,
        userinterface_name: String,
        original_prompt: String,
        start_node: &str,
    ) -> Result<ExplorationId> {
        let tree = self.persistence.load_full_tree(&tree_id).await?;
        if !tree.nodes.iter().any(|n| n.label == start_node) {
            return Err(Error::NavigationTree(format!("start node '{start_node}' not found in tree")));
        }

        let exploration_id = ExplorationId::new(uuid::Uuid::new_v4().to_string());
        let context = ExplorationContext::new(
            original_prompt,
            tree_id,
            userinterface_name,
            device.device_model.clone(),
            device.device_id.clone(),
            None,
            team_id,
        );

        {
            let mut run = self.run.lock().await;
            *run = Run::default();
            run.state = transition(ExplorationState::Idle, ExplorationAction::StartExploration)?;
            run.context = Some(context);
            run.exploration_id = Some(exploration_id.clone());
        }

        let run = self.run.clone();
        let engine = self.engine.clone();
        let exploration_id_for_task = exploration_id.clone();
        let callback: CompletionCallback = {
            let run = run.clone();
            Arc::new(move |_id, outcome| {
                let run = run.clone();
                tokio::spawn(async move {
                    let mut guard = run.lock().await;
                    match outcome {
                        TaskOutcome::Completed(_) => {
                            if let Ok(next) = transition(guard.state, ExplorationAction::AnalysisComplete) {
                                guard.state = next;
                            }
                        }
                        TaskOutcome::Failed(error) => {
                            tracing::warn!(%error, "exploration analysis failed");
                            guard.state = ExplorationState::Failed;
                            if let Some(ctx) = guard.context.as_mut() {
                                ctx.add_step_result("phase1_analyze_and_plan", serde_json::json!({"success": false, "error": error}));
                            }
                        }
                    }
                });
            })
        };

        spawn_tracked(exploration_id_for_task.to_string(), callback, async move {
            // Lock only to check out and check back in the context; the
            // screenshot capture and planner call in between run unlocked
            // so `get_exploration_status` can keep polling while this runs.
            let mut ctx = {
                let guard = run.lock().await;
                guard.context.clone().ok_or_else(|| "no active exploration".to_string())?
            };
            engine.phase0_detect_strategy(&mut ctx);
            engine.phase1_analyze_and_plan(&mut ctx, &device).await.map_err(|e| e.to_string())?;
            {
                let mut guard = run.lock().await;
                guard.context = Some(ctx);
            }
            Ok(serde_json::json!({"success": true}))
        });

        Ok(exploration_id)
    }

    pub async fn get_exploration_status(&self) -> Result<ExplorationStatus> {
        let run = self.run.lock().await;
        let exploration_id =
            run.exploration_id.clone().ok_or_else(|| Error::ExplorationNotFound("no active exploration".to_string()))?;
        let context = run.require_context()?;
        Ok(ExplorationStatus { exploration_id, state: run.state, context: context.summary() })
    }

    /// Phase 2a (spec.md §4.5), grounded in `structure_creator.py`. Locks
    /// `run` only for the state transition at each end; the persistence
    /// writes, cache invalidation, and settling sleep in between run
    /// unlocked so `get_exploration_status` keeps polling.
    pub async fn continue_exploration(&self, selected_items: Option<Vec<String>>) -> Result<StructureCreated> {
        let (next, ctx) = {
            let run = self.run.lock().await;
            let next = transition(run.state, ExplorationAction::ContinueExploration)?;
            (next, run.require_context()?.clone())
        };

        let items: Vec<String> = match selected_items {
            Some(selected) => ctx.predicted_items.iter().filter(|i| selected.contains(i)).cloned().collect(),
            None => ctx.predicted_items.clone(),
        };

        let tree = self.persistence.load_full_tree(&ctx.tree_id).await?;
        let start_node = tree
            .nodes
            .iter()
            .find(|n| n.is_entry_point() || n.node_id.as_str() == "home")
            .ok_or_else(|| Error::NavigationTree("no start node in tree".to_string()))?
            .node_id
            .clone();

        let strategy = ctx.strategy.ok_or_else(|| Error::Internal("strategy not detected yet".to_string()))?;
        let structure = build_structure(strategy, start_node.as_str(), &items, ctx.items_left_of_home, ctx.lines);

        for node in &structure.nodes {
            self.persistence.upsert_node(&ctx.tree_id, node.clone()).await?;
        }
        for edge in &structure.edges {
            self.persistence.upsert_edge(&ctx.tree_id, edge.clone()).await?;
        }
        self.cache.invalidate(&ctx.tree_id, ctx.team_id.as_str());
        tokio::time::sleep(std::time::Duration::from_millis(SETTLING_DELAY_MS)).await;

        let outcome = StructureCreated { nodes_created: structure.nodes.len(), edges_created: structure.edges.len() };
        {
            let mut run = self.run.lock().await;
            run.state = next;
            run.created_node_ids.extend(structure.nodes.iter().map(|n| n.node_id.clone()));
            if let Some(ctx) = run.context.as_mut() {
                ctx.add_step_result("phase2_structure_created", serde_json::json!({"success": true, "items": items}));
            }
        }
        Ok(outcome)
    }

    /// Phase 2b start (spec.md §4.5).
    pub async fn start_validation(&self) -> Result<usize> {
        let mut run = self.run.lock().await;
        let next = transition(run.state, ExplorationAction::StartValidation)?;
        let items = run.require_context()?.predicted_items.clone();
        run.items_to_validate = items;
        run.current_validation_index = 0;
        run.captures.clear();
        run.state = next;
        Ok(run.items_to_validate.len())
    }

    /// Phase 2b, one item (spec.md §4.5), grounded in
    /// `phases/validation_runner.py`: enter, capture, exit, and — on
    /// failure — recover to the start node via the navigation executor.
    /// One forward/enter/exit step per item rather than a depth-first
    /// row-by-row plan (DESIGN.md's "Validation-walk depth" decision);
    /// `run` is locked only for the bracketing state reads/writes, the
    /// controller I/O and recovery navigation in between run unlocked.
    pub async fn validate_next_item(&self, device: &Device) -> Result<ValidationOutcome> {
        let (item, ctx) = {
            let mut run = self.run.lock().await;
            transition(run.state, ExplorationAction::ValidateNextItem)?;
            run.state = ExplorationState::Validating;
            let index = run.current_validation_index;
            let item = run
                .items_to_validate
                .get(index)
                .cloned()
                .ok_or_else(|| Error::Internal("validate_next_item called with no items left".to_string()))?;
            let ctx = run.require_context()?.clone();
            (item, ctx)
        };
        let node_id: NodeId = item.clone().into();

        let result = self.run_one_validation(device, &ctx, &item).await;

        let recovery_error = if let Err(error) = &result {
            tracing::warn!(item = %item, %error, "validation step failed, attempting recovery");
            match self.recover_to_start(device, &ctx).await {
                Ok(()) => None,
                Err(_) => Some(error.to_string()),
            }
        } else {
            None
        };

        if let Some(error) = recovery_error {
            let mut run = self.run.lock().await;
            run.state = ExplorationState::Failed;
            return Err(Error::ExplorationRecovery(error));
        }

        let (success, has_more) = {
            let mut run = self.run.lock().await;
            let success = match &result {
                Ok(screenshot_url) => {
                    run.captures.push(NodeVerificationData {
                        node_id: node_id.clone(),
                        node_label: item.clone(),
                        screenshot_url: screenshot_url.clone(),
                    });
                    if let Some(ctx) = run.context.as_mut() {
                        ctx.completed_items.push(item.clone());
                        ctx.current_step += 1;
                    }
                    true
                }
                Err(error) => {
                    if let Some(ctx) = run.context.as_mut() {
                        ctx.failed_items.push(crate::context::FailedItem { item: item.clone(), error: error.to_string() });
                    }
                    false
                }
            };

            run.current_validation_index += 1;
            let has_more = run.current_validation_index < run.items_to_validate.len();
            run.state = if has_more {
                transition(ExplorationState::Validating, ExplorationAction::ValidateNextItem)?
            } else {
                transition(ExplorationState::Validating, ExplorationAction::AllItemsValidated)?
            };
            (success, has_more)
        };

        Ok(ValidationOutcome { item, node_id, success, has_more })
    }

    async fn run_one_validation(&self, device: &Device, ctx: &ExplorationContext, item: &str) -> Result<String> {
        let is_dpad = ctx.strategy.map(|s| s.is_dpad()).unwrap_or(false);
        let remote = self
            .controllers
            .get_controllers(navplane_core::ControllerKind::Remote)
            .into_iter()
            .next()
            .ok_or_else(|| Error::controller("remote", "no remote controller registered"))?;

        let enter = if is_dpad {
            navplane_core::Action::new("select", serde_json::Value::Null)
        } else {
            navplane_core::Action::new("tap", serde_json::json!({"text": item}))
        };
        let mut enter = enter;
        enter.action_type = "remote".to_string();
        remote.execute_action(&enter, device).await?;

        let av = self
            .controllers
            .get_controllers(navplane_core::ControllerKind::Av)
            .into_iter()
            .next()
            .ok_or_else(|| Error::controller("av", "no av controller registered"))?;
        let capture = av.execute_action(&navplane_core::Action::new("capture_screenshot", serde_json::Value::Null), device).await?;
        let screenshot_url = capture
            .get("screenshot_url")
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::Internal("av controller returned no screenshot_url".to_string()))?
            .to_string();

        let mut exit = navplane_core::Action::new("key_event", serde_json::json!({"key": "BACK"}));
        exit.action_type = "remote".to_string();
        remote.execute_action(&exit, device).await?;

        Ok(screenshot_url)
    }

    async fn recover_to_start(&self, device: &Device, ctx: &ExplorationContext) -> Result<()> {
        let navigation = self.navigation.as_ref().ok_or_else(|| {
            Error::ExplorationRecovery("no navigation executor configured for recovery".to_string())
        })?;
        let execution_id = navigation
            .execute_navigation(
                device.clone(),
                ctx.userinterface_name.clone(),
                ctx.team_id.clone(),
                ctx.tree_id.clone(),
                NavigationTarget::Label("home".to_string()),
                None,
                None,
            )
            .await?;

        for _ in 0..20 {
            let record = navigation.get_execution_status(&execution_id).await?;
            match record.status {
                navplane_core::ExecutionStatus::Completed => return Ok(()),
                navplane_core::ExecutionStatus::Error => {
                    return Err(Error::ExplorationRecovery(record.error.unwrap_or_default()))
                }
                navplane_core::ExecutionStatus::Running => {
                    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
                }
            }
        }
        Err(Error::ExplorationRecovery("recovery navigation did not complete in time".to_string()))
    }

    /// Phase 2c start (spec.md §4.5).
    pub async fn start_node_verification(&self) -> Result<Vec<VerificationSuggestion>> {
        let mut run = self.run.lock().await;
        let next = transition(run.state, ExplorationAction::StartNodeVerification)?;
        let is_dpad = run.require_context()?.strategy.map(|s| s.is_dpad()).unwrap_or(false);
        let suggestions = suggest_verifications(&run.captures, is_dpad);
        run.suggestions = suggestions.clone();
        run.state = next;
        Ok(suggestions)
    }

    /// Phase 2c approval (spec.md §4.5). `run` is locked only for the
    /// transition check and the final state write, not across the
    /// persistence round-trips in between.
    pub async fn approve_node_verifications(&self, approved: Vec<ApprovedVerification>) -> Result<usize> {
        let (next, tree_id) = {
            let run = self.run.lock().await;
            let next = transition(run.state, ExplorationAction::ApproveNodeVerifications)?;
            (next, run.require_context()?.tree_id.clone())
        };

        let mut tree = self.persistence.load_full_tree(&tree_id).await?;
        let mut updated = 0;
        for approval in &approved {
            let Some(verification) = to_verification(approval) else { continue };
            if let Some(node) = tree.nodes.iter_mut().find(|n| n.node_id == approval.node_id) {
                node.verifications.push(verification);
                self.persistence.upsert_node(&tree_id, node.clone()).await?;
                updated += 1;
            }
        }

        let mut run = self.run.lock().await;
        run.state = next;
        Ok(updated)
    }

    /// Phase 3 finalise (spec.md §4.5), grounded in
    /// `phases/cleanup_manager.py::finalize_structure`. `run` is locked
    /// only to read the transition/ids and to write the final state; the
    /// persistence writes, cache invalidation, and settling sleep run
    /// unlocked.
    pub async fn finalize_structure(&self) -> Result<FinalizeOutcome> {
        let (next, tree_id, team_id, created_node_ids) = {
            let run = self.run.lock().await;
            let next = transition(run.state, ExplorationAction::FinalizeStructure)?;
            let ctx = run.require_context()?;
            (next, ctx.tree_id.clone(), ctx.team_id.clone(), run.created_node_ids.clone())
        };

        let mut tree = self.persistence.load_full_tree(&tree_id).await?;
        let nodes_renamed = crate::cleanup::strip_temp_labels(&mut tree.nodes);
        for node in tree.nodes.into_iter().filter(|n| created_node_ids.contains(&n.node_id)) {
            self.persistence.upsert_node(&tree_id, node).await?;
        }
        self.cache.invalidate(&tree_id, team_id.as_str());
        tokio::time::sleep(std::time::Duration::from_millis(SETTLING_DELAY_MS)).await;

        let mut run = self.run.lock().await;
        run.state = next;
        Ok(FinalizeOutcome { nodes_renamed })
    }

    /// Cancel (spec.md §4.5): delete every node created by this
    /// exploration and reset to `idle`.
    pub async fn cancel_exploration(&self) -> Result<()> {
        let mut run = self.run.lock().await;
        let tree_id = run.require_context()?.tree_id.clone();
        for node_id in run.created_node_ids.drain(..).collect::<Vec<_>>() {
            self.persistence.delete_node(&tree_id, &node_id).await?;
        }
        *run = Run::default();
        Ok(())
    }
}

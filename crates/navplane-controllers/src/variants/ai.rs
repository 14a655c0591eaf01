//! `ai` controller (spec.md §3): a marker capability indicating a device
//! can be driven by the exploration engine's `AiPlanner`. The actual
//! planning call lives in `navplane-llm`/`navplane-explore`; this
//! controller only participates in capability discovery.

use async_trait::async_trait;
use navplane_core::{Action, ControllerKind, Device, Error, Result};

use crate::registry::Controller;

#[derive(Default)]
pub struct AiPlannerController;

impl AiPlannerController {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Controller for AiPlannerController {
    fn kind(&self) -> ControllerKind {
        ControllerKind::Ai
    }

    fn variant(&self) -> &str {
        "planner"
    }

    fn available_action_types(&self) -> Vec<&str> {
        vec![]
    }

    async fn execute_action(&self, action: &Action, _device: &Device) -> Result<serde_json::Value> {
        Err(Error::controller(
            "planner",
            format!("ai controller does not execute actions directly: {}", action.command),
        ))
    }
}

//! `AiPlanner` trait and request/response types (spec.md §6 "External AI
//! planner"). Trimmed from the teacher's streaming `LlmProvider` to the
//! single request/response shape this system actually needs: given a
//! screenshot and some context, propose a structure for the unexplored
//! screen.

use serde::{Deserialize, Serialize};

pub type PlannerResult<T> = Result<T, PlannerError>;

#[derive(Debug, Clone, thiserror::Error)]
pub enum PlannerError {
    #[error("request failed: {0}")]
    RequestFailed(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("cancelled")]
    Cancelled,
}

/// Input to one planning call (spec.md §6).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlanRequest {
    pub screenshot_url: String,
    pub original_prompt: String,
    pub device_model: String,
}

/// A single menu item the planner believes exists on-screen.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlannedItem {
    pub label: String,
    #[serde(default)]
    pub has_submenu: bool,
}

/// Planner output (spec.md §6's `{menu_type, lines, items, strategy,
/// predicted_depth, reasoning, items_left_of_home?}`).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlanResponse {
    pub menu_type: String,
    pub lines: u32,
    pub items: Vec<PlannedItem>,
    pub strategy: String,
    pub predicted_depth: u32,
    pub reasoning: String,
    #[serde(default)]
    pub items_left_of_home: Option<u32>,
}

/// External AI planner contract (spec.md §6). The crate never calls a real
/// model; callers supply an implementation.
#[async_trait::async_trait]
pub trait AiPlanner: Send + Sync {
    fn name(&self) -> &str;

    async fn plan(&self, request: PlanRequest) -> PlannerResult<PlanResponse>;
}

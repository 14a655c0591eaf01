//! A fixture-driven `AiPlanner` used in tests and to drive the gateway in
//! isolation (spec.md §1's "in-memory/no-op implementations").

use std::collections::VecDeque;
use tokio::sync::Mutex;

use crate::provider::{AiPlanner, PlanRequest, PlanResponse, PlannerError, PlannerResult};

/// Replays a fixed queue of canned responses, one per call. Returns
/// `PlannerError::RequestFailed` once the queue is drained.
pub struct ScriptedPlanner {
    name: String,
    responses: Mutex<VecDeque<PlanResponse>>,
}

impl ScriptedPlanner {
    pub fn new(name: impl Into<String>, responses: Vec<PlanResponse>) -> Self {
        Self {
            name: name.into(),
            responses: Mutex::new(responses.into()),
        }
    }
}

#[async_trait::async_trait]
impl AiPlanner for ScriptedPlanner {
    fn name(&self) -> &str {
        &self.name
    }

    async fn plan(&self, _request: PlanRequest) -> PlannerResult<PlanResponse> {
        self.responses
            .lock()
            .await
            .pop_front()
            .ok_or_else(|| PlannerError::RequestFailed("scripted planner exhausted".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::PlannedItem;

    fn response(menu_type: &str) -> PlanResponse {
        PlanResponse {
            menu_type: menu_type.to_string(),
            lines: 5,
            items: vec![PlannedItem { label: "Home".into(), has_submenu: false }],
            strategy: "exhaustive".into(),
            predicted_depth: 1,
            reasoning: "single flat list".into(),
            items_left_of_home: None,
        }
    }

    #[tokio::test]
    async fn replays_queued_responses_in_order() {
        let planner = ScriptedPlanner::new("fixture", vec![response("list"), response("grid")]);
        let req = PlanRequest {
            screenshot_url: "memory://a.png".into(),
            original_prompt: "explore".into(),
            device_model: "tv-1".into(),
        };
        let first = planner.plan(req.clone()).await.unwrap();
        assert_eq!(first.menu_type, "list");
        let second = planner.plan(req.clone()).await.unwrap();
        assert_eq!(second.menu_type, "grid");
        let err = planner.plan(req).await.unwrap_err();
        assert!(matches!(err, PlannerError::RequestFailed(_)));
    }
}

//! `web` controllers: playwright (spec.md §3). Real browser automation is
//! out of scope.

use async_trait::async_trait;
use navplane_core::{Action, ControllerKind, Device, Error, Result};

use crate::registry::Controller;

#[derive(Default)]
pub struct PlaywrightController;

impl PlaywrightController {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Controller for PlaywrightController {
    fn kind(&self) -> ControllerKind {
        ControllerKind::Web
    }

    fn variant(&self) -> &str {
        "playwright"
    }

    fn available_action_types(&self) -> Vec<&str> {
        vec!["navigate", "click_selector", "fill_selector", "wait_for_selector"]
    }

    async fn execute_action(&self, action: &Action, device: &Device) -> Result<serde_json::Value> {
        if !self.available_action_types().contains(&action.command.as_str()) {
            return Err(Error::controller("playwright", format!("unsupported command: {}", action.command)));
        }
        Ok(serde_json::json!({
            "command": action.command,
            "device_id": device.device_id.as_str(),
            "status": "ok",
        }))
    }
}

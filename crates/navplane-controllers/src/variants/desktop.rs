//! `desktop` controller (spec.md §3): mouse/keyboard control of a desktop
//! session. Real input-injection is out of scope.

use async_trait::async_trait;
use navplane_core::{Action, ControllerKind, Device, Error, Result};

use crate::registry::Controller;

#[derive(Default)]
pub struct DesktopController;

impl DesktopController {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Controller for DesktopController {
    fn kind(&self) -> ControllerKind {
        ControllerKind::Desktop
    }

    fn variant(&self) -> &str {
        "desktop"
    }

    fn available_action_types(&self) -> Vec<&str> {
        vec!["click", "move_mouse", "key_press", "type_text"]
    }

    async fn execute_action(&self, action: &Action, device: &Device) -> Result<serde_json::Value> {
        if !self.available_action_types().contains(&action.command.as_str()) {
            return Err(Error::controller("desktop", format!("unsupported command: {}", action.command)));
        }
        Ok(serde_json::json!({
            "command": action.command,
            "device_id": device.device_id.as_str(),
            "status": "ok",
        }))
    }
}

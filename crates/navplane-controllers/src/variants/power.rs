//! `power` controllers: tapo (spec.md §3). Real smart-plug control is out
//! of scope.

use async_trait::async_trait;
use navplane_core::{Action, ControllerKind, Device, Error, Result};

use crate::registry::Controller;

#[derive(Default)]
pub struct TapoPowerController;

impl TapoPowerController {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Controller for TapoPowerController {
    fn kind(&self) -> ControllerKind {
        ControllerKind::Power
    }

    fn variant(&self) -> &str {
        "tapo"
    }

    fn available_action_types(&self) -> Vec<&str> {
        vec!["power_on", "power_off", "power_cycle"]
    }

    async fn execute_action(&self, action: &Action, device: &Device) -> Result<serde_json::Value> {
        if !self.available_action_types().contains(&action.command.as_str()) {
            return Err(Error::controller("tapo", format!("unsupported command: {}", action.command)));
        }
        Ok(serde_json::json!({
            "command": action.command,
            "device_id": device.device_id.as_str(),
            "status": "ok",
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn power_cycle_succeeds() {
        let controller = TapoPowerController::new();
        let device = Device::new("d1", "tv", "shield");
        let action = Action::new("power_cycle", serde_json::Value::Null);
        let result = controller.execute_action(&action, &device).await.unwrap();
        assert_eq!(result["status"], "ok");
    }
}

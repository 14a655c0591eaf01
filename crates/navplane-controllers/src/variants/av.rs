//! `av` controllers: hdmi_stream, vnc_stream, camera_stream (spec.md §3).
//!
//! Construction order (spec.md §4.1, §9): av controllers are built first
//! and independently of everything else — the cycle between av and
//! verification is broken by building verification last and injecting the
//! av handle there; av never holds a reference back to verification.

use async_trait::async_trait;
use navplane_core::{Action, ControllerKind, Device, Error, Result};

use crate::registry::Controller;

macro_rules! av_controller {
    ($name:ident, $variant:literal) => {
        #[derive(Default)]
        pub struct $name;

        impl $name {
            pub fn new() -> Self {
                Self
            }
        }

        #[async_trait]
        impl Controller for $name {
            fn kind(&self) -> ControllerKind {
                ControllerKind::Av
            }

            fn variant(&self) -> &str {
                $variant
            }

            fn available_action_types(&self) -> Vec<&str> {
                vec!["start_stream", "stop_stream", "capture_screenshot"]
            }

            async fn execute_action(&self, action: &Action, device: &Device) -> Result<serde_json::Value> {
                if !self.available_action_types().contains(&action.command.as_str()) {
                    return Err(Error::controller(
                        $variant,
                        format!("unsupported command: {}", action.command),
                    ));
                }
                let mut result = serde_json::json!({
                    "command": action.command,
                    "device_id": device.device_id.as_str(),
                    "status": "ok",
                });
                if action.command == "capture_screenshot" {
                    result["screenshot_url"] =
                        serde_json::Value::String(format!("memory://{}/{}.png", device.device_id, $variant));
                }
                Ok(result)
            }
        }
    };
}

av_controller!(HdmiStreamController, "hdmi_stream");
av_controller!(VncStreamController, "vnc_stream");
av_controller!(CameraStreamController, "camera_stream");

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn capture_screenshot_returns_a_url() {
        let controller = HdmiStreamController::new();
        let device = Device::new("d1", "tv", "shield");
        let action = Action::new("capture_screenshot", serde_json::Value::Null);
        let result = controller.execute_action(&action, &device).await.unwrap();
        assert!(result["screenshot_url"].as_str().unwrap().starts_with("memory://"));
    }

    #[tokio::test]
    async fn unsupported_command_errors() {
        let controller = VncStreamController::new();
        let device = Device::new("d1", "pc", "nuc");
        let action = Action::new("unsupported_command", serde_json::Value::Null);
        assert!(controller.execute_action(&action, &device).await.is_err());
    }
}

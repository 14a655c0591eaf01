//! `remote` controllers: android_mobile, android_tv, appium, ir_remote
//! (spec.md §3). Real device I/O (adb, appium, infrared blaster) is out of
//! scope; each controller validates the command against its known action
//! types and reports a synthetic result, the way `MemoryPersistence`
//! stands in for a real database.

use async_trait::async_trait;
use navplane_core::{Action, ControllerKind, Device, Error, Result};

use crate::registry::Controller;

macro_rules! remote_controller {
    ($name:ident, $variant:literal, [$($action:literal),* $(,)?]) => {
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
                ControllerKind::Remote
            }

            fn variant(&self) -> &str {
                $variant
            }

            fn available_action_types(&self) -> Vec<&str> {
                vec![$($action),*]
            }

            async fn execute_action(&self, action: &Action, device: &Device) -> Result<serde_json::Value> {
                if !self.available_action_types().contains(&action.command.as_str()) {
                    return Err(Error::controller(
                        $variant,
                        format!("unsupported command: {}", action.command),
                    ));
                }
                Ok(serde_json::json!({
                    "command": action.command,
                    "device_id": device.device_id.as_str(),
                    "status": "ok",
                }))
            }
        }
    };
}

remote_controller!(AndroidMobileController, "android_mobile", ["tap", "swipe", "key_event", "text_input"]);
remote_controller!(AndroidTvController, "android_tv", ["key_event", "dpad_up", "dpad_down", "dpad_left", "dpad_right", "select"]);
remote_controller!(AppiumRemoteController, "appium", ["tap", "swipe", "find_and_tap", "key_event"]);
remote_controller!(IrRemoteController, "ir_remote", ["ir_command"]);

//! `verification` controllers: image, text, video, audio, adb, appium
//! (spec.md §3). Real pixel/OCR/audio analysis is explicitly out of scope
//! (spec.md Non-goals); each controller evaluates its `expected` payload
//! against a literal equality check, giving callers a working contract to
//! test against without pulling in an image/audio processing stack.
//!
//! Construction order (spec.md §4.1): verification controllers are built
//! last, each holding a non-owning back-reference to the device's av
//! controller plus the device's `device_model` — every variant except
//! `adb` and `appium` receives the av handle (spec.md §9: the cycle is
//! broken by construction order, av never points back to verification).

use async_trait::async_trait;
use navplane_core::{Action, ControllerKind, Device, Error, Result, Verification};
use std::sync::Arc;

use crate::registry::Controller;

macro_rules! verification_controller {
    ($name:ident, $variant:literal, $vtype:literal) => {
        pub struct $name {
            av: Option<Arc<dyn Controller>>,
            device_model: String,
        }

        impl $name {
            /// `av` is the device's av controller (`None` for `adb`/`appium`,
            /// which spec.md §4.1 exempts from av injection).
            pub fn new(av: Option<Arc<dyn Controller>>, device_model: impl Into<String>) -> Self {
                Self { av, device_model: device_model.into() }
            }

            pub fn av_variant(&self) -> Option<&str> {
                self.av.as_deref().map(Controller::variant)
            }
        }

        #[async_trait]
        impl Controller for $name {
            fn kind(&self) -> ControllerKind {
                ControllerKind::Verification
            }

            fn variant(&self) -> &str {
                $variant
            }

            fn available_action_types(&self) -> Vec<&str> {
                vec![]
            }

            fn available_verification_types(&self) -> Vec<&str> {
                vec![$vtype]
            }

            async fn execute_action(&self, action: &Action, _device: &Device) -> Result<serde_json::Value> {
                Err(Error::controller(
                    $variant,
                    format!("verification controllers do not execute actions: {}", action.command),
                ))
            }

            async fn execute_verification(&self, verification: &Verification, _device: &Device) -> Result<bool> {
                if verification.verification_type != $vtype {
                    return Err(Error::controller(
                        $variant,
                        format!("unsupported verification type: {}", verification.verification_type),
                    ));
                }
                Ok(verification.expected == verification.params)
            }
        }
    };
}

verification_controller!(ImageVerificationController, "image", "image");
verification_controller!(TextVerificationController, "text", "text");
verification_controller!(VideoVerificationController, "video", "video");
verification_controller!(AudioVerificationController, "audio", "audio");
verification_controller!(AdbVerificationController, "adb", "adb");
verification_controller!(AppiumVerificationController, "appium", "appium");

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn matching_expected_passes() {
        let controller = TextVerificationController::new(None, "shield");
        let device = Device::new("d1", "tv", "shield");
        let verification = Verification {
            command: "check_label".into(),
            verification_type: "text".into(),
            params: serde_json::json!("Home"),
            expected: serde_json::json!("Home"),
        };
        assert!(controller.execute_verification(&verification, &device).await.unwrap());
    }

    #[tokio::test]
    async fn mismatched_expected_fails() {
        let controller = TextVerificationController::new(None, "shield");
        let device = Device::new("d1", "tv", "shield");
        let verification = Verification {
            command: "check_label".into(),
            verification_type: "text".into(),
            params: serde_json::json!("Settings"),
            expected: serde_json::json!("Home"),
        };
        assert!(!controller.execute_verification(&verification, &device).await.unwrap());
    }

    #[tokio::test]
    async fn wrong_type_errors() {
        let controller = TextVerificationController::new(None, "shield");
        let device = Device::new("d1", "tv", "shield");
        let verification = Verification {
            command: "check_label".into(),
            verification_type: "image".into(),
            params: serde_json::Value::Null,
            expected: serde_json::Value::Null,
        };
        assert!(controller.execute_verification(&verification, &device).await.is_err());
    }

    #[tokio::test]
    async fn image_verification_holds_injected_av_handle() {
        use crate::variants::av::HdmiStreamController;

        let av: Arc<dyn Controller> = Arc::new(HdmiStreamController::new());
        let controller = ImageVerificationController::new(Some(av), "shield");
        assert_eq!(controller.av_variant(), Some("hdmi_stream"));
    }

    #[tokio::test]
    async fn adb_verification_has_no_av_handle() {
        let controller = AdbVerificationController::new(None, "shield");
        assert_eq!(controller.av_variant(), None);
    }
}

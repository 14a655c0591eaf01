//! Controller abstractions (spec.md §4.1): one trait, one registry, and a
//! typed implementation per `ControllerKind` variant.

pub mod registry;
pub mod variants;

pub use registry::{Controller, ControllerRegistry};

use std::sync::Arc;

use navplane_core::ControllerKind;

/// Build a registry with every shipped controller variant registered, in
/// spec.md §4.1's construction order: (a) av first; (b) remote, ai, power,
/// desktop, web, order-independent; (c) verification last, injected with
/// the av controller built in (a) (every variant except `adb`/`appium`)
/// and `device_model`. `device_model` identifies the device this host's
/// controllers run against.
pub fn build_default_registry(device_model: impl Into<String>) -> ControllerRegistry {
    let device_model = device_model.into();
    let mut registry = ControllerRegistry::new();

    // (a) av first — never holds a reference back to verification.
    registry.register(variants::av::HdmiStreamController::new());
    registry.register(variants::av::VncStreamController::new());
    registry.register(variants::av::CameraStreamController::new());

    // (b) everything else, order-independent
    registry.register(variants::remote::AndroidMobileController::new());
    registry.register(variants::remote::AndroidTvController::new());
    registry.register(variants::remote::AppiumRemoteController::new());
    registry.register(variants::remote::IrRemoteController::new());
    registry.register(variants::desktop::DesktopController::new());
    registry.register(variants::web::PlaywrightController::new());
    registry.register(variants::power::TapoPowerController::new());
    registry.register(variants::ai::AiPlannerController::new());

    // (c) verification last, holding a back-reference to av + device_model
    let av: Arc<dyn Controller> = registry
        .get_controller(ControllerKind::Av, "hdmi_stream")
        .expect("hdmi_stream was registered in step (a)");
    registry.register(variants::verification::ImageVerificationController::new(Some(av.clone()), device_model.clone()));
    registry.register(variants::verification::TextVerificationController::new(Some(av.clone()), device_model.clone()));
    registry.register(variants::verification::VideoVerificationController::new(Some(av.clone()), device_model.clone()));
    registry.register(variants::verification::AudioVerificationController::new(Some(av), device_model.clone()));
    registry.register(variants::verification::AdbVerificationController::new(None, device_model.clone()));
    registry.register(variants::verification::AppiumVerificationController::new(None, device_model));

    registry
}

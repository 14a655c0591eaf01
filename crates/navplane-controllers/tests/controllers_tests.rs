//! Integration tests for navplane-controllers.

use navplane_controllers::build_default_registry;
use navplane_core::{Action, ControllerKind, Device, Verification};

#[tokio::test]
async fn android_tv_controller_executes_known_action() {
    let registry = build_default_registry("shield");
    let controller = registry.get_controller(ControllerKind::Remote, "android_tv").unwrap();
    let device = Device::new("tv-1", "living room tv", "shield");
    let action = Action::new("select", serde_json::Value::Null);
    let result = controller.execute_action(&action, &device).await.unwrap();
    assert_eq!(result["status"], "ok");
}

#[tokio::test]
async fn image_verification_controller_checks_expected() {
    let registry = build_default_registry("shield");
    let controller = registry.get_controller(ControllerKind::Verification, "image").unwrap();
    let device = Device::new("tv-1", "living room tv", "shield");
    let verification = Verification {
        command: "check_logo".into(),
        verification_type: "image".into(),
        params: serde_json::json!("logo.png"),
        expected: serde_json::json!("logo.png"),
    };
    assert!(controller.execute_verification(&verification, &device).await.unwrap());
}

#[test]
fn capabilities_list_every_kind() {
    let registry = build_default_registry("shield");
    let caps = registry.get_capabilities();
    for kind in ControllerKind::ALL {
        assert!(caps.contains_key(&kind), "missing capability entry for {kind}");
    }
}

#[test]
fn available_action_types_include_expected_entries() {
    let registry = build_default_registry("shield");
    let action_types = registry.get_available_action_types();
    assert!(action_types.contains(&"tap".to_string()));
    assert!(action_types.contains(&"power_cycle".to_string()));
}

//! Controller trait and registry (spec.md §4.1).
//!
//! Each controller is a self-contained implementation of one
//! `ControllerKind` variant. To add a new controller: implement the
//! `Controller` trait and register it in `build_default_registry()`.

use navplane_core::{Action, ControllerKind, Device, Error, Result, Verification};
use std::collections::HashMap;
use std::sync::Arc;

/// Implement this to add a new controller capability.
#[async_trait::async_trait]
pub trait Controller: Send + Sync {
    /// The capability family this controller belongs to.
    fn kind(&self) -> ControllerKind;

    /// The specific implementation within its kind, e.g. `"android_mobile"`.
    fn variant(&self) -> &str;

    /// Action `command` strings this controller knows how to run.
    fn available_action_types(&self) -> Vec<&str>;

    /// Verification `verification_type` strings this controller knows how
    /// to evaluate. Empty for non-verification controllers.
    fn available_verification_types(&self) -> Vec<&str> {
        vec![]
    }

    async fn execute_action(&self, action: &Action, device: &Device) -> Result<serde_json::Value>;

    async fn execute_verification(&self, verification: &Verification, _device: &Device) -> Result<bool> {
        Err(Error::controller(
            self.variant(),
            format!("does not support verification type {}", verification.verification_type),
        ))
    }
}

/// Owns every registered controller, keyed by capability family
/// (spec.md §4.1).
#[derive(Default)]
pub struct ControllerRegistry {
    controllers: HashMap<ControllerKind, Vec<Arc<dyn Controller>>>,
}

impl ControllerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a controller. Replaces any existing controller with the
    /// same kind+variant.
    pub fn register(&mut self, controller: impl Controller + 'static) {
        let controller: Arc<dyn Controller> = Arc::new(controller);
        let kind = controller.kind();
        let variant = controller.variant().to_string();
        let bucket = self.controllers.entry(kind).or_default();
        bucket.retain(|c| c.variant() != variant);
        bucket.push(controller);
    }

    /// Look up a specific controller by kind and variant (spec.md §4.1).
    pub fn get_controller(&self, kind: ControllerKind, variant: &str) -> Option<Arc<dyn Controller>> {
        self.controllers
            .get(&kind)
            .and_then(|bucket| bucket.iter().find(|c| c.variant() == variant))
            .cloned()
    }

    /// All controllers registered under a kind.
    pub fn get_controllers(&self, kind: ControllerKind) -> Vec<Arc<dyn Controller>> {
        self.controllers.get(&kind).cloned().unwrap_or_default()
    }

    /// `{kind -> [variant, ...]}` for every registered controller.
    pub fn get_capabilities(&self) -> HashMap<ControllerKind, Vec<String>> {
        self.controllers
            .iter()
            .map(|(kind, bucket)| (*kind, bucket.iter().map(|c| c.variant().to_string()).collect()))
            .collect()
    }

    /// Every action-type string any registered controller understands.
    pub fn get_available_action_types(&self) -> Vec<String> {
        let mut out: Vec<String> = self
            .controllers
            .values()
            .flatten()
            .flat_map(|c| c.available_action_types())
            .map(|s| s.to_string())
            .collect();
        out.sort();
        out.dedup();
        out
    }

    /// Every verification-type string any registered verification
    /// controller understands.
    pub fn get_available_verification_types(&self) -> Vec<String> {
        let mut out: Vec<String> = self
            .controllers
            .values()
            .flatten()
            .flat_map(|c| c.available_verification_types())
            .map(|s| s.to_string())
            .collect();
        out.sort();
        out.dedup();
        out
    }
}

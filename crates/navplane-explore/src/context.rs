//! Exploration context (spec.md §4.5), grounded in
//! `exploration_context.py`: everything one exploration run accumulates as
//! it walks through phases 0-3, plus the history helpers needed to answer
//! "how far did we get" and "what just happened" without re-deriving them
//! from the raw step log on every call.

use chrono::{DateTime, Utc};
use navplane_core::{DeviceId, TeamId, TreeId};
use serde::{Deserialize, Serialize};

/// How phase 0 decided to interact with the device (spec.md §4.5 phase 0).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    ClickWithSelectors,
    ClickWithText,
    DpadWithScreenshot,
}

impl Strategy {
    pub fn is_dpad(&self) -> bool {
        matches!(self, Strategy::DpadWithScreenshot)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MenuType {
    Horizontal,
    Vertical,
    Grid,
}

/// One entry in `step_history`: what happened, when, and the raw result
/// payload the phase recorded (spec.md §4.5 "history fields").
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StepRecord {
    pub step: String,
    pub result: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

/// An item that failed validation, with the reason (spec.md §4.5 phase 2
/// `failed_items`).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FailedItem {
    pub item: String,
    pub error: String,
}

/// API-shaped summary of a context, truncating `available_elements` to 10
/// entries the way `to_dict` does (spec.md §4.5, grounded in
/// `exploration_context.py::to_dict`).
#[derive(Clone, Debug, Serialize)]
pub struct ContextSummary {
    pub original_prompt: String,
    pub tree_id: TreeId,
    pub userinterface_name: String,
    pub device_model: String,
    pub strategy: Option<Strategy>,
    pub has_dump_ui: bool,
    pub available_elements: Vec<serde_json::Value>,
    pub predicted_items: Vec<String>,
    pub menu_type: Option<MenuType>,
    pub current_step: u32,
    pub total_steps: u32,
    pub progress_percentage: f64,
    pub completed_items: Vec<String>,
    pub failed_items: Vec<FailedItem>,
}

/// Everything accumulated by one exploration run (spec.md §4.5).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExplorationContext {
    // Original request
    pub original_prompt: String,
    pub tree_id: TreeId,
    pub userinterface_name: String,
    pub device_model: String,
    pub device_id: DeviceId,
    pub host_name: Option<String>,
    pub team_id: TeamId,

    // Phase 0
    pub strategy: Option<Strategy>,
    pub has_dump_ui: bool,
    pub available_elements: Vec<serde_json::Value>,

    // Phase 1
    pub predicted_items: Vec<String>,
    pub item_selectors: std::collections::HashMap<String, serde_json::Value>,
    pub screenshot_url: Option<String>,
    pub menu_type: Option<MenuType>,
    /// Row count the planner predicted (spec.md §4.5 phase 1's `lines`),
    /// used by `build_dpad_structure` to chain focus nodes DOWN/UP across
    /// more than one row.
    pub lines: u32,
    /// How many of `predicted_items`' first row sit to the left of the
    /// start node (spec.md §4.5 phase 2a); `None` means every item in the
    /// row is reached by RIGHT from home.
    pub items_left_of_home: Option<u32>,

    // Phase 2
    pub current_step: u32,
    pub total_steps: u32,
    pub completed_items: Vec<String>,
    pub failed_items: Vec<FailedItem>,

    // History
    pub step_history: Vec<StepRecord>,
    pub last_success: Option<StepRecord>,
    pub last_failure: Option<StepRecord>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ExplorationContext {
    pub fn new(
        original_prompt: impl Into<String>,
        tree_id: TreeId,
        userinterface_name: impl Into<String>,
        device_model: impl Into<String>,
        device_id: DeviceId,
        host_name: Option<String>,
        team_id: TeamId,
    ) -> Self {
        let now = Utc::now();
        Self {
            original_prompt: original_prompt.into(),
            tree_id,
            userinterface_name: userinterface_name.into(),
            device_model: device_model.into(),
            device_id,
            host_name,
            team_id,
            strategy: None,
            has_dump_ui: false,
            available_elements: Vec::new(),
            predicted_items: Vec::new(),
            item_selectors: std::collections::HashMap::new(),
            screenshot_url: None,
            menu_type: None,
            lines: 1,
            items_left_of_home: None,
            current_step: 0,
            total_steps: 0,
            completed_items: Vec::new(),
            failed_items: Vec::new(),
            step_history: Vec::new(),
            last_success: None,
            last_failure: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// spec.md §4.5 "history fields": append to `step_history`, update
    /// `last_success`/`last_failure` by inspecting `result.success`, bump
    /// `updated_at`.
    pub fn add_step_result(&mut self, step: impl Into<String>, result: serde_json::Value) {
        let record = StepRecord { step: step.into(), result, timestamp: Utc::now() };
        let succeeded = record.result.get("success").and_then(|v| v.as_bool()).unwrap_or(false);
        if succeeded {
            self.last_success = Some(record.clone());
        } else {
            self.last_failure = Some(record.clone());
        }
        self.step_history.push(record);
        self.updated_at = Utc::now();
    }

    pub fn progress_percentage(&self) -> f64 {
        if self.total_steps == 0 {
            0.0
        } else {
            (self.current_step as f64 / self.total_steps as f64) * 100.0
        }
    }

    /// Supplemented from `exploration_context.py::get_last_n_steps`
    /// (dropped from spec.md's distilled field list, see SPEC_FULL.md §4.5).
    pub fn last_n_steps(&self, n: usize) -> &[StepRecord] {
        let len = self.step_history.len();
        &self.step_history[len.saturating_sub(n)..]
    }

    /// Supplemented from `exploration_context.py::is_phase_complete`: the
    /// last step whose name starts with `phase` prefix must have succeeded.
    pub fn phase_complete(&self, phase: &str) -> bool {
        self.step_history
            .iter()
            .rev()
            .find(|s| s.step.starts_with(phase))
            .map(|s| s.result.get("success").and_then(|v| v.as_bool()).unwrap_or(false))
            .unwrap_or(false)
    }

    pub fn summary(&self) -> ContextSummary {
        ContextSummary {
            original_prompt: self.original_prompt.clone(),
            tree_id: self.tree_id.clone(),
            userinterface_name: self.userinterface_name.clone(),
            device_model: self.device_model.clone(),
            strategy: self.strategy,
            has_dump_ui: self.has_dump_ui,
            available_elements: self.available_elements.iter().take(10).cloned().collect(),
            predicted_items: self.predicted_items.clone(),
            menu_type: self.menu_type,
            current_step: self.current_step,
            total_steps: self.total_steps,
            progress_percentage: self.progress_percentage(),
            completed_items: self.completed_items.clone(),
            failed_items: self.failed_items.clone(),
        }
    }
}

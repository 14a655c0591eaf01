//! Core data model (spec.md §3): hosts, devices, trees, nodes, edges, actions.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Cheaply-cloneable string identifier, following the teacher's `SessionKey`
/// pattern.
macro_rules! string_id {
    ($name:ident) => {
        #[derive(Clone, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Arc<str>);

        impl $name {
            pub fn new(s: impl Into<String>) -> Self {
                Self(Arc::from(s.into()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self::new(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self::new(s)
            }
        }
    };
}

string_id!(NodeId);
string_id!(EdgeId);
string_id!(TreeId);
string_id!(DeviceId);
string_id!(TeamId);
string_id!(ActionSetId);
string_id!(ExecutionId);
string_id!(ExplorationId);

// ---------------------------------------------------------------------------
// Host / Device
// ---------------------------------------------------------------------------

/// One process-owned fleet host (spec.md §3 `Host`).
#[derive(Debug)]
pub struct Host {
    pub host_ip: String,
    pub host_port: u16,
    pub host_name: String,
    pub host_url: String,
    pub devices: HashMap<DeviceId, Device>,
}

/// A physical or virtual device owned exclusively by its `Host`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    pub device_id: DeviceId,
    pub device_name: String,
    pub device_model: String,
    pub device_ip: Option<String>,
    pub device_port: Option<u16>,
    pub video_stream_path: Option<String>,
    pub video_capture_path: Option<String>,
    pub ir_type: Option<String>,
}

impl Device {
    pub fn new(
        device_id: impl Into<DeviceId>,
        device_name: impl Into<String>,
        device_model: impl Into<String>,
    ) -> Self {
        Self {
            device_id: device_id.into(),
            device_name: device_name.into(),
            device_model: device_model.into(),
            device_ip: None,
            device_port: None,
            video_stream_path: None,
            video_capture_path: None,
            ir_type: None,
        }
    }
}

// ---------------------------------------------------------------------------
// ControllerKind
// ---------------------------------------------------------------------------

/// The seven controller capability families (spec.md §3).
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControllerKind {
    Remote,
    Av,
    Verification,
    Desktop,
    Web,
    Power,
    Ai,
}

impl ControllerKind {
    pub const ALL: [ControllerKind; 7] = [
        ControllerKind::Remote,
        ControllerKind::Av,
        ControllerKind::Verification,
        ControllerKind::Desktop,
        ControllerKind::Web,
        ControllerKind::Power,
        ControllerKind::Ai,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ControllerKind::Remote => "remote",
            ControllerKind::Av => "av",
            ControllerKind::Verification => "verification",
            ControllerKind::Desktop => "desktop",
            ControllerKind::Web => "web",
            ControllerKind::Power => "power",
            ControllerKind::Ai => "ai",
        }
    }
}

impl std::fmt::Display for ControllerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Navigation tree / node / edge
// ---------------------------------------------------------------------------

/// One tree in a userinterface's hierarchy (spec.md §3 `NavigationTree`).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NavigationTree {
    pub tree_id: TreeId,
    pub parent_tree_id: Option<TreeId>,
    pub parent_node_id: Option<NodeId>,
    pub is_root_tree: bool,
    pub tree_depth: u32,
    pub userinterface_id: String,
    pub name: String,
}

/// Maximum depth of a tree hierarchy (spec.md §3 invariants).
pub const MAX_TREE_DEPTH: u32 = 5;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Screen,
    Entry,
    #[serde(other)]
    Other,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationPassCondition {
    All,
    Any,
}

impl Default for VerificationPassCondition {
    fn default() -> Self {
        Self::All
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// A UI screen or entry point (spec.md §3 `Node`).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Node {
    pub node_id: NodeId,
    pub label: String,
    pub node_type: NodeType,
    #[serde(default)]
    pub position: Position,
    #[serde(default)]
    pub data: serde_json::Value,
    #[serde(default)]
    pub verifications: Vec<Verification>,
    #[serde(default)]
    pub verification_pass_condition: VerificationPassCondition,
    /// `child_tree_id` implies this node mounts a sub-tree (spec.md §3).
    #[serde(default)]
    pub child_tree_id: Option<TreeId>,
}

impl Node {
    /// A node whose label is `ENTRY` (case-insensitive) or whose
    /// `node_type == entry` is an entry point (spec.md §3).
    pub fn is_entry_point(&self) -> bool {
        self.node_type == NodeType::Entry || self.label.eq_ignore_ascii_case("entry")
    }

    /// The `_temp` suffix is a lifecycle marker, never identity
    /// (spec.md §9): strip it from the label only.
    pub fn strip_temp_suffix(&mut self) -> bool {
        if let Some(stripped) = self.label.strip_suffix("_temp") {
            self.label = stripped.to_string();
            true
        } else {
            false
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EdgeType {
    Navigation,
    EnterSubtree,
    ExitSubtree,
    SiblingShortcut,
}

impl Default for EdgeType {
    fn default() -> Self {
        Self::Navigation
    }
}

/// A directed connection between two nodes, carrying ordered action sets
/// (spec.md §3 `Edge`).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Edge {
    pub edge_id: EdgeId,
    pub source_node_id: NodeId,
    pub target_node_id: NodeId,
    #[serde(default)]
    pub action_sets: Vec<ActionSet>,
    pub default_action_set_id: Option<ActionSetId>,
    #[serde(default = "default_final_wait_time")]
    pub final_wait_time: u64,
    #[serde(default)]
    pub edge_type: EdgeType,
    #[serde(default)]
    pub enable_sibling_shortcuts: bool,
    #[serde(default)]
    pub data: serde_json::Value,
}

fn default_final_wait_time() -> u64 {
    2000
}

impl Edge {
    /// Default action set, resolved by id (spec.md §4.2 step 1).
    pub fn default_action_set(&self) -> Option<&ActionSet> {
        let id = self.default_action_set_id.as_ref()?;
        self.action_sets.iter().find(|s| &s.id == id)
    }

    /// §3: `enable_sibling_shortcuts` is read both from the edge itself
    /// and from `action_sets[0]`; prefer the former (Open Questions,
    /// precedence preserved from `navigation_graph.py`).
    pub fn sibling_shortcuts_enabled(&self) -> bool {
        self.enable_sibling_shortcuts
            || self
                .action_sets
                .first()
                .map(|s| s.enable_sibling_shortcuts)
                .unwrap_or(false)
    }
}

/// A labelled bundle of actions with retry/failure fallbacks
/// (spec.md §3 `ActionSet`).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ActionSet {
    pub id: ActionSetId,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub actions: Vec<Action>,
    #[serde(default)]
    pub retry_actions: Vec<Action>,
    #[serde(default)]
    pub failure_actions: Vec<Action>,
    #[serde(default)]
    pub kpi_references: Vec<String>,
    #[serde(default)]
    pub use_verifications_for_kpi: bool,
    /// Read as a fallback for `Edge::enable_sibling_shortcuts` (Open
    /// Questions, precedence preserved).
    #[serde(default)]
    pub enable_sibling_shortcuts: bool,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum ValidationStatus {
    Success,
    Failed,
    FailedRecovered,
}

/// A single controller invocation (spec.md §3 `Action`).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Action {
    pub command: String,
    #[serde(default)]
    pub action_type: String,
    #[serde(default)]
    pub params: serde_json::Value,
    #[serde(default)]
    pub wait_time_ms: Option<u64>,
    #[serde(default)]
    pub validation_status: Option<ValidationStatus>,
    #[serde(default)]
    pub validated_at: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(default)]
    pub actual_result: Option<serde_json::Value>,
}

impl Action {
    pub fn new(command: impl Into<String>, params: serde_json::Value) -> Self {
        Self {
            command: command.into(),
            action_type: String::new(),
            params,
            wait_time_ms: None,
            validation_status: None,
            validated_at: None,
            actual_result: None,
        }
    }
}

/// A post-condition check (spec.md §3 `Verification`).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Verification {
    pub command: String,
    pub verification_type: String,
    #[serde(default)]
    pub params: serde_json::Value,
    #[serde(default)]
    pub expected: serde_json::Value,
}

// ---------------------------------------------------------------------------
// Execution record (spec.md §3)
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    Running,
    Completed,
    Error,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExecutionRecord {
    pub execution_id: ExecutionId,
    pub status: ExecutionStatus,
    pub tree_id: TreeId,
    pub target_node_id: Option<NodeId>,
    pub target_node_label: Option<String>,
    pub progress: u8,
    pub message: String,
    pub start_time: chrono::DateTime<chrono::Utc>,
    pub result: Option<serde_json::Value>,
    pub error: Option<String>,
}

impl ExecutionRecord {
    pub fn new(execution_id: ExecutionId, tree_id: TreeId) -> Self {
        Self {
            execution_id,
            status: ExecutionStatus::Running,
            tree_id,
            target_node_id: None,
            target_node_label: None,
            progress: 0,
            message: "started".to_string(),
            start_time: chrono::Utc::now(),
            result: None,
            error: None,
        }
    }
}

//! Error taxonomy for the device-automation control plane (spec.md §7).

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum Error {
    /// Missing env var, unknown `{type, implementation}` controller pair.
    #[error("config error: {0}")]
    Config(String),

    /// `load_navigation_tree` couldn't find the named userinterface.
    #[error("userinterface not found: {0}")]
    UserInterfaceNotFound(String),

    /// `load_navigation_tree` found a userinterface with no root tree.
    #[error("no root tree for userinterface: {0}")]
    NoRootTree(String),

    /// Resolving an arbitrary tree_id to its root failed.
    #[error("navigation tree error: {0}")]
    NavigationTree(String),

    /// Unified-graph build or patch failed.
    #[error("unified cache error: {0}")]
    UnifiedCache(String),

    #[error("no path from {from} to {to}")]
    PathNotFound { from: String, to: String },

    #[error("ambiguous target label: {0}")]
    AmbiguousTarget(String),

    #[error("no entry point in graph")]
    NoEntryPoint,

    #[error("controller error: {kind} - {message}")]
    Controller { kind: String, message: String },

    #[error("verification failed: {0}")]
    Verification(String),

    #[error("could not recover exploration to start node: {0}")]
    ExplorationRecovery(String),

    #[error("persistence error: {0}")]
    Persistence(String),

    #[error("execution not found: {0}")]
    ExecutionNotFound(String),

    #[error("exploration not found: {0}")]
    ExplorationNotFound(String),

    /// Request named a device id the host has no registration for
    /// (spec.md §6: unknown device/tree/node maps to 404).
    #[error("device not found: {0}")]
    DeviceNotFound(String),

    /// Invalid state-machine transition: the request's source state
    /// doesn't match the exploration's current state (spec.md §8.7).
    #[error("invalid transition: {action} is not valid from state {state}")]
    InvalidTransition { action: String, state: String },

    #[error("internal error: {0}")]
    Internal(String),

    /// Missing or mismatched bearer token on an authenticated gateway route.
    #[error("auth error: {0}")]
    Auth(String),

    /// Request is missing a required field or query param, or names an
    /// ambiguous target (spec.md §7: 400, distinct from `Config`'s
    /// construction-time, log-and-continue meaning).
    #[error("invalid request: {0}")]
    Validation(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn controller(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Controller {
            kind: kind.into(),
            message: message.into(),
        }
    }

    pub fn invalid_transition(action: impl Into<String>, state: impl ToString) -> Self {
        Self::InvalidTransition {
            action: action.into(),
            state: state.to_string(),
        }
    }

    pub fn auth_failed(msg: impl Into<String>) -> Self {
        Self::Auth(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// True for errors spec.md §7 maps to HTTP 400 (client-correctable).
    pub fn is_bad_request(&self) -> bool {
        matches!(
            self,
            Self::PathNotFound { .. }
                | Self::AmbiguousTarget(_)
                | Self::NoEntryPoint
                | Self::Auth(_)
                | Self::InvalidTransition { .. }
                | Self::Validation(_)
        )
    }

    /// True for errors spec.md §7 maps to HTTP 404.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::UserInterfaceNotFound(_)
                | Self::NoRootTree(_)
                | Self::ExecutionNotFound(_)
                | Self::ExplorationNotFound(_)
                | Self::DeviceNotFound(_)
        )
    }

    /// HTTP status code per spec.md §7's table.
    pub fn status_code(&self) -> u16 {
        if self.is_bad_request() {
            400
        } else if self.is_not_found() {
            404
        } else {
            500
        }
    }
}

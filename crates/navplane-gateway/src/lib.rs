//! HTTP gateway (spec.md §6): a thin axum router exposing navigation
//! execution/preview/cache and exploration-lifecycle operations over the
//! executors and caches built by the lower crates.

pub mod auth;
pub mod server;

pub use server::{start_gateway, GatewayConfig, GatewayState};

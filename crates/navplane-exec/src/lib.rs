//! Navigation executor: graph loading, pathfinding dispatch, and the
//! shared async task fabric (spec.md §4.4, §4.7).

pub mod events;
pub mod executor;
pub mod registry;
pub mod tasks;

pub use events::ExecutionEvent;
pub use executor::{LoadedGraph, NavigationExecutor, NavigationTarget, VerificationOutcome};
pub use registry::{ExecutionHandle, ExecutionRegistry};
pub use tasks::{spawn_tracked, CompletionCallback, TaskOutcome};

//! Shared async task fabric (spec.md §4.7), grounded in the teacher's
//! `agenticlaw-agent::queue` event-loop shape, simplified to: allocate a
//! UUID, record a status, `tokio::spawn` the work, write back on
//! completion, optionally POST a callback. Shared by the navigation
//! executor and the exploration engine.

use std::future::Future;
use std::sync::Arc;

/// Outcome written back once a spawned unit of work finishes.
#[derive(Clone, Debug)]
pub enum TaskOutcome {
    Completed(serde_json::Value),
    Failed(String),
}

/// A callback invoked with the task's id and outcome once it finishes,
/// e.g. to update an `ExecutionRegistry`/`ExplorationRegistry` entry or
/// POST a webhook. Boxed so both crates can supply closures without a
/// generic parameter threading through every call site.
pub type CompletionCallback = Arc<dyn Fn(String, TaskOutcome) + Send + Sync>;

/// Spawns `work` on the tokio runtime, tagging it with `task_id`, and
/// invokes `on_complete` with the resulting `TaskOutcome`. The caller's
/// `work` future produces a `Result<serde_json::Value, String>` instead of
/// `navplane_core::Result` so this module stays decoupled from the error
/// taxonomy of whichever crate is driving it.
pub fn spawn_tracked<F>(task_id: String, on_complete: CompletionCallback, work: F)
where
    F: Future<Output = Result<serde_json::Value, String>> + Send + 'static,
{
    tokio::spawn(async move {
        let outcome = match work.await {
            Ok(value) => TaskOutcome::Completed(value),
            Err(message) => TaskOutcome::Failed(message),
        };
        on_complete(task_id, outcome);
    });
}

//! Execution record registry (spec.md §4.4), grounded in the teacher's
//! `SessionRegistry` — a `DashMap` keyed by id, wrapped in a small struct
//! rather than exposed directly.

use dashmap::DashMap;
use navplane_core::{ExecutionId, ExecutionRecord, ExecutionStatus, Result, TreeId};
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct ExecutionHandle(Arc<Mutex<ExecutionRecord>>);

impl ExecutionHandle {
    pub async fn snapshot(&self) -> ExecutionRecord {
        self.0.lock().await.clone()
    }

    pub async fn set_progress(&self, progress: u8, message: impl Into<String>) {
        let mut rec = self.0.lock().await;
        rec.progress = progress;
        rec.message = message.into();
    }

    pub async fn complete(&self, result: serde_json::Value) {
        let mut rec = self.0.lock().await;
        rec.status = ExecutionStatus::Completed;
        rec.progress = 100;
        rec.result = Some(result);
    }

    pub async fn fail(&self, error: impl Into<String>) {
        let mut rec = self.0.lock().await;
        rec.status = ExecutionStatus::Error;
        rec.error = Some(error.into());
    }
}

#[derive(Default)]
pub struct ExecutionRegistry {
    executions: DashMap<ExecutionId, ExecutionHandle>,
}

impl ExecutionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self, execution_id: ExecutionId, tree_id: TreeId) -> ExecutionHandle {
        let handle = ExecutionHandle(Arc::new(Mutex::new(ExecutionRecord::new(execution_id.clone(), tree_id))));
        self.executions.insert(execution_id, handle.clone());
        handle
    }

    pub fn get(&self, execution_id: &ExecutionId) -> Option<ExecutionHandle> {
        self.executions.get(execution_id).map(|e| e.clone())
    }

    pub async fn status(&self, execution_id: &ExecutionId) -> Result<ExecutionRecord> {
        match self.get(execution_id) {
            Some(handle) => Ok(handle.snapshot().await),
            None => Err(navplane_core::Error::ExecutionNotFound(execution_id.to_string())),
        }
    }

    pub fn remove(&self, execution_id: &ExecutionId) {
        self.executions.remove(execution_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_and_fetch_status() {
        let registry = ExecutionRegistry::new();
        let id = ExecutionId::new("ex-1");
        registry.create(id.clone(), TreeId::new("t1"));
        let status = registry.status(&id).await.unwrap();
        assert_eq!(status.status, ExecutionStatus::Running);
    }

    #[tokio::test]
    async fn complete_updates_progress_and_result() {
        let registry = ExecutionRegistry::new();
        let id = ExecutionId::new("ex-1");
        let handle = registry.create(id.clone(), TreeId::new("t1"));
        handle.complete(serde_json::json!({"ok": true})).await;
        let status = registry.status(&id).await.unwrap();
        assert_eq!(status.status, ExecutionStatus::Completed);
        assert_eq!(status.progress, 100);
    }

    #[tokio::test]
    async fn missing_id_errors() {
        let registry = ExecutionRegistry::new();
        let err = registry.status(&ExecutionId::new("nope")).await.unwrap_err();
        assert!(err.is_not_found());
    }
}

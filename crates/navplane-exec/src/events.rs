//! Execution progress events (spec.md §4.4), grounded in the teacher's
//! `AgentEvent` — a small enum broadcast while a background task runs, kept
//! separate from the terminal `ExecutionRecord` so callers can observe
//! step-by-step progress without polling.

use navplane_core::{EdgeId, ExecutionId, NodeId};

#[derive(Clone, Debug)]
pub enum ExecutionEvent {
    Started { execution_id: ExecutionId },
    StepStarted { execution_id: ExecutionId, edge_id: EdgeId },
    StepSucceeded { execution_id: ExecutionId, edge_id: EdgeId, progress: u8 },
    StepRetried { execution_id: ExecutionId, edge_id: EdgeId },
    StepFailed { execution_id: ExecutionId, edge_id: EdgeId, error: String },
    VerificationRan { execution_id: ExecutionId, node_id: NodeId, passed: bool },
    Completed { execution_id: ExecutionId },
    Errored { execution_id: ExecutionId, error: String },
}

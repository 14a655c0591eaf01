//! Exploration phase state machine (spec.md §4.5, §8.7), grounded in the
//! teacher's `agenticlaw-kg::manifest::NodeState` (an explicit, closed enum
//! of lifecycle states) and `agenticlaw-agent::queue::QueueEvent` (an
//! explicit enum of things that can drive a transition): every state
//! transition is a pure function from `(State, Action) -> Result<State>`.
//! `ExplorationExecutor` holds the only state a real run needs —
//! `Run::state`, behind the same `Mutex` that guards the rest of the
//! run's context — and calls `transition` directly rather than through a
//! second, separately-locked wrapper.

use navplane_core::{Error, Result};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExplorationState {
    Idle,
    Analysis,
    AwaitingApproval,
    StructureCreated,
    AwaitingValidation,
    Validating,
    ValidationComplete,
    AwaitingNodeVerification,
    NodeVerificationComplete,
    Finalized,
    Cancelled,
    Failed,
}

impl std::fmt::Display for ExplorationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Analysis => "analysis",
            Self::AwaitingApproval => "awaiting_approval",
            Self::StructureCreated => "structure_created",
            Self::AwaitingValidation => "awaiting_validation",
            Self::Validating => "validating",
            Self::ValidationComplete => "validation_complete",
            Self::AwaitingNodeVerification => "awaiting_node_verification",
            Self::NodeVerificationComplete => "node_verification_complete",
            Self::Finalized => "finalized",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

/// Every request that can move the state machine (spec.md §4.5 diagram).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ExplorationAction {
    StartExploration,
    AnalysisComplete,
    ContinueExploration,
    StartValidation,
    ValidateNextItem,
    AllItemsValidated,
    StartNodeVerification,
    ApproveNodeVerifications,
    FinalizeStructure,
    CancelExploration,
    Fail,
}

impl ExplorationAction {
    fn as_str(&self) -> &'static str {
        match self {
            Self::StartExploration => "start_exploration",
            Self::AnalysisComplete => "analysis_complete",
            Self::ContinueExploration => "continue_exploration",
            Self::StartValidation => "start_validation",
            Self::ValidateNextItem => "validate_next_item",
            Self::AllItemsValidated => "all_items_validated",
            Self::StartNodeVerification => "start_node_verification",
            Self::ApproveNodeVerifications => "approve_node_verifications",
            Self::FinalizeStructure => "finalize_structure",
            Self::CancelExploration => "cancel_exploration",
            Self::Fail => "fail",
        }
    }
}

/// Pure transition function (spec.md §4.5 diagram + "Anywhere →
/// cancel_exploration" / "Any failure ⇒ failed").
pub(crate) fn transition(state: ExplorationState, action: ExplorationAction) -> Result<ExplorationState> {
    use ExplorationAction as A;
    use ExplorationState as S;

    if action == A::CancelExploration {
        return Ok(S::Cancelled);
    }
    if action == A::Fail {
        return Ok(S::Failed);
    }

    let next = match (state, action) {
        (S::Idle, A::StartExploration) => S::Analysis,
        (S::Analysis, A::AnalysisComplete) => S::AwaitingApproval,
        (S::AwaitingApproval, A::ContinueExploration) => S::StructureCreated,
        (S::StructureCreated, A::StartValidation) => S::AwaitingValidation,
        (S::AwaitingValidation, A::ValidateNextItem) => S::Validating,
        (S::Validating, A::ValidateNextItem) => S::AwaitingValidation,
        (S::Validating, A::AllItemsValidated) => S::ValidationComplete,
        (S::ValidationComplete, A::StartNodeVerification) => S::AwaitingNodeVerification,
        (S::AwaitingNodeVerification, A::ApproveNodeVerifications) => S::NodeVerificationComplete,
        (S::NodeVerificationComplete, A::FinalizeStructure) => S::Finalized,
        _ => {
            return Err(Error::invalid_transition(action.as_str(), state));
        }
    };
    Ok(next)
}

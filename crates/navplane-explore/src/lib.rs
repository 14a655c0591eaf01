//! Exploration executor, engine, and supporting phase modules
//! (spec.md §4.5, §4.6): automatically discovering a device's navigation
//! structure from a natural-language prompt.

pub mod cleanup;
pub mod context;
pub mod engine;
pub mod executor;
pub mod sanitize;
pub mod state;
pub mod structure;
pub mod verification;

pub use context::{ContextSummary, ExplorationContext, FailedItem, MenuType, Strategy, StepRecord};
pub use engine::ExplorationEngine;
pub use executor::{ExplorationExecutor, ExplorationStatus, FinalizeOutcome, StructureCreated, ValidationOutcome};
pub use sanitize::sanitize_node_name;
pub use state::{ExplorationAction, ExplorationState};
pub use structure::{build_structure, Structure};
pub use verification::{ApprovedVerification, NodeVerificationData, VerificationSuggestion};

//! Navigation graph store, cache, and pathfinder (spec.md §4.2, §4.3).

pub mod build;
pub mod cache;
pub mod model;
pub mod pathfinder;
pub mod validate;

pub use build::{build_tree_graph, build_unified_graph, TreeData};
pub use cache::UnifiedGraphCache;
pub use model::{Graph, GraphEdge};
pub use pathfinder::{pick_entry_point, resolve_target_label, shortest_path, validation_sequence, Path, PathStep, ValidationStep};
pub use validate::GraphReport;

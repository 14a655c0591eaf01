//! Shared types, error taxonomy, configuration, and external-collaborator
//! traits for the device-automation control plane.

pub mod config;
pub mod error;
pub mod object_store;
pub mod persistence;
pub mod types;

pub use config::{DeviceConfig, HostConfig};
pub use error::{Error, Result};
pub use object_store::{NullObjectStore, ObjectStore, UploadResult};
pub use persistence::{FullTree, MemoryPersistence, PersistenceBackend};
pub use types::*;

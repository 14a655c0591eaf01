//! Object-store contract (spec.md §6): screenshot/recording uploads used by
//! the exploration engine. Real uploads (R2, S3, ...) are out of scope; the
//! crate ships a no-op implementation for tests.

use async_trait::async_trait;

use crate::error::Result;

#[derive(Clone, Debug)]
pub struct UploadResult {
    pub url: String,
    pub size_bytes: u64,
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn upload(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<UploadResult>;
}

/// No-op `ObjectStore` that echoes a deterministic synthetic URL, sufficient
/// for tests that need an upload contract to be satisfied without a real
/// backend (spec.md §1's "in-memory/no-op implementations").
#[derive(Default)]
pub struct NullObjectStore;

#[async_trait]
impl ObjectStore for NullObjectStore {
    async fn upload(&self, key: &str, bytes: &[u8], _content_type: &str) -> Result<UploadResult> {
        Ok(UploadResult {
            url: format!("memory://{key}"),
            size_bytes: bytes.len() as u64,
        })
    }
}

pub mod error;
pub mod filesystem;

pub use error::StorageError;
pub use filesystem::FilesystemStorage;

use async_trait::async_trait;
use std::sync::Arc;

/// Object storage seam. The library only ever needs three operations, so
/// providers stay small: write-once put, batch delete, and public URL
/// resolution.
#[async_trait]
pub trait StorageGateway: Send + Sync {
    /// Write an object. Never overwrites: an object already present at
    /// `path` yields [`StorageError::AlreadyExists`].
    async fn put_object(
        &self,
        path: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<(), StorageError>;

    /// Delete a batch of objects. Callers are responsible for chunking to
    /// the provider batch limit.
    async fn delete_objects(&self, paths: &[String]) -> Result<(), StorageError>;

    /// Publicly resolvable URL for a stored object.
    fn resolve_public_url(&self, path: &str) -> Result<String, StorageError>;

    fn name(&self) -> &str;
}

pub type DynStorage = Arc<dyn StorageGateway>;

pub fn create_gateway(config: &crate::StorageConfig, base_url: Option<&str>) -> DynStorage {
    Arc::new(FilesystemStorage::new(
        config.root_directory.clone(),
        base_url.unwrap_or("").to_string(),
        config.public_prefix.clone(),
    ))
}

pub mod deletion;
pub mod error;
pub mod folders;
pub mod handlers;
pub mod ordering;
pub mod types;
pub mod upload;

pub use error::AssetError;
pub use folders::folder_index;
pub use handlers::{
    delete_all_handler, delete_asset_handler, delete_category_handler, folders_handler,
    list_assets_handler, reorder_handler, upload_handler,
};
pub use types::*;
pub use upload::ProgressSnapshot;

#[cfg(test)]
mod tests;

use crate::catalog::{Asset, SharedCatalog};
use crate::storage::DynStorage;
use std::sync::Arc;

pub type SharedLibrary = Arc<AssetLibrary>;

/// The back office's asset-management core: upload pipeline, ordering
/// engine, folder index, and deletion. Owns its collaborators and its
/// progress counters instead of reading ambient state.
pub struct AssetLibrary {
    pub(crate) storage: DynStorage,
    pub(crate) catalog: SharedCatalog,
    pub(crate) config: crate::LibraryConfig,
    /// URL route prefix backing objects are served under, used to derive
    /// storage paths for rows that predate the explicit path column.
    pub(crate) media_prefix: String,
    /// Serializes upload batches. The sort base is read from a snapshot and
    /// the progress counters assume a single writer, so concurrent batches
    /// must queue.
    pub(crate) batch_lock: tokio::sync::Mutex<()>,
    pub(crate) progress: Arc<upload::UploadProgress>,
}

impl AssetLibrary {
    pub fn new(
        storage: DynStorage,
        catalog: SharedCatalog,
        config: crate::LibraryConfig,
        media_prefix: String,
    ) -> Self {
        Self {
            storage,
            catalog,
            config,
            media_prefix,
            batch_lock: tokio::sync::Mutex::new(()),
            progress: Arc::new(upload::UploadProgress::default()),
        }
    }

    /// Current snapshot of all catalog rows, for the admin dashboard.
    pub async fn snapshot(&self) -> Result<Vec<Asset>, AssetError> {
        Ok(self.catalog.all_assets().await?)
    }

    pub async fn folders(&self) -> Result<Vec<FolderSummary>, AssetError> {
        let snapshot = self.catalog.all_assets().await?;
        let vocabulary: Vec<&str> = self
            .config
            .known_categories
            .iter()
            .map(|c| c.as_str())
            .collect();
        Ok(folder_index(&snapshot, &vocabulary))
    }

    pub fn progress(&self) -> ProgressSnapshot {
        self.progress.snapshot()
    }
}

use crate::catalog::CatalogError;
use crate::storage::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("no files in upload batch")]
    EmptyBatch,

    #[error("destructive operation requires explicit confirmation")]
    NotConfirmed,

    #[error("asset {0} not found")]
    UnknownAsset(u64),

    /// The asset's backing object cannot be located, so deleting only its
    /// catalog row is refused.
    #[error("cannot resolve storage path for asset {0}")]
    MissingStoragePath(u64),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),
}

mod error;
mod json_store;
mod types;

pub use error::CatalogError;
pub use json_store::JsonCatalog;
pub use types::*;

use async_trait::async_trait;
use std::sync::Arc;

/// Relational seam for asset rows. Implementations assign ids at insert
/// time and must report an ordering column their schema does not carry as
/// the typed [`CatalogError::UnknownOrderColumn`], distinct from generic
/// failure, so readers can degrade gracefully.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn insert(&self, row: NewAsset) -> Result<Asset, CatalogError>;

    /// The only post-creation mutation in this design.
    async fn update_sort_order(&self, id: u64, sort_order: i64) -> Result<(), CatalogError>;

    async fn delete(&self, id: u64) -> Result<(), CatalogError>;

    /// Delete every row in one category (normalized match), returning how
    /// many rows were removed.
    async fn delete_where_category(&self, category: &str) -> Result<usize, CatalogError>;

    async fn delete_all(&self) -> Result<usize, CatalogError>;

    async fn query(&self, query: AssetQuery) -> Result<Vec<Asset>, CatalogError>;

    /// Full snapshot, unordered. Admin views and the ordering engine work
    /// from this rather than from ambient state.
    async fn all_assets(&self) -> Result<Vec<Asset>, CatalogError>;
}

pub type SharedCatalog = Arc<dyn CatalogStore>;

pub mod error;
pub mod handlers;
pub mod lightbox;
pub mod types;

pub use error::GalleryError;
pub use handlers::gallery_page_handler;
pub use lightbox::{Lightbox, SWIPE_THRESHOLD};
pub use types::*;


use crate::catalog::{AssetQuery, CatalogError, OrderBy, SharedCatalog};
use std::sync::Arc;
use tracing::warn;

pub type SharedReader = Arc<GalleryReader>;

/// Anonymous read path over the catalog: fixed-size pages, fixed filter
/// vocabulary, and a degraded ordering fallback for catalogs that predate
/// the sort column.
pub struct GalleryReader {
    catalog: SharedCatalog,
    page_size: usize,
}

impl GalleryReader {
    pub fn new(catalog: SharedCatalog, page_size: usize) -> Self {
        Self { catalog, page_size }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Fetch one page. `has_more` is false exactly when the returned
    /// window came back shorter than the page size, so callers stop
    /// paging. Every returned item is re-validated against the filter
    /// before it is handed out, regardless of what the query claimed.
    pub async fn fetch_page(
        &self,
        filter: GalleryFilter,
        page: usize,
    ) -> Result<GalleryPage, GalleryError> {
        let query = AssetQuery {
            order_by: OrderBy::SortOrderThenCreated,
            category_contains: filter.needle().map(|n| n.to_string()),
            offset: page.saturating_mul(self.page_size),
            limit: self.page_size,
        };

        let rows = match self.catalog.query(query.clone()).await {
            Ok(rows) => rows,
            Err(CatalogError::UnknownOrderColumn(column)) => {
                // Degraded schema: fall back to creation-time ordering.
                warn!(column = %column, "ordering column unavailable, using creation order");
                self.catalog
                    .query(AssetQuery {
                        order_by: OrderBy::CreatedDesc,
                        ..query
                    })
                    .await?
            }
            Err(e) => return Err(e.into()),
        };

        let has_more = rows.len() == self.page_size;
        let items: Vec<GalleryItem> = rows
            .into_iter()
            .filter(|asset| filter.matches(asset))
            .map(GalleryItem::from)
            .collect();

        Ok(GalleryPage {
            items,
            page,
            page_size: self.page_size,
            has_more,
            filter: filter.as_str().to_string(),
        })
    }
}

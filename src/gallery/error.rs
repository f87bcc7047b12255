use thiserror::Error;

#[derive(Debug, Error)]
pub enum GalleryError {
    #[error("catalog error: {0}")]
    Catalog(#[from] crate::catalog::CatalogError),
}

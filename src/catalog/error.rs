use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    /// The store's schema does not carry the requested ordering column.
    /// Readers treat this as a recoverable degraded-schema condition.
    #[error("unknown ordering column: {0}")]
    UnknownOrderColumn(String),

    #[error("asset {0} not found")]
    NotFound(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

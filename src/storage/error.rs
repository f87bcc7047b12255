use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("object already exists at {0}")]
    AlreadyExists(String),

    #[error("no public URL available for {0}")]
    NoPublicUrl(String),

    #[error("invalid object path: {0}")]
    InvalidPath(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

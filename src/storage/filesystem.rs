use super::{StorageError, StorageGateway};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Stores objects as files under a root directory. Public URLs point at the
/// server's own media route, so `base_url` + `public_prefix` must match how
/// the router serves the root directory.
pub struct FilesystemStorage {
    root: PathBuf,
    base_url: String,
    public_prefix: String,
}

impl FilesystemStorage {
    pub fn new(root: PathBuf, base_url: String, public_prefix: String) -> Self {
        Self {
            root,
            base_url,
            public_prefix,
        }
    }

    fn resolve_local(&self, path: &str) -> Result<PathBuf, StorageError> {
        validate_object_path(path)?;
        Ok(self.root.join(path))
    }
}

/// Object paths are relative, slash-separated, and must not escape the root.
fn validate_object_path(path: &str) -> Result<(), StorageError> {
    if path.is_empty() || path.starts_with('/') {
        return Err(StorageError::InvalidPath(path.to_string()));
    }
    for component in Path::new(path).components() {
        match component {
            std::path::Component::Normal(_) => {}
            _ => return Err(StorageError::InvalidPath(path.to_string())),
        }
    }
    Ok(())
}

#[async_trait]
impl StorageGateway for FilesystemStorage {
    async fn put_object(
        &self,
        path: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<(), StorageError> {
        let local = self.resolve_local(path)?;

        if let Some(parent) = local.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        // create_new gives us the collision signal without a racy
        // exists-then-write check.
        let mut options = tokio::fs::OpenOptions::new();
        options.write(true).create_new(true);
        let mut file = match options.open(&local).await {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(StorageError::AlreadyExists(path.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        use tokio::io::AsyncWriteExt;
        file.write_all(bytes).await?;
        file.flush().await?;

        debug!(
            path = %path,
            size = bytes.len(),
            content_type = %content_type,
            "stored object"
        );
        Ok(())
    }

    async fn delete_objects(&self, paths: &[String]) -> Result<(), StorageError> {
        for path in paths {
            let local = self.resolve_local(path)?;
            match tokio::fs::remove_file(&local).await {
                Ok(()) => debug!(path = %path, "deleted object"),
                // Batch deletes tolerate already-missing keys.
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    warn!(path = %path, "object missing during delete");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    fn resolve_public_url(&self, path: &str) -> Result<String, StorageError> {
        validate_object_path(path)?;
        let encoded: Vec<String> = path
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect();
        Ok(format!(
            "{}{}/{}",
            self.base_url,
            self.public_prefix,
            encoded.join("/")
        ))
    }

    fn name(&self) -> &str {
        "Filesystem Storage"
    }
}

use super::{AssetError, AssetLibrary, Confirmation, DeletionReport, STORAGE_DELETE_CHUNK};
use crate::catalog::Asset;
use tracing::{info, warn};
use url::Url;

/// Where an asset's backing bytes live, as far as deletion is concerned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageRef {
    /// Uploaded through this system; the object at this path must go when
    /// the row goes.
    Managed(String),
    /// Externally linked; there is no backing object to remove.
    External,
    /// Looks managed but the path cannot be recovered. Deletion is refused
    /// rather than dropping the row and stranding the object.
    Unresolvable,
}

/// Resolve an asset's storage reference: the explicit path column when
/// present, otherwise derived from a media URL under `media_prefix`.
pub fn storage_ref(asset: &Asset, media_prefix: &str) -> StorageRef {
    if let Some(path) = &asset.storage_path {
        return StorageRef::Managed(path.clone());
    }

    let url_path = if let Ok(parsed) = Url::parse(&asset.media_url) {
        parsed.path().to_string()
    } else if asset.media_url.starts_with('/') {
        asset.media_url.clone()
    } else {
        return StorageRef::Unresolvable;
    };

    let prefix = format!("{}/", media_prefix.trim_end_matches('/'));
    match url_path.strip_prefix(&prefix) {
        Some(rest) => match urlencoding::decode(rest) {
            Ok(decoded) if !decoded.is_empty() => StorageRef::Managed(decoded.into_owned()),
            _ => StorageRef::Unresolvable,
        },
        None => StorageRef::External,
    }
}

impl AssetLibrary {
    /// Delete a single asset: object first, then row. An asset whose
    /// backing object cannot be located fails outright; deleting metadata
    /// while leaving bytes behind is not an acceptable outcome here.
    pub async fn delete_asset(&self, id: u64) -> Result<(), AssetError> {
        let snapshot = self.catalog.all_assets().await?;
        let asset = snapshot
            .iter()
            .find(|a| a.id == id)
            .ok_or(AssetError::UnknownAsset(id))?;

        match storage_ref(asset, &self.media_prefix) {
            StorageRef::Managed(path) => {
                self.storage.delete_objects(&[path]).await?;
            }
            StorageRef::External => {
                // No backing object; the row alone is the asset.
            }
            StorageRef::Unresolvable => {
                return Err(AssetError::MissingStoragePath(id));
            }
        }

        self.catalog.delete(id).await?;
        info!(id, "deleted asset");
        Ok(())
    }

    /// Delete every asset in one category. Storage objects go first, in
    /// chunks of [`STORAGE_DELETE_CHUNK`]; catalog rows are only touched
    /// after every chunk succeeded.
    pub async fn delete_category(
        &self,
        category: &str,
        confirmation: Confirmation,
    ) -> Result<DeletionReport, AssetError> {
        if confirmation != Confirmation::Confirmed {
            return Err(AssetError::NotConfirmed);
        }

        let snapshot = self.catalog.all_assets().await?;
        let scope: Vec<&Asset> = snapshot.iter().filter(|a| a.in_category(category)).collect();

        let objects_deleted = self.delete_backing_objects(&scope).await?;
        let rows_deleted = self.catalog.delete_where_category(category).await?;

        info!(
            category = %category,
            objects_deleted,
            rows_deleted,
            "deleted category"
        );
        Ok(DeletionReport {
            objects_deleted,
            rows_deleted,
        })
    }

    /// Delete every asset in the catalog, same object-before-row pattern.
    pub async fn delete_all(
        &self,
        confirmation: Confirmation,
    ) -> Result<DeletionReport, AssetError> {
        if confirmation != Confirmation::Confirmed {
            return Err(AssetError::NotConfirmed);
        }

        let snapshot = self.catalog.all_assets().await?;
        let scope: Vec<&Asset> = snapshot.iter().collect();

        let objects_deleted = self.delete_backing_objects(&scope).await?;
        let rows_deleted = self.catalog.delete_all().await?;

        info!(objects_deleted, rows_deleted, "deleted all assets");
        Ok(DeletionReport {
            objects_deleted,
            rows_deleted,
        })
    }

    /// Resolve and remove the backing objects for a set of assets. Fails
    /// before deleting anything if any asset in scope is unresolvable, and
    /// halts at the first failed chunk so catalog rows are never removed
    /// past a storage failure.
    async fn delete_backing_objects(&self, scope: &[&Asset]) -> Result<usize, AssetError> {
        let mut paths = Vec::new();
        for asset in scope {
            match storage_ref(asset, &self.media_prefix) {
                StorageRef::Managed(path) => paths.push(path),
                StorageRef::External => {}
                StorageRef::Unresolvable => {
                    warn!(id = asset.id, "unresolvable storage path, aborting bulk delete");
                    return Err(AssetError::MissingStoragePath(asset.id));
                }
            }
        }

        let mut deleted = 0;
        for chunk in paths.chunks(STORAGE_DELETE_CHUNK) {
            self.storage.delete_objects(chunk).await?;
            deleted += chunk.len();
        }
        Ok(deleted)
    }
}

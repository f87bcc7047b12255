use super::{AssetError, AssetLibrary, ReorderOutcome};
use crate::catalog::{Asset, CatalogError, SharedCatalog, compare_catalog_order};
use tracing::{error, info};

/// A category's assets in display order.
pub fn current_order(snapshot: &[Asset], category: &str) -> Vec<Asset> {
    let mut assets: Vec<Asset> = snapshot
        .iter()
        .filter(|a| a.in_category(category))
        .cloned()
        .collect();
    assets.sort_by(compare_catalog_order);
    assets
}

/// Single-element move: remove the asset from its current position and
/// insert it at `target_index` in the post-removal list. Returns `None`
/// when the move is a no-op (unknown id or identity move).
pub fn reorder(list: &[Asset], moved_id: u64, target_index: usize) -> Option<Vec<Asset>> {
    let source = list.iter().position(|a| a.id == moved_id)?;

    let mut moved = list.to_vec();
    let asset = moved.remove(source);
    let target = target_index.min(moved.len());
    if target == source {
        return None;
    }
    moved.insert(target, asset);
    Some(moved)
}

/// Persist a category's order as a contiguous 0..N-1 rewrite, one write per
/// asset, in list order. Not atomic; callers reconcile on failure.
pub async fn persist_order(catalog: &SharedCatalog, order: &[Asset]) -> Result<(), CatalogError> {
    for (position, asset) in order.iter().enumerate() {
        catalog.update_sort_order(asset.id, position as i64).await?;
    }
    Ok(())
}

impl AssetLibrary {
    /// Move one asset to a new position within its category. The new order
    /// is applied optimistically; if persisting it fails the canonical
    /// catalog order is reloaded rather than trusting partial state.
    pub async fn reorder_category(
        &self,
        category: &str,
        moved_id: u64,
        target_index: usize,
    ) -> Result<ReorderOutcome, AssetError> {
        let snapshot = self.catalog.all_assets().await?;
        let order = current_order(&snapshot, category);

        let Some(new_order) = reorder(&order, moved_id, target_index) else {
            return Ok(ReorderOutcome::Unchanged);
        };

        match persist_order(&self.catalog, &new_order).await {
            Ok(()) => {
                info!(
                    category = %category,
                    moved_id,
                    target_index,
                    "reordered category"
                );
                Ok(ReorderOutcome::Applied { order: new_order })
            }
            Err(e) => {
                error!(
                    category = %category,
                    error = %e,
                    "failed to persist new order, reloading canonical state"
                );
                let canonical = self.catalog.all_assets().await?;
                Ok(ReorderOutcome::Reverted {
                    order: current_order(&canonical, category),
                    error: e.to_string(),
                })
            }
        }
    }
}

use super::{
    Asset, AssetQuery, CatalogError, CatalogStore, NewAsset, OrderBy, compare_catalog_order,
    normalize_category,
};
use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, info};

const SORT_ORDER_COLUMN: &str = "sort_order";

fn default_columns() -> Vec<String> {
    [
        "id",
        "category",
        "title",
        "media_url",
        "storage_path",
        SORT_ORDER_COLUMN,
        "created_at",
    ]
    .iter()
    .map(|c| c.to_string())
    .collect()
}

/// On-disk representation. The column list is persisted so catalogs written
/// before the ordering column existed keep reporting it as unknown until a
/// sort-order write promotes the schema.
#[derive(Serialize, Deserialize)]
struct CatalogFile {
    #[serde(default = "default_columns")]
    columns: Vec<String>,
    next_id: u64,
    assets: Vec<Asset>,
}

impl Default for CatalogFile {
    fn default() -> Self {
        Self {
            columns: default_columns(),
            next_id: 1,
            assets: Vec::new(),
        }
    }
}

/// File-backed catalog: in-memory state behind a lock, written back after
/// every mutation.
pub struct JsonCatalog {
    path: PathBuf,
    state: RwLock<CatalogFile>,
}

impl JsonCatalog {
    pub async fn load_or_create(path: &Path) -> Result<Self, CatalogError> {
        let state = if path.exists() {
            let content = tokio::fs::read_to_string(path).await?;
            let file: CatalogFile = serde_json::from_str(&content)?;
            info!(
                path = %path.display(),
                assets = file.assets.len(),
                "loaded catalog"
            );
            file
        } else {
            info!(path = %path.display(), "no catalog file found, starting empty");
            CatalogFile::default()
        };

        Ok(Self {
            path: path.to_path_buf(),
            state: RwLock::new(state),
        })
    }

    async fn save(&self, state: &CatalogFile) -> Result<(), CatalogError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_string_pretty(state)?;
        tokio::fs::write(&self.path, content).await?;
        Ok(())
    }
}

fn compare_created_desc(a: &Asset, b: &Asset) -> Ordering {
    b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id))
}

#[async_trait]
impl CatalogStore for JsonCatalog {
    async fn insert(&self, row: NewAsset) -> Result<Asset, CatalogError> {
        let mut state = self.state.write().await;
        let asset = Asset {
            id: state.next_id,
            category: row.category,
            title: row.title,
            media_url: row.media_url,
            storage_path: row.storage_path,
            sort_order: row.sort_order,
            created_at: Utc::now(),
        };
        state.next_id += 1;
        state.assets.push(asset.clone());
        self.save(&state).await?;
        debug!(id = asset.id, category = %asset.category, "inserted asset");
        Ok(asset)
    }

    async fn update_sort_order(&self, id: u64, sort_order: i64) -> Result<(), CatalogError> {
        let mut state = self.state.write().await;
        let asset = state
            .assets
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(CatalogError::NotFound(id))?;
        asset.sort_order = Some(sort_order);
        // Writing the column promotes a legacy schema.
        if !state.columns.iter().any(|c| c == SORT_ORDER_COLUMN) {
            state.columns.push(SORT_ORDER_COLUMN.to_string());
        }
        self.save(&state).await
    }

    async fn delete(&self, id: u64) -> Result<(), CatalogError> {
        let mut state = self.state.write().await;
        let before = state.assets.len();
        state.assets.retain(|a| a.id != id);
        if state.assets.len() == before {
            return Err(CatalogError::NotFound(id));
        }
        self.save(&state).await
    }

    async fn delete_where_category(&self, category: &str) -> Result<usize, CatalogError> {
        let mut state = self.state.write().await;
        let before = state.assets.len();
        state.assets.retain(|a| !a.in_category(category));
        let removed = before - state.assets.len();
        if removed > 0 {
            self.save(&state).await?;
        }
        Ok(removed)
    }

    async fn delete_all(&self) -> Result<usize, CatalogError> {
        let mut state = self.state.write().await;
        let removed = state.assets.len();
        state.assets.clear();
        if removed > 0 {
            self.save(&state).await?;
        }
        Ok(removed)
    }

    async fn query(&self, query: AssetQuery) -> Result<Vec<Asset>, CatalogError> {
        let state = self.state.read().await;

        if query.order_by == OrderBy::SortOrderThenCreated
            && !state.columns.iter().any(|c| c == SORT_ORDER_COLUMN)
        {
            return Err(CatalogError::UnknownOrderColumn(
                SORT_ORDER_COLUMN.to_string(),
            ));
        }

        let mut rows: Vec<Asset> = state
            .assets
            .iter()
            .filter(|a| match &query.category_contains {
                Some(needle) => a
                    .normalized_category()
                    .contains(&normalize_category(needle)),
                None => true,
            })
            .cloned()
            .collect();

        match query.order_by {
            OrderBy::SortOrderThenCreated => rows.sort_by(compare_catalog_order),
            OrderBy::CreatedDesc => rows.sort_by(compare_created_desc),
        }

        Ok(rows
            .into_iter()
            .skip(query.offset)
            .take(query.limit)
            .collect())
    }

    async fn all_assets(&self) -> Result<Vec<Asset>, CatalogError> {
        let state = self.state.read().await;
        Ok(state.assets.clone())
    }
}

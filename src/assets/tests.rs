#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::LibraryConfig;
    use crate::catalog::{Asset, AssetQuery, CatalogError, CatalogStore, NewAsset, OrderBy};
    use crate::storage::{StorageError, StorageGateway};
    use async_trait::async_trait;
    use chrono::Utc;
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::sync::Mutex;

    /// In-memory storage double. Collisions and injected failures mirror
    /// the gateway contract.
    #[derive(Default)]
    struct MemoryStorage {
        objects: Mutex<HashMap<String, Vec<u8>>>,
        delete_calls: Mutex<Vec<Vec<String>>>,
        /// Fail the nth delete_objects call (1-based).
        fail_delete_call: Option<usize>,
        always_collide: bool,
    }

    impl MemoryStorage {
        fn object_count(&self) -> usize {
            self.objects.lock().unwrap().len()
        }

        fn has_object(&self, path: &str) -> bool {
            self.objects.lock().unwrap().contains_key(path)
        }

        fn seed_object(&self, path: &str) {
            self.objects
                .lock()
                .unwrap()
                .insert(path.to_string(), b"seed".to_vec());
        }

        fn delete_call_count(&self) -> usize {
            self.delete_calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl StorageGateway for MemoryStorage {
        async fn put_object(
            &self,
            path: &str,
            bytes: &[u8],
            _content_type: &str,
        ) -> Result<(), StorageError> {
            let mut objects = self.objects.lock().unwrap();
            if self.always_collide || objects.contains_key(path) {
                return Err(StorageError::AlreadyExists(path.to_string()));
            }
            objects.insert(path.to_string(), bytes.to_vec());
            Ok(())
        }

        async fn delete_objects(&self, paths: &[String]) -> Result<(), StorageError> {
            let call_number = {
                let mut calls = self.delete_calls.lock().unwrap();
                calls.push(paths.to_vec());
                calls.len()
            };
            if self.fail_delete_call == Some(call_number) {
                return Err(StorageError::Io(std::io::Error::other("provider outage")));
            }
            let mut objects = self.objects.lock().unwrap();
            for path in paths {
                objects.remove(path);
            }
            Ok(())
        }

        fn resolve_public_url(&self, path: &str) -> Result<String, StorageError> {
            Ok(format!("/media/{path}"))
        }

        fn name(&self) -> &str {
            "Memory Storage"
        }
    }

    /// In-memory catalog double with injectable failures.
    #[derive(Default)]
    struct MemoryCatalog {
        state: Mutex<(u64, Vec<Asset>)>,
        /// Fail inserts once this many rows were inserted by the test body.
        fail_insert_after: Option<usize>,
        inserts: Mutex<usize>,
        /// Fail sort-order updates once this many have gone through.
        fail_update_after: Option<usize>,
        updates: Mutex<usize>,
    }

    impl MemoryCatalog {
        fn seed(&self, category: &str, media_url: &str, path: Option<&str>, sort: Option<i64>) -> u64 {
            let mut state = self.state.lock().unwrap();
            state.0 += 1;
            let id = state.0;
            state.1.push(Asset {
                id,
                category: category.to_string(),
                title: None,
                media_url: media_url.to_string(),
                storage_path: path.map(|p| p.to_string()),
                sort_order: sort,
                created_at: Utc::now(),
            });
            id
        }

        fn asset(&self, id: u64) -> Option<Asset> {
            self.state.lock().unwrap().1.iter().find(|a| a.id == id).cloned()
        }

        fn update_count(&self) -> usize {
            *self.updates.lock().unwrap()
        }
    }

    #[async_trait]
    impl CatalogStore for MemoryCatalog {
        async fn insert(&self, row: NewAsset) -> Result<Asset, CatalogError> {
            {
                let mut inserts = self.inserts.lock().unwrap();
                if self.fail_insert_after.is_some_and(|limit| *inserts >= limit) {
                    return Err(CatalogError::Io(std::io::Error::other("insert refused")));
                }
                *inserts += 1;
            }
            let mut state = self.state.lock().unwrap();
            state.0 += 1;
            let asset = Asset {
                id: state.0,
                category: row.category,
                title: row.title,
                media_url: row.media_url,
                storage_path: row.storage_path,
                sort_order: row.sort_order,
                created_at: Utc::now(),
            };
            state.1.push(asset.clone());
            Ok(asset)
        }

        async fn update_sort_order(&self, id: u64, sort_order: i64) -> Result<(), CatalogError> {
            {
                let mut updates = self.updates.lock().unwrap();
                if self.fail_update_after.is_some_and(|limit| *updates >= limit) {
                    return Err(CatalogError::Io(std::io::Error::other("update refused")));
                }
                *updates += 1;
            }
            let mut state = self.state.lock().unwrap();
            let asset = state
                .1
                .iter_mut()
                .find(|a| a.id == id)
                .ok_or(CatalogError::NotFound(id))?;
            asset.sort_order = Some(sort_order);
            Ok(())
        }

        async fn delete(&self, id: u64) -> Result<(), CatalogError> {
            let mut state = self.state.lock().unwrap();
            let before = state.1.len();
            state.1.retain(|a| a.id != id);
            if state.1.len() == before {
                return Err(CatalogError::NotFound(id));
            }
            Ok(())
        }

        async fn delete_where_category(&self, category: &str) -> Result<usize, CatalogError> {
            let mut state = self.state.lock().unwrap();
            let before = state.1.len();
            state.1.retain(|a| !a.in_category(category));
            Ok(before - state.1.len())
        }

        async fn delete_all(&self) -> Result<usize, CatalogError> {
            let mut state = self.state.lock().unwrap();
            let removed = state.1.len();
            state.1.clear();
            Ok(removed)
        }

        async fn query(&self, query: AssetQuery) -> Result<Vec<Asset>, CatalogError> {
            let state = self.state.lock().unwrap();
            let mut rows: Vec<Asset> = state
                .1
                .iter()
                .filter(|a| match &query.category_contains {
                    Some(needle) => a.normalized_category().contains(needle.as_str()),
                    None => true,
                })
                .cloned()
                .collect();
            match query.order_by {
                OrderBy::SortOrderThenCreated => {
                    rows.sort_by(crate::catalog::compare_catalog_order)
                }
                OrderBy::CreatedDesc => rows.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
            }
            Ok(rows
                .into_iter()
                .skip(query.offset)
                .take(query.limit)
                .collect())
        }

        async fn all_assets(&self) -> Result<Vec<Asset>, CatalogError> {
            Ok(self.state.lock().unwrap().1.clone())
        }
    }

    fn library_config() -> LibraryConfig {
        LibraryConfig {
            known_categories: KNOWN_CATEGORIES.iter().map(|c| c.to_string()).collect(),
            gallery_page_size: 24,
            progress_interval_ms: 250,
        }
    }

    fn library(
        storage: Arc<MemoryStorage>,
        catalog: Arc<MemoryCatalog>,
    ) -> AssetLibrary {
        AssetLibrary::new(storage, catalog, library_config(), "/media".to_string())
    }

    fn file(name: &str, bytes: &[u8]) -> UploadFile {
        UploadFile {
            name: name.to_string(),
            bytes: bytes.to_vec(),
            content_type: "image/jpeg".to_string(),
        }
    }

    #[tokio::test]
    async fn batch_lands_after_existing_assets_in_upload_order() {
        let storage = Arc::new(MemoryStorage::default());
        let catalog = Arc::new(MemoryCatalog::default());
        catalog.seed("Baby", "/media/baby/old.jpg", Some("baby/old.jpg"), Some(4));

        let library = library(storage.clone(), catalog.clone());
        let report = library
            .upload_batch(vec![file("crib.jpg", b"aaa"), file("naptime.jpg", b"bb")], "Baby")
            .await
            .unwrap();

        assert!(report.failed.is_none());
        assert_eq!(report.uploaded.len(), 2);
        assert_eq!(report.uploaded[0].sort_order, Some(5));
        assert_eq!(report.uploaded[1].sort_order, Some(6));
        assert_eq!(report.uploaded[0].title.as_deref(), Some("crib.jpg"));
        assert_eq!(
            report.uploaded[0].storage_path.as_deref(),
            Some("baby/crib.jpg")
        );
        assert_eq!(report.uploaded[0].media_url, "/media/baby/crib.jpg");
        assert_eq!(report.bytes_transferred, 5);
        assert!(storage.has_object("baby/crib.jpg"));
        assert!(storage.has_object("baby/naptime.jpg"));
    }

    #[tokio::test]
    async fn simultaneous_batches_queue_and_get_distinct_positions() {
        let storage = Arc::new(MemoryStorage::default());
        let catalog = Arc::new(MemoryCatalog::default());
        let library = library(storage, catalog.clone());

        let (a, b) = tokio::join!(
            library.upload_batch(vec![file("a.jpg", b"1")], "Weddings"),
            library.upload_batch(vec![file("b.jpg", b"2")], "Weddings"),
        );
        assert!(a.unwrap().failed.is_none());
        assert!(b.unwrap().failed.is_none());

        // Whichever batch ran second saw the first one's row in its sort
        // base, so the positions never collide.
        let mut orders: Vec<i64> = catalog
            .all_assets()
            .await
            .unwrap()
            .iter()
            .filter_map(|x| x.sort_order)
            .collect();
        orders.sort_unstable();
        assert_eq!(orders, vec![0, 1]);
    }

    #[tokio::test]
    async fn empty_batch_is_rejected_without_io() {
        let storage = Arc::new(MemoryStorage::default());
        let catalog = Arc::new(MemoryCatalog::default());
        let library = library(storage.clone(), catalog);

        let err = library.upload_batch(Vec::new(), "Baby").await.unwrap_err();
        assert!(matches!(err, AssetError::EmptyBatch));
        assert_eq!(storage.object_count(), 0);
    }

    #[tokio::test]
    async fn failed_insert_leaves_no_orphaned_object() {
        let storage = Arc::new(MemoryStorage::default());
        let catalog = Arc::new(MemoryCatalog {
            fail_insert_after: Some(0),
            ..Default::default()
        });

        let library = library(storage.clone(), catalog.clone());
        let report = library
            .upload_batch(vec![file("veil.jpg", b"abc")], "Weddings")
            .await
            .unwrap();

        let failure = report.failed.unwrap();
        assert_eq!(failure.index, 0);
        assert_eq!(failure.file_name, "veil.jpg");
        assert!(report.uploaded.is_empty());
        // Compensating delete removed the just-written object.
        assert_eq!(storage.object_count(), 0);
        assert!(catalog.all_assets().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn failure_mid_batch_keeps_earlier_files_and_skips_later_ones() {
        let storage = Arc::new(MemoryStorage::default());
        let catalog = Arc::new(MemoryCatalog {
            fail_insert_after: Some(1),
            ..Default::default()
        });

        let library = library(storage.clone(), catalog.clone());
        let report = library
            .upload_batch(
                vec![
                    file("one.jpg", b"1"),
                    file("two.jpg", b"2"),
                    file("three.jpg", b"3"),
                ],
                "Weddings",
            )
            .await
            .unwrap();

        assert_eq!(report.uploaded.len(), 1);
        assert_eq!(report.uploaded[0].title.as_deref(), Some("one.jpg"));
        let failure = report.failed.unwrap();
        assert_eq!(failure.index, 1);
        assert_eq!(failure.file_name, "two.jpg");

        // File one committed, file two compensated, file three never tried.
        assert!(storage.has_object("weddings/one.jpg"));
        assert!(!storage.has_object("weddings/two.jpg"));
        assert!(!storage.has_object("weddings/three.jpg"));
        assert_eq!(catalog.all_assets().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn path_collision_is_retried_once_with_a_unique_name() {
        let storage = Arc::new(MemoryStorage::default());
        storage.seed_object("weddings/rings.jpg");
        let catalog = Arc::new(MemoryCatalog::default());

        let library = library(storage.clone(), catalog);
        let report = library
            .upload_batch(vec![file("rings.jpg", b"xyz")], "Weddings")
            .await
            .unwrap();

        assert!(report.failed.is_none());
        let path = report.uploaded[0].storage_path.clone().unwrap();
        assert_ne!(path, "weddings/rings.jpg");
        assert!(path.starts_with("weddings/"));
        assert!(path.ends_with("_rings.jpg"));
        assert!(storage.has_object(&path));
    }

    #[tokio::test]
    async fn persistent_collision_fails_the_file() {
        let storage = Arc::new(MemoryStorage {
            always_collide: true,
            ..Default::default()
        });
        let catalog = Arc::new(MemoryCatalog::default());

        let library = library(storage, catalog.clone());
        let report = library
            .upload_batch(vec![file("rings.jpg", b"xyz")], "Weddings")
            .await
            .unwrap();

        assert!(report.uploaded.is_empty());
        assert!(report.failed.is_some());
        assert!(catalog.all_assets().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn moving_an_asset_persists_a_contiguous_order() {
        let storage = Arc::new(MemoryStorage::default());
        let catalog = Arc::new(MemoryCatalog::default());
        let a = catalog.seed("Weddings", "/media/w/a.jpg", Some("w/a.jpg"), Some(0));
        let b = catalog.seed("Weddings", "/media/w/b.jpg", Some("w/b.jpg"), Some(1));
        let c = catalog.seed("Weddings", "/media/w/c.jpg", Some("w/c.jpg"), Some(2));
        let d = catalog.seed("Weddings", "/media/w/d.jpg", Some("w/d.jpg"), Some(3));

        let library = library(storage, catalog.clone());
        let outcome = library.reorder_category("Weddings", d, 0).await.unwrap();

        let ReorderOutcome::Applied { order } = outcome else {
            panic!("expected applied reorder");
        };
        let ids: Vec<u64> = order.iter().map(|x| x.id).collect();
        assert_eq!(ids, vec![d, a, b, c]);

        assert_eq!(catalog.asset(d).unwrap().sort_order, Some(0));
        assert_eq!(catalog.asset(a).unwrap().sort_order, Some(1));
        assert_eq!(catalog.asset(b).unwrap().sort_order, Some(2));
        assert_eq!(catalog.asset(c).unwrap().sort_order, Some(3));
    }

    #[tokio::test]
    async fn reorder_to_current_position_issues_no_writes() {
        let storage = Arc::new(MemoryStorage::default());
        let catalog = Arc::new(MemoryCatalog::default());
        let a = catalog.seed("Weddings", "/media/w/a.jpg", Some("w/a.jpg"), Some(0));
        catalog.seed("Weddings", "/media/w/b.jpg", Some("w/b.jpg"), Some(1));

        let library = library(storage, catalog.clone());
        let outcome = library.reorder_category("Weddings", a, 0).await.unwrap();

        assert!(matches!(outcome, ReorderOutcome::Unchanged));
        assert_eq!(catalog.update_count(), 0);

        // Unknown ids are also a no-op.
        let outcome = library.reorder_category("Weddings", 999, 0).await.unwrap();
        assert!(matches!(outcome, ReorderOutcome::Unchanged));
        assert_eq!(catalog.update_count(), 0);
    }

    #[tokio::test]
    async fn reordering_one_category_leaves_others_untouched() {
        let storage = Arc::new(MemoryStorage::default());
        let catalog = Arc::new(MemoryCatalog::default());
        let w1 = catalog.seed("Weddings", "/media/w/1.jpg", Some("w/1.jpg"), Some(0));
        let w2 = catalog.seed("Weddings", "/media/w/2.jpg", Some("w/2.jpg"), Some(1));
        let b1 = catalog.seed("Baby", "/media/b/1.jpg", Some("b/1.jpg"), Some(7));
        let b2 = catalog.seed("Baby", "/media/b/2.jpg", Some("b/2.jpg"), Some(9));

        let library = library(storage, catalog.clone());
        library.reorder_category("Weddings", w2, 0).await.unwrap();

        assert_eq!(catalog.asset(b1).unwrap().sort_order, Some(7));
        assert_eq!(catalog.asset(b2).unwrap().sort_order, Some(9));
        assert_eq!(catalog.asset(w2).unwrap().sort_order, Some(0));
        assert_eq!(catalog.asset(w1).unwrap().sort_order, Some(1));
    }

    #[tokio::test]
    async fn failed_persistence_reloads_canonical_order() {
        let storage = Arc::new(MemoryStorage::default());
        let catalog = Arc::new(MemoryCatalog {
            fail_update_after: Some(1),
            ..Default::default()
        });
        let a = catalog.seed("Weddings", "/media/w/a.jpg", Some("w/a.jpg"), Some(0));
        let b = catalog.seed("Weddings", "/media/w/b.jpg", Some("w/b.jpg"), Some(1));
        let c = catalog.seed("Weddings", "/media/w/c.jpg", Some("w/c.jpg"), Some(2));

        let library = library(storage, catalog.clone());
        let outcome = library.reorder_category("Weddings", c, 0).await.unwrap();

        let ReorderOutcome::Reverted { order, .. } = outcome else {
            panic!("expected reverted reorder");
        };
        // The returned order is the catalog's, not the optimistic one: the
        // single write that landed moved c to the front.
        let ids: Vec<u64> = order.iter().map(|x| x.id).collect();
        assert_eq!(ids, vec![c, a, b]);
    }

    #[tokio::test]
    async fn bulk_delete_halts_before_catalog_rows_on_storage_failure() {
        let storage = Arc::new(MemoryStorage {
            fail_delete_call: Some(2),
            ..Default::default()
        });
        let catalog = Arc::new(MemoryCatalog::default());
        for i in 0..250 {
            let path = format!("weddings/{i}.jpg");
            storage.seed_object(&path);
            catalog.seed("Weddings", &format!("/media/{path}"), Some(&path), Some(i));
        }

        let library = library(storage.clone(), catalog.clone());
        let err = library
            .delete_category("Weddings", Confirmation::Confirmed)
            .await
            .unwrap_err();
        assert!(matches!(err, AssetError::Storage(_)));

        // Chunks after the failed one were never attempted, and no catalog
        // row was removed.
        assert_eq!(storage.delete_call_count(), 2);
        assert_eq!(catalog.all_assets().await.unwrap().len(), 250);
    }

    #[tokio::test]
    async fn bulk_delete_requires_confirmation() {
        let storage = Arc::new(MemoryStorage::default());
        let catalog = Arc::new(MemoryCatalog::default());
        catalog.seed("Weddings", "/media/w/a.jpg", Some("w/a.jpg"), Some(0));

        let library = library(storage.clone(), catalog.clone());

        let err = library
            .delete_category("Weddings", Confirmation::Unconfirmed)
            .await
            .unwrap_err();
        assert!(matches!(err, AssetError::NotConfirmed));
        let err = library.delete_all(Confirmation::Unconfirmed).await.unwrap_err();
        assert!(matches!(err, AssetError::NotConfirmed));

        assert_eq!(storage.delete_call_count(), 0);
        assert_eq!(catalog.all_assets().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn delete_all_batches_objects_then_clears_rows() {
        let storage = Arc::new(MemoryStorage::default());
        let catalog = Arc::new(MemoryCatalog::default());
        for i in 0..250 {
            let path = format!("weddings/{i}.jpg");
            storage.seed_object(&path);
            catalog.seed("Weddings", &format!("/media/{path}"), Some(&path), Some(i));
        }
        // External link rows have no backing object but still count as rows.
        catalog.seed("Weddings", "https://cdn.example.net/x.jpg", None, None);

        let library = library(storage.clone(), catalog.clone());
        let report = library.delete_all(Confirmation::Confirmed).await.unwrap();

        assert_eq!(report.objects_deleted, 250);
        assert_eq!(report.rows_deleted, 251);
        assert_eq!(storage.delete_call_count(), 3); // 100 + 100 + 50
        assert_eq!(storage.object_count(), 0);
        assert!(catalog.all_assets().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unresolvable_asset_fails_single_delete_without_touching_the_row() {
        let storage = Arc::new(MemoryStorage::default());
        let catalog = Arc::new(MemoryCatalog::default());
        let id = catalog.seed("Weddings", "not a url", None, None);

        let library = library(storage.clone(), catalog.clone());
        let err = library.delete_asset(id).await.unwrap_err();
        assert!(matches!(err, AssetError::MissingStoragePath(_)));

        assert_eq!(storage.delete_call_count(), 0);
        assert_eq!(catalog.all_assets().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn externally_linked_asset_skips_the_storage_delete() {
        let storage = Arc::new(MemoryStorage::default());
        let catalog = Arc::new(MemoryCatalog::default());
        let id = catalog.seed("Weddings", "https://cdn.example.net/x.jpg", None, None);

        let library = library(storage.clone(), catalog.clone());
        library.delete_asset(id).await.unwrap();

        assert_eq!(storage.delete_call_count(), 0);
        assert!(catalog.all_assets().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unresolvable_asset_aborts_bulk_delete_before_any_removal() {
        let storage = Arc::new(MemoryStorage::default());
        let catalog = Arc::new(MemoryCatalog::default());
        storage.seed_object("weddings/good.jpg");
        catalog.seed(
            "Weddings",
            "/media/weddings/good.jpg",
            Some("weddings/good.jpg"),
            Some(0),
        );
        catalog.seed("Weddings", "not a url", None, None);

        let library = library(storage.clone(), catalog.clone());
        let err = library
            .delete_category("Weddings", Confirmation::Confirmed)
            .await
            .unwrap_err();
        assert!(matches!(err, AssetError::MissingStoragePath(_)));

        assert_eq!(storage.delete_call_count(), 0);
        assert!(storage.has_object("weddings/good.jpg"));
        assert_eq!(catalog.all_assets().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn progress_reports_cumulative_bytes() {
        let storage = Arc::new(MemoryStorage::default());
        let catalog = Arc::new(MemoryCatalog::default());

        let library = library(storage, catalog);
        library
            .upload_batch(
                vec![file("a.jpg", &[0u8; 1024]), file("b.jpg", &[0u8; 2048])],
                "Weddings",
            )
            .await
            .unwrap();

        let snapshot = library.progress();
        assert!(!snapshot.active);
        assert_eq!(snapshot.files_completed, 2);
        assert_eq!(snapshot.bytes_transferred, 3072);
    }
}

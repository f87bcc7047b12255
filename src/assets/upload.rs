use super::{AssetError, AssetLibrary, BatchFailure, BatchReport, UploadFile};
use crate::catalog::{NewAsset, normalize_category};
use crate::storage::StorageError;
use serde::Serialize;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// Progress counters for the in-flight batch. Single writer (the pipeline),
/// read by the sampling task and the progress endpoint.
#[derive(Default)]
pub struct UploadProgress {
    active: AtomicBool,
    bytes_transferred: AtomicU64,
    files_completed: AtomicUsize,
    total_files: AtomicUsize,
    current_index: AtomicUsize,
    current_file: Mutex<String>,
    started_at: Mutex<Option<Instant>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProgressSnapshot {
    pub active: bool,
    pub current_index: usize,
    pub total_files: usize,
    pub current_file: String,
    pub files_completed: usize,
    pub bytes_transferred: u64,
    pub elapsed_ms: u64,
    /// Cumulative throughput: bytes transferred over elapsed wall time.
    pub bytes_per_second: f64,
}

impl UploadProgress {
    fn begin(&self, total_files: usize) {
        self.bytes_transferred.store(0, Ordering::Relaxed);
        self.files_completed.store(0, Ordering::Relaxed);
        self.total_files.store(total_files, Ordering::Relaxed);
        self.current_index.store(0, Ordering::Relaxed);
        *self.started_at.lock().unwrap() = Some(Instant::now());
        self.active.store(true, Ordering::Release);
    }

    fn start_file(&self, index: usize, name: &str) {
        self.current_index.store(index, Ordering::Relaxed);
        *self.current_file.lock().unwrap() = name.to_string();
    }

    fn finish_file(&self, bytes: u64) {
        self.bytes_transferred.fetch_add(bytes, Ordering::Relaxed);
        self.files_completed.fetch_add(1, Ordering::Relaxed);
    }

    fn end(&self) {
        self.active.store(false, Ordering::Release);
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        let elapsed = self
            .started_at
            .lock()
            .unwrap()
            .map(|start| start.elapsed())
            .unwrap_or(Duration::ZERO);
        let bytes = self.bytes_transferred.load(Ordering::Relaxed);
        let seconds = elapsed.as_secs_f64();
        ProgressSnapshot {
            active: self.active.load(Ordering::Acquire),
            current_index: self.current_index.load(Ordering::Relaxed),
            total_files: self.total_files.load(Ordering::Relaxed),
            current_file: self.current_file.lock().unwrap().clone(),
            files_completed: self.files_completed.load(Ordering::Relaxed),
            bytes_transferred: bytes,
            elapsed_ms: elapsed.as_millis() as u64,
            bytes_per_second: if seconds > 0.0 { bytes as f64 / seconds } else { 0.0 },
        }
    }
}

/// Emits a progress event on a fixed interval while the batch runs.
fn spawn_progress_reporter(progress: std::sync::Arc<UploadProgress>, interval_ms: u64) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_millis(interval_ms.max(50)));
        interval.tick().await; // Skip the first immediate tick

        loop {
            interval.tick().await;
            let snapshot = progress.snapshot();
            if !snapshot.active {
                break;
            }
            info!(
                file = %snapshot.current_file,
                index = snapshot.current_index + 1,
                total = snapshot.total_files,
                bytes = snapshot.bytes_transferred,
                throughput_bps = snapshot.bytes_per_second as u64,
                "upload progress"
            );
        }
    });
}

/// Filesystem-safe object name: whitespace becomes `_`, anything outside
/// `[A-Za-z0-9._-]` is dropped.
pub(crate) fn sanitize_object_name(name: &str) -> String {
    let safe: String = name
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();
    if safe.trim_matches(['.', '_', '-']).is_empty() {
        "file".to_string()
    } else {
        safe
    }
}

/// Folder segment for a category: the normalized label with spaces
/// collapsed to underscores.
pub(crate) fn category_folder(category: &str) -> String {
    sanitize_object_name(&normalize_category(category))
}

fn unique_variant(folder: &str, safe_name: &str) -> String {
    let token = uuid::Uuid::new_v4().simple().to_string();
    format!(
        "{}/{}_{}_{}",
        folder,
        chrono::Utc::now().timestamp_millis(),
        &token[..8],
        safe_name
    )
}

impl AssetLibrary {
    /// Upload a batch of files into one category, strictly one file at a
    /// time. A failure at file `i` keeps files `0..i` committed and never
    /// attempts the rest.
    pub async fn upload_batch(
        &self,
        files: Vec<UploadFile>,
        category: &str,
    ) -> Result<BatchReport, AssetError> {
        if files.is_empty() {
            return Err(AssetError::EmptyBatch);
        }

        // One batch at a time: the sort base below is only valid while no
        // other batch is inserting into the category.
        let _batch = self.batch_lock.lock().await;

        // Sort positions for the batch land after everything already in
        // the category, in presentation order.
        let snapshot = self.catalog.all_assets().await?;
        let base = snapshot
            .iter()
            .filter(|a| a.in_category(category))
            .filter_map(|a| a.sort_order)
            .max()
            .unwrap_or(-1);

        let folder = category_folder(category);
        let total = files.len();

        self.progress.begin(total);
        spawn_progress_reporter(self.progress.clone(), self.config.progress_interval_ms);

        let mut report = BatchReport {
            uploaded: Vec::new(),
            failed: None,
            bytes_transferred: 0,
        };

        for (index, file) in files.into_iter().enumerate() {
            self.progress.start_file(index, &file.name);

            match self
                .upload_one(&file, category, &folder, base + 1 + index as i64)
                .await
            {
                Ok(asset) => {
                    let size = file.bytes.len() as u64;
                    self.progress.finish_file(size);
                    report.bytes_transferred += size;
                    info!(
                        id = asset.id,
                        file = %file.name,
                        category = %category,
                        "uploaded asset"
                    );
                    report.uploaded.push(asset);
                }
                Err(e) => {
                    error!(
                        file = %file.name,
                        index,
                        error = %e,
                        "upload batch aborted"
                    );
                    report.failed = Some(BatchFailure {
                        index,
                        file_name: file.name,
                        reason: e.to_string(),
                    });
                    break;
                }
            }
        }

        self.progress.end();
        Ok(report)
    }

    async fn upload_one(
        &self,
        file: &UploadFile,
        category: &str,
        folder: &str,
        sort_order: i64,
    ) -> Result<crate::catalog::Asset, AssetError> {
        let safe_name = sanitize_object_name(&file.name);
        let mut path = format!("{}/{}", folder, safe_name);

        match self
            .storage
            .put_object(&path, &file.bytes, &file.content_type)
            .await
        {
            Ok(()) => {}
            // A name collision gets one regenerated path; any other
            // storage failure aborts this file.
            Err(StorageError::AlreadyExists(_)) => {
                path = unique_variant(folder, &safe_name);
                warn!(file = %file.name, retry_path = %path, "object path collision, retrying");
                self.storage
                    .put_object(&path, &file.bytes, &file.content_type)
                    .await?;
            }
            Err(e) => return Err(e.into()),
        }

        let media_url = match self.storage.resolve_public_url(&path) {
            Ok(url) if !url.is_empty() => url,
            Ok(_) => {
                self.compensate(&path).await;
                return Err(StorageError::NoPublicUrl(path).into());
            }
            Err(e) => {
                self.compensate(&path).await;
                return Err(e.into());
            }
        };

        let row = NewAsset {
            category: category.to_string(),
            title: Some(file.name.clone()),
            media_url,
            storage_path: Some(path.clone()),
            sort_order: Some(sort_order),
        };

        match self.catalog.insert(row).await {
            Ok(asset) => Ok(asset),
            Err(e) => {
                // The object must not outlive a failed row insert.
                self.compensate(&path).await;
                Err(e.into())
            }
        }
    }

    /// Best-effort removal of a just-written object whose catalog row never
    /// materialized.
    async fn compensate(&self, path: &str) {
        if let Err(e) = self.storage.delete_objects(&[path.to_string()]).await {
            error!(
                path = %path,
                error = %e,
                "failed to clean up orphaned storage object"
            );
        }
    }
}

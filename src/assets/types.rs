use crate::catalog::Asset;
use serde::Serialize;

/// The studio's fixed category vocabulary. Folder listings union this with
/// whatever categories the catalog actually contains.
pub const KNOWN_CATEGORIES: [&str; 6] = [
    "Weddings",
    "Couples",
    "Baby",
    "Family",
    "Portraits",
    "Events",
];

/// Provider batch limit for storage object deletion.
pub const STORAGE_DELETE_CHUNK: usize = 100;

/// One local file handed to the upload pipeline.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub name: String,
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// Outcome of one upload batch. Files uploaded before a failure stay
/// committed; files after it were never attempted.
#[derive(Debug, Serialize)]
pub struct BatchReport {
    pub uploaded: Vec<Asset>,
    pub failed: Option<BatchFailure>,
    pub bytes_transferred: u64,
}

#[derive(Debug, Serialize)]
pub struct BatchFailure {
    pub index: usize,
    pub file_name: String,
    pub reason: String,
}

impl BatchReport {
    pub fn summary(&self) -> String {
        match &self.failed {
            None => format!("uploaded {} file(s)", self.uploaded.len()),
            Some(failure) => format!(
                "uploaded {} file(s), then '{}' (file {}) failed: {}",
                self.uploaded.len(),
                failure.file_name,
                failure.index + 1,
                failure.reason
            ),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FolderSummary {
    pub name: String,
    pub count: usize,
}

/// Explicit confirmation gate for destructive bulk operations. The request
/// must carry it; nothing is inferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Confirmed,
    Unconfirmed,
}

impl Confirmation {
    pub fn from_flag(confirmed: bool) -> Self {
        if confirmed {
            Confirmation::Confirmed
        } else {
            Confirmation::Unconfirmed
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DeletionReport {
    pub objects_deleted: usize,
    pub rows_deleted: usize,
}

/// Result of a reorder request. `Reverted` means the optimistic order could
/// not be persisted and the canonical catalog order was reloaded instead.
#[derive(Debug)]
pub enum ReorderOutcome {
    Unchanged,
    Applied { order: Vec<Asset> },
    Reverted { order: Vec<Asset>, error: String },
}

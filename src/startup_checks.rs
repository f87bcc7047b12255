use crate::Config;
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Debug, Error)]
pub enum StartupCheckError {
    #[error("Failed to create storage root directory: {0}")]
    StorageRootCreationFailed(std::io::Error),

    #[error("Failed to create catalog directory: {0}")]
    CatalogDirectoryCreationFailed(std::io::Error),

    #[error("Catalog file exists but is not readable: {0}")]
    CatalogFileUnreadable(std::io::Error),
}

pub async fn perform_startup_checks(config: &Config) -> Result<(), Vec<StartupCheckError>> {
    let mut errors = Vec::new();

    info!("Performing startup checks...");

    let storage_root = &config.storage.root_directory;
    if storage_root.exists() {
        info!("Storage root directory exists: {:?}", storage_root);
    } else {
        info!(
            "Storage root directory does not exist, creating: {:?}",
            storage_root
        );
        if let Err(e) = tokio::fs::create_dir_all(storage_root).await {
            error!("Failed to create storage root directory: {}", e);
            errors.push(StartupCheckError::StorageRootCreationFailed(e));
        }
    }

    if let Some(parent) = config.catalog.file.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        info!("Catalog directory does not exist, creating: {:?}", parent);
        if let Err(e) = tokio::fs::create_dir_all(parent).await {
            error!("Failed to create catalog directory: {}", e);
            errors.push(StartupCheckError::CatalogDirectoryCreationFailed(e));
        }
    }

    if config.catalog.file.exists() {
        match tokio::fs::read_to_string(&config.catalog.file).await {
            Ok(_) => info!("Catalog file is readable: {:?}", config.catalog.file),
            Err(e) => {
                error!("Catalog file is not readable: {}", e);
                errors.push(StartupCheckError::CatalogFileUnreadable(e));
            }
        }
    } else {
        warn!(
            "Catalog file not found at {:?}, a new one will be created on first write",
            config.catalog.file
        );
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

/// Every startup-check failure here prevents the asset subsystem from
/// working, so they are all treated as critical.
pub fn has_critical_error(errors: &[StartupCheckError]) -> bool {
    !errors.is_empty()
}

//! Storage backend construction from configuration.

use portico_core::config::{Config, StorageBackend};
use std::sync::Arc;

use crate::local::LocalStorage;
use crate::s3::S3Storage;
use crate::traits::{Storage, StorageError, StorageResult};

/// Build the configured storage backend.
pub fn create_storage(config: &Config) -> StorageResult<Arc<dyn Storage>> {
    match config.storage_backend {
        StorageBackend::S3 => {
            let storage = S3Storage::new(
                config.storage_bucket.clone(),
                config.s3_region.clone(),
                config.s3_endpoint.clone(),
            )?;
            tracing::info!(bucket = %config.storage_bucket, "Using S3 storage backend");
            Ok(Arc::new(storage))
        }
        StorageBackend::Local => {
            let base_path = config.local_storage_path.clone().ok_or_else(|| {
                StorageError::ConfigError(
                    "LOCAL_STORAGE_PATH is required for the local backend".to_string(),
                )
            })?;
            let base_url = config
                .local_storage_base_url
                .clone()
                .unwrap_or_else(|| "http://localhost:8080/files".to_string());
            tracing::info!(path = %base_path, "Using local storage backend");
            Ok(Arc::new(LocalStorage::new(base_path, base_url)))
        }
    }
}

//! Storage abstraction trait

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for portico_core::AppError {
    fn from(err: StorageError) -> Self {
        use portico_core::AppError;
        match err {
            StorageError::NotFound(path) => AppError::ObjectNotFound(path),
            StorageError::InvalidKey(key) => AppError::InvalidInput(format!("Invalid storage key: {}", key)),
            StorageError::UploadFailed(msg) => AppError::Storage(msg),
            StorageError::DownloadFailed(msg) => AppError::Storage(msg),
            StorageError::BackendError(msg) => AppError::Storage(msg),
            StorageError::IoError(err) => AppError::Storage(format!("IO error: {}", err)),
            StorageError::ConfigError(msg) => AppError::Internal(msg),
        }
    }
}

/// Storage abstraction trait
///
/// The confirmation step of the upload lifecycle trusts the backend's own
/// view of a stored object (content type, metadata) over anything the client
/// declared, so the trait exposes both read and attach operations for the
/// flat metadata map.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Check if an object exists at the given path.
    async fn exists(&self, path: &str) -> StorageResult<bool>;

    /// Write raw bytes with the given content type.
    async fn put(&self, path: &str, data: Bytes, content_type: &str) -> StorageResult<()>;

    /// Download the whole object into memory.
    async fn download(&self, path: &str) -> StorageResult<Vec<u8>>;

    /// Content type the backend itself reports for the stored object.
    async fn content_type(&self, path: &str) -> StorageResult<Option<String>>;

    /// Custom metadata currently attached to the object.
    async fn metadata(&self, path: &str) -> StorageResult<HashMap<String, String>>;

    /// Attach a flat string-to-string metadata map to an existing object,
    /// replacing any previously attached custom metadata.
    async fn set_metadata(
        &self,
        path: &str,
        metadata: HashMap<String, String>,
    ) -> StorageResult<()>;

    /// Generate a time-limited signed read URL for the object.
    async fn signed_read_url(&self, path: &str, expires_in: Duration) -> StorageResult<String>;

    /// Backend name for logging and health reporting.
    fn backend_name(&self) -> &'static str;
}

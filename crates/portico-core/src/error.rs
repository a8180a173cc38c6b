//! Error types module
//!
//! All errors are unified under the `AppError` enum, which covers database,
//! storage, upload-lifecycle, and workflow errors. The `ErrorMetadata` trait
//! lets each variant self-describe its HTTP presentation so the API layer
//! renders every error the same way.

use std::io;

use sqlx::Error as SqlxError;
use uuid::Uuid;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for precondition blocks and upstream rejections
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "DUPLICATE_FAILED_DOCUMENT")
    fn error_code(&self) -> &'static str;

    /// Whether this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Suggested action for the client
    fn suggested_action(&self) -> Option<&'static str>;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Whether details should be hidden in production
    fn is_sensitive(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[source] SqlxError),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("A failed document named '{file_name}' already exists")]
    DuplicateFailedDocument { file_name: String },

    #[error("Upload dispatcher rejected the request (status {status}): {body}")]
    DispatcherRejected { status: u16, body: String },

    #[error("Direct storage write failed (status {status}): {body}")]
    StorageWriteFailed { status: u16, body: String },

    #[error("Stored object not found at '{0}'")]
    ObjectNotFound(String),

    #[error("Stored object has unsupported content type '{content_type}'")]
    UnsupportedStoredType { content_type: String },

    #[error("Property {property_id} has an active lease")]
    ActiveLeaseExists { property_id: Uuid },

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

impl From<SqlxError> for AppError {
    fn from(err: SqlxError) -> Self {
        AppError::Database(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Internal(format!("IO error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InvalidInput(format!("JSON parsing error: {}", err))
    }
}

impl From<uuid::Error> for AppError {
    fn from(err: uuid::Error) -> Self {
        AppError::InvalidInput(format!("UUID parsing error: {}", err))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::InvalidInput(format!("Validation error: {}", err))
    }
}

/// Static metadata for each variant: (http_status, error_code, recoverable, suggested_action, sensitive, log_level).
/// client_message stays per-variant for dynamic content.
fn app_error_static_metadata(
    err: &AppError,
) -> (
    u16,
    &'static str,
    bool,
    Option<&'static str>,
    bool,
    LogLevel,
) {
    match err {
        AppError::Database(_) => (
            500,
            "DATABASE_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::Storage(_) => (
            500,
            "STORAGE_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::DuplicateFailedDocument { .. } => (
            409,
            "DUPLICATE_FAILED_DOCUMENT",
            false,
            Some("Delete the failed document record, then upload again"),
            false,
            LogLevel::Debug,
        ),
        AppError::DispatcherRejected { .. } => (
            502,
            "DISPATCHER_REJECTED",
            false,
            Some("Resubmit the upload"),
            false,
            LogLevel::Warn,
        ),
        AppError::StorageWriteFailed { .. } => (
            502,
            "STORAGE_WRITE_FAILED",
            false,
            Some("Resubmit the upload"),
            false,
            LogLevel::Warn,
        ),
        AppError::ObjectNotFound(_) => (
            404,
            "OBJECT_NOT_FOUND",
            false,
            Some("Resubmit the upload"),
            false,
            LogLevel::Warn,
        ),
        AppError::UnsupportedStoredType { .. } => (
            415,
            "UNSUPPORTED_STORED_TYPE",
            false,
            Some("Upload one of the supported document formats"),
            false,
            LogLevel::Warn,
        ),
        AppError::ActiveLeaseExists { .. } => (
            409,
            "ACTIVE_LEASE_EXISTS",
            false,
            Some("End the active lease before changing the property status"),
            false,
            LogLevel::Debug,
        ),
        AppError::Forbidden(_) => (
            403,
            "FORBIDDEN",
            false,
            None,
            true,
            LogLevel::Debug,
        ),
        AppError::Unauthorized(_) => (
            401,
            "UNAUTHORIZED",
            false,
            Some("Check the session headers"),
            false,
            LogLevel::Debug,
        ),
        AppError::InvalidInput(_) => (
            400,
            "INVALID_INPUT",
            false,
            Some("Check request parameters and try again"),
            false,
            LogLevel::Debug,
        ),
        AppError::BadRequest(_) => (
            400,
            "BAD_REQUEST",
            false,
            Some("Check request format and parameters"),
            false,
            LogLevel::Debug,
        ),
        AppError::NotFound(_) => (
            404,
            "NOT_FOUND",
            false,
            Some("Verify the resource ID exists"),
            false,
            LogLevel::Debug,
        ),
        AppError::Internal(_) => (
            500,
            "INTERNAL_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::InternalWithSource { .. } => (
            500,
            "INTERNAL_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
    }
}

impl AppError {
    /// Get the error type name for detailed error responses
    pub fn error_type(&self) -> &str {
        match self {
            AppError::Database(_) => "Database",
            AppError::Storage(_) => "Storage",
            AppError::DuplicateFailedDocument { .. } => "DuplicateFailedDocument",
            AppError::DispatcherRejected { .. } => "DispatcherRejected",
            AppError::StorageWriteFailed { .. } => "StorageWriteFailed",
            AppError::ObjectNotFound(_) => "ObjectNotFound",
            AppError::UnsupportedStoredType { .. } => "UnsupportedStoredType",
            AppError::ActiveLeaseExists { .. } => "ActiveLeaseExists",
            AppError::Forbidden(_) => "Forbidden",
            AppError::Unauthorized(_) => "Unauthorized",
            AppError::InvalidInput(_) => "InvalidInput",
            AppError::BadRequest(_) => "BadRequest",
            AppError::NotFound(_) => "NotFound",
            AppError::Internal(_) => "Internal",
            AppError::InternalWithSource { .. } => "Internal",
        }
    }

    /// Get detailed error information including error chain
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        let mut details = self.to_string();

        let mut source = self.source();
        let mut depth = 0;
        while let Some(err) = source {
            depth += 1;
            if depth > 5 {
                details.push_str("\n  ... (truncated)");
                break;
            }
            details.push_str(&format!("\n  Caused by: {}", err));
            source = err.source();
        }

        details
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        app_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).1
    }

    fn is_recoverable(&self) -> bool {
        app_error_static_metadata(self).2
    }

    fn suggested_action(&self) -> Option<&'static str> {
        app_error_static_metadata(self).3
    }

    fn is_sensitive(&self) -> bool {
        app_error_static_metadata(self).4
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).5
    }

    fn client_message(&self) -> String {
        match self {
            AppError::Database(_) => "Failed to access data store".to_string(),
            AppError::Storage(_) => "Failed to access storage".to_string(),
            AppError::DuplicateFailedDocument { file_name } => format!(
                "A document named '{}' previously failed extraction. Delete it from the error documents list before uploading it again.",
                file_name
            ),
            AppError::DispatcherRejected { body, .. } => {
                format!("Upload dispatcher rejected the request: {}", body)
            }
            AppError::StorageWriteFailed { status, .. } => {
                format!("Storage write failed with status {}", status)
            }
            AppError::ObjectNotFound(path) => {
                format!("Uploaded object was not found at '{}'", path)
            }
            AppError::UnsupportedStoredType { content_type } => format!(
                "The stored object reports content type '{}', which is not supported",
                content_type
            ),
            AppError::ActiveLeaseExists { .. } => {
                "The property has an active lease; its status cannot be changed".to_string()
            }
            // Generic on purpose: authorization failures leak no detail.
            AppError::Forbidden(_) => "Forbidden".to_string(),
            AppError::Unauthorized(ref msg) => msg.clone(),
            AppError::InvalidInput(ref msg) => msg.clone(),
            AppError::BadRequest(ref msg) => msg.clone(),
            AppError::NotFound(ref msg) => msg.clone(),
            AppError::Internal(_) => "Internal server error".to_string(),
            AppError::InternalWithSource { .. } => "Internal server error".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_metadata_database() {
        let err = AppError::from(sqlx::Error::PoolClosed);
        assert_eq!(err.http_status_code(), 500);
        assert_eq!(err.error_code(), "DATABASE_ERROR");
        assert!(err.is_recoverable());
        assert_eq!(err.client_message(), "Failed to access data store");
        assert!(err.is_sensitive());
        assert_eq!(err.log_level(), LogLevel::Error);
    }

    #[test]
    fn test_error_metadata_duplicate_failed_document() {
        let err = AppError::DuplicateFailedDocument {
            file_name: "lease.pdf".to_string(),
        };
        assert_eq!(err.http_status_code(), 409);
        assert_eq!(err.error_code(), "DUPLICATE_FAILED_DOCUMENT");
        assert!(!err.is_recoverable());
        assert!(err.client_message().contains("lease.pdf"));
        assert!(err.client_message().contains("Delete"));
        assert_eq!(err.log_level(), LogLevel::Debug);
    }

    #[test]
    fn test_error_metadata_forbidden_is_generic() {
        let err = AppError::Forbidden("agent tried to approve property 42".to_string());
        assert_eq!(err.http_status_code(), 403);
        assert_eq!(err.client_message(), "Forbidden");
        assert!(err.is_sensitive());
    }

    #[test]
    fn test_error_metadata_dispatcher_rejected_surfaces_body() {
        let err = AppError::DispatcherRejected {
            status: 422,
            body: "unknown bucket".to_string(),
        };
        assert_eq!(err.http_status_code(), 502);
        assert!(err.client_message().contains("unknown bucket"));
        assert_eq!(err.suggested_action(), Some("Resubmit the upload"));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_error_metadata_active_lease() {
        let err = AppError::ActiveLeaseExists {
            property_id: Uuid::new_v4(),
        };
        assert_eq!(err.http_status_code(), 409);
        assert_eq!(err.error_code(), "ACTIVE_LEASE_EXISTS");
        assert!(err.client_message().contains("active lease"));
    }
}

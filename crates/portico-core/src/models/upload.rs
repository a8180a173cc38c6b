use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// A file selected for upload. Ephemeral: held only for the duration of the
/// submit call and never persisted if the upload does not complete.
#[derive(Debug, Clone)]
pub struct UploadCandidate {
    pub file_name: String,
    pub content_type: String,
    pub document_type: String,
    pub bytes: Bytes,
}

/// Metadata sent to the upload dispatcher for validation.
#[derive(Debug, Clone, Serialize)]
pub struct DispatchRequest {
    pub file_name: String,
    pub file_path: String,
    pub bucket_name: String,
    pub content_type: String,
    pub upload_timestamp: DateTime<Utc>,
    pub user_id: Uuid,
    pub session_id: Uuid,
    pub service_key_role: String,
    pub document_type: String,
}

/// Raw dispatcher response body.
#[derive(Debug, Clone, Deserialize)]
pub struct DispatchResponse {
    pub status: String,
    #[serde(default)]
    pub signed_url: Option<String>,
    #[serde(default)]
    pub upload_path: Option<String>,
}

/// Validated dispatcher grant: a time-limited write URL plus the canonical
/// storage path the object will live under.
#[derive(Debug, Clone)]
pub struct DispatchTicket {
    pub signed_url: String,
    pub upload_path: String,
}

/// Successful upload result.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StoredUpload {
    pub path: String,
    pub bucket: String,
    pub content_type: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BatchSuccess {
    pub file_name: String,
    pub upload: StoredUpload,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BatchFailure {
    pub file_name: String,
    pub code: String,
    pub reason: String,
}

/// End-of-batch summary. Files are attempted sequentially and independently;
/// one failure never aborts the remainder of the batch.
#[derive(Debug, Default, Serialize, ToSchema)]
pub struct BatchSummary {
    pub succeeded: Vec<BatchSuccess>,
    pub failed: Vec<BatchFailure>,
}

impl BatchSummary {
    pub fn is_all_ok(&self) -> bool {
        self.failed.is_empty()
    }
}

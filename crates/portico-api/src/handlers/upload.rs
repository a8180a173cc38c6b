//! Document upload endpoint.

use axum::{
    extract::{Multipart, State},
    response::IntoResponse,
    Json,
};
use portico_core::models::{BatchSummary, UploadCandidate};
use portico_core::AppError;
use std::sync::Arc;

use crate::auth::models::SessionContext;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;

/// Upload one or more documents.
///
/// Files are processed strictly in order; a failure on one file does not
/// abort the rest. The response always carries the full per-file summary.
#[utoipa::path(
    post,
    path = "/api/v1/documents",
    tag = "documents",
    request_body(content = inline(Object), content_type = "multipart/form-data", description = "One `document_type` text field plus one or more `files` parts"),
    responses(
        (status = 200, description = "Batch summary with per-file outcomes", body = BatchSummary),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, multipart), fields(user_id = %session.identity.user_id))]
pub async fn upload_documents(
    session: SessionContext,
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, HttpAppError> {
    let mut document_type: Option<String> = None;
    let mut files: Vec<(String, String, bytes::Bytes)> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Malformed multipart body: {}", e)))?
    {
        match field.name() {
            Some("document_type") => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Unreadable field: {}", e)))?;
                document_type = Some(value);
            }
            Some("files") | Some("file") => {
                let file_name = field
                    .file_name()
                    .map(|n| n.to_string())
                    .ok_or_else(|| AppError::InvalidInput("File part without a filename".to_string()))?;
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Unreadable file part: {}", e)))?;
                files.push((file_name, content_type, data));
            }
            _ => {}
        }
    }

    let document_type = document_type
        .ok_or_else(|| AppError::InvalidInput("The document_type field is required".to_string()))?;
    if files.is_empty() {
        return Err(AppError::InvalidInput("No files provided".to_string()).into());
    }

    let candidates = files
        .into_iter()
        .map(|(file_name, content_type, bytes)| UploadCandidate {
            file_name,
            content_type,
            document_type: document_type.clone(),
            bytes,
        })
        .collect();

    let summary = state
        .uploads
        .submit_batch(candidates, &session.identity, &session.meta)
        .await;

    Ok(Json(summary))
}

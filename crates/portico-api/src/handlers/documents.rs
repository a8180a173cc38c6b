//! Signed read access to stored documents.

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use portico_core::models::{AuditAction, NewAuditRecord};
use portico_core::AppError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use utoipa::{IntoParams, ToSchema};

use crate::auth::models::SessionContext;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;

const MIN_EXPIRY_SECS: u64 = 30;
const MAX_EXPIRY_SECS: u64 = 3600;

#[derive(Deserialize, IntoParams)]
pub struct SignedUrlQuery {
    /// Storage path of the document.
    pub path: String,
    /// URL lifetime in seconds.
    #[serde(default = "default_expiry")]
    pub expires_in: u64,
}

fn default_expiry() -> u64 {
    600
}

#[derive(Serialize, ToSchema)]
pub struct SignedUrlResponse {
    pub url: String,
    pub expires_in: u64,
}

/// Issue a time-limited read URL for a stored document.
#[utoipa::path(
    get,
    path = "/api/v1/documents/url",
    tag = "documents",
    params(SignedUrlQuery),
    responses(
        (status = 200, description = "Signed read URL", body = SignedUrlResponse),
        (status = 404, description = "Object not found", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, session, query), fields(user_id = %session.identity.user_id, path = %query.path))]
pub async fn signed_document_url(
    session: SessionContext,
    State(state): State<Arc<AppState>>,
    Query(query): Query<SignedUrlQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    if !state.storage.exists(&query.path).await.map_err(AppError::from)? {
        return Err(AppError::ObjectNotFound(query.path).into());
    }

    let expires_in = query.expires_in.clamp(MIN_EXPIRY_SECS, MAX_EXPIRY_SECS);
    let url = state
        .storage
        .signed_read_url(&query.path, Duration::from_secs(expires_in))
        .await
        .map_err(AppError::from)?;

    state
        .audit
        .append(NewAuditRecord::new(
            &session.identity,
            &session.meta,
            AuditAction::View,
            "documents",
            Some(query.path.clone()),
            format!("Issued signed read URL for '{}'", query.path),
        ))
        .await;

    Ok(Json(SignedUrlResponse { url, expires_in }))
}

//! Document registry endpoints: extraction outcomes, counts, and error-queue
//! cleanup. Rows are created by the external extraction pipeline; this
//! surface only reads and deletes them, scoped to the calling user.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use portico_core::models::{
    AuditAction, ExtractionStatus, NewAuditRecord, RegistryEntryResponse,
};
use portico_core::AppError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::auth::models::SessionContext;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;

#[derive(Deserialize, IntoParams)]
pub struct RegistryListQuery {
    /// Optional extraction status filter (PENDING, PASSED, or FAILED).
    pub status: Option<String>,
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_per_page")]
    pub per_page: i64,
}

fn default_page() -> i64 {
    1
}

fn default_per_page() -> i64 {
    25
}

fn parse_status(raw: Option<&str>) -> Result<Option<ExtractionStatus>, AppError> {
    raw.map(|s| {
        s.parse::<ExtractionStatus>()
            .map_err(AppError::InvalidInput)
    })
    .transpose()
}

#[utoipa::path(
    get,
    path = "/api/v1/registry",
    tag = "registry",
    params(RegistryListQuery),
    responses(
        (status = 200, description = "Registry entries, newest first", body = Vec<RegistryEntryResponse>),
        (status = 400, description = "Invalid status filter", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    )
)]
pub async fn list_entries(
    session: SessionContext,
    State(state): State<Arc<AppState>>,
    Query(query): Query<RegistryListQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    let status = parse_status(query.status.as_deref())?;
    let per_page = query.per_page.clamp(1, 100);
    let entries = state
        .registry
        .list(session.identity.user_id, status, query.page, per_page)
        .await?;
    let response: Vec<RegistryEntryResponse> =
        entries.into_iter().map(RegistryEntryResponse::from).collect();
    Ok(Json(response))
}

#[derive(Serialize, ToSchema)]
pub struct RegistryCountResponse {
    pub total: i64,
}

#[utoipa::path(
    get,
    path = "/api/v1/registry/count",
    tag = "registry",
    params(
        ("status" = Option<String>, Query, description = "Optional extraction status filter")
    ),
    responses(
        (status = 200, description = "Entry count", body = RegistryCountResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    )
)]
pub async fn count_entries(
    session: SessionContext,
    State(state): State<Arc<AppState>>,
    Query(query): Query<RegistryListQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    let status = parse_status(query.status.as_deref())?;
    let total = state
        .registry
        .count(session.identity.user_id, status)
        .await?;
    Ok(Json(RegistryCountResponse { total }))
}

/// Delete a registry row, typically a FAILED one blocking a re-upload.
#[utoipa::path(
    delete,
    path = "/api/v1/registry/{id}",
    tag = "registry",
    params(
        ("id" = Uuid, Path, description = "Registry entry ID")
    ),
    responses(
        (status = 204, description = "Entry deleted"),
        (status = 404, description = "Entry not found", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, session), fields(user_id = %session.identity.user_id, entry_id = %id))]
pub async fn delete_entry(
    session: SessionContext,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let entry = state
        .registry
        .get(id, session.identity.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Registry entry {} not found", id)))?;

    let affected = state.registry.delete(id, session.identity.user_id).await?;
    if affected == 0 {
        return Err(AppError::NotFound(format!("Registry entry {} not found", id)).into());
    }

    state
        .audit
        .append(NewAuditRecord::new(
            &session.identity,
            &session.meta,
            AuditAction::Delete,
            "document_registry",
            Some(id.to_string()),
            format!("Deleted registry entry for '{}'", entry.file_name),
        ))
        .await;

    Ok(StatusCode::NO_CONTENT)
}

//! Audit trail viewer endpoints. Read-only: audit rows are append-only and
//! written by the services, never through this surface.

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use portico_core::models::AuditRecord;
use portico_core::AppError;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::auth::models::SessionContext;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;

#[derive(Deserialize, IntoParams)]
pub struct AuditListQuery {
    /// Filter by acting user.
    pub user_id: Option<Uuid>,
    /// Filter by affected table name.
    pub table_name: Option<String>,
    /// Filter by action tag (CREATE, UPDATE, DELETE, APPROVE, VIEW).
    pub action: Option<String>,
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_per_page")]
    pub per_page: i64,
}

fn default_page() -> i64 {
    1
}

fn default_per_page() -> i64 {
    50
}

fn require_admin(session: &SessionContext) -> Result<(), AppError> {
    if session.identity.is_admin() {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "role '{}' requested the audit trail",
            session.identity.role
        )))
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/audit-logs",
    tag = "audit",
    params(AuditListQuery),
    responses(
        (status = 200, description = "Audit rows, newest first", body = Vec<AuditRecord>),
        (status = 403, description = "Forbidden", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    )
)]
pub async fn list_audit_logs(
    session: SessionContext,
    State(state): State<Arc<AppState>>,
    Query(query): Query<AuditListQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    require_admin(&session)?;
    let per_page = query.per_page.clamp(1, 200);
    let records = state
        .audit_log
        .list(
            query.user_id,
            query.table_name,
            query.action,
            query.page,
            per_page,
        )
        .await?;
    Ok(Json(records))
}

#[utoipa::path(
    get,
    path = "/api/v1/audit-logs/{id}",
    tag = "audit",
    params(
        ("id" = Uuid, Path, description = "Audit record ID")
    ),
    responses(
        (status = 200, description = "Audit record", body = AuditRecord),
        (status = 404, description = "Record not found", body = ErrorResponse),
        (status = 403, description = "Forbidden", body = ErrorResponse)
    )
)]
pub async fn get_audit_log(
    session: SessionContext,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    require_admin(&session)?;
    let record = state
        .audit_log
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Audit record {} not found", id)))?;
    Ok(Json(record))
}

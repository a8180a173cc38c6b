//! Property review workflow endpoints.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use portico_core::models::{PropertyResponse, PropertyStatus, ReviewDecision};
use portico_core::AppError;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::auth::models::SessionContext;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;

#[derive(Deserialize, IntoParams)]
pub struct ReviewQueueQuery {
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

/// Properties waiting for an Admin decision. Review-status properties are
/// excluded from every normal listing and only reachable here.
#[utoipa::path(
    get,
    path = "/api/v1/properties/review",
    tag = "properties",
    params(ReviewQueueQuery),
    responses(
        (status = 200, description = "Properties in review, newest first", body = Vec<PropertyResponse>),
        (status = 403, description = "Forbidden", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    )
)]
pub async fn list_review_queue(
    session: SessionContext,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ReviewQueueQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    if !session.identity.is_admin() {
        return Err(AppError::Forbidden(format!(
            "role '{}' requested the review queue",
            session.identity.role
        ))
        .into());
    }
    let per_page = query.per_page.clamp(1, 100);
    let properties = state.properties.list_review(query.page, per_page).await?;
    let response: Vec<PropertyResponse> =
        properties.into_iter().map(PropertyResponse::from).collect();
    Ok(Json(response))
}

#[utoipa::path(
    get,
    path = "/api/v1/properties/{id}",
    tag = "properties",
    params(
        ("id" = Uuid, Path, description = "Property ID")
    ),
    responses(
        (status = 200, description = "Property found", body = PropertyResponse),
        (status = 404, description = "Property not found", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    )
)]
pub async fn get_property(
    _session: SessionContext,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let property = state
        .properties
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Property {} not found", id)))?;
    Ok(Json(PropertyResponse::from(property)))
}

#[derive(Deserialize, ToSchema)]
pub struct DecisionRequest {
    pub action: ReviewDecision,
}

/// Approve or reject a property in review. Admin only; rejection deletes
/// the record.
#[utoipa::path(
    post,
    path = "/api/v1/properties/{id}/decision",
    tag = "properties",
    params(
        ("id" = Uuid, Path, description = "Property ID")
    ),
    request_body = DecisionRequest,
    responses(
        (status = 204, description = "Decision applied"),
        (status = 403, description = "Forbidden", body = ErrorResponse),
        (status = 404, description = "Property not found in review", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, session, request), fields(property_id = %id, user_id = %session.identity.user_id))]
pub async fn decide_property(
    session: SessionContext,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(request): Json<DecisionRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    match request.action {
        ReviewDecision::Approve => {
            state
                .review
                .approve(id, &session.identity, &session.meta)
                .await?
        }
        ReviewDecision::Reject => {
            state
                .review
                .reject(id, &session.identity, &session.meta)
                .await?
        }
    }
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize, ToSchema)]
pub struct StatusUpdateRequest {
    pub status: PropertyStatus,
}

/// Cycle an approved property among the operational statuses. Blocked while
/// an active lease references the property.
#[utoipa::path(
    put,
    path = "/api/v1/properties/{id}/status",
    tag = "properties",
    params(
        ("id" = Uuid, Path, description = "Property ID")
    ),
    request_body = StatusUpdateRequest,
    responses(
        (status = 204, description = "Status updated"),
        (status = 409, description = "Property has an active lease", body = ErrorResponse),
        (status = 404, description = "Property not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, session, request), fields(property_id = %id, status = %request.status, user_id = %session.identity.user_id))]
pub async fn update_property_status(
    session: SessionContext,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(request): Json<StatusUpdateRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    state
        .review
        .update_status(id, request.status, &session.identity, &session.meta)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

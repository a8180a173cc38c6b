use axum::extract::FromRequestParts;
use axum::http::{request::Parts, StatusCode};
use axum::Json;
use portico_core::models::{RequestMeta, SessionIdentity};

use crate::error::ErrorResponse;

/// Caller context extracted by the identity-header middleware and stored in
/// request extensions.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub identity: SessionIdentity,
    pub meta: RequestMeta,
}

// FromRequestParts rather than an Extension extractor so handlers taking
// Multipart can still receive the context.
impl<S> FromRequestParts<S> for SessionContext
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SessionContext>()
            .cloned()
            .ok_or_else(|| {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(ErrorResponse {
                        error: "Missing session context".to_string(),
                        details: None,
                        error_type: None,
                        code: "MISSING_SESSION_CONTEXT".to_string(),
                        recoverable: false,
                        suggested_action: Some("Check the session headers".to_string()),
                    }),
                )
            })
    }
}

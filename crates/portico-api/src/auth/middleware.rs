//! Identity-header authentication.
//!
//! The external session provider authenticates the browser; a trusted
//! gateway forwards the established identity on every request as headers,
//! authenticated by a shared key. This service never decides authentication
//! itself; it validates the gateway key, parses the identity, and hands a
//! `SessionContext` to the handlers. The row-governed store receives the
//! same identity as query parameters on its side.

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};
use portico_core::models::{RequestMeta, SessionIdentity, UserRole};
use portico_core::AppError;
use std::sync::Arc;
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::auth::models::SessionContext;
use crate::error::HttpAppError;

pub const GATEWAY_KEY_HEADER: &str = "x-gateway-key";
pub const USER_ID_HEADER: &str = "x-user-id";
pub const USERNAME_HEADER: &str = "x-username";
pub const ROLE_HEADER: &str = "x-user-role";
pub const ACCOUNT_ID_HEADER: &str = "x-account-id";
pub const SESSION_ID_HEADER: &str = "x-session-id";

#[derive(Clone)]
pub struct AuthState {
    pub gateway_shared_key: String,
}

fn secure_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Result<&'a str, AppError> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized(format!("Missing {} header", name)))
}

fn uuid_header(headers: &HeaderMap, name: &str) -> Result<Uuid, AppError> {
    header(headers, name)?
        .parse::<Uuid>()
        .map_err(|_| AppError::Unauthorized(format!("Malformed {} header", name)))
}

/// Extract the original client address, preferring the gateway-set
/// forwarding header over the socket peer.
fn extract_client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn parse_session_identity(headers: &HeaderMap) -> Result<SessionIdentity, AppError> {
    let role = header(headers, ROLE_HEADER)?
        .parse::<UserRole>()
        .map_err(|_| AppError::Unauthorized(format!("Malformed {} header", ROLE_HEADER)))?;
    Ok(SessionIdentity {
        user_id: uuid_header(headers, USER_ID_HEADER)?,
        username: header(headers, USERNAME_HEADER)?.to_string(),
        role,
        account_id: uuid_header(headers, ACCOUNT_ID_HEADER)?,
        session_id: uuid_header(headers, SESSION_ID_HEADER)?,
    })
}

pub async fn auth_middleware(
    State(auth_state): State<Arc<AuthState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let headers = request.headers();

    let gateway_key = match headers.get(GATEWAY_KEY_HEADER).and_then(|v| v.to_str().ok()) {
        Some(key) => key,
        None => {
            return HttpAppError(AppError::Unauthorized(
                "Missing gateway key header".to_string(),
            ))
            .into_response();
        }
    };
    if !secure_compare(gateway_key, &auth_state.gateway_shared_key) {
        return HttpAppError(AppError::Unauthorized("Invalid gateway key".to_string()))
            .into_response();
    }

    let identity = match parse_session_identity(headers) {
        Ok(identity) => identity,
        Err(e) => return HttpAppError(e).into_response(),
    };

    let meta = RequestMeta {
        ip_address: extract_client_ip(headers),
        user_agent: headers
            .get(axum::http::header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string()),
    };

    tracing::debug!(
        user_id = %identity.user_id,
        role = %identity.role,
        "Session established from gateway headers"
    );

    request
        .extensions_mut()
        .insert(SessionContext { identity, meta });

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(role: &str) -> HeaderMap {
        let mut map = HeaderMap::new();
        map.insert(
            USER_ID_HEADER,
            HeaderValue::from_str(&Uuid::new_v4().to_string()).unwrap(),
        );
        map.insert(USERNAME_HEADER, HeaderValue::from_static("dora"));
        map.insert(ROLE_HEADER, HeaderValue::from_str(role).unwrap());
        map.insert(
            ACCOUNT_ID_HEADER,
            HeaderValue::from_str(&Uuid::new_v4().to_string()).unwrap(),
        );
        map.insert(
            SESSION_ID_HEADER,
            HeaderValue::from_str(&Uuid::new_v4().to_string()).unwrap(),
        );
        map
    }

    #[test]
    fn test_parse_session_identity_accepts_complete_headers() {
        let identity = parse_session_identity(&headers("admin")).unwrap();
        assert_eq!(identity.username, "dora");
        assert_eq!(identity.role, UserRole::Admin);
    }

    #[test]
    fn test_parse_session_identity_rejects_missing_and_malformed() {
        let mut incomplete = headers("manager");
        incomplete.remove(USER_ID_HEADER);
        assert!(parse_session_identity(&incomplete).is_err());

        let mut bad_role = headers("manager");
        bad_role.insert(ROLE_HEADER, HeaderValue::from_static("landlord"));
        assert!(parse_session_identity(&bad_role).is_err());

        let mut bad_uuid = headers("agent");
        bad_uuid.insert(USER_ID_HEADER, HeaderValue::from_static("42"));
        assert!(parse_session_identity(&bad_uuid).is_err());
    }

    #[test]
    fn test_secure_compare() {
        assert!(secure_compare("gateway-key", "gateway-key"));
        assert!(!secure_compare("gateway-key", "gateway-kez"));
        assert!(!secure_compare("short", "longer-value"));
    }

    #[test]
    fn test_extract_client_ip_takes_first_forwarded_hop() {
        let mut map = HeaderMap::new();
        map.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.9, 10.0.0.1"),
        );
        assert_eq!(extract_client_ip(&map).as_deref(), Some("203.0.113.9"));
        assert_eq!(extract_client_ip(&HeaderMap::new()), None);
    }
}

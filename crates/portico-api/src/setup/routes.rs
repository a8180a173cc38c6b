//! Route configuration and setup.

use anyhow::Result;
use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::{delete, get, post, put},
    Json, Router,
};
use portico_core::Config;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::api_doc;
use crate::auth::middleware::{auth_middleware, AuthState};
use crate::handlers;
use crate::middleware::request_id_middleware;
use crate::setup::health;
use crate::state::AppState;

pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router> {
    let cors = setup_cors(config)?;
    let auth_state = Arc::new(AuthState {
        gateway_shared_key: config.gateway_shared_key.clone(),
    });

    // Public: health, API docs, and the token-authenticated SSE stream
    // (EventSource cannot set custom headers).
    let public_routes = Router::new()
        .route("/health/live", get(health::live))
        .route("/health/ready", get(health::ready))
        .route(
            "/api/openapi.json",
            get(|| async { Json(api_doc::ApiDoc::openapi()) }),
        )
        .route(
            "/api/v1/realtime/stream",
            get(handlers::realtime::stream_notifications),
        );

    // Everything else requires the gateway-established session identity.
    let protected_routes = Router::new()
        .route("/api/v1/documents", post(handlers::upload::upload_documents))
        .route(
            "/api/v1/documents/url",
            get(handlers::documents::signed_document_url),
        )
        .route("/api/v1/registry", get(handlers::registry::list_entries))
        .route(
            "/api/v1/registry/count",
            get(handlers::registry::count_entries),
        )
        .route(
            "/api/v1/registry/{id}",
            delete(handlers::registry::delete_entry),
        )
        .route(
            "/api/v1/properties/review",
            get(handlers::review::list_review_queue),
        )
        .route(
            "/api/v1/properties/{id}",
            get(handlers::review::get_property),
        )
        .route(
            "/api/v1/properties/{id}/decision",
            post(handlers::review::decide_property),
        )
        .route(
            "/api/v1/properties/{id}/status",
            put(handlers::review::update_property_status),
        )
        .route(
            "/api/v1/audit-logs",
            get(handlers::audit_log::list_audit_logs),
        )
        .route(
            "/api/v1/audit-logs/{id}",
            get(handlers::audit_log::get_audit_log),
        )
        .route(
            "/api/v1/realtime/token",
            post(handlers::realtime::issue_channel_token),
        )
        .layer(axum::middleware::from_fn_with_state(
            auth_state,
            auth_middleware,
        ));

    let app = public_routes
        .merge(protected_routes)
        .with_state(state)
        .merge(utoipa_rapidoc::RapiDoc::new("/api/openapi.json").path("/docs"))
        .layer(DefaultBodyLimit::max(config.max_upload_size_bytes))
        .layer(RequestBodyLimitLayer::new(config.max_upload_size_bytes))
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    Ok(app)
}

fn setup_cors(config: &Config) -> Result<CorsLayer> {
    let methods = [Method::GET, Method::POST, Method::PUT, Method::DELETE];
    let cors = if config.cors_origins.is_empty() {
        if config.is_production() {
            anyhow::bail!("CORS_ORIGINS must be set in production");
        }
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any)
    } else {
        let origins = config
            .cors_origins
            .iter()
            .map(|origin| origin.parse::<HeaderValue>())
            .collect::<Result<Vec<_>, _>>()?;
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers(Any)
    };
    Ok(cors)
}

//! Application wiring: database, storage, services, routes, server.

pub mod health;
pub mod routes;
pub mod server;

use anyhow::Result;
use axum::Router;
use portico_core::Config;
use portico_db::{AuditLogRepository, LeaseRepository, PropertyRepository, RegistryRepository};
use portico_services::{
    AuditSink, ChannelTokenService, DbAuditSink, HttpSignedUrlTransport, HttpUploadDispatcher,
    RegistryFeed, ReviewService, UploadService,
};
use portico_storage::create_storage;
use std::sync::Arc;

use crate::state::AppState;

/// Build every service and the router from configuration.
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, Router)> {
    let pool = portico_db::connect(
        &config.database_url,
        config.db_max_connections,
        config.db_timeout_seconds,
    )
    .await?;
    portico_db::run_migrations(&pool).await?;
    tracing::info!("Database connected and migrated");

    let storage = create_storage(&config)?;

    let registry = RegistryRepository::new(pool.clone());
    let properties = PropertyRepository::new(pool.clone());
    let leases = LeaseRepository::new(pool.clone());
    let audit_log = AuditLogRepository::new(pool.clone());
    let audit: Arc<dyn AuditSink> = Arc::new(DbAuditSink::new(audit_log.clone()));

    let uploads = UploadService::new(
        Arc::new(registry.clone()),
        Arc::new(HttpUploadDispatcher::new(config.dispatcher_url.clone())),
        Arc::new(HttpSignedUrlTransport::new()),
        storage.clone(),
        audit.clone(),
        config.storage_bucket.clone(),
    );
    let review = ReviewService::new(
        Arc::new(properties.clone()),
        Arc::new(leases),
        audit.clone(),
    );
    let channel_tokens = ChannelTokenService::new(
        config.realtime_token_secret.clone(),
        config.realtime_token_ttl_secs,
    );

    let feed = RegistryFeed::new(config.realtime_channel_capacity);
    feed.spawn_listener(pool.clone());

    let state = Arc::new(AppState {
        config: config.clone(),
        pool,
        storage,
        registry,
        properties,
        audit_log,
        audit,
        uploads,
        review,
        channel_tokens,
        feed,
    });

    let router = routes::setup_routes(&config, state.clone())?;
    Ok((state, router))
}

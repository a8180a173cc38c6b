//! Application state shared across handlers.

use portico_core::Config;
use portico_db::{AuditLogRepository, PropertyRepository, RegistryRepository};
use portico_services::{
    AuditSink, ChannelTokenService, RegistryFeed, ReviewService, UploadService,
};
use portico_storage::Storage;
use sqlx::PgPool;
use std::sync::Arc;

pub struct AppState {
    pub config: Config,
    pub pool: PgPool,
    pub storage: Arc<dyn Storage>,
    pub registry: RegistryRepository,
    pub properties: PropertyRepository,
    pub audit_log: AuditLogRepository,
    pub audit: Arc<dyn AuditSink>,
    pub uploads: UploadService,
    pub review: ReviewService,
    pub channel_tokens: ChannelTokenService,
    pub feed: RegistryFeed,
}

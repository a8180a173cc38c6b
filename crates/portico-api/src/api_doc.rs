//! OpenAPI documentation.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;
use portico_core::models;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Portico API",
        version = "0.1.0",
        description = "Real-estate portfolio document lifecycle and review API. Covers document upload with extraction tracking, the property review/approval workflow, registry cleanup, audit trail access, and realtime extraction notifications. All endpoints are versioned under /api/v1/."
    ),
    paths(
        // Documents
        handlers::upload::upload_documents,
        handlers::documents::signed_document_url,
        // Registry
        handlers::registry::list_entries,
        handlers::registry::count_entries,
        handlers::registry::delete_entry,
        // Properties
        handlers::review::list_review_queue,
        handlers::review::get_property,
        handlers::review::decide_property,
        handlers::review::update_property_status,
        // Audit trail
        handlers::audit_log::list_audit_logs,
        handlers::audit_log::get_audit_log,
        // Realtime
        handlers::realtime::issue_channel_token,
        handlers::realtime::stream_notifications,
    ),
    components(schemas(
        error::ErrorResponse,
        models::StoredUpload,
        models::BatchSuccess,
        models::BatchFailure,
        models::BatchSummary,
        models::ExtractionStatus,
        models::RegistryEntryResponse,
        models::PropertyStatus,
        models::PropertyResponse,
        models::ReviewDecision,
        models::AuditRecord,
        handlers::registry::RegistryCountResponse,
        handlers::review::DecisionRequest,
        handlers::review::StatusUpdateRequest,
        handlers::documents::SignedUrlResponse,
        handlers::realtime::ChannelTokenResponse,
    )),
    tags(
        (name = "documents", description = "Document upload and signed read access"),
        (name = "registry", description = "Extraction registry reads and cleanup"),
        (name = "properties", description = "Review/approval workflow and status updates"),
        (name = "audit", description = "Append-only audit trail"),
        (name = "realtime", description = "Extraction notification stream")
    )
)]
pub struct ApiDoc;

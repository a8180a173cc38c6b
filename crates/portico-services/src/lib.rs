//! Service layer for the portico portfolio platform.
//!
//! Orchestration lives here: the document upload lifecycle, the Admin
//! review/approval workflow, the realtime notification bridge, and the
//! fire-and-forget audit recorder. Repositories and storage backends are
//! injected behind traits so the lifecycle steps can be exercised with
//! counting test doubles.

pub mod audit;
pub mod dispatcher;
pub mod realtime;
pub mod review;
pub mod upload;

pub use audit::{AuditSink, DbAuditSink};
pub use dispatcher::{
    HttpSignedUrlTransport, HttpUploadDispatcher, SignedUrlTransport, UploadDispatcher,
};
pub use realtime::bridge::{
    Guidance, Notification, NotificationBridge, NotificationKind, SubscriptionState,
};
pub use realtime::feed::{RegistryFeed, REGISTRY_NOTIFY_CHANNEL};
pub use realtime::token::{ChannelClaims, ChannelTokenService, IssuedChannelToken};
pub use review::{LeaseGate, PropertyStore, ReviewService};
pub use upload::{FailedDocumentGate, UploadService};

pub mod audit;
pub mod property;
pub mod registry;
pub mod session;
pub mod upload;

pub use audit::{AuditAction, AuditRecord, NewAuditRecord};
pub use property::{Property, PropertyResponse, PropertyStatus, ReviewDecision};
pub use registry::{
    ExtractionStatus, RegistryEntry, RegistryEntryResponse, RegistryEvent,
};
pub use session::{RequestMeta, SessionIdentity, UserRole};
pub use upload::{
    BatchFailure, BatchSuccess, BatchSummary, DispatchRequest, DispatchResponse, DispatchTicket,
    StoredUpload, UploadCandidate,
};

//! Document upload lifecycle.
//!
//! One file moves through five strictly sequential steps: duplicate-failure
//! guard, dispatcher handshake, direct PUT to the signed URL, confirmation
//! plus metadata tagging against the stored object, and one audit row. No
//! step retries; a failure is terminal for that file and the caller must
//! resubmit. Batches run files one at a time with independent outcomes.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use portico_core::models::{
    AuditAction, BatchFailure, BatchSuccess, BatchSummary, DispatchRequest, NewAuditRecord,
    RegistryEntry, RequestMeta, SessionIdentity, StoredUpload, UploadCandidate,
};
use portico_core::validation::{ensure_document_type, is_allowed_content_type};
use portico_core::{AppError, ErrorMetadata};
use portico_storage::{derive_object_key, Storage};

use crate::audit::AuditSink;
use crate::dispatcher::{SignedUrlTransport, UploadDispatcher};

/// Pre-check against the registry for a stale FAILED row.
///
/// The lookup is global by filename, not scoped to the uploading user: a
/// failed extraction blocks re-upload of that name for everyone until the
/// row is deleted.
#[async_trait]
pub trait FailedDocumentGate: Send + Sync {
    async fn find_failed(&self, file_name: &str) -> Result<Option<RegistryEntry>, AppError>;
}

#[async_trait]
impl FailedDocumentGate for portico_db::RegistryRepository {
    async fn find_failed(&self, file_name: &str) -> Result<Option<RegistryEntry>, AppError> {
        self.find_failed_by_filename(file_name).await
    }
}

pub struct UploadService {
    gate: Arc<dyn FailedDocumentGate>,
    dispatcher: Arc<dyn UploadDispatcher>,
    transport: Arc<dyn SignedUrlTransport>,
    storage: Arc<dyn Storage>,
    audit: Arc<dyn AuditSink>,
    bucket: String,
}

impl UploadService {
    pub fn new(
        gate: Arc<dyn FailedDocumentGate>,
        dispatcher: Arc<dyn UploadDispatcher>,
        transport: Arc<dyn SignedUrlTransport>,
        storage: Arc<dyn Storage>,
        audit: Arc<dyn AuditSink>,
        bucket: String,
    ) -> Self {
        UploadService {
            gate,
            dispatcher,
            transport,
            storage,
            audit,
            bucket,
        }
    }

    /// Run one file through the full lifecycle.
    ///
    /// No registry row is written here; that belongs to the extraction
    /// pipeline once it picks up the stored object.
    #[tracing::instrument(
        skip(self, candidate, identity, meta),
        fields(
            file_name = %candidate.file_name,
            user_id = %identity.user_id,
            document_type = %candidate.document_type,
        )
    )]
    pub async fn submit_upload(
        &self,
        candidate: UploadCandidate,
        identity: &SessionIdentity,
        meta: &RequestMeta,
    ) -> Result<StoredUpload, AppError> {
        // Client-declared type, checked before any network call.
        if !is_allowed_content_type(&candidate.content_type) {
            return Err(AppError::InvalidInput(format!(
                "Content type '{}' is not supported for document upload",
                candidate.content_type
            )));
        }
        ensure_document_type(&candidate.document_type)?;

        if let Some(stale) = self.gate.find_failed(&candidate.file_name).await? {
            tracing::debug!(
                stale_entry_id = %stale.id,
                "Upload blocked by existing FAILED registry row"
            );
            return Err(AppError::DuplicateFailedDocument {
                file_name: candidate.file_name,
            });
        }

        let upload_timestamp = Utc::now();
        let file_path = derive_object_key(upload_timestamp, &candidate.file_name);

        let ticket = self
            .dispatcher
            .dispatch(&DispatchRequest {
                file_name: candidate.file_name.clone(),
                file_path,
                bucket_name: self.bucket.clone(),
                content_type: candidate.content_type.clone(),
                upload_timestamp,
                user_id: identity.user_id,
                session_id: identity.session_id,
                service_key_role: identity.role.to_string(),
                document_type: candidate.document_type.clone(),
            })
            .await?;

        self.transport
            .put(
                &ticket.signed_url,
                candidate.bytes.clone(),
                &candidate.content_type,
            )
            .await?;

        let resolved_type = self
            .confirm(&ticket.upload_path, &candidate, identity, meta)
            .await?;

        self.audit
            .append(NewAuditRecord::new(
                identity,
                meta,
                AuditAction::Create,
                "documents",
                Some(ticket.upload_path.clone()),
                format!(
                    "Uploaded document '{}' ({})",
                    candidate.file_name, candidate.document_type
                ),
            ))
            .await;

        tracing::info!(path = %ticket.upload_path, "Document upload confirmed");

        Ok(StoredUpload {
            path: ticket.upload_path,
            bucket: self.bucket.clone(),
            content_type: resolved_type,
        })
    }

    /// Confirmation step: verify the object landed, re-derive its content
    /// type from the backend's own view, re-validate, and tag it with the
    /// flattened session metadata.
    async fn confirm(
        &self,
        path: &str,
        candidate: &UploadCandidate,
        identity: &SessionIdentity,
        meta: &RequestMeta,
    ) -> Result<String, AppError> {
        if !self.storage.exists(path).await.map_err(AppError::from)? {
            return Err(AppError::ObjectNotFound(path.to_string()));
        }

        let stored_type = self
            .storage
            .content_type(path)
            .await
            .map_err(AppError::from)?
            .unwrap_or_default();
        if !is_allowed_content_type(&stored_type) {
            return Err(AppError::UnsupportedStoredType {
                content_type: stored_type,
            });
        }

        let mut tags = HashMap::new();
        tags.insert("user_id".to_string(), identity.user_id.to_string());
        tags.insert("username".to_string(), identity.username.clone());
        tags.insert("role".to_string(), identity.role.to_string());
        tags.insert("account_id".to_string(), identity.account_id.to_string());
        tags.insert("session_id".to_string(), identity.session_id.to_string());
        tags.insert("file_name".to_string(), candidate.file_name.clone());
        tags.insert("document_type".to_string(), candidate.document_type.clone());
        tags.insert("content_type".to_string(), stored_type.clone());
        tags.insert("confirmed_at".to_string(), Utc::now().to_rfc3339());
        if let Some(ip) = &meta.ip_address {
            tags.insert("ip_address".to_string(), ip.clone());
        }
        if let Some(ua) = &meta.user_agent {
            tags.insert("user_agent".to_string(), ua.clone());
        }

        self.storage
            .set_metadata(path, tags)
            .await
            .map_err(AppError::from)?;

        Ok(stored_type)
    }

    /// Upload a batch of files sequentially. A failure on one file never
    /// aborts the remainder; the summary attributes each outcome to its file.
    #[tracing::instrument(skip(self, candidates, identity, meta), fields(batch_size = candidates.len(), user_id = %identity.user_id))]
    pub async fn submit_batch(
        &self,
        candidates: Vec<UploadCandidate>,
        identity: &SessionIdentity,
        meta: &RequestMeta,
    ) -> BatchSummary {
        let mut summary = BatchSummary::default();
        for candidate in candidates {
            let file_name = candidate.file_name.clone();
            match self.submit_upload(candidate, identity, meta).await {
                Ok(upload) => summary.succeeded.push(BatchSuccess { file_name, upload }),
                Err(e) => {
                    tracing::warn!(file_name = %file_name, error = %e, "Batch file failed");
                    summary.failed.push(BatchFailure {
                        file_name,
                        code: e.error_code().to_string(),
                        reason: e.client_message(),
                    });
                }
            }
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::test_support::RecordingAuditSink;
    use bytes::Bytes;
    use portico_core::models::{DispatchTicket, ExtractionStatus, UserRole};
    use portico_storage::{LocalStorage, StorageResult};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;
    use uuid::Uuid;

    fn identity() -> SessionIdentity {
        SessionIdentity {
            user_id: Uuid::new_v4(),
            username: "rivka".to_string(),
            role: UserRole::Manager,
            account_id: Uuid::new_v4(),
            session_id: Uuid::new_v4(),
        }
    }

    fn candidate(name: &str, content_type: &str) -> UploadCandidate {
        UploadCandidate {
            file_name: name.to_string(),
            content_type: content_type.to_string(),
            document_type: "Rent Roll".to_string(),
            bytes: Bytes::from_static(b"%PDF-1.7 test"),
        }
    }

    fn failed_entry(name: &str) -> RegistryEntry {
        RegistryEntry {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            file_name: name.to_string(),
            extraction_status: ExtractionStatus::Failed,
            confidence_pct: None,
            remarks: Some("unreadable scan".to_string()),
            document_type: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    struct StubGate {
        failed: Option<RegistryEntry>,
        calls: AtomicUsize,
    }

    impl StubGate {
        fn clean() -> Self {
            StubGate {
                failed: None,
                calls: AtomicUsize::new(0),
            }
        }

        fn blocked(entry: RegistryEntry) -> Self {
            StubGate {
                failed: Some(entry),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl FailedDocumentGate for StubGate {
        async fn find_failed(&self, file_name: &str) -> Result<Option<RegistryEntry>, AppError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .failed
                .as_ref()
                .filter(|e| e.file_name == file_name)
                .cloned())
        }
    }

    /// Dispatcher double: counts calls and hands out tickets pointing at the
    /// local storage backend the transport double writes to.
    struct CountingDispatcher {
        calls: AtomicUsize,
        reject: bool,
    }

    impl CountingDispatcher {
        fn granting() -> Self {
            CountingDispatcher {
                calls: AtomicUsize::new(0),
                reject: false,
            }
        }

        fn rejecting() -> Self {
            CountingDispatcher {
                calls: AtomicUsize::new(0),
                reject: true,
            }
        }
    }

    #[async_trait]
    impl UploadDispatcher for CountingDispatcher {
        async fn dispatch(&self, request: &DispatchRequest) -> Result<DispatchTicket, AppError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.reject {
                return Err(AppError::DispatcherRejected {
                    status: 422,
                    body: r#"{"status":"error","reason":"bucket mismatch"}"#.to_string(),
                });
            }
            Ok(DispatchTicket {
                signed_url: format!("stub://{}", request.file_path),
                upload_path: request.file_path.clone(),
            })
        }
    }

    /// Transport double: writes through to local storage so the confirmation
    /// step sees a real object, and can be told to fail for specific files.
    struct LocalTransport {
        storage: Arc<LocalStorage>,
        calls: AtomicUsize,
        fail_for: Mutex<Vec<String>>,
    }

    impl LocalTransport {
        fn new(storage: Arc<LocalStorage>) -> Self {
            LocalTransport {
                storage,
                calls: AtomicUsize::new(0),
                fail_for: Mutex::new(Vec::new()),
            }
        }

        fn failing_for(self, paths_containing: &str) -> Self {
            self.fail_for
                .lock()
                .unwrap()
                .push(paths_containing.to_string());
            self
        }
    }

    #[async_trait]
    impl SignedUrlTransport for LocalTransport {
        async fn put(
            &self,
            signed_url: &str,
            data: Bytes,
            content_type: &str,
        ) -> Result<(), AppError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let path = signed_url.trim_start_matches("stub://");
            if self
                .fail_for
                .lock()
                .unwrap()
                .iter()
                .any(|needle| path.contains(needle.as_str()))
            {
                return Err(AppError::StorageWriteFailed {
                    status: 503,
                    body: "backend unavailable".to_string(),
                });
            }
            self.storage
                .put(path, data, content_type)
                .await
                .map_err(AppError::from)
        }
    }

    /// Storage wrapper that lies about the stored content type, for the
    /// confirmation-stage allow-list check.
    struct MisreportingStorage {
        inner: Arc<LocalStorage>,
        reported_type: String,
    }

    #[async_trait]
    impl Storage for MisreportingStorage {
        async fn exists(&self, path: &str) -> StorageResult<bool> {
            self.inner.exists(path).await
        }

        async fn put(&self, path: &str, data: Bytes, content_type: &str) -> StorageResult<()> {
            self.inner.put(path, data, content_type).await
        }

        async fn download(&self, path: &str) -> StorageResult<Vec<u8>> {
            self.inner.download(path).await
        }

        async fn content_type(&self, path: &str) -> StorageResult<Option<String>> {
            self.inner.content_type(path).await?;
            Ok(Some(self.reported_type.clone()))
        }

        async fn metadata(
            &self,
            path: &str,
        ) -> StorageResult<HashMap<String, String>> {
            self.inner.metadata(path).await
        }

        async fn set_metadata(
            &self,
            path: &str,
            metadata: HashMap<String, String>,
        ) -> StorageResult<()> {
            self.inner.set_metadata(path, metadata).await
        }

        async fn signed_read_url(
            &self,
            path: &str,
            expires_in: Duration,
        ) -> StorageResult<String> {
            self.inner.signed_read_url(path, expires_in).await
        }

        fn backend_name(&self) -> &'static str {
            "misreporting"
        }
    }

    struct Harness {
        _dir: tempfile::TempDir,
        service: UploadService,
        gate: Arc<StubGate>,
        dispatcher: Arc<CountingDispatcher>,
        transport: Arc<LocalTransport>,
        storage: Arc<LocalStorage>,
        audit: RecordingAuditSink,
    }

    fn harness(gate: StubGate, dispatcher: CountingDispatcher) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let storage = Arc::new(LocalStorage::new(dir.path(), "http://localhost:9100/files"));
        harness_with(gate, dispatcher, storage.clone(), storage, dir)
    }

    fn harness_with(
        gate: StubGate,
        dispatcher: CountingDispatcher,
        write_storage: Arc<LocalStorage>,
        confirm_storage: Arc<dyn Storage>,
        dir: tempfile::TempDir,
    ) -> Harness {
        let gate = Arc::new(gate);
        let dispatcher = Arc::new(dispatcher);
        let transport = Arc::new(LocalTransport::new(write_storage.clone()));
        let audit = RecordingAuditSink::new();
        let service = UploadService::new(
            gate.clone(),
            dispatcher.clone(),
            transport.clone(),
            confirm_storage,
            Arc::new(audit.clone()),
            "portfolio-docs".to_string(),
        );
        Harness {
            _dir: dir,
            service,
            gate,
            dispatcher,
            transport,
            storage: write_storage,
            audit,
        }
    }

    // E2E scenario A: clean upload runs every step exactly once and audits
    // one CREATE.
    #[tokio::test]
    async fn test_clean_upload_runs_all_steps_once() {
        let h = harness(StubGate::clean(), CountingDispatcher::granting());
        let result = h
            .service
            .submit_upload(
                candidate("lease.pdf", "application/pdf"),
                &identity(),
                &RequestMeta {
                    ip_address: Some("10.1.2.3".to_string()),
                    user_agent: Some("portico-web/1.4".to_string()),
                },
            )
            .await
            .unwrap();

        assert!(result.path.ends_with("_lease.pdf"));
        assert_eq!(result.bucket, "portfolio-docs");
        assert_eq!(result.content_type, "application/pdf");
        assert_eq!(h.gate.calls.load(Ordering::SeqCst), 1);
        assert_eq!(h.dispatcher.calls.load(Ordering::SeqCst), 1);
        assert_eq!(h.transport.calls.load(Ordering::SeqCst), 1);

        let records = h.audit.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].action, AuditAction::Create);
        assert_eq!(records[0].table_name, "documents");
        assert_eq!(records[0].record_id.as_deref(), Some(result.path.as_str()));

        // Confirmation attached the flattened session metadata.
        let tags = h.storage.metadata(&result.path).await.unwrap();
        assert_eq!(tags.get("file_name").map(String::as_str), Some("lease.pdf"));
        assert_eq!(tags.get("role").map(String::as_str), Some("manager"));
        assert_eq!(tags.get("ip_address").map(String::as_str), Some("10.1.2.3"));
        assert!(tags.contains_key("confirmed_at"));
    }

    // P1 / E2E scenario B: an existing FAILED row for the filename stops the
    // upload before any dispatcher or storage call.
    #[tokio::test]
    async fn test_failed_duplicate_blocks_before_any_network_call() {
        let h = harness(
            StubGate::blocked(failed_entry("lease.pdf")),
            CountingDispatcher::granting(),
        );
        let err = h
            .service
            .submit_upload(
                candidate("lease.pdf", "application/pdf"),
                &identity(),
                &RequestMeta::default(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::DuplicateFailedDocument { .. }));
        assert_eq!(h.dispatcher.calls.load(Ordering::SeqCst), 0);
        assert_eq!(h.transport.calls.load(Ordering::SeqCst), 0);
        assert!(h.audit.records().is_empty());
    }

    // P2, declared-type half: disallowed MIME rejected before dispatcher
    // contact.
    #[tokio::test]
    async fn test_disallowed_declared_type_rejected_before_dispatch() {
        let h = harness(StubGate::clean(), CountingDispatcher::granting());
        let err = h
            .service
            .submit_upload(
                candidate("malware.exe", "application/x-msdownload"),
                &identity(),
                &RequestMeta::default(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::InvalidInput(_)));
        assert_eq!(h.gate.calls.load(Ordering::SeqCst), 0);
        assert_eq!(h.dispatcher.calls.load(Ordering::SeqCst), 0);
    }

    // P2, stored-type half: the backend's own reported content type is
    // re-validated at confirmation even though steps 1-3 passed.
    #[tokio::test]
    async fn test_stored_type_revalidated_at_confirmation() {
        let dir = tempfile::tempdir().unwrap();
        let local = Arc::new(LocalStorage::new(dir.path(), "http://localhost:9100/files"));
        let confirm = Arc::new(MisreportingStorage {
            inner: local.clone(),
            reported_type: "application/zip".to_string(),
        });
        let h = harness_with(
            StubGate::clean(),
            CountingDispatcher::granting(),
            local,
            confirm,
            dir,
        );

        let err = h
            .service
            .submit_upload(
                candidate("lease.pdf", "application/pdf"),
                &identity(),
                &RequestMeta::default(),
            )
            .await
            .unwrap_err();

        match err {
            AppError::UnsupportedStoredType { content_type } => {
                assert_eq!(content_type, "application/zip");
            }
            other => panic!("Expected UnsupportedStoredType, got {:?}", other),
        }
        // The upload itself did happen; only confirmation refused it.
        assert_eq!(h.transport.calls.load(Ordering::SeqCst), 1);
        assert!(h.audit.records().is_empty());
    }

    #[tokio::test]
    async fn test_blank_document_type_rejected() {
        let h = harness(StubGate::clean(), CountingDispatcher::granting());
        let mut bad = candidate("lease.pdf", "application/pdf");
        bad.document_type = "  ".to_string();
        let err = h
            .service
            .submit_upload(bad, &identity(), &RequestMeta::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
        assert_eq!(h.dispatcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_dispatcher_rejection_surfaces_upstream_body() {
        let h = harness(StubGate::clean(), CountingDispatcher::rejecting());
        let err = h
            .service
            .submit_upload(
                candidate("lease.pdf", "application/pdf"),
                &identity(),
                &RequestMeta::default(),
            )
            .await
            .unwrap_err();

        match err {
            AppError::DispatcherRejected { status, body } => {
                assert_eq!(status, 422);
                assert!(body.contains("bucket mismatch"));
            }
            other => panic!("Expected DispatcherRejected, got {:?}", other),
        }
        assert_eq!(h.transport.calls.load(Ordering::SeqCst), 0);
    }

    // P3: a storage-write failure on file k leaves files k+1..N attempted,
    // with per-file outcomes attributed independently.
    #[tokio::test]
    async fn test_batch_failure_is_independent_per_file() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Arc::new(LocalStorage::new(dir.path(), "http://localhost:9100/files"));
        let gate = Arc::new(StubGate::clean());
        let dispatcher = Arc::new(CountingDispatcher::granting());
        let transport =
            Arc::new(LocalTransport::new(storage.clone()).failing_for("quarterly_report"));
        let audit = RecordingAuditSink::new();
        let service = UploadService::new(
            gate,
            dispatcher.clone(),
            transport.clone(),
            storage,
            Arc::new(audit.clone()),
            "portfolio-docs".to_string(),
        );

        let summary = service
            .submit_batch(
                vec![
                    candidate("lease.pdf", "application/pdf"),
                    candidate("quarterly_report.xlsx", "application/vnd.ms-excel"),
                    candidate("notes.txt", "text/plain"),
                ],
                &identity(),
                &RequestMeta::default(),
            )
            .await;

        assert_eq!(summary.succeeded.len(), 2);
        assert_eq!(summary.failed.len(), 1);
        assert!(!summary.is_all_ok());
        assert_eq!(summary.failed[0].file_name, "quarterly_report.xlsx");
        assert_eq!(summary.failed[0].code, "STORAGE_WRITE_FAILED");
        let succeeded: Vec<&str> = summary
            .succeeded
            .iter()
            .map(|s| s.file_name.as_str())
            .collect();
        assert_eq!(succeeded, vec!["lease.pdf", "notes.txt"]);
        // All three files were attempted.
        assert_eq!(dispatcher.calls.load(Ordering::SeqCst), 3);
        assert_eq!(transport.calls.load(Ordering::SeqCst), 3);
        // Only the two confirmed uploads were audited.
        assert_eq!(audit.records().len(), 2);
    }

    #[tokio::test]
    async fn test_confirmation_missing_object_is_object_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let local = Arc::new(LocalStorage::new(dir.path(), "http://localhost:9100/files"));
        // Confirm against an empty second storage root: the PUT lands in one
        // place, the existence check looks in another.
        let other_dir = tempfile::tempdir().unwrap();
        let confirm: Arc<dyn Storage> = Arc::new(LocalStorage::new(
            other_dir.path(),
            "http://localhost:9100/files",
        ));
        let h = harness_with(
            StubGate::clean(),
            CountingDispatcher::granting(),
            local,
            confirm,
            dir,
        );

        let err = h
            .service
            .submit_upload(
                candidate("lease.pdf", "application/pdf"),
                &identity(),
                &RequestMeta::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ObjectNotFound(_)));
    }
}

//! Property review/approval workflow.
//!
//! A property arrives from upstream ingestion in `Review` status and leaves
//! it exactly one of two ways: an Admin approves it to `Available`, or an
//! Admin rejects it and the row is deleted. Already-available properties
//! cycle among the operational statuses through `update_status`, which is
//! blocked for any caller while the property has an active lease.

use std::sync::Arc;

use async_trait::async_trait;
use portico_core::models::{
    AuditAction, NewAuditRecord, Property, PropertyStatus, RequestMeta, SessionIdentity,
};
use portico_core::AppError;
use uuid::Uuid;

use crate::audit::AuditSink;

#[async_trait]
pub trait PropertyStore: Send + Sync {
    async fn get(&self, id: Uuid) -> Result<Option<Property>, AppError>;
    async fn list_review(&self, page: i64, per_page: i64) -> Result<Vec<Property>, AppError>;
    async fn approve(&self, id: Uuid, updated_by: Uuid) -> Result<u64, AppError>;
    async fn delete_in_review(&self, id: Uuid) -> Result<u64, AppError>;
    async fn update_status(
        &self,
        id: Uuid,
        status: PropertyStatus,
        updated_by: Uuid,
    ) -> Result<u64, AppError>;
}

#[async_trait]
impl PropertyStore for portico_db::PropertyRepository {
    async fn get(&self, id: Uuid) -> Result<Option<Property>, AppError> {
        portico_db::PropertyRepository::get(self, id).await
    }

    async fn list_review(&self, page: i64, per_page: i64) -> Result<Vec<Property>, AppError> {
        portico_db::PropertyRepository::list_review(self, page, per_page).await
    }

    async fn approve(&self, id: Uuid, updated_by: Uuid) -> Result<u64, AppError> {
        portico_db::PropertyRepository::approve(self, id, updated_by).await
    }

    async fn delete_in_review(&self, id: Uuid) -> Result<u64, AppError> {
        portico_db::PropertyRepository::delete_in_review(self, id).await
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: PropertyStatus,
        updated_by: Uuid,
    ) -> Result<u64, AppError> {
        portico_db::PropertyRepository::update_status(self, id, status, updated_by).await
    }
}

#[async_trait]
pub trait LeaseGate: Send + Sync {
    async fn has_active_lease(&self, property_id: Uuid) -> Result<bool, AppError>;
}

#[async_trait]
impl LeaseGate for portico_db::LeaseRepository {
    async fn has_active_lease(&self, property_id: Uuid) -> Result<bool, AppError> {
        portico_db::LeaseRepository::has_active_lease(self, property_id).await
    }
}

pub struct ReviewService {
    properties: Arc<dyn PropertyStore>,
    leases: Arc<dyn LeaseGate>,
    audit: Arc<dyn AuditSink>,
}

impl ReviewService {
    pub fn new(
        properties: Arc<dyn PropertyStore>,
        leases: Arc<dyn LeaseGate>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        ReviewService {
            properties,
            leases,
            audit,
        }
    }

    fn require_admin(identity: &SessionIdentity, action: &str) -> Result<(), AppError> {
        if identity.is_admin() {
            Ok(())
        } else {
            // Internal message only; the client sees a generic "Forbidden".
            Err(AppError::Forbidden(format!(
                "role '{}' attempted to {} a property",
                identity.role, action
            )))
        }
    }

    /// Approve: `Review` -> `Available`. Admin only, irreversible.
    #[tracing::instrument(skip(self, identity, meta), fields(property_id = %property_id, user_id = %identity.user_id))]
    pub async fn approve(
        &self,
        property_id: Uuid,
        identity: &SessionIdentity,
        meta: &RequestMeta,
    ) -> Result<(), AppError> {
        Self::require_admin(identity, "approve")?;

        let affected = self.properties.approve(property_id, identity.user_id).await?;
        if affected == 0 {
            return Err(AppError::NotFound(format!(
                "Property {} not found in review",
                property_id
            )));
        }

        self.audit
            .append(NewAuditRecord::new(
                identity,
                meta,
                AuditAction::Approve,
                "property",
                Some(property_id.to_string()),
                format!("Approved property {} for listing", property_id),
            ))
            .await;

        tracing::info!("Property approved");
        Ok(())
    }

    /// Reject: hard-delete the row. Admin only; there is no "Rejected"
    /// status to return to.
    #[tracing::instrument(skip(self, identity, meta), fields(property_id = %property_id, user_id = %identity.user_id))]
    pub async fn reject(
        &self,
        property_id: Uuid,
        identity: &SessionIdentity,
        meta: &RequestMeta,
    ) -> Result<(), AppError> {
        Self::require_admin(identity, "reject")?;

        let affected = self.properties.delete_in_review(property_id).await?;
        if affected == 0 {
            return Err(AppError::NotFound(format!(
                "Property {} not found in review",
                property_id
            )));
        }

        self.audit
            .append(NewAuditRecord::new(
                identity,
                meta,
                AuditAction::Delete,
                "property",
                Some(property_id.to_string()),
                format!("Rejected property {} (record deleted)", property_id),
            ))
            .await;

        tracing::info!("Property rejected and deleted");
        Ok(())
    }

    /// Cycle an already-approved property among the operational statuses.
    /// Blocked while any active lease references the property, for every
    /// role.
    #[tracing::instrument(skip(self, identity, meta), fields(property_id = %property_id, status = %new_status, user_id = %identity.user_id))]
    pub async fn update_status(
        &self,
        property_id: Uuid,
        new_status: PropertyStatus,
        identity: &SessionIdentity,
        meta: &RequestMeta,
    ) -> Result<(), AppError> {
        if !new_status.is_operational() {
            return Err(AppError::InvalidInput(
                "Status 'Review' is set by ingestion and cannot be assigned directly".to_string(),
            ));
        }

        if self.leases.has_active_lease(property_id).await? {
            return Err(AppError::ActiveLeaseExists { property_id });
        }

        let affected = self
            .properties
            .update_status(property_id, new_status, identity.user_id)
            .await?;
        if affected == 0 {
            return Err(AppError::NotFound(format!(
                "Property {} not found or still in review",
                property_id
            )));
        }

        self.audit
            .append(NewAuditRecord::new(
                identity,
                meta,
                AuditAction::Update,
                "property",
                Some(property_id.to_string()),
                format!("Changed property {} status to {}", property_id, new_status),
            ))
            .await;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::test_support::RecordingAuditSink;
    use chrono::Utc;
    use portico_core::models::UserRole;
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    fn identity(role: UserRole) -> SessionIdentity {
        SessionIdentity {
            user_id: Uuid::new_v4(),
            username: "sam".to_string(),
            role,
            account_id: Uuid::new_v4(),
            session_id: Uuid::new_v4(),
        }
    }

    fn property(status: PropertyStatus) -> Property {
        Property {
            id: Uuid::new_v4(),
            name: "Elm Street 12".to_string(),
            address: "12 Elm St".to_string(),
            status,
            updated_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    /// In-memory property store mirroring the repository's row-count
    /// contract.
    #[derive(Default)]
    struct MemoryPropertyStore {
        rows: Mutex<HashMap<Uuid, Property>>,
    }

    impl MemoryPropertyStore {
        fn with(properties: Vec<Property>) -> Self {
            let store = MemoryPropertyStore::default();
            {
                let mut rows = store.rows.lock().unwrap();
                for p in properties {
                    rows.insert(p.id, p);
                }
            }
            store
        }

        fn status_of(&self, id: Uuid) -> Option<PropertyStatus> {
            self.rows.lock().unwrap().get(&id).map(|p| p.status)
        }

        fn contains(&self, id: Uuid) -> bool {
            self.rows.lock().unwrap().contains_key(&id)
        }
    }

    #[async_trait]
    impl PropertyStore for MemoryPropertyStore {
        async fn get(&self, id: Uuid) -> Result<Option<Property>, AppError> {
            Ok(self.rows.lock().unwrap().get(&id).cloned())
        }

        async fn list_review(&self, _page: i64, _per_page: i64) -> Result<Vec<Property>, AppError> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .values()
                .filter(|p| p.status == PropertyStatus::Review)
                .cloned()
                .collect())
        }

        async fn approve(&self, id: Uuid, updated_by: Uuid) -> Result<u64, AppError> {
            let mut rows = self.rows.lock().unwrap();
            match rows.get_mut(&id) {
                Some(p) if p.status == PropertyStatus::Review => {
                    p.status = PropertyStatus::Available;
                    p.updated_by = Some(updated_by);
                    Ok(1)
                }
                _ => Ok(0),
            }
        }

        async fn delete_in_review(&self, id: Uuid) -> Result<u64, AppError> {
            let mut rows = self.rows.lock().unwrap();
            match rows.get(&id) {
                Some(p) if p.status == PropertyStatus::Review => {
                    rows.remove(&id);
                    Ok(1)
                }
                _ => Ok(0),
            }
        }

        async fn update_status(
            &self,
            id: Uuid,
            status: PropertyStatus,
            updated_by: Uuid,
        ) -> Result<u64, AppError> {
            let mut rows = self.rows.lock().unwrap();
            match rows.get_mut(&id) {
                Some(p) if p.status != PropertyStatus::Review => {
                    p.status = status;
                    p.updated_by = Some(updated_by);
                    Ok(1)
                }
                _ => Ok(0),
            }
        }
    }

    struct StubLeases {
        active: HashSet<Uuid>,
    }

    impl StubLeases {
        fn none() -> Self {
            StubLeases {
                active: HashSet::new(),
            }
        }

        fn active_on(property_id: Uuid) -> Self {
            let mut active = HashSet::new();
            active.insert(property_id);
            StubLeases { active }
        }
    }

    #[async_trait]
    impl LeaseGate for StubLeases {
        async fn has_active_lease(&self, property_id: Uuid) -> Result<bool, AppError> {
            Ok(self.active.contains(&property_id))
        }
    }

    fn service(
        store: MemoryPropertyStore,
        leases: StubLeases,
    ) -> (Arc<MemoryPropertyStore>, RecordingAuditSink, ReviewService) {
        let store = Arc::new(store);
        let audit = RecordingAuditSink::new();
        let service = ReviewService::new(store.clone(), Arc::new(leases), Arc::new(audit.clone()));
        (store, audit, service)
    }

    // E2E scenario C: Admin approve moves Review -> Available and appends
    // one APPROVE row for table "property".
    #[tokio::test]
    async fn test_admin_approve_transitions_to_available() {
        let p = property(PropertyStatus::Review);
        let id = p.id;
        let (store, audit, service) = service(MemoryPropertyStore::with(vec![p]), StubLeases::none());

        service
            .approve(id, &identity(UserRole::Admin), &RequestMeta::default())
            .await
            .unwrap();

        assert_eq!(store.status_of(id), Some(PropertyStatus::Available));
        let records = audit.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].action, AuditAction::Approve);
        assert_eq!(records[0].table_name, "property");
        assert_eq!(records[0].record_id.as_deref(), Some(id.to_string().as_str()));
    }

    // P4 / E2E scenario D: non-Admin approve and reject both fail with no
    // mutation and no audit row.
    #[tokio::test]
    async fn test_non_admin_cannot_approve_or_reject() {
        for role in [UserRole::Manager, UserRole::Agent] {
            let p = property(PropertyStatus::Review);
            let id = p.id;
            let (store, audit, service) =
                service(MemoryPropertyStore::with(vec![p]), StubLeases::none());

            let err = service
                .approve(id, &identity(role), &RequestMeta::default())
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::Forbidden(_)));

            let err = service
                .reject(id, &identity(role), &RequestMeta::default())
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::Forbidden(_)));

            assert_eq!(store.status_of(id), Some(PropertyStatus::Review));
            assert!(store.contains(id));
            assert!(audit.records().is_empty());
        }
    }

    #[tokio::test]
    async fn test_admin_reject_deletes_the_row() {
        let p = property(PropertyStatus::Review);
        let id = p.id;
        let (store, audit, service) = service(MemoryPropertyStore::with(vec![p]), StubLeases::none());

        service
            .reject(id, &identity(UserRole::Admin), &RequestMeta::default())
            .await
            .unwrap();

        assert!(!store.contains(id));
        let records = audit.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].action, AuditAction::Delete);
        assert!(records[0].description.contains("Rejected"));
    }

    #[tokio::test]
    async fn test_approve_missing_or_already_available_is_not_found() {
        let p = property(PropertyStatus::Available);
        let id = p.id;
        let (_store, audit, service) =
            service(MemoryPropertyStore::with(vec![p]), StubLeases::none());

        let err = service
            .approve(id, &identity(UserRole::Admin), &RequestMeta::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert!(audit.records().is_empty());
    }

    // P5 / E2E scenario E: an active lease blocks the status change for any
    // role; with no active lease the stored status equals the request.
    #[tokio::test]
    async fn test_active_lease_blocks_status_update_for_any_role() {
        for role in [UserRole::Admin, UserRole::Manager, UserRole::Agent] {
            let p = property(PropertyStatus::Available);
            let id = p.id;
            let (store, audit, service) = service(
                MemoryPropertyStore::with(vec![p]),
                StubLeases::active_on(id),
            );

            let err = service
                .update_status(
                    id,
                    PropertyStatus::Occupied,
                    &identity(role),
                    &RequestMeta::default(),
                )
                .await
                .unwrap_err();

            assert!(matches!(err, AppError::ActiveLeaseExists { .. }));
            assert_eq!(store.status_of(id), Some(PropertyStatus::Available));
            assert!(audit.records().is_empty());
        }
    }

    #[tokio::test]
    async fn test_status_update_without_lease_applies_requested_status() {
        let p = property(PropertyStatus::Available);
        let id = p.id;
        let (store, audit, service) = service(MemoryPropertyStore::with(vec![p]), StubLeases::none());

        service
            .update_status(
                id,
                PropertyStatus::UnderMaintenance,
                &identity(UserRole::Agent),
                &RequestMeta::default(),
            )
            .await
            .unwrap();

        assert_eq!(store.status_of(id), Some(PropertyStatus::UnderMaintenance));
        let records = audit.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].action, AuditAction::Update);
    }

    #[tokio::test]
    async fn test_review_status_cannot_be_assigned_directly() {
        let p = property(PropertyStatus::Available);
        let id = p.id;
        let (_store, _audit, service) =
            service(MemoryPropertyStore::with(vec![p]), StubLeases::none());

        let err = service
            .update_status(
                id,
                PropertyStatus::Review,
                &identity(UserRole::Admin),
                &RequestMeta::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_status_update_on_review_property_is_not_found() {
        let p = property(PropertyStatus::Review);
        let id = p.id;
        let (store, _audit, service) =
            service(MemoryPropertyStore::with(vec![p]), StubLeases::none());

        let err = service
            .update_status(
                id,
                PropertyStatus::Occupied,
                &identity(UserRole::Admin),
                &RequestMeta::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(store.status_of(id), Some(PropertyStatus::Review));
    }
}

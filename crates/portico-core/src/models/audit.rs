use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use utoipa::ToSchema;
use uuid::Uuid;

use super::session::{RequestMeta, SessionIdentity, UserRole};

/// Audit action tag.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum AuditAction {
    Create,
    Update,
    Delete,
    Approve,
    View,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Create => "CREATE",
            AuditAction::Update => "UPDATE",
            AuditAction::Delete => "DELETE",
            AuditAction::Approve => "APPROVE",
            AuditAction::View => "VIEW",
        }
    }
}

impl Display for AuditAction {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

/// Audit row to append. Append-only: application code never updates or
/// deletes these rows.
#[derive(Debug, Clone)]
pub struct NewAuditRecord {
    pub user_id: Uuid,
    pub username: String,
    pub role: UserRole,
    pub action: AuditAction,
    pub table_name: String,
    pub record_id: Option<String>,
    pub description: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl NewAuditRecord {
    pub fn new(
        identity: &SessionIdentity,
        meta: &RequestMeta,
        action: AuditAction,
        table_name: impl Into<String>,
        record_id: Option<String>,
        description: impl Into<String>,
    ) -> Self {
        NewAuditRecord {
            user_id: identity.user_id,
            username: identity.username.clone(),
            role: identity.role,
            action,
            table_name: table_name.into(),
            record_id,
            description: description.into(),
            ip_address: meta.ip_address.clone(),
            user_agent: meta.user_agent.clone(),
        }
    }
}

/// Stored audit row. Role and action are kept as raw text on the read side;
/// the viewer renders whatever was recorded.
#[derive(Debug, Clone, Serialize, ToSchema, sqlx::FromRow)]
pub struct AuditRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub username: String,
    pub role: String,
    pub action: String,
    pub table_name: String,
    pub record_id: Option<String>,
    pub description: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> SessionIdentity {
        SessionIdentity {
            user_id: Uuid::new_v4(),
            username: "dora".to_string(),
            role: UserRole::Admin,
            account_id: Uuid::new_v4(),
            session_id: Uuid::new_v4(),
        }
    }

    #[test]
    fn test_new_audit_record_copies_identity() {
        let identity = identity();
        let meta = RequestMeta {
            ip_address: Some("10.0.0.9".to_string()),
            user_agent: Some("portico-web/1.4".to_string()),
        };
        let record = NewAuditRecord::new(
            &identity,
            &meta,
            AuditAction::Approve,
            "property",
            Some("p-1".to_string()),
            "Approved property",
        );
        assert_eq!(record.user_id, identity.user_id);
        assert_eq!(record.username, "dora");
        assert_eq!(record.role, UserRole::Admin);
        assert_eq!(record.action.as_str(), "APPROVE");
        assert_eq!(record.ip_address.as_deref(), Some("10.0.0.9"));
    }
}

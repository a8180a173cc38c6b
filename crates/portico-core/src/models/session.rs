use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

/// User role for authorization
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Manager,
    Agent,
}

impl Display for UserRole {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            UserRole::Admin => write!(f, "admin"),
            UserRole::Manager => write!(f, "manager"),
            UserRole::Agent => write!(f, "agent"),
        }
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(UserRole::Admin),
            "manager" => Ok(UserRole::Manager),
            "agent" => Ok(UserRole::Agent),
            other => Err(format!("Unknown role: {}", other)),
        }
    }
}

/// Caller identity established by the external session provider and forwarded
/// on every request. The row-governed data store scopes visibility by these
/// same fields.
#[derive(Debug, Clone)]
pub struct SessionIdentity {
    pub user_id: Uuid,
    pub username: String,
    pub role: UserRole,
    pub account_id: Uuid,
    pub session_id: Uuid,
}

impl SessionIdentity {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// Per-request transport metadata used for object tagging and audit rows.
#[derive(Debug, Clone, Default)]
pub struct RequestMeta {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip() {
        for role in [UserRole::Admin, UserRole::Manager, UserRole::Agent] {
            assert_eq!(role.to_string().parse::<UserRole>().unwrap(), role);
        }
    }

    #[test]
    fn test_role_parse_is_case_insensitive() {
        assert_eq!("Admin".parse::<UserRole>().unwrap(), UserRole::Admin);
        assert_eq!("MANAGER".parse::<UserRole>().unwrap(), UserRole::Manager);
        assert!("tenant".parse::<UserRole>().is_err());
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

/// Property lifecycle status.
///
/// `Review` is set by the upstream ingestion process and is only left via an
/// Admin approve (to `Available`) or reject (row deletion). The remaining
/// operational statuses cycle through the separate status-update action.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub enum PropertyStatus {
    Review,
    Available,
    Occupied,
    #[serde(rename = "Under Maintenance")]
    UnderMaintenance,
    #[serde(rename = "Not Available")]
    NotAvailable,
}

impl PropertyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyStatus::Review => "Review",
            PropertyStatus::Available => "Available",
            PropertyStatus::Occupied => "Occupied",
            PropertyStatus::UnderMaintenance => "Under Maintenance",
            PropertyStatus::NotAvailable => "Not Available",
        }
    }

    /// Statuses a property may be moved to through the status-update action.
    pub fn is_operational(&self) -> bool {
        !matches!(self, PropertyStatus::Review)
    }
}

impl Display for PropertyStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PropertyStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Review" => Ok(PropertyStatus::Review),
            "Available" => Ok(PropertyStatus::Available),
            "Occupied" => Ok(PropertyStatus::Occupied),
            "Under Maintenance" => Ok(PropertyStatus::UnderMaintenance),
            "Not Available" => Ok(PropertyStatus::NotAvailable),
            other => Err(format!("Unknown property status: {}", other)),
        }
    }
}

/// Admin decision on a property in review.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ReviewDecision {
    Approve,
    Reject,
}

/// Property record (the subset the review workflow touches).
#[derive(Debug, Clone)]
pub struct Property {
    pub id: Uuid,
    pub name: String,
    pub address: String,
    pub status: PropertyStatus,
    pub updated_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PropertyResponse {
    pub id: Uuid,
    pub name: String,
    pub address: String,
    pub status: PropertyStatus,
    pub updated_at: DateTime<Utc>,
}

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for Property {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        use sqlx::Row;
        let status_text: String = row.try_get("status")?;
        let status = status_text
            .parse::<PropertyStatus>()
            .map_err(|e| sqlx::Error::ColumnDecode {
                index: "status".to_string(),
                source: e.into(),
            })?;
        let created_at: DateTime<Utc> = row.try_get("created_at")?;
        let updated_at: DateTime<Utc> = row.try_get("updated_at")?;
        Ok(Property {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            address: row.try_get("address")?,
            status,
            updated_by: row.try_get("updated_by")?,
            created_at,
            updated_at,
        })
    }
}

impl From<Property> for PropertyResponse {
    fn from(property: Property) -> Self {
        PropertyResponse {
            id: property.id,
            name: property.name,
            address: property.address,
            status: property.status,
            updated_at: property.updated_at,
        }
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

/// Extraction outcome recorded by the external pipeline.
///
/// Rows are created and transitioned outside this service; we only read,
/// pre-check, delete, and react to them.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum ExtractionStatus {
    Pending,
    Passed,
    Failed,
}

impl ExtractionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionStatus::Pending => "PENDING",
            ExtractionStatus::Passed => "PASSED",
            ExtractionStatus::Failed => "FAILED",
        }
    }
}

impl Display for ExtractionStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ExtractionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "PENDING" => Ok(ExtractionStatus::Pending),
            "PASSED" => Ok(ExtractionStatus::Passed),
            "FAILED" => Ok(ExtractionStatus::Failed),
            other => Err(format!("Unknown extraction status: {}", other)),
        }
    }
}

/// One uploaded file's extraction record.
#[derive(Debug, Clone)]
pub struct RegistryEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub file_name: String,
    pub extraction_status: ExtractionStatus,
    pub confidence_pct: Option<i32>,
    pub remarks: Option<String>,
    pub document_type: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for RegistryEntry {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        use sqlx::Row;
        let status_text: String = row.try_get("extraction_status")?;
        let extraction_status = status_text.parse::<ExtractionStatus>().map_err(|e| {
            sqlx::Error::ColumnDecode {
                index: "extraction_status".to_string(),
                source: e.into(),
            }
        })?;
        let created_at: DateTime<Utc> = row.try_get("created_at")?;
        let updated_at: DateTime<Utc> = row.try_get("updated_at")?;
        Ok(RegistryEntry {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            file_name: row.try_get("file_name")?,
            extraction_status,
            confidence_pct: row.try_get("confidence_pct")?,
            remarks: row.try_get("remarks")?,
            document_type: row.try_get("document_type")?,
            created_at,
            updated_at,
        })
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RegistryEntryResponse {
    pub id: Uuid,
    pub file_name: String,
    pub extraction_status: ExtractionStatus,
    pub confidence_pct: Option<i32>,
    pub remarks: Option<String>,
    pub document_type: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<RegistryEntry> for RegistryEntryResponse {
    fn from(entry: RegistryEntry) -> Self {
        RegistryEntryResponse {
            id: entry.id,
            file_name: entry.file_name,
            extraction_status: entry.extraction_status,
            confidence_pct: entry.confidence_pct,
            remarks: entry.remarks,
            document_type: entry.document_type,
            created_at: entry.created_at,
        }
    }
}

/// Registry INSERT event carried over the notification channel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RegistryEvent {
    pub user_id: Uuid,
    pub file_name: String,
    pub extraction_status: ExtractionStatus,
    #[serde(default)]
    pub document_type: Option<String>,
}

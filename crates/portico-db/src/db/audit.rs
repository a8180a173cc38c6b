use portico_core::models::{AuditRecord, NewAuditRecord};
use portico_core::AppError;
use sqlx::PgPool;
use uuid::Uuid;

/// Repository for the append-only audit trail.
///
/// Inserts only; application code never updates or deletes audit rows.
#[derive(Clone)]
pub struct AuditLogRepository {
    pool: PgPool,
}

impl AuditLogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, record: &NewAuditRecord) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO audit_logs (
                id, user_id, username, role, action, table_name,
                record_id, description, ip_address, user_agent
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(record.user_id)
        .bind(&record.username)
        .bind(record.role.to_string())
        .bind(record.action.as_str())
        .bind(&record.table_name)
        .bind(&record.record_id)
        .bind(&record.description)
        .bind(&record.ip_address)
        .bind(&record.user_agent)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// List audit rows for the viewer, newest first, with optional actor and
    /// table filters.
    pub async fn list(
        &self,
        user_id: Option<Uuid>,
        table_name: Option<String>,
        action: Option<String>,
        page: i64,
        per_page: i64,
    ) -> Result<Vec<AuditRecord>, AppError> {
        let offset = (page.max(1) - 1) * per_page;
        let rows = sqlx::query_as::<_, AuditRecord>(
            r#"
            SELECT id, user_id, username, role, action, table_name,
                   record_id, description, ip_address, user_agent, created_at
            FROM audit_logs
            WHERE ($1::uuid IS NULL OR user_id = $1)
              AND ($2::text IS NULL OR table_name = $2)
              AND ($3::text IS NULL OR action = $3)
            ORDER BY created_at DESC
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(user_id)
        .bind(table_name)
        .bind(action)
        .bind(per_page)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<AuditRecord>, AppError> {
        let row = sqlx::query_as::<_, AuditRecord>(
            r#"
            SELECT id, user_id, username, role, action, table_name,
                   record_id, description, ip_address, user_agent, created_at
            FROM audit_logs
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }
}

use portico_core::models::{Property, PropertyStatus};
use portico_core::AppError;
use sqlx::PgPool;
use uuid::Uuid;

/// Repository for property records.
///
/// Properties are created upstream in `Review` status; this repository
/// implements the review-queue reads, the approve/reject transitions, and
/// the operational status update.
#[derive(Clone)]
pub struct PropertyRepository {
    pool: PgPool,
}

impl PropertyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Property>, AppError> {
        let row = sqlx::query_as::<_, Property>(
            r#"
            SELECT id, name, address, status, updated_by, created_at, updated_at
            FROM properties
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// List properties waiting for review, newest first. Review properties
    /// are excluded from all normal listing views and only reachable here.
    pub async fn list_review(&self, page: i64, per_page: i64) -> Result<Vec<Property>, AppError> {
        let offset = (page.max(1) - 1) * per_page;
        let rows = sqlx::query_as::<_, Property>(
            r#"
            SELECT id, name, address, status, updated_by, created_at, updated_at
            FROM properties
            WHERE status = 'Review'
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(per_page)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Approve: `Review` -> `Available`. The WHERE clause keeps the
    /// transition one-way; an already-approved or missing property affects
    /// zero rows.
    pub async fn approve(&self, id: Uuid, updated_by: Uuid) -> Result<u64, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE properties
            SET status = 'Available', updated_by = $2, updated_at = NOW()
            WHERE id = $1 AND status = 'Review'
            "#,
        )
        .bind(id)
        .bind(updated_by)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Reject: hard-delete the row. There is no "Rejected" status.
    pub async fn delete_in_review(&self, id: Uuid) -> Result<u64, AppError> {
        let result = sqlx::query(
            r#"
            DELETE FROM properties
            WHERE id = $1 AND status = 'Review'
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Cycle an already-approved property among the operational statuses.
    /// Properties still in `Review` are not touched by this operation.
    pub async fn update_status(
        &self,
        id: Uuid,
        status: PropertyStatus,
        updated_by: Uuid,
    ) -> Result<u64, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE properties
            SET status = $2, updated_by = $3, updated_at = NOW()
            WHERE id = $1 AND status <> 'Review'
            "#,
        )
        .bind(id)
        .bind(status.as_str())
        .bind(updated_by)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}

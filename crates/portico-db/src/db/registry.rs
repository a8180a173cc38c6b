use portico_core::models::{ExtractionStatus, RegistryEntry};
use portico_core::AppError;
use sqlx::{PgPool, Row};
use uuid::Uuid;

/// Repository for the document registry written by the extraction pipeline.
///
/// This service only reads, pre-checks, and deletes registry rows; their
/// creation and status transitions happen outside this codebase.
#[derive(Clone)]
pub struct RegistryRepository {
    pool: PgPool,
}

impl RegistryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Look up a FAILED row for the given original filename.
    ///
    /// The check is global (not scoped to any user): a stale FAILED row for a
    /// filename blocks re-upload for everyone until it is deleted.
    pub async fn find_failed_by_filename(
        &self,
        file_name: &str,
    ) -> Result<Option<RegistryEntry>, AppError> {
        let row = sqlx::query_as::<_, RegistryEntry>(
            r#"
            SELECT id, user_id, file_name, extraction_status, confidence_pct,
                   remarks, document_type, created_at, updated_at
            FROM document_registry
            WHERE file_name = $1 AND extraction_status = 'FAILED'
            LIMIT 1
            "#,
        )
        .bind(file_name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// List a user's registry entries, optionally filtered by status, newest
    /// first.
    pub async fn list(
        &self,
        user_id: Uuid,
        status: Option<ExtractionStatus>,
        page: i64,
        per_page: i64,
    ) -> Result<Vec<RegistryEntry>, AppError> {
        let offset = (page.max(1) - 1) * per_page;
        let rows = sqlx::query_as::<_, RegistryEntry>(
            r#"
            SELECT id, user_id, file_name, extraction_status, confidence_pct,
                   remarks, document_type, created_at, updated_at
            FROM document_registry
            WHERE user_id = $1
              AND ($2::text IS NULL OR extraction_status = $2)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(user_id)
        .bind(status.map(|s| s.as_str()))
        .bind(per_page)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Count a user's registry entries, optionally filtered by status.
    pub async fn count(
        &self,
        user_id: Uuid,
        status: Option<ExtractionStatus>,
    ) -> Result<i64, AppError> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS total
            FROM document_registry
            WHERE user_id = $1
              AND ($2::text IS NULL OR extraction_status = $2)
            "#,
        )
        .bind(user_id)
        .bind(status.map(|s| s.as_str()))
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get::<i64, _>("total"))
    }

    pub async fn get(&self, id: Uuid, user_id: Uuid) -> Result<Option<RegistryEntry>, AppError> {
        let row = sqlx::query_as::<_, RegistryEntry>(
            r#"
            SELECT id, user_id, file_name, extraction_status, confidence_pct,
                   remarks, document_type, created_at, updated_at
            FROM document_registry
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// Delete a registry row (error-queue cleanup). Scoped to the owner; the
    /// returned count is 0 when the row does not exist or belongs to someone
    /// else.
    pub async fn delete(&self, id: Uuid, user_id: Uuid) -> Result<u64, AppError> {
        let result = sqlx::query(
            r#"
            DELETE FROM document_registry
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}

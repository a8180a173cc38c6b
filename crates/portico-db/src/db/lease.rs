use portico_core::AppError;
use sqlx::{PgPool, Row};
use uuid::Uuid;

/// Repository for the lease checks the property workflow depends on.
#[derive(Clone)]
pub struct LeaseRepository {
    pool: PgPool,
}

impl LeaseRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Whether any lease with status `active` references the property.
    /// Application-level pre-query: see the schema notes on the
    /// check-then-act window.
    pub async fn has_active_lease(&self, property_id: Uuid) -> Result<bool, AppError> {
        let row = sqlx::query(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM leases
                WHERE property_id = $1 AND status = 'active'
            ) AS has_active
            "#,
        )
        .bind(property_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get::<bool, _>("has_active"))
    }
}

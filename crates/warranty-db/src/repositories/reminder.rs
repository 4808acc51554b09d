//! PostgreSQL implementation of ReminderRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use warranty_core::entities::ReminderThreshold;
use warranty_core::traits::{ReminderRepository, RepoResult};
use warranty_core::value_objects::CodeValue;

use super::error::map_db_error;

/// PostgreSQL implementation of ReminderRepository
#[derive(Clone)]
pub struct PgReminderRepository {
    pool: PgPool,
}

impl PgReminderRepository {
    /// Create a new PgReminderRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReminderRepository for PgReminderRepository {
    #[instrument(skip(self))]
    async fn try_claim(
        &self,
        code: &CodeValue,
        threshold: ReminderThreshold,
        now: DateTime<Utc>,
    ) -> RepoResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO reminder_deliveries (code, threshold, sent_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (code, threshold) DO NOTHING
            "#,
        )
        .bind(code.as_str())
        .bind(threshold.as_str())
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.rows_affected() == 1)
    }

    #[instrument(skip(self))]
    async fn release(&self, code: &CodeValue, threshold: ReminderThreshold) -> RepoResult<()> {
        sqlx::query(
            r#"
            DELETE FROM reminder_deliveries
            WHERE code = $1 AND threshold = $2
            "#,
        )
        .bind(code.as_str())
        .bind(threshold.as_str())
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn clear_for_code(&self, code: &CodeValue) -> RepoResult<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM reminder_deliveries
            WHERE code = $1
            "#,
        )
        .bind(code.as_str())
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.rows_affected())
    }
}

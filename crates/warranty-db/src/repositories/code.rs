//! PostgreSQL implementation of CodeRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use warranty_core::entities::{ActivationOutcome, Code, LinkOutcome};
use warranty_core::error::DomainError;
use warranty_core::traits::{CodeRepository, RepoResult};
use warranty_core::value_objects::{CodeValue, Snowflake};

use crate::mappers::codes_from_models;
use crate::models::{ActivatedCodeModel, CodeModel};

use super::error::{code_not_found, map_db_error, map_unique_violation};

/// PostgreSQL implementation of CodeRepository
#[derive(Clone)]
pub struct PgCodeRepository {
    pool: PgPool,
}

impl PgCodeRepository {
    /// Create a new PgCodeRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CodeRepository for PgCodeRepository {
    #[instrument(skip(self, code), fields(code = %code.value))]
    async fn create(&self, code: &Code) -> RepoResult<()> {
        sqlx::query(
            r#"
            INSERT INTO codes (code, product_info, user_id, is_used, linked_at,
                               warranty_activated, warranty_activated_by,
                               warranty_activated_at, warranty_expires_at, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(code.value.as_str())
        .bind(&code.product_info)
        .bind(code.user_id.map(Snowflake::into_inner))
        .bind(code.is_used)
        .bind(code.linked_at)
        .bind(code.warranty_activated)
        .bind(code.warranty_activated_by.map(Snowflake::into_inner))
        .bind(code.warranty_activated_at)
        .bind(code.warranty_expires_at)
        .bind(code.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            map_unique_violation(e, || DomainError::CodeAlreadyExists(code.value.to_string()))
        })?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn find_by_value(&self, value: &CodeValue) -> RepoResult<Option<Code>> {
        let result = sqlx::query_as::<_, CodeModel>(
            r#"
            SELECT code, product_info, user_id, is_used, linked_at, warranty_activated,
                   warranty_activated_by, warranty_activated_at, warranty_expires_at, created_at
            FROM codes
            WHERE code = $1
            "#,
        )
        .bind(value.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        result.map(Code::try_from).transpose()
    }

    #[instrument(skip(self))]
    async fn link(
        &self,
        value: &CodeValue,
        user_id: Snowflake,
        now: DateTime<Utc>,
    ) -> RepoResult<LinkOutcome> {
        // Only an unlinked row matches, so concurrent linkers race on the row lock
        // and exactly one sees it returned
        let linked = sqlx::query_as::<_, CodeModel>(
            r#"
            UPDATE codes
            SET user_id = $2, is_used = TRUE, linked_at = $3
            WHERE code = $1 AND user_id IS NULL
            RETURNING code, product_info, user_id, is_used, linked_at, warranty_activated,
                      warranty_activated_by, warranty_activated_at, warranty_expires_at, created_at
            "#,
        )
        .bind(value.as_str())
        .bind(user_id.into_inner())
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        if let Some(model) = linked {
            return Ok(LinkOutcome {
                code: Code::try_from(model)?,
                newly_linked: true,
            });
        }

        match self.find_by_value(value).await? {
            None => Err(code_not_found(value)),
            Some(code) if code.is_linked_to(user_id) => Ok(LinkOutcome {
                code,
                newly_linked: false,
            }),
            Some(_) => Err(DomainError::CodeAlreadyLinked(value.to_string())),
        }
    }

    #[instrument(skip(self))]
    async fn activate(
        &self,
        value: &CodeValue,
        admin_id: Snowflake,
        user_id: Option<Snowflake>,
        now: DateTime<Utc>,
    ) -> RepoResult<ActivationOutcome> {
        let activated = sqlx::query_as::<_, ActivatedCodeModel>(
            r#"
            WITH prev AS (
                SELECT code, user_id FROM codes WHERE code = $1 FOR UPDATE
            )
            UPDATE codes c
            SET user_id               = COALESCE(c.user_id, $3::BIGINT),
                is_used               = COALESCE(c.user_id, $3::BIGINT) IS NOT NULL,
                linked_at             = CASE
                                            WHEN c.user_id IS NULL AND $3::BIGINT IS NOT NULL THEN $4
                                            ELSE c.linked_at
                                        END,
                warranty_activated    = TRUE,
                warranty_activated_by = $2,
                warranty_activated_at = $4,
                warranty_expires_at   = $5
            FROM prev
            WHERE c.code = prev.code
              AND c.warranty_activated = FALSE
              AND ($3::BIGINT IS NULL OR c.user_id IS NULL OR c.user_id = $3::BIGINT)
            RETURNING c.code, c.product_info, c.user_id, c.is_used, c.linked_at,
                      c.warranty_activated, c.warranty_activated_by, c.warranty_activated_at,
                      c.warranty_expires_at, c.created_at,
                      (prev.user_id IS NULL AND c.user_id IS NOT NULL) AS newly_linked
            "#,
        )
        .bind(value.as_str())
        .bind(admin_id.into_inner())
        .bind(user_id.map(Snowflake::into_inner))
        .bind(now)
        .bind(Code::warranty_expiry_from(now))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        if let Some(model) = activated {
            return ActivationOutcome::try_from(model);
        }

        match self.find_by_value(value).await? {
            None => Err(code_not_found(value)),
            Some(code) if code.warranty_activated => {
                Err(DomainError::CodeAlreadyActivated(value.to_string()))
            }
            Some(_) => Err(DomainError::CodeAlreadyLinked(value.to_string())),
        }
    }

    #[instrument(skip(self))]
    async fn extend(&self, value: &CodeValue, days: i64) -> RepoResult<Code> {
        let days = i32::try_from(days)
            .map_err(|_| DomainError::ValidationError(format!("{days} days is out of range")))?;

        let extended = sqlx::query_as::<_, CodeModel>(
            r#"
            UPDATE codes
            SET warranty_expires_at = warranty_expires_at + make_interval(days => $2)
            WHERE code = $1 AND warranty_activated = TRUE
            RETURNING code, product_info, user_id, is_used, linked_at, warranty_activated,
                      warranty_activated_by, warranty_activated_at, warranty_expires_at, created_at
            "#,
        )
        .bind(value.as_str())
        .bind(days)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        match extended {
            Some(model) => Code::try_from(model),
            None => match self.find_by_value(value).await? {
                None => Err(code_not_found(value)),
                Some(_) => Err(DomainError::WarrantyNotActivated(value.to_string())),
            },
        }
    }

    #[instrument(skip(self))]
    async fn find_pending(&self, created_since: Option<DateTime<Utc>>) -> RepoResult<Vec<Code>> {
        let results = sqlx::query_as::<_, CodeModel>(
            r#"
            SELECT code, product_info, user_id, is_used, linked_at, warranty_activated,
                   warranty_activated_by, warranty_activated_at, warranty_expires_at, created_at
            FROM codes
            WHERE user_id IS NOT NULL
              AND warranty_activated = FALSE
              AND ($1::TIMESTAMPTZ IS NULL OR created_at >= $1)
            ORDER BY created_at DESC
            "#,
        )
        .bind(created_since)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        codes_from_models(results)
    }

    #[instrument(skip(self))]
    async fn find_expiring(
        &self,
        after: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> RepoResult<Vec<Code>> {
        let results = sqlx::query_as::<_, CodeModel>(
            r#"
            SELECT code, product_info, user_id, is_used, linked_at, warranty_activated,
                   warranty_activated_by, warranty_activated_at, warranty_expires_at, created_at
            FROM codes
            WHERE warranty_activated = TRUE
              AND warranty_expires_at > $1
              AND warranty_expires_at <= $2
            ORDER BY warranty_expires_at ASC
            "#,
        )
        .bind(after)
        .bind(until)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        codes_from_models(results)
    }

    #[instrument(skip(self))]
    async fn find_by_user(&self, user_id: Snowflake) -> RepoResult<Vec<Code>> {
        let results = sqlx::query_as::<_, CodeModel>(
            r#"
            SELECT code, product_info, user_id, is_used, linked_at, warranty_activated,
                   warranty_activated_by, warranty_activated_at, warranty_expires_at, created_at
            FROM codes
            WHERE user_id = $1
            ORDER BY linked_at DESC
            "#,
        )
        .bind(user_id.into_inner())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        codes_from_models(results)
    }
}

//! PostgreSQL implementation of AuditLogRepository

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use warranty_core::entities::{AuditEntry, NewAuditEntry};
use warranty_core::traits::{AuditLogRepository, RepoResult};
use warranty_core::value_objects::{CodeValue, Snowflake};

use crate::models::AuditLogModel;

use super::error::map_db_error;

/// PostgreSQL implementation of AuditLogRepository
#[derive(Clone)]
pub struct PgAuditLogRepository {
    pool: PgPool,
}

impl PgAuditLogRepository {
    /// Create a new PgAuditLogRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditLogRepository for PgAuditLogRepository {
    #[instrument(skip(self, entry), fields(action = %entry.action))]
    async fn append(&self, entry: &NewAuditEntry) -> RepoResult<AuditEntry> {
        let model = sqlx::query_as::<_, AuditLogModel>(
            r#"
            INSERT INTO audit_log (user_id, actor_kind, actor_id, code, action, detail)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, user_id, actor_kind, actor_id, code, action, detail, created_at
            "#,
        )
        .bind(entry.user_id.map(Snowflake::into_inner))
        .bind(entry.actor.kind())
        .bind(entry.actor.id().map(Snowflake::into_inner))
        .bind(&entry.code)
        .bind(entry.action.as_str())
        .bind(&entry.detail)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;

        AuditEntry::try_from(model)
    }

    #[instrument(skip(self))]
    async fn find_by_user(&self, user_id: Snowflake, limit: i64) -> RepoResult<Vec<AuditEntry>> {
        let results = sqlx::query_as::<_, AuditLogModel>(
            r#"
            SELECT id, user_id, actor_kind, actor_id, code, action, detail, created_at
            FROM audit_log
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(user_id.into_inner())
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        results.into_iter().map(AuditEntry::try_from).collect()
    }

    #[instrument(skip(self))]
    async fn find_by_code(&self, code: &CodeValue, limit: i64) -> RepoResult<Vec<AuditEntry>> {
        let results = sqlx::query_as::<_, AuditLogModel>(
            r#"
            SELECT id, user_id, actor_kind, actor_id, code, action, detail, created_at
            FROM audit_log
            WHERE code = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(code.as_str())
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        results.into_iter().map(AuditEntry::try_from).collect()
    }
}

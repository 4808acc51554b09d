//! PostgreSQL implementation of EntitlementRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use warranty_core::entities::EntitlementSnapshot;
use warranty_core::traits::{EntitlementRepository, RepoResult};
use warranty_core::value_objects::Snowflake;

use crate::models::EntitlementSnapshotModel;

use super::error::map_db_error;

/// PostgreSQL implementation of EntitlementRepository
#[derive(Clone)]
pub struct PgEntitlementRepository {
    pool: PgPool,
}

impl PgEntitlementRepository {
    /// Create a new PgEntitlementRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EntitlementRepository for PgEntitlementRepository {
    #[instrument(skip(self))]
    async fn find(&self, user_id: Snowflake) -> RepoResult<Option<EntitlementSnapshot>> {
        let result = sqlx::query_as::<_, EntitlementSnapshotModel>(
            r#"
            SELECT user_id, has_premium, has_warranty, code_linked, warranty_expires_at, last_updated
            FROM entitlement_snapshots
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(EntitlementSnapshot::from))
    }

    #[instrument(skip(self))]
    async fn sync_from_codes(
        &self,
        user_id: Snowflake,
        now: DateTime<Utc>,
    ) -> RepoResult<Option<EntitlementSnapshot>> {
        // Single statement: the aggregate and the upsert see the same code rows
        let result = sqlx::query_as::<_, EntitlementSnapshotModel>(
            r#"
            INSERT INTO entitlement_snapshots
                (user_id, has_premium, has_warranty, code_linked, warranty_expires_at, last_updated)
            SELECT $1,
                   TRUE,
                   COALESCE(MAX(warranty_expires_at) FILTER (WHERE warranty_activated) > $2, FALSE),
                   TRUE,
                   MAX(warranty_expires_at) FILTER (WHERE warranty_activated),
                   $2
            FROM codes
            WHERE user_id = $1
            HAVING COUNT(*) > 0
            ON CONFLICT (user_id) DO UPDATE
            SET has_premium         = EXCLUDED.has_premium,
                has_warranty        = EXCLUDED.has_warranty,
                code_linked         = TRUE,
                warranty_expires_at = EXCLUDED.warranty_expires_at,
                last_updated        = EXCLUDED.last_updated
            RETURNING user_id, has_premium, has_warranty, code_linked, warranty_expires_at, last_updated
            "#,
        )
        .bind(user_id.into_inner())
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(EntitlementSnapshot::from))
    }

    #[instrument(skip(self))]
    async fn record_departure(
        &self,
        user_id: Snowflake,
        has_premium: bool,
        has_warranty: bool,
        now: DateTime<Utc>,
    ) -> RepoResult<EntitlementSnapshot> {
        let result = sqlx::query_as::<_, EntitlementSnapshotModel>(
            r#"
            INSERT INTO entitlement_snapshots
                (user_id, has_premium, has_warranty, code_linked, warranty_expires_at, last_updated)
            VALUES (
                $1, $2, $3,
                EXISTS (SELECT 1 FROM codes WHERE user_id = $1),
                (SELECT MAX(warranty_expires_at) FROM codes
                 WHERE user_id = $1 AND warranty_activated = TRUE),
                $4
            )
            ON CONFLICT (user_id) DO UPDATE
            SET has_premium         = EXCLUDED.has_premium,
                has_warranty        = EXCLUDED.has_warranty,
                code_linked         = entitlement_snapshots.code_linked OR EXCLUDED.code_linked,
                warranty_expires_at = COALESCE(entitlement_snapshots.warranty_expires_at,
                                               EXCLUDED.warranty_expires_at),
                last_updated        = EXCLUDED.last_updated
            RETURNING user_id, has_premium, has_warranty, code_linked, warranty_expires_at, last_updated
            "#,
        )
        .bind(user_id.into_inner())
        .bind(has_premium)
        .bind(has_warranty)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(EntitlementSnapshot::from(result))
    }

    #[instrument(skip(self))]
    async fn clear_warranty(&self, user_id: Snowflake, now: DateTime<Utc>) -> RepoResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE entitlement_snapshots
            SET has_warranty = FALSE, last_updated = $2
            WHERE user_id = $1
              AND has_warranty = TRUE
              AND (warranty_expires_at IS NULL OR warranty_expires_at <= $2)
            "#,
        )
        .bind(user_id.into_inner())
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.rows_affected() == 1)
    }

    #[instrument(skip(self))]
    async fn find_expired(&self, now: DateTime<Utc>) -> RepoResult<Vec<EntitlementSnapshot>> {
        let results = sqlx::query_as::<_, EntitlementSnapshotModel>(
            r#"
            SELECT user_id, has_premium, has_warranty, code_linked, warranty_expires_at, last_updated
            FROM entitlement_snapshots
            WHERE has_warranty = TRUE
              AND (warranty_expires_at IS NULL OR warranty_expires_at <= $1)
            ORDER BY warranty_expires_at ASC NULLS FIRST
            "#,
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(results.into_iter().map(EntitlementSnapshot::from).collect())
    }

    #[instrument(skip(self))]
    async fn find_active_warranties(
        &self,
        now: DateTime<Utc>,
    ) -> RepoResult<Vec<EntitlementSnapshot>> {
        let results = sqlx::query_as::<_, EntitlementSnapshotModel>(
            r#"
            SELECT user_id, has_premium, has_warranty, code_linked, warranty_expires_at, last_updated
            FROM entitlement_snapshots
            WHERE has_warranty = TRUE AND warranty_expires_at > $1
            ORDER BY user_id
            "#,
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(results.into_iter().map(EntitlementSnapshot::from).collect())
    }
}

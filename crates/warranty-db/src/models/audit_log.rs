//! Audit log database model

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for audit_log table
#[derive(Debug, Clone, FromRow)]
pub struct AuditLogModel {
    pub id: i64,
    pub user_id: Option<i64>,
    /// One of `user`, `admin`, `system`
    pub actor_kind: String,
    pub actor_id: Option<i64>,
    pub code: Option<String>,
    /// Action kind stored as its SCREAMING_SNAKE name
    pub action: String,
    pub detail: String,
    pub created_at: DateTime<Utc>,
}

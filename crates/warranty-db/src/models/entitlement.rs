//! Entitlement snapshot database model

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for entitlement_snapshots table
#[derive(Debug, Clone, FromRow)]
pub struct EntitlementSnapshotModel {
    pub user_id: i64,
    pub has_premium: bool,
    pub has_warranty: bool,
    pub code_linked: bool,
    pub warranty_expires_at: Option<DateTime<Utc>>,
    pub last_updated: DateTime<Utc>,
}

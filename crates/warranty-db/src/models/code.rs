//! Code database model

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for codes table
#[derive(Debug, Clone, FromRow)]
pub struct CodeModel {
    pub code: String,
    pub product_info: Option<String>,
    pub user_id: Option<i64>,
    pub is_used: bool,
    pub linked_at: Option<DateTime<Utc>>,
    pub warranty_activated: bool,
    pub warranty_activated_by: Option<i64>,
    pub warranty_activated_at: Option<DateTime<Utc>>,
    pub warranty_expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Row returned by the activation statement
#[derive(Debug, Clone, FromRow)]
pub struct ActivatedCodeModel {
    #[sqlx(flatten)]
    pub code: CodeModel,
    /// The statement bound the supplied user to a previously unlinked code
    pub newly_linked: bool,
}

//! Repository traits (ports) - define the interface for durable state
//!
//! Every mutation is a single conditional statement against the store. The
//! implementation reports through its return value whether the condition held,
//! so callers never read-modify-write in memory.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::entities::{
    ActivationOutcome, AuditEntry, Code, EntitlementSnapshot, LinkOutcome, NewAuditEntry,
    ReminderThreshold,
};
use crate::error::DomainError;
use crate::value_objects::{CodeValue, Snowflake};

/// Result type for repository operations
pub type RepoResult<T> = Result<T, DomainError>;

// ============================================================================
// Code Repository
// ============================================================================

#[async_trait]
pub trait CodeRepository: Send + Sync {
    /// Insert a new code; `CodeAlreadyExists` on duplicate value
    async fn create(&self, code: &Code) -> RepoResult<()>;

    /// Find a code by its normalized value
    async fn find_by_value(&self, value: &CodeValue) -> RepoResult<Option<Code>>;

    /// Bind an unlinked code to `user_id`
    ///
    /// Idempotent when already bound to the same user (`newly_linked = false`).
    /// Fails with `CodeNotFound` or `CodeAlreadyLinked`. Warranty fields are
    /// left untouched.
    async fn link(
        &self,
        value: &CodeValue,
        user_id: Snowflake,
        now: DateTime<Utc>,
    ) -> RepoResult<LinkOutcome>;

    /// Activate the warranty: expiry = `now` + warranty term
    ///
    /// When `user_id` is supplied and the code is unlinked, the link happens in
    /// the same statement. Fails with `CodeNotFound`, `CodeAlreadyActivated`,
    /// or `CodeAlreadyLinked` (supplied user differs from the bound one).
    async fn activate(
        &self,
        value: &CodeValue,
        admin_id: Snowflake,
        user_id: Option<Snowflake>,
        now: DateTime<Utc>,
    ) -> RepoResult<ActivationOutcome>;

    /// Add `days` to the current expiry; `WarrantyNotActivated` if inactive
    async fn extend(&self, value: &CodeValue, days: i64) -> RepoResult<Code>;

    /// Linked codes whose warranty is not yet activated, newest first
    async fn find_pending(&self, created_since: Option<DateTime<Utc>>) -> RepoResult<Vec<Code>>;

    /// Activated codes with expiry in `(after, until]`, soonest first
    async fn find_expiring(
        &self,
        after: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> RepoResult<Vec<Code>>;

    /// All codes bound to a user
    async fn find_by_user(&self, user_id: Snowflake) -> RepoResult<Vec<Code>>;
}

// ============================================================================
// Entitlement Repository
// ============================================================================

#[async_trait]
pub trait EntitlementRepository: Send + Sync {
    /// Find the snapshot for a user
    async fn find(&self, user_id: Snowflake) -> RepoResult<Option<EntitlementSnapshot>>;

    /// Re-derive the snapshot from the user's linked codes
    ///
    /// Premium follows from holding any code; the warranty expiry is the latest
    /// expiry among activated codes. Returns `None` when the user holds no code.
    async fn sync_from_codes(
        &self,
        user_id: Snowflake,
        now: DateTime<Utc>,
    ) -> RepoResult<Option<EntitlementSnapshot>>;

    /// Record the roles observed on the platform when the user left
    ///
    /// Creates the snapshot if missing; a known expiry is preserved.
    async fn record_departure(
        &self,
        user_id: Snowflake,
        has_premium: bool,
        has_warranty: bool,
        now: DateTime<Utc>,
    ) -> RepoResult<EntitlementSnapshot>;

    /// Flip `has_warranty` off if it is set and the expiry has passed
    ///
    /// Returns whether this call performed the flip.
    async fn clear_warranty(&self, user_id: Snowflake, now: DateTime<Utc>) -> RepoResult<bool>;

    /// Snapshots still flagged with a warranty whose expiry has passed
    async fn find_expired(&self, now: DateTime<Utc>) -> RepoResult<Vec<EntitlementSnapshot>>;

    /// Snapshots with a warranty that is still running
    async fn find_active_warranties(
        &self,
        now: DateTime<Utc>,
    ) -> RepoResult<Vec<EntitlementSnapshot>>;
}

// ============================================================================
// Audit Log Repository
// ============================================================================

#[async_trait]
pub trait AuditLogRepository: Send + Sync {
    /// Append an entry; entries are never updated or deleted
    async fn append(&self, entry: &NewAuditEntry) -> RepoResult<AuditEntry>;

    /// Latest entries concerning a user, newest first
    async fn find_by_user(&self, user_id: Snowflake, limit: i64) -> RepoResult<Vec<AuditEntry>>;

    /// Latest entries concerning a code, newest first
    async fn find_by_code(&self, code: &CodeValue, limit: i64) -> RepoResult<Vec<AuditEntry>>;
}

// ============================================================================
// Reminder Repository
// ============================================================================

#[async_trait]
pub trait ReminderRepository: Send + Sync {
    /// Claim the (code, threshold) reminder; false if already delivered
    async fn try_claim(
        &self,
        code: &CodeValue,
        threshold: ReminderThreshold,
        now: DateTime<Utc>,
    ) -> RepoResult<bool>;

    /// Drop a claim whose delivery failed so the next run retries it
    async fn release(&self, code: &CodeValue, threshold: ReminderThreshold) -> RepoResult<()>;

    /// Forget every delivered reminder for a code (its term changed)
    async fn clear_for_code(&self, code: &CodeValue) -> RepoResult<u64>;
}

//! Read-side queries for operators

use chrono::{DateTime, Duration, Utc};
use tracing::{instrument, warn};
use warranty_core::entities::{AuditEntry, Code, EntitlementSnapshot};
use warranty_core::{CodeValue, DomainError, Snowflake};

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};

/// Default window for the near-expiry list
pub const DEFAULT_EXPIRING_DAYS: i64 = 30;
/// Default number of audit entries returned
pub const DEFAULT_AUDIT_LIMIT: i64 = 50;
const MAX_AUDIT_LIMIT: i64 = 500;
const MAX_WINDOW_DAYS: i64 = 3650;

/// Mismatch between the stored snapshot and the platform role set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Discrepancy {
    MissingPremiumRole,
    MissingWarrantyRole,
    UnexpectedPremiumRole,
    UnexpectedWarrantyRole,
    /// Warranty flag still set although the term has ended
    StaleWarrantyFlag,
    /// The user holds codes but has no snapshot
    SnapshotMissing,
}

impl Discrepancy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingPremiumRole => "MISSING_PREMIUM_ROLE",
            Self::MissingWarrantyRole => "MISSING_WARRANTY_ROLE",
            Self::UnexpectedPremiumRole => "UNEXPECTED_PREMIUM_ROLE",
            Self::UnexpectedWarrantyRole => "UNEXPECTED_WARRANTY_ROLE",
            Self::StaleWarrantyFlag => "STALE_WARRANTY_FLAG",
            Self::SnapshotMissing => "SNAPSHOT_MISSING",
        }
    }
}

/// Entitlement status report for one user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitlementStatus {
    pub user_id: Snowflake,
    pub snapshot: Option<EntitlementSnapshot>,
    pub codes: Vec<Code>,
    /// `None` when the platform could not be reached
    pub member: Option<bool>,
    pub discrepancies: Vec<Discrepancy>,
    pub checked_at: DateTime<Utc>,
}

/// Entitlement queries
pub struct EntitlementQueries<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> EntitlementQueries<'a> {
    /// Create a new EntitlementQueries
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Linked codes still waiting for warranty activation
    #[instrument(skip(self))]
    pub async fn pending(&self, days: Option<i64>) -> ServiceResult<Vec<Code>> {
        let since = match days {
            Some(days) => Some(Utc::now() - Duration::days(window_days(days)?)),
            None => None,
        };

        self.ctx
            .store("find pending codes", self.ctx.code_repo().find_pending(since))
            .await
    }

    /// Activated codes expiring within `days` (default 30)
    #[instrument(skip(self))]
    pub async fn expiring(&self, days: Option<i64>) -> ServiceResult<Vec<Code>> {
        let days = window_days(days.unwrap_or(DEFAULT_EXPIRING_DAYS))?;
        let now = Utc::now();

        self.ctx
            .store(
                "find expiring codes",
                self.ctx
                    .code_repo()
                    .find_expiring(now, now + Duration::days(days)),
            )
            .await
    }

    /// Full status report, including drift against the platform
    #[instrument(skip(self))]
    pub async fn status(&self, user_id: Snowflake) -> ServiceResult<EntitlementStatus> {
        let now = Utc::now();
        let snapshot = self
            .ctx
            .store("find snapshot", self.ctx.entitlement_repo().find(user_id))
            .await?;
        let codes = self
            .ctx
            .store("find user codes", self.ctx.code_repo().find_by_user(user_id))
            .await?;

        let held = match self.ctx.platform().member_roles(user_id).await {
            Ok(held) => Some(held),
            Err(e) => {
                warn!(error = %e, user_id = %user_id, "Member lookup failed during status check");
                None
            }
        };

        let discrepancies = self.discrepancies(
            snapshot.as_ref(),
            !codes.is_empty(),
            held.as_ref().and_then(Option::as_deref),
            now,
        );

        Ok(EntitlementStatus {
            user_id,
            snapshot,
            codes,
            member: held.map(|h| h.is_some()),
            discrepancies,
            checked_at: now,
        })
    }

    /// Audit history for a user, newest first
    #[instrument(skip(self))]
    pub async fn audit_for_user(
        &self,
        user_id: Snowflake,
        limit: Option<i64>,
    ) -> ServiceResult<Vec<AuditEntry>> {
        let limit = audit_limit(limit);
        self.ctx
            .store(
                "find audit by user",
                self.ctx.audit_repo().find_by_user(user_id, limit),
            )
            .await
    }

    /// Audit history for a code, newest first
    #[instrument(skip(self))]
    pub async fn audit_for_code(
        &self,
        raw: &str,
        limit: Option<i64>,
    ) -> ServiceResult<Vec<AuditEntry>> {
        let value = CodeValue::parse(raw).map_err(DomainError::from)?;
        let limit = audit_limit(limit);
        self.ctx
            .store(
                "find audit by code",
                self.ctx.audit_repo().find_by_code(&value, limit),
            )
            .await
    }

    fn discrepancies(
        &self,
        snapshot: Option<&EntitlementSnapshot>,
        has_codes: bool,
        held: Option<&[Snowflake]>,
        now: DateTime<Utc>,
    ) -> Vec<Discrepancy> {
        let mut found = Vec::new();

        let entitled = snapshot.map(|s| s.entitled_roles(now)).unwrap_or_default();
        match snapshot {
            Some(s) if s.is_warranty_stale(now) => found.push(Discrepancy::StaleWarrantyFlag),
            None if has_codes => found.push(Discrepancy::SnapshotMissing),
            _ => {}
        }

        let Some(held) = held else {
            return found;
        };
        let roles = self.ctx.roles();

        if let Some(role_id) = roles.premium {
            match (entitled.premium, held.contains(&role_id)) {
                (true, false) => found.push(Discrepancy::MissingPremiumRole),
                (false, true) => found.push(Discrepancy::UnexpectedPremiumRole),
                _ => {}
            }
        }
        if let Some(role_id) = roles.warranty {
            match (entitled.warranty, held.contains(&role_id)) {
                (true, false) => found.push(Discrepancy::MissingWarrantyRole),
                (false, true) => found.push(Discrepancy::UnexpectedWarrantyRole),
                _ => {}
            }
        }

        found
    }
}

fn window_days(days: i64) -> ServiceResult<i64> {
    if (1..=MAX_WINDOW_DAYS).contains(&days) {
        Ok(days)
    } else {
        Err(ServiceError::validation(format!(
            "days must be between 1 and {MAX_WINDOW_DAYS}"
        )))
    }
}

fn audit_limit(limit: Option<i64>) -> i64 {
    limit
        .unwrap_or(DEFAULT_AUDIT_LIMIT)
        .clamp(1, MAX_AUDIT_LIMIT)
}

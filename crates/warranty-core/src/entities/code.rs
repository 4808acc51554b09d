//! Code entity - a redeemable code and its warranty state

use chrono::{DateTime, Duration, Utc};

use crate::value_objects::{CodeValue, Snowflake};

/// Fixed warranty term granted at activation
pub const WARRANTY_TERM_DAYS: i64 = 365;

/// Code entity
///
/// `warranty_activated` only moves from false to true; `warranty_expires_at`
/// is set once at activation and only ever extended additively afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Code {
    pub value: CodeValue,
    pub product_info: Option<String>,
    pub user_id: Option<Snowflake>,
    pub is_used: bool,
    pub linked_at: Option<DateTime<Utc>>,
    pub warranty_activated: bool,
    pub warranty_activated_by: Option<Snowflake>,
    pub warranty_activated_at: Option<DateTime<Utc>>,
    pub warranty_expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Code {
    /// Create a new, unlinked and inactive code
    pub fn new(value: CodeValue, product_info: Option<String>) -> Self {
        Self {
            value,
            product_info,
            user_id: None,
            is_used: false,
            linked_at: None,
            warranty_activated: false,
            warranty_activated_by: None,
            warranty_activated_at: None,
            warranty_expires_at: None,
            created_at: Utc::now(),
        }
    }

    /// Expiry of a warranty activated at `activated_at`
    pub fn warranty_expiry_from(activated_at: DateTime<Utc>) -> DateTime<Utc> {
        activated_at + Duration::days(WARRANTY_TERM_DAYS)
    }

    /// Check if the code is bound to the given user
    pub fn is_linked_to(&self, user_id: Snowflake) -> bool {
        self.user_id == Some(user_id)
    }

    /// Check if the warranty is activated and not yet expired at `now`
    pub fn warranty_active_at(&self, now: DateTime<Utc>) -> bool {
        self.warranty_activated && self.warranty_expires_at.is_some_and(|exp| exp > now)
    }

    /// Whole days left on the warranty, zero once expired
    pub fn days_remaining(&self, now: DateTime<Utc>) -> Option<i64> {
        self.warranty_expires_at
            .map(|exp| (exp - now).num_days().max(0))
    }
}

/// Outcome of a successful link
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkOutcome {
    /// The code after the link
    pub code: Code,
    /// False when the code was already bound to the same user (idempotent no-op)
    pub newly_linked: bool,
}

impl LinkOutcome {
    /// Whether the user inherits a warranty activated before the link
    pub fn inherits_warranty(&self) -> bool {
        self.code.warranty_activated
    }

    pub fn warranty_expires_at(&self) -> Option<DateTime<Utc>> {
        self.code.warranty_expires_at
    }
}

/// Outcome of a successful activation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivationOutcome {
    /// The code after activation
    pub code: Code,
    /// True when the supplied user was bound in the same statement
    pub newly_linked: bool,
}

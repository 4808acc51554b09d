//! Entitlement snapshot - durable per-user record of what the user is owed

use chrono::{DateTime, Utc};

use crate::value_objects::Snowflake;

/// Per-user entitlement, independent of platform role presence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitlementSnapshot {
    pub user_id: Snowflake,
    pub has_premium: bool,
    pub has_warranty: bool,
    pub code_linked: bool,
    pub warranty_expires_at: Option<DateTime<Utc>>,
    pub last_updated: DateTime<Utc>,
}

impl EntitlementSnapshot {
    /// Warranty flag set and expiry strictly in the future
    pub fn warranty_active_at(&self, now: DateTime<Utc>) -> bool {
        self.has_warranty && self.warranty_expires_at.is_some_and(|exp| exp > now)
    }

    /// Warranty flag still set although the term is over (or was never known)
    pub fn is_warranty_stale(&self, now: DateTime<Utc>) -> bool {
        self.has_warranty && !self.warranty_active_at(now)
    }

    /// Roles this snapshot entitles the user to at `now`
    pub fn entitled_roles(&self, now: DateTime<Utc>) -> EntitledRoles {
        EntitledRoles {
            premium: self.has_premium,
            warranty: self.warranty_active_at(now),
        }
    }
}

/// Entitlement roles owed to a user
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntitledRoles {
    pub premium: bool,
    pub warranty: bool,
}

impl EntitledRoles {
    pub fn any(&self) -> bool {
        self.premium || self.warranty
    }
}

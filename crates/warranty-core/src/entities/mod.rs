//! Domain entities

mod audit;
mod code;
mod entitlement;
mod notice;
mod reminder;

pub use audit::{Actor, AuditAction, AuditEntry, NewAuditEntry};
pub use code::{ActivationOutcome, Code, LinkOutcome, WARRANTY_TERM_DAYS};
pub use entitlement::{EntitledRoles, EntitlementSnapshot};
pub use notice::Notice;
pub use reminder::ReminderThreshold;

//! PostgreSQL repository implementations

mod audit_log;
mod code;
mod entitlement;
pub(crate) mod error;
mod reminder;

pub use audit_log::PgAuditLogRepository;
pub use code::PgCodeRepository;
pub use entitlement::PgEntitlementRepository;
pub use reminder::PgReminderRepository;

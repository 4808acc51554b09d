//! Ports - interfaces the domain needs from infrastructure

mod platform;
mod repositories;

pub use platform::{ListedMember, MembershipPlatform, Notifier, PlatformError, PlatformResult};
pub use repositories::{
    AuditLogRepository, CodeRepository, EntitlementRepository, ReminderRepository, RepoResult,
};

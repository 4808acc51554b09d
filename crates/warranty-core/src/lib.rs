//! # warranty-core
//!
//! Domain layer containing entities, value objects, repository traits and the
//! membership platform ports. This crate has zero dependencies on
//! infrastructure (database, web framework, HTTP clients).

pub mod entities;
pub mod error;
pub mod traits;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use entities::{
    ActivationOutcome, Actor, AuditAction, AuditEntry, Code, EntitledRoles, EntitlementSnapshot,
    LinkOutcome, NewAuditEntry, Notice, ReminderThreshold, WARRANTY_TERM_DAYS,
};
pub use error::DomainError;
pub use traits::{
    AuditLogRepository, CodeRepository, EntitlementRepository, ListedMember, MembershipPlatform,
    Notifier, PlatformError, PlatformResult, ReminderRepository, RepoResult,
};
pub use value_objects::{CodeValue, CodeValueError, Snowflake, SnowflakeParseError};

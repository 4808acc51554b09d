//! Database models with SQLx `FromRow` derives

mod audit_log;
mod code;
mod entitlement;

pub use audit_log::AuditLogModel;
pub use code::{ActivatedCodeModel, CodeModel};
pub use entitlement::EntitlementSnapshotModel;

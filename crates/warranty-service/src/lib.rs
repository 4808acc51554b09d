//! # warranty-service
//!
//! Application layer: the activation engine that owns every code mutation,
//! the role reconciler that pushes durable entitlements onto the platform,
//! read-side queries, and the DTOs exchanged with the HTTP surface.

pub mod dto;
pub mod services;

pub use dto::*;
pub use services::{
    ActivationEngine, ActivationResult, CodeValidation, CreatedCode, Discrepancy,
    EntitlementQueries, EntitlementStatus, JoinOutcome, LinkResult, MemberRoleReport,
    RoleApplication, RoleKind, RoleReconciler, RoleRevocation, ServiceContext,
    ServiceContextBuilder, ServiceError, ServiceResult, SweepReport, MEMBER_PAGE_SIZE,
};

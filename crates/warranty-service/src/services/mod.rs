//! Business logic services
//!
//! Every service borrows the shared [`ServiceContext`]; none of them keeps
//! state of its own between calls.

pub mod activation;
pub mod context;
pub mod error;
pub mod queries;
pub mod reconciler;

pub use activation::{ActivationEngine, ActivationResult, CodeValidation, CreatedCode, LinkResult};
pub use context::{ServiceContext, ServiceContextBuilder};
pub use error::{ServiceError, ServiceResult};
pub use queries::{Discrepancy, EntitlementQueries, EntitlementStatus};
pub use reconciler::{
    JoinOutcome, MemberRoleReport, RoleApplication, RoleKind, RoleReconciler, RoleRevocation,
    SweepReport, MEMBER_PAGE_SIZE,
};

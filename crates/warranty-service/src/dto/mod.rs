//! Data transfer objects for API requests and responses
//!
//! This module provides:
//! - Request DTOs with validation for API inputs
//! - Response DTOs for serializing API outputs
//! - Mappers for converting domain entities and service results to DTOs

pub mod mappers;
pub mod requests;
pub mod responses;

pub use requests::{
    ActivateRequest, AuditQuery, CreateCodeRequest, ExtendRequest, MemberLeaveRequest,
    RedeemRequest, WindowQuery,
};

pub use responses::{
    ActivationResponse, AuditEntryResponse, CodeResponse, CodeValidationResponse,
    CreateCodeResponse, EntitlementResponse, EntitlementStatusResponse, HealthChecks,
    HealthResponse, JoinResponse, LeaveResponse, LinkResponse, ReadinessResponse,
    MemberRoleReportResponse, RoleApplicationResponse, SweepReportResponse,
};

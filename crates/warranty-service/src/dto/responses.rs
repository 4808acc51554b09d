//! Response DTOs for API endpoints
//!
//! All response DTOs implement `Serialize` for JSON output.
//! Snowflake IDs are serialized as strings for JavaScript compatibility.

use chrono::{DateTime, Utc};
use serde::Serialize;
use warranty_core::AuditAction;

// ============================================================================
// Code Responses
// ============================================================================

/// Code record as seen by operators and the redemption form
#[derive(Debug, Clone, Serialize)]
pub struct CodeResponse {
    pub code: String,
    pub product_info: Option<String>,
    pub user_id: Option<String>,
    pub is_used: bool,
    pub linked_at: Option<DateTime<Utc>>,
    pub warranty_activated: bool,
    pub warranty_activated_by: Option<String>,
    pub warranty_activated_at: Option<DateTime<Utc>>,
    pub warranty_expires_at: Option<DateTime<Utc>>,
    /// Whole days left on the warranty, floored at zero
    pub days_remaining: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// Result of a code lookup
#[derive(Debug, Clone, Serialize)]
pub struct CodeValidationResponse {
    pub code: String,
    pub found: bool,
    pub already_linked: bool,
    pub warranty_activated: bool,
}

/// Roles pushed to the platform by one operation
#[derive(Debug, Clone, Default, Serialize)]
pub struct RoleApplicationResponse {
    pub member: bool,
    pub granted: Vec<&'static str>,
    pub failed: Vec<&'static str>,
}

/// Result of a redemption or operator assignment
#[derive(Debug, Clone, Serialize)]
pub struct LinkResponse {
    pub code: CodeResponse,
    pub newly_linked: bool,
    pub inherited_warranty: bool,
    pub roles: RoleApplicationResponse,
}

/// Result of an operator activation
#[derive(Debug, Clone, Serialize)]
pub struct ActivationResponse {
    pub code: CodeResponse,
    pub newly_linked: bool,
    pub roles: Option<RoleApplicationResponse>,
    pub notified: bool,
}

/// Result of code creation
#[derive(Debug, Clone, Serialize)]
pub struct CreateCodeResponse {
    pub code: CodeResponse,
    pub linked: bool,
    pub activated: bool,
    pub roles: Option<RoleApplicationResponse>,
}

// ============================================================================
// Entitlement Responses
// ============================================================================

/// Stored entitlement snapshot
#[derive(Debug, Clone, Serialize)]
pub struct EntitlementResponse {
    pub user_id: String,
    pub has_premium: bool,
    pub has_warranty: bool,
    pub code_linked: bool,
    pub warranty_expires_at: Option<DateTime<Utc>>,
    pub last_updated: DateTime<Utc>,
}

/// Operator status report for one user
#[derive(Debug, Clone, Serialize)]
pub struct EntitlementStatusResponse {
    pub user_id: String,
    /// Null when the platform could not be reached
    pub member: Option<bool>,
    pub snapshot: Option<EntitlementResponse>,
    pub codes: Vec<CodeResponse>,
    pub discrepancies: Vec<&'static str>,
    pub checked_at: DateTime<Utc>,
}

/// Audit log entry
#[derive(Debug, Clone, Serialize)]
pub struct AuditEntryResponse {
    pub id: i64,
    pub user_id: Option<String>,
    pub actor_kind: &'static str,
    pub actor_id: Option<String>,
    pub code: Option<String>,
    pub action: AuditAction,
    pub detail: String,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// Membership Responses
// ============================================================================

/// Result of a member join
#[derive(Debug, Clone, Serialize)]
pub struct JoinResponse {
    pub user_id: String,
    pub member_role_granted: bool,
    pub warranty_expired: bool,
    pub roles: RoleApplicationResponse,
    pub welcomed: bool,
}

/// Result of a member departure
#[derive(Debug, Clone, Serialize)]
pub struct LeaveResponse {
    pub user_id: String,
    pub recorded: bool,
    pub snapshot: Option<EntitlementResponse>,
}

/// Totals from an integrity sweep
#[derive(Debug, Clone, Serialize)]
pub struct SweepReportResponse {
    pub checked: usize,
    pub repaired: usize,
    pub not_members: usize,
    pub failures: usize,
}

/// Member role backfill totals
#[derive(Debug, Clone, Serialize)]
pub struct MemberRoleReportResponse {
    pub assigned: usize,
    pub already_held: usize,
    pub bots_skipped: usize,
    pub failures: usize,
}

// ============================================================================
// Health Responses
// ============================================================================

/// Basic health check response
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

impl HealthResponse {
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: Utc::now(),
        }
    }
}

/// Readiness check response
#[derive(Debug, Clone, Serialize)]
pub struct ReadinessResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub checks: HealthChecks,
}

/// Health check status for each dependency
#[derive(Debug, Clone, Serialize)]
pub struct HealthChecks {
    pub database: String,
}

impl ReadinessResponse {
    pub fn ready(database_healthy: bool) -> Self {
        Self {
            status: if database_healthy { "ready" } else { "not_ready" }.to_string(),
            timestamp: Utc::now(),
            checks: HealthChecks {
                database: if database_healthy { "healthy" } else { "unhealthy" }.to_string(),
            },
        }
    }
}

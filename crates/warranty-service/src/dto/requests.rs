//! Request DTOs for API endpoints
//!
//! All request DTOs implement `Deserialize`; those carrying free input also
//! implement `Validate`. Snowflakes are accepted as strings or numbers.

use serde::Deserialize;
use validator::Validate;
use warranty_core::Snowflake;

// ============================================================================
// Code Requests
// ============================================================================

/// Redemption form submission
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RedeemRequest {
    pub user_id: Snowflake,
}

/// Operator request to create a code
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CreateCodeRequest {
    /// Generated when omitted
    #[validate(length(min = 5, max = 50, message = "Code must be 5-50 characters"))]
    pub code: Option<String>,

    #[validate(length(max = 255, message = "Product info must be at most 255 characters"))]
    pub product_info: Option<String>,

    /// Link the new code to this buyer
    pub assign_to: Option<Snowflake>,

    /// Activate the warranty right away (links `assign_to` in the same step)
    #[serde(default)]
    pub activate_warranty: bool,
}

/// Operator request to activate a warranty
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActivateRequest {
    /// Bind this user if the code is still unlinked
    pub user_id: Option<Snowflake>,
}

/// Operator request to extend a warranty
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ExtendRequest {
    #[validate(range(min = 1, max = 3650, message = "Days must be between 1 and 3650"))]
    pub days: i64,

    /// Why the term was extended, kept in the audit trail
    #[validate(length(max = 255, message = "Reason must be at most 255 characters"))]
    pub reason: Option<String>,
}

// ============================================================================
// Membership Requests
// ============================================================================

/// Gateway relay notification that a member left
///
/// `roles` is required: an unknown role set must not be recorded as an
/// empty one.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct MemberLeaveRequest {
    /// Role ids the member held at the moment of departure
    pub roles: Vec<Snowflake>,
}

// ============================================================================
// Query Parameters
// ============================================================================

/// `?days=` window for code lists
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct WindowQuery {
    #[validate(range(min = 1, max = 3650, message = "Days must be between 1 and 3650"))]
    pub days: Option<i64>,
}

/// `?limit=` for audit history
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct AuditQuery {
    #[validate(range(min = 1, max = 500, message = "Limit must be between 1 and 500"))]
    pub limit: Option<i64>,
}

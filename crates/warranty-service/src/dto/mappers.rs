//! Entity to DTO mappers
//!
//! Implements `From` conversions from domain entities and service results to
//! response DTOs.

use chrono::Utc;
use warranty_core::entities::{AuditEntry, Code, EntitlementSnapshot};

use crate::services::{
    ActivationResult, CodeValidation, CreatedCode, EntitlementStatus, JoinOutcome, LinkResult,
    MemberRoleReport, RoleApplication, SweepReport,
};

use super::responses::{
    ActivationResponse, AuditEntryResponse, CodeResponse, CodeValidationResponse,
    CreateCodeResponse, EntitlementResponse, EntitlementStatusResponse, JoinResponse,
    LinkResponse, MemberRoleReportResponse, RoleApplicationResponse, SweepReportResponse,
};

// ============================================================================
// Code Mappers
// ============================================================================

impl From<&Code> for CodeResponse {
    fn from(code: &Code) -> Self {
        Self {
            code: code.value.to_string(),
            product_info: code.product_info.clone(),
            user_id: code.user_id.map(|id| id.to_string()),
            is_used: code.is_used,
            linked_at: code.linked_at,
            warranty_activated: code.warranty_activated,
            warranty_activated_by: code.warranty_activated_by.map(|id| id.to_string()),
            warranty_activated_at: code.warranty_activated_at,
            warranty_expires_at: code.warranty_expires_at,
            days_remaining: code.days_remaining(Utc::now()),
            created_at: code.created_at,
        }
    }
}

impl From<Code> for CodeResponse {
    fn from(code: Code) -> Self {
        Self::from(&code)
    }
}

impl From<CodeValidation> for CodeValidationResponse {
    fn from(validation: CodeValidation) -> Self {
        Self {
            code: validation.value.into_inner(),
            found: true,
            already_linked: validation.already_linked,
            warranty_activated: validation.warranty_activated,
        }
    }
}

impl From<&RoleApplication> for RoleApplicationResponse {
    fn from(app: &RoleApplication) -> Self {
        Self {
            member: app.member,
            granted: app.granted.iter().map(|k| k.as_str()).collect(),
            failed: app.failed.iter().map(|k| k.as_str()).collect(),
        }
    }
}

impl From<LinkResult> for LinkResponse {
    fn from(result: LinkResult) -> Self {
        Self {
            code: CodeResponse::from(&result.code),
            newly_linked: result.newly_linked,
            inherited_warranty: result.inherited_warranty,
            roles: RoleApplicationResponse::from(&result.roles),
        }
    }
}

impl From<ActivationResult> for ActivationResponse {
    fn from(result: ActivationResult) -> Self {
        Self {
            code: CodeResponse::from(&result.code),
            newly_linked: result.newly_linked,
            roles: result.roles.as_ref().map(RoleApplicationResponse::from),
            notified: result.notified,
        }
    }
}

impl From<CreatedCode> for CreateCodeResponse {
    fn from(created: CreatedCode) -> Self {
        let roles = match (&created.link, &created.activation) {
            (Some(link), _) => Some(RoleApplicationResponse::from(&link.roles)),
            (None, Some(activation)) => activation.roles.as_ref().map(RoleApplicationResponse::from),
            (None, None) => None,
        };
        Self {
            linked: created.code.is_used,
            activated: created.code.warranty_activated,
            code: CodeResponse::from(&created.code),
            roles,
        }
    }
}

// ============================================================================
// Entitlement Mappers
// ============================================================================

impl From<&EntitlementSnapshot> for EntitlementResponse {
    fn from(snapshot: &EntitlementSnapshot) -> Self {
        Self {
            user_id: snapshot.user_id.to_string(),
            has_premium: snapshot.has_premium,
            has_warranty: snapshot.has_warranty,
            code_linked: snapshot.code_linked,
            warranty_expires_at: snapshot.warranty_expires_at,
            last_updated: snapshot.last_updated,
        }
    }
}

impl From<EntitlementStatus> for EntitlementStatusResponse {
    fn from(status: EntitlementStatus) -> Self {
        Self {
            user_id: status.user_id.to_string(),
            member: status.member,
            snapshot: status.snapshot.as_ref().map(EntitlementResponse::from),
            codes: status.codes.iter().map(CodeResponse::from).collect(),
            discrepancies: status.discrepancies.iter().map(|d| d.as_str()).collect(),
            checked_at: status.checked_at,
        }
    }
}

impl From<AuditEntry> for AuditEntryResponse {
    fn from(entry: AuditEntry) -> Self {
        Self {
            id: entry.id,
            user_id: entry.user_id.map(|id| id.to_string()),
            actor_kind: entry.actor.kind(),
            actor_id: entry.actor.id().map(|id| id.to_string()),
            code: entry.code,
            action: entry.action,
            detail: entry.detail,
            created_at: entry.created_at,
        }
    }
}

// ============================================================================
// Membership Mappers
// ============================================================================

impl From<JoinOutcome> for JoinResponse {
    fn from(outcome: JoinOutcome) -> Self {
        Self {
            user_id: outcome.user_id.to_string(),
            member_role_granted: outcome.member_role_granted,
            warranty_expired: outcome.warranty_expired,
            roles: RoleApplicationResponse::from(&outcome.roles),
            welcomed: outcome.welcomed,
        }
    }
}

impl From<SweepReport> for SweepReportResponse {
    fn from(report: SweepReport) -> Self {
        Self {
            checked: report.checked,
            repaired: report.repaired,
            not_members: report.not_members,
            failures: report.failures,
        }
    }
}

impl From<MemberRoleReport> for MemberRoleReportResponse {
    fn from(report: MemberRoleReport) -> Self {
        Self {
            assigned: report.assigned,
            already_held: report.already_held,
            bots_skipped: report.bots_skipped,
            failures: report.failures,
        }
    }
}

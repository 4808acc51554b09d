//! Expiry sweep - clears lapsed warranty flags and removes the warranty role

use chrono::{DateTime, Utc};
use tracing::{error, info, instrument, warn};
use warranty_core::entities::{Actor, AuditAction, EntitlementSnapshot, NewAuditEntry, Notice};
use warranty_core::Snowflake;
use warranty_service::{RoleReconciler, RoleRevocation, ServiceContext, ServiceResult};

/// Totals from one expiry sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExpiryReport {
    pub expired: usize,
    pub roles_removed: usize,
    pub notified: usize,
    /// Another run or a rejoin cleared the flag first
    pub skipped: usize,
    /// Extended while the sweep was running; the role was put back
    pub renewed: usize,
    pub failures: usize,
}

/// Expire every snapshot whose warranty term has ended
///
/// Each user is committed on its own; an error for one user is logged and the
/// sweep moves on.
#[instrument(skip(ctx))]
pub async fn run_expiry_sweep(
    ctx: &ServiceContext,
    now: DateTime<Utc>,
) -> ServiceResult<ExpiryReport> {
    let snapshots = ctx
        .store("find expired", ctx.entitlement_repo().find_expired(now))
        .await?;

    let reconciler = RoleReconciler::new(ctx);
    let mut report = ExpiryReport::default();

    for snapshot in &snapshots {
        let user_id = snapshot.user_id;

        let cleared = match ctx
            .store(
                "clear warranty",
                ctx.entitlement_repo().clear_warranty(user_id, now),
            )
            .await
        {
            Ok(cleared) => cleared,
            Err(e) => {
                error!(error = %e, user_id = %user_id, "Failed to clear expired warranty");
                report.failures += 1;
                continue;
            }
        };
        if !cleared {
            report.skipped += 1;
            continue;
        }
        let revocation = reconciler.revoke_warranty(user_id).await;

        // An extension may have resynced the snapshot since the clear
        if let Some(renewed) = renewed_snapshot(ctx, user_id, now).await {
            reconciler.apply_snapshot(&renewed, now).await;
            info!(user_id = %user_id, "Warranty extended during sweep, role kept");
            report.renewed += 1;
            continue;
        }
        report.expired += 1;

        match revocation {
            RoleRevocation::Removed => report.roles_removed += 1,
            RoleRevocation::Failed => report.failures += 1,
            _ => {}
        }

        let code = expired_code(ctx, snapshot).await;
        let notice = Notice::WarrantyExpired {
            code: code.clone(),
            premium_kept: snapshot.has_premium,
        };
        if ctx.notify(user_id, &notice).await {
            report.notified += 1;
        }

        let mut entry = NewAuditEntry::new(AuditAction::WarrantyExpired, Actor::System)
            .user(user_id)
            .detail(format!("warranty role {}", revocation_label(revocation)));
        if let Some(code) = code {
            entry = entry.code(code);
        }
        ctx.record(entry).await;
    }

    info!(
        expired = report.expired,
        roles_removed = report.roles_removed,
        notified = report.notified,
        skipped = report.skipped,
        renewed = report.renewed,
        failures = report.failures,
        "Expiry sweep finished"
    );
    Ok(report)
}

/// The user's snapshot if it again shows a running warranty
async fn renewed_snapshot(
    ctx: &ServiceContext,
    user_id: Snowflake,
    now: DateTime<Utc>,
) -> Option<EntitlementSnapshot> {
    match ctx
        .store("find snapshot", ctx.entitlement_repo().find(user_id))
        .await
    {
        Ok(snapshot) => snapshot.filter(|s| s.warranty_active_at(now)),
        Err(e) => {
            warn!(error = %e, user_id = %user_id, "Failed to re-read snapshot after expiry");
            None
        }
    }
}

/// The activated code whose expiry the snapshot mirrors, if it can be read
async fn expired_code(ctx: &ServiceContext, snapshot: &EntitlementSnapshot) -> Option<String> {
    let codes = ctx
        .store(
            "find user codes",
            ctx.code_repo().find_by_user(snapshot.user_id),
        )
        .await
        .ok()?;

    codes
        .into_iter()
        .filter(|c| c.warranty_activated)
        .max_by_key(|c| c.warranty_expires_at)
        .map(|c| c.value.into_inner())
}

fn revocation_label(revocation: RoleRevocation) -> &'static str {
    match revocation {
        RoleRevocation::Removed => "removed",
        RoleRevocation::NotHeld => "not held",
        RoleRevocation::NotMember => "not removed (not a member)",
        RoleRevocation::NotConfigured => "not configured",
        RoleRevocation::Failed => "removal failed",
    }
}

//! Reminder sweep - one direct message per (code, threshold)

use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument, warn};
use warranty_core::entities::{Actor, AuditAction, NewAuditEntry, Notice, ReminderThreshold};
use warranty_service::{ServiceContext, ServiceResult};

/// Totals from one reminder sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReminderReport {
    pub sent: usize,
    /// Claimed by an earlier run
    pub already_sent: usize,
    /// Activated but never linked; nobody to remind
    pub unbound: usize,
    /// Claim or delivery failed; retried next run
    pub failed: usize,
}

/// Remind owners of warranties entering the 30-day and 7-day windows
///
/// The claim is taken before sending and released if the message does not go
/// out, so a crash between the two can only drop a reminder, never repeat one.
#[instrument(skip(ctx))]
pub async fn run_reminder_sweep(
    ctx: &ServiceContext,
    now: DateTime<Utc>,
) -> ServiceResult<ReminderReport> {
    let mut report = ReminderReport::default();

    for threshold in ReminderThreshold::ALL {
        let (after, until) = threshold.window(now);
        let codes = ctx
            .store(
                "find expiring codes",
                ctx.code_repo().find_expiring(after, until),
            )
            .await?;

        debug!(threshold = %threshold, count = codes.len(), "Reminder candidates");

        for code in codes {
            let (Some(user_id), Some(expires_at)) = (code.user_id, code.warranty_expires_at)
            else {
                report.unbound += 1;
                continue;
            };

            let claimed = match ctx
                .store(
                    "claim reminder",
                    ctx.reminder_repo().try_claim(&code.value, threshold, now),
                )
                .await
            {
                Ok(claimed) => claimed,
                Err(e) => {
                    warn!(error = %e, code = %code.value, threshold = %threshold, "Reminder claim failed");
                    report.failed += 1;
                    continue;
                }
            };
            if !claimed {
                report.already_sent += 1;
                continue;
            }

            let notice = Notice::Reminder {
                code: code.value.to_string(),
                days_left: code.days_remaining(now).unwrap_or(0),
                expires_at,
            };

            if ctx.notify(user_id, &notice).await {
                report.sent += 1;
                ctx.record(
                    NewAuditEntry::new(AuditAction::ReminderSent, Actor::System)
                        .user(user_id)
                        .code(code.value.as_str())
                        .detail(format!("{threshold} reminder")),
                )
                .await;
            } else {
                report.failed += 1;
                if let Err(e) = ctx
                    .store(
                        "release reminder",
                        ctx.reminder_repo().release(&code.value, threshold),
                    )
                    .await
                {
                    warn!(error = %e, code = %code.value, threshold = %threshold, "Failed to release reminder claim");
                }
            }
        }
    }

    info!(
        sent = report.sent,
        already_sent = report.already_sent,
        unbound = report.unbound,
        failed = report.failed,
        "Reminder sweep finished"
    );
    Ok(report)
}

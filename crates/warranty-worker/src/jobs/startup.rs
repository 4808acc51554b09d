//! Startup integrity sweep

use chrono::{DateTime, Utc};
use tracing::instrument;
use warranty_service::{RoleReconciler, ServiceContext, ServiceResult, SweepReport};

/// Repair roles lost while the process was down
#[instrument(skip(ctx))]
pub async fn run_startup_sweep(
    ctx: &ServiceContext,
    now: DateTime<Utc>,
) -> ServiceResult<SweepReport> {
    RoleReconciler::new(ctx).sweep_guild(now).await
}

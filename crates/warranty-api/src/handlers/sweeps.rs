//! Sweep handlers

use axum::{extract::State, Json};
use chrono::Utc;
use warranty_service::{MemberRoleReportResponse, RoleReconciler, SweepReportResponse};

use crate::extractors::Operator;
use crate::response::ApiResult;
use crate::state::AppState;

/// Walk every active warranty and re-grant missing roles
///
/// POST /sweeps/integrity
pub async fn integrity_sweep(
    State(state): State<AppState>,
    _operator: Operator,
) -> ApiResult<Json<SweepReportResponse>> {
    let reconciler = RoleReconciler::new(state.service_context());
    let report = reconciler.sweep_guild(Utc::now()).await?;
    Ok(Json(report.into()))
}

/// Give the member role to everyone already in the community
///
/// POST /sweeps/member-role
pub async fn member_role_backfill(
    State(state): State<AppState>,
    operator: Operator,
) -> ApiResult<Json<MemberRoleReportResponse>> {
    let reconciler = RoleReconciler::new(state.service_context());
    let report = reconciler
        .assign_member_role_to_all(operator.operator_id)
        .await?;
    Ok(Json(report.into()))
}

//! Membership event handlers
//!
//! The gateway relay posts guild joins and departures here.

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use warranty_service::{
    EntitlementResponse, JoinResponse, LeaveResponse, MemberLeaveRequest, RoleReconciler,
};

use crate::extractors::{ServiceAuth, UserIdPath, ValidatedJson};
use crate::response::ApiResult;
use crate::state::AppState;

/// A user joined the guild
///
/// POST /members/{user_id}/join
pub async fn member_join(
    State(state): State<AppState>,
    _auth: ServiceAuth,
    Path(path): Path<UserIdPath>,
) -> ApiResult<Json<JoinResponse>> {
    let user_id = path.user_id()?;
    let reconciler = RoleReconciler::new(state.service_context());
    let outcome = reconciler.on_member_join(user_id, Utc::now()).await?;
    Ok(Json(outcome.into()))
}

/// A user left the guild; the body carries the roles held at departure
///
/// POST /members/{user_id}/leave
pub async fn member_leave(
    State(state): State<AppState>,
    _auth: ServiceAuth,
    Path(path): Path<UserIdPath>,
    ValidatedJson(request): ValidatedJson<MemberLeaveRequest>,
) -> ApiResult<Json<LeaveResponse>> {
    let user_id = path.user_id()?;
    let reconciler = RoleReconciler::new(state.service_context());
    let snapshot = reconciler
        .on_member_leave(user_id, &request.roles, Utc::now())
        .await?;

    Ok(Json(LeaveResponse {
        user_id: user_id.to_string(),
        recorded: snapshot.is_some(),
        snapshot: snapshot.as_ref().map(EntitlementResponse::from),
    }))
}

//! User handlers
//!
//! Operator views of one user's entitlement and the manual restore.

use axum::{
    extract::{Path, State},
    Json,
};
use warranty_service::{
    ActivationEngine, AuditEntryResponse, AuditQuery, EntitlementQueries,
    EntitlementStatusResponse, RoleApplicationResponse,
};

use crate::extractors::{Operator, UserIdPath, ValidatedQuery};
use crate::response::ApiResult;
use crate::state::AppState;

/// Durable snapshot, codes and live role discrepancies for a user
///
/// GET /users/{user_id}/entitlement
pub async fn get_entitlement(
    State(state): State<AppState>,
    _operator: Operator,
    Path(path): Path<UserIdPath>,
) -> ApiResult<Json<EntitlementStatusResponse>> {
    let user_id = path.user_id()?;
    let queries = EntitlementQueries::new(state.service_context());
    let status = queries.status(user_id).await?;
    Ok(Json(status.into()))
}

/// Audit history of a user, newest first
///
/// GET /users/{user_id}/audit?limit=
pub async fn user_audit(
    State(state): State<AppState>,
    _operator: Operator,
    Path(path): Path<UserIdPath>,
    ValidatedQuery(query): ValidatedQuery<AuditQuery>,
) -> ApiResult<Json<Vec<AuditEntryResponse>>> {
    let user_id = path.user_id()?;
    let queries = EntitlementQueries::new(state.service_context());
    let entries = queries.audit_for_user(user_id, query.limit).await?;
    Ok(Json(entries.into_iter().map(AuditEntryResponse::from).collect()))
}

/// Re-derive and re-apply a user's roles
///
/// POST /users/{user_id}/restore
pub async fn force_restore(
    State(state): State<AppState>,
    operator: Operator,
    Path(path): Path<UserIdPath>,
) -> ApiResult<Json<RoleApplicationResponse>> {
    let user_id = path.user_id()?;
    let engine = ActivationEngine::new(state.service_context());
    let roles = engine.force_restore(user_id, operator.operator_id).await?;
    Ok(Json(RoleApplicationResponse::from(&roles)))
}

//! Code handlers
//!
//! Redemption form and operator endpoints for the code lifecycle.

use axum::{
    extract::{Path, State},
    Json,
};
use warranty_service::{
    ActivateRequest, ActivationEngine, ActivationResponse, AuditEntryResponse, AuditQuery,
    CodeResponse, CodeValidationResponse, CreateCodeRequest, CreateCodeResponse,
    EntitlementQueries, ExtendRequest, LinkResponse, RedeemRequest, WindowQuery,
};

use crate::extractors::{
    CodePath, Operator, OptionalJson, ServiceAuth, ValidatedJson, ValidatedQuery,
};
use crate::response::{ApiResult, Created};
use crate::state::AppState;

/// Look a code up
///
/// GET /codes/{code}
pub async fn validate_code(
    State(state): State<AppState>,
    _auth: ServiceAuth,
    Path(path): Path<CodePath>,
) -> ApiResult<Json<CodeValidationResponse>> {
    let engine = ActivationEngine::new(state.service_context());
    let validation = engine.validate(&path.code).await?;
    Ok(Json(validation.into()))
}

/// Redeem a code for a user
///
/// POST /codes/{code}/redeem
pub async fn redeem_code(
    State(state): State<AppState>,
    _auth: ServiceAuth,
    Path(path): Path<CodePath>,
    ValidatedJson(request): ValidatedJson<RedeemRequest>,
) -> ApiResult<Json<LinkResponse>> {
    let engine = ActivationEngine::new(state.service_context());
    let result = engine.redeem(&path.code, request.user_id).await?;
    Ok(Json(result.into()))
}

/// Create a code, optionally assigning and activating it
///
/// POST /codes
pub async fn create_code(
    State(state): State<AppState>,
    operator: Operator,
    ValidatedJson(request): ValidatedJson<CreateCodeRequest>,
) -> ApiResult<Created<Json<CreateCodeResponse>>> {
    let engine = ActivationEngine::new(state.service_context());
    let created = engine
        .create_code(
            request.code.as_deref(),
            request.product_info,
            request.assign_to,
            request.activate_warranty,
            operator.operator_id,
        )
        .await?;
    Ok(Created(Json(created.into())))
}

/// Activate a warranty
///
/// POST /codes/{code}/activate
pub async fn activate_code(
    State(state): State<AppState>,
    operator: Operator,
    Path(path): Path<CodePath>,
    OptionalJson(request): OptionalJson<ActivateRequest>,
) -> ApiResult<Json<ActivationResponse>> {
    let engine = ActivationEngine::new(state.service_context());
    let result = engine
        .admin_activate(&path.code, operator.operator_id, request.user_id)
        .await?;
    Ok(Json(result.into()))
}

/// Extend a warranty
///
/// POST /codes/{code}/extend
pub async fn extend_code(
    State(state): State<AppState>,
    operator: Operator,
    Path(path): Path<CodePath>,
    ValidatedJson(request): ValidatedJson<ExtendRequest>,
) -> ApiResult<Json<CodeResponse>> {
    let engine = ActivationEngine::new(state.service_context());
    let code = engine
        .extend(
            &path.code,
            request.days,
            operator.operator_id,
            request.reason.as_deref(),
        )
        .await?;
    Ok(Json(code.into()))
}

/// Linked codes awaiting activation
///
/// GET /codes/pending?days=
pub async fn list_pending(
    State(state): State<AppState>,
    _operator: Operator,
    ValidatedQuery(query): ValidatedQuery<WindowQuery>,
) -> ApiResult<Json<Vec<CodeResponse>>> {
    let queries = EntitlementQueries::new(state.service_context());
    let codes = queries.pending(query.days).await?;
    Ok(Json(codes.iter().map(CodeResponse::from).collect()))
}

/// Activated codes close to expiry
///
/// GET /codes/expiring?days=
pub async fn list_expiring(
    State(state): State<AppState>,
    _operator: Operator,
    ValidatedQuery(query): ValidatedQuery<WindowQuery>,
) -> ApiResult<Json<Vec<CodeResponse>>> {
    let queries = EntitlementQueries::new(state.service_context());
    let codes = queries.expiring(query.days).await?;
    Ok(Json(codes.iter().map(CodeResponse::from).collect()))
}

/// Audit history of a code
///
/// GET /codes/{code}/audit?limit=
pub async fn code_audit(
    State(state): State<AppState>,
    _operator: Operator,
    Path(path): Path<CodePath>,
    ValidatedQuery(query): ValidatedQuery<AuditQuery>,
) -> ApiResult<Json<Vec<AuditEntryResponse>>> {
    let queries = EntitlementQueries::new(state.service_context());
    let entries = queries.audit_for_code(&path.code, query.limit).await?;
    Ok(Json(entries.into_iter().map(AuditEntryResponse::from).collect()))
}

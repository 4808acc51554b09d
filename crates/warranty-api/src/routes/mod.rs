//! Route definitions
//!
//! All API routes organized by caller and mounted under /api/v1.

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::{codes, health, members, sweeps, users};
use crate::state::AppState;

/// Create the main API router (health routes are merged separately)
pub fn create_router() -> Router<AppState> {
    Router::new().nest("/api/v1", api_v1_routes())
}

/// Health check routes (no authentication)
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
}

/// API v1 routes
fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .merge(code_routes())
        .merge(user_routes())
        .merge(member_routes())
        .merge(sweep_routes())
}

/// Code lifecycle routes (redemption form and operators)
fn code_routes() -> Router<AppState> {
    Router::new()
        .route("/codes", post(codes::create_code))
        .route("/codes/pending", get(codes::list_pending))
        .route("/codes/expiring", get(codes::list_expiring))
        .route("/codes/:code", get(codes::validate_code))
        .route("/codes/:code/redeem", post(codes::redeem_code))
        .route("/codes/:code/activate", post(codes::activate_code))
        .route("/codes/:code/extend", post(codes::extend_code))
        .route("/codes/:code/audit", get(codes::code_audit))
}

/// Operator user routes
fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users/:user_id/entitlement", get(users::get_entitlement))
        .route("/users/:user_id/audit", get(users::user_audit))
        .route("/users/:user_id/restore", post(users::force_restore))
}

/// Gateway relay routes
fn member_routes() -> Router<AppState> {
    Router::new()
        .route("/members/:user_id/join", post(members::member_join))
        .route("/members/:user_id/leave", post(members::member_leave))
}

/// Operator sweep routes
fn sweep_routes() -> Router<AppState> {
    Router::new()
        .route("/sweeps/integrity", post(sweeps::integrity_sweep))
        .route("/sweeps/member-role", post(sweeps::member_role_backfill))
}

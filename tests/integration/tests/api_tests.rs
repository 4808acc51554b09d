//! API Integration Tests
//!
//! The application runs in-process over in-memory ports; the database pool is
//! lazy and only the readiness probe reaches for it.
//!
//! Run with: cargo test -p integration-tests --test api_tests

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use integration_tests::*;
use serde_json::json;

// ============================================================================
// Health Check Tests
// ============================================================================

#[tokio::test]
async fn test_health_check() {
    let app = TestApp::new();

    let response = app.get("/health", Caller::Anonymous).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "healthy");
    assert!(response.headers.contains_key("x-request-id"));
}

#[tokio::test]
async fn test_readiness_reports_unreachable_database() {
    let app = TestApp::new();

    let response = app.get("/health/ready", Caller::Anonymous).await;

    assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response.body["checks"]["database"], "unhealthy");
}

// ============================================================================
// Auth Tests
// ============================================================================

#[tokio::test]
async fn test_missing_and_wrong_token_are_rejected() {
    let app = TestApp::new();
    let raw = unique_code();
    app.env.store.insert_code(unlinked_code(&raw));
    let path = format!("/api/v1/codes/{raw}");

    let response = app.get(&path, Caller::Anonymous).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.error_code(), Some("MISSING_AUTHORIZATION"));

    let response = app.get(&path, Caller::WrongToken).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.error_code(), Some("INVALID_TOKEN"));

    let response = app.get(&path, Caller::Service).await;
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_operator_routes_need_operator_header() {
    let app = TestApp::new();

    let response = app.get("/api/v1/codes/pending", Caller::Service).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.error_code(), Some("MISSING_OPERATOR"));
}

// ============================================================================
// Redemption Form Tests
// ============================================================================

#[tokio::test]
async fn test_validate_and_redeem() {
    let app = TestApp::new();
    let user = unique_user();
    let raw = unique_code();
    app.env.store.insert_code(unlinked_code(&raw));
    app.env.platform.join(user);

    let lookup = app
        .get(&format!("/api/v1/codes/{}", raw.to_lowercase()), Caller::Service)
        .await;
    assert_eq!(lookup.status, StatusCode::OK);
    assert_eq!(lookup.body["code"], raw.as_str());
    assert_eq!(lookup.body["found"], true);
    assert_eq!(lookup.body["already_linked"], false);

    let redeem = app
        .post(
            &format!("/api/v1/codes/{raw}/redeem"),
            Caller::Service,
            Some(json!({ "user_id": user.to_string() })),
        )
        .await;
    assert_eq!(redeem.status, StatusCode::OK);
    assert_eq!(redeem.body["newly_linked"], true);
    assert_eq!(redeem.body["code"]["user_id"], user.to_string());
    assert_eq!(redeem.body["roles"]["granted"], json!(["premium"]));

    let again = app
        .post(
            &format!("/api/v1/codes/{raw}/redeem"),
            Caller::Service,
            Some(json!({ "user_id": unique_user().to_string() })),
        )
        .await;
    assert_eq!(again.status, StatusCode::CONFLICT);
    assert_eq!(again.error_code(), Some("CODE_ALREADY_LINKED"));
}

#[tokio::test]
async fn test_unknown_and_malformed_codes() {
    let app = TestApp::new();

    let response = app.get("/api/v1/codes/UNKNOWN-1", Caller::Service).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.error_code(), Some("CODE_NOT_FOUND"));

    let response = app.get("/api/v1/codes/a!b", Caller::Service).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.error_code(), Some("INVALID_CODE"));
}

#[tokio::test]
async fn test_redeem_rejects_bad_body() {
    let app = TestApp::new();
    let raw = unique_code();
    app.env.store.insert_code(unlinked_code(&raw));

    let response = app
        .post(
            &format!("/api/v1/codes/{raw}/redeem"),
            Caller::Service,
            Some(json!({ "user_id": "not-a-snowflake" })),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.error_code(), Some("INVALID_BODY"));
    assert_eq!(app.env.store.code(&raw).unwrap().user_id, None);
}

#[tokio::test]
async fn test_store_outage_maps_to_service_unavailable() {
    let app = TestApp::new();
    let raw = unique_code();
    app.env.store.insert_code(unlinked_code(&raw));
    app.env.store.fail_next("find_by_value", 1);

    let response = app.get(&format!("/api/v1/codes/{raw}"), Caller::Service).await;

    assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response.error_code(), Some("TRANSIENT_STORE_FAILURE"));
}

// ============================================================================
// Operator Tests
// ============================================================================

#[tokio::test]
async fn test_operator_code_lifecycle() {
    let app = TestApp::new();
    let operator = Caller::Operator(OPERATOR);
    let user = unique_user();
    let raw = unique_code();
    app.env.platform.join(user);

    let created = app
        .post(
            "/api/v1/codes",
            operator,
            Some(json!({ "code": raw, "product_info": "Desk lamp", "assign_to": user.to_string() })),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.body["linked"], true);
    assert_eq!(created.body["activated"], false);

    let pending = app.get("/api/v1/codes/pending", operator).await;
    assert_eq!(pending.status, StatusCode::OK);
    assert_eq!(pending.body[0]["code"], raw.as_str());

    let activated = app
        .post(&format!("/api/v1/codes/{raw}/activate"), operator, None)
        .await;
    assert_eq!(activated.status, StatusCode::OK);
    assert_eq!(activated.body["notified"], true);
    assert_eq!(activated.body["code"]["warranty_activated"], true);
    assert_eq!(activated.body["code"]["days_remaining"], 364);
    assert!(app.env.platform.has_role(user, WARRANTY_ROLE));

    let extended = app
        .post(
            &format!("/api/v1/codes/{raw}/extend"),
            operator,
            Some(json!({ "days": 30 })),
        )
        .await;
    assert_eq!(extended.status, StatusCode::OK);
    assert_eq!(extended.body["days_remaining"], 394);

    let audit = app
        .get(&format!("/api/v1/codes/{raw}/audit?limit=10"), operator)
        .await;
    assert_eq!(audit.status, StatusCode::OK);
    let actions: Vec<_> = audit
        .body
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["action"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(actions, ["EXTEND", "ACTIVATE", "CODE_LINKED", "CODE_CREATED"]);
}

#[tokio::test]
async fn test_extend_validates_days() {
    let app = TestApp::new();
    let raw = unique_code();
    app.env
        .store
        .insert_code(activated_code(&raw, None, Utc::now() + Duration::days(10)));

    let response = app
        .post(
            &format!("/api/v1/codes/{raw}/extend"),
            Caller::Operator(OPERATOR),
            Some(json!({ "days": 0 })),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.error_code(), Some("VALIDATION_ERROR"));
}

#[tokio::test]
async fn test_activate_twice_conflicts() {
    let app = TestApp::new();
    let raw = unique_code();
    app.env.store.insert_code(unlinked_code(&raw));
    let path = format!("/api/v1/codes/{raw}/activate");

    let first = app.post(&path, Caller::Operator(OPERATOR), None).await;
    let second = app.post(&path, Caller::Operator(OPERATOR), None).await;

    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.body["roles"], serde_json::Value::Null);
    assert_eq!(second.status, StatusCode::CONFLICT);
    assert_eq!(second.error_code(), Some("CODE_ALREADY_ACTIVATED"));
}

#[tokio::test]
async fn test_expiring_window_query() {
    let app = TestApp::new();
    let soon = unique_code();
    let later = unique_code();
    let now = Utc::now();
    app.env
        .store
        .insert_code(activated_code(&soon, Some(unique_user()), now + Duration::days(3)));
    app.env
        .store
        .insert_code(activated_code(&later, Some(unique_user()), now + Duration::days(25)));

    let week = app
        .get("/api/v1/codes/expiring?days=7", Caller::Operator(OPERATOR))
        .await;
    assert_eq!(week.status, StatusCode::OK);
    assert_eq!(week.body.as_array().unwrap().len(), 1);
    assert_eq!(week.body[0]["code"], soon.as_str());

    let month = app
        .get("/api/v1/codes/expiring", Caller::Operator(OPERATOR))
        .await;
    assert_eq!(month.body.as_array().unwrap().len(), 2);

    let invalid = app
        .get("/api/v1/codes/expiring?days=0", Caller::Operator(OPERATOR))
        .await;
    assert_eq!(invalid.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_entitlement_status_reports_drift() {
    let app = TestApp::new();
    let user = unique_user();
    let raw = unique_code();
    app.env.store.insert_code(unlinked_code(&raw));
    app.env.platform.join(user);
    app.env
        .engine()
        .admin_activate(&raw, OPERATOR, Some(user))
        .await
        .unwrap();
    app.env.platform.strip_role(user, WARRANTY_ROLE);

    let response = app
        .get(
            &format!("/api/v1/users/{user}/entitlement"),
            Caller::Operator(OPERATOR),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["member"], true);
    assert_eq!(response.body["snapshot"]["has_warranty"], true);
    assert_eq!(response.body["codes"][0]["code"], raw.as_str());
    assert_eq!(response.body["discrepancies"], json!(["MISSING_WARRANTY_ROLE"]));

    let restored = app
        .post(
            &format!("/api/v1/users/{user}/restore"),
            Caller::Operator(OPERATOR),
            None,
        )
        .await;
    assert_eq!(restored.status, StatusCode::OK);
    assert_eq!(restored.body["granted"], json!(["warranty"]));

    let audit = app
        .get(&format!("/api/v1/users/{user}/audit"), Caller::Operator(OPERATOR))
        .await;
    assert_eq!(audit.body[0]["action"], "ROLES_RESTORED");
    assert_eq!(audit.body[0]["actor_kind"], "admin");
}

#[tokio::test]
async fn test_invalid_user_id_path() {
    let app = TestApp::new();

    let response = app
        .get("/api/v1/users/abc/entitlement", Caller::Operator(OPERATOR))
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.error_code(), Some("INVALID_PATH_PARAMETER"));
}

// ============================================================================
// Gateway Relay Tests
// ============================================================================

#[tokio::test]
async fn test_member_leave_and_join_relay() {
    let app = TestApp::new();
    let user = unique_user();
    let expires = Utc::now() + Duration::days(40);
    app.env
        .store
        .insert_code(activated_code(&unique_code(), Some(user), expires));
    app.env
        .store
        .insert_snapshot(snapshot(user, true, true, Some(expires)));

    let leave = app
        .post(
            &format!("/api/v1/members/{user}/leave"),
            Caller::Service,
            Some(json!({ "roles": [PREMIUM_ROLE.to_string(), WARRANTY_ROLE.to_string()] })),
        )
        .await;
    assert_eq!(leave.status, StatusCode::OK);
    assert_eq!(leave.body["recorded"], true);
    assert_eq!(leave.body["snapshot"]["has_warranty"], true);

    app.env.platform.join(user);
    let join = app
        .post(&format!("/api/v1/members/{user}/join"), Caller::Service, None)
        .await;
    assert_eq!(join.status, StatusCode::OK);
    assert_eq!(join.body["member_role_granted"], true);
    assert_eq!(join.body["roles"]["granted"], json!(["premium", "warranty"]));
    assert_eq!(join.body["welcomed"], true);
}

#[tokio::test]
async fn test_member_leave_requires_role_list() {
    let app = TestApp::new();
    let user = unique_user();
    let raw = unique_code();
    let expires = Utc::now() + Duration::days(200);
    app.env
        .store
        .insert_code(activated_code(&raw, Some(user), expires));
    app.env
        .store
        .insert_snapshot(snapshot(user, true, true, Some(expires)));
    app.env
        .platform
        .join_with_roles(user, &[PREMIUM_ROLE, WARRANTY_ROLE]);

    let leave = app
        .post(&format!("/api/v1/members/{user}/leave"), Caller::Service, None)
        .await;
    assert_eq!(leave.status, StatusCode::BAD_REQUEST);
    assert_eq!(leave.error_code(), Some("INVALID_BODY"));

    let leave = app
        .post(
            &format!("/api/v1/members/{user}/leave"),
            Caller::Service,
            Some(json!({})),
        )
        .await;
    assert_eq!(leave.status, StatusCode::BAD_REQUEST);

    let stored = app.env.store.snapshot(user).unwrap();
    assert!(stored.has_premium);
    assert!(stored.has_warranty);
    assert_eq!(stored.warranty_expires_at, Some(expires));
}

#[tokio::test]
async fn test_integrity_sweep_endpoint() {
    let app = TestApp::new();
    let user = unique_user();
    app.env.store.insert_snapshot(snapshot(
        user,
        true,
        true,
        Some(Utc::now() + Duration::days(40)),
    ));
    app.env.platform.join(user);

    let response = app
        .post("/api/v1/sweeps/integrity", Caller::Operator(OPERATOR), None)
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["checked"], 1);
    assert_eq!(response.body["repaired"], 1);
}

#[tokio::test]
async fn test_member_role_backfill_endpoint() {
    let app = TestApp::new();
    let user = unique_user();
    app.env.platform.join(user);

    let response = app
        .post("/api/v1/sweeps/member-role", Caller::Service, None)
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.error_code(), Some("MISSING_OPERATOR"));

    let response = app
        .post("/api/v1/sweeps/member-role", Caller::Operator(OPERATOR), None)
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["assigned"], 1);
    assert_eq!(response.body["bots_skipped"], 0);
    assert!(app.env.platform.has_role(user, MEMBER_ROLE));
}

//! Membership tests: departure capture, restore on rejoin, integrity sweep,
//! member role backfill
//!
//! Run with: cargo test -p integration-tests --test membership_tests

use chrono::{Duration, Utc};
use integration_tests::*;
use warranty_common::RoleConfig;
use warranty_core::{AuditAction, Notice};
use warranty_service::{RoleKind, MEMBER_PAGE_SIZE};

/// Link and activate a fresh code for `user` through the engine
async fn entitle(env: &TestEnv, user: warranty_core::Snowflake) -> String {
    let raw = unique_code();
    env.store.insert_code(unlinked_code(&raw));
    env.engine()
        .admin_activate(&raw, OPERATOR, Some(user))
        .await
        .unwrap();
    raw
}

// ============================================================================
// Leave and rejoin
// ============================================================================

#[tokio::test]
async fn test_rejoin_restores_roles_from_snapshot() {
    let env = TestEnv::new();
    let user = unique_user();
    env.platform.join(user);
    entitle(&env, user).await;
    assert!(env.platform.has_role(user, PREMIUM_ROLE));
    assert!(env.platform.has_role(user, WARRANTY_ROLE));

    let roles_at_departure = env.platform.leave(user);
    let recorded = env
        .reconciler()
        .on_member_leave(user, &roles_at_departure, Utc::now())
        .await
        .unwrap()
        .unwrap();
    assert!(recorded.has_premium);
    assert!(recorded.has_warranty);

    env.platform.join(user);
    let outcome = env.reconciler().on_member_join(user, Utc::now()).await.unwrap();

    assert!(outcome.member_role_granted);
    assert!(!outcome.warranty_expired);
    assert_eq!(outcome.roles.granted, vec![RoleKind::Premium, RoleKind::Warranty]);
    assert!(outcome.welcomed);
    assert!(env.platform.has_role(user, MEMBER_ROLE));
    assert!(env.platform.has_role(user, PREMIUM_ROLE));
    assert!(env.platform.has_role(user, WARRANTY_ROLE));

    let welcome = env.notifier.sent_to(user).pop().unwrap();
    assert_eq!(
        welcome,
        Notice::WelcomeBack {
            premium: true,
            warranty_expires_at: recorded.warranty_expires_at,
        }
    );

    let actions = env.store.actions_for(user);
    assert_eq!(
        actions[actions.len() - 2..],
        [AuditAction::UserLeft, AuditAction::RolesRestored]
    );
}

#[tokio::test]
async fn test_warranty_lapsed_while_away_restores_premium_only() {
    let env = TestEnv::new();
    let user = unique_user();
    let expired = Utc::now() - Duration::days(3);
    env.store
        .insert_code(activated_code(&unique_code(), Some(user), expired));
    env.store.insert_snapshot(snapshot(user, true, true, Some(expired)));
    env.platform.join(user);

    let outcome = env.reconciler().on_member_join(user, Utc::now()).await.unwrap();

    assert!(outcome.warranty_expired);
    assert_eq!(outcome.roles.granted, vec![RoleKind::Premium]);
    assert!(!env.platform.has_role(user, WARRANTY_ROLE));
    assert!(!env.store.snapshot(user).unwrap().has_warranty);
    assert_eq!(
        env.store.actions_for(user),
        vec![AuditAction::WarrantyExpired, AuditAction::RolesRestored]
    );
    assert_eq!(
        env.notifier.sent_to(user),
        vec![Notice::WelcomeBack {
            premium: true,
            warranty_expires_at: None,
        }]
    );
}

#[tokio::test]
async fn test_join_without_history_grants_member_role_only() {
    let env = TestEnv::new();
    let user = unique_user();
    env.platform.join(user);

    let outcome = env.reconciler().on_member_join(user, Utc::now()).await.unwrap();

    assert!(outcome.member_role_granted);
    assert!(outcome.snapshot.is_none());
    assert!(outcome.roles.granted.is_empty());
    assert!(!outcome.welcomed);
    assert_eq!(env.platform.roles_of(user), Some(vec![MEMBER_ROLE]));
    assert!(env.notifier.sent().is_empty());
    assert!(env.store.audit_entries().is_empty());
}

#[tokio::test]
async fn test_duplicate_join_event_is_harmless() {
    let env = TestEnv::new();
    let user = unique_user();
    env.platform.join(user);
    entitle(&env, user).await;

    let outcome = env.reconciler().on_member_join(user, Utc::now()).await.unwrap();

    assert!(outcome.roles.granted.is_empty());
    assert!(!outcome.welcomed);
    assert_eq!(env.store.count_actions(AuditAction::RolesRestored), 0);
    assert_eq!(env.platform.grant_count(user, PREMIUM_ROLE), 1);
}

#[tokio::test]
async fn test_leave_without_roles_or_history_records_nothing() {
    let env = TestEnv::new();
    let user = unique_user();

    let recorded = env
        .reconciler()
        .on_member_leave(user, &[MEMBER_ROLE], Utc::now())
        .await
        .unwrap();

    assert!(recorded.is_none());
    assert!(env.store.snapshot(user).is_none());
    assert!(env.store.audit_entries().is_empty());
}

#[tokio::test]
async fn test_leave_keeps_known_expiry() {
    let env = TestEnv::new();
    let user = unique_user();
    let expires = Utc::now() + Duration::days(90);
    let raw = unique_code();
    env.store.insert_code(activated_code(&raw, Some(user), expires));
    env.store.insert_snapshot(snapshot(user, true, true, Some(expires)));

    // An operator had stripped the warranty role before the user left
    let recorded = env
        .reconciler()
        .on_member_leave(user, &[PREMIUM_ROLE], Utc::now())
        .await
        .unwrap()
        .unwrap();

    assert!(recorded.has_premium);
    assert!(!recorded.has_warranty);
    assert_eq!(recorded.warranty_expires_at, Some(expires));

    let entry = env.store.audit_entries().pop().unwrap();
    assert_eq!(entry.action, AuditAction::UserLeft);
    assert_eq!(entry.detail, "premium=true, warranty=false");

    // The code still shows an active warranty, but the rejoin follows what was held
    env.platform.join(user);
    let outcome = env
        .reconciler()
        .on_member_join(user, Utc::now())
        .await
        .unwrap();

    assert!(!outcome.warranty_expired);
    assert_eq!(outcome.roles.granted, vec![RoleKind::Premium]);
    assert!(env.platform.has_role(user, PREMIUM_ROLE));
    assert!(!env.platform.has_role(user, WARRANTY_ROLE));
    assert_eq!(env.store.count_actions(AuditAction::WarrantyExpired), 0);
    assert!(env.store.code(&raw).unwrap().warranty_activated);
}

#[tokio::test]
async fn test_unconfigured_role_keeps_stored_flag_on_leave() {
    let env = TestEnv::with_roles(RoleConfig {
        premium: Some(PREMIUM_ROLE),
        warranty: None,
        member: None,
    });
    let user = unique_user();
    let expires = Utc::now() + Duration::days(90);
    env.store.insert_snapshot(snapshot(user, true, true, Some(expires)));

    let recorded = env
        .reconciler()
        .on_member_leave(user, &[PREMIUM_ROLE], Utc::now())
        .await
        .unwrap()
        .unwrap();

    assert!(recorded.has_premium);
    assert!(recorded.has_warranty);
}

#[tokio::test]
async fn test_join_during_platform_outage_reports_failures() {
    let env = TestEnv::new();
    let user = unique_user();
    env.store.insert_snapshot(snapshot(
        user,
        true,
        true,
        Some(Utc::now() + Duration::days(30)),
    ));
    env.platform.join(user);
    env.platform.set_unavailable(true);

    let outcome = env.reconciler().on_member_join(user, Utc::now()).await.unwrap();

    assert!(!outcome.member_role_granted);
    assert!(!outcome.roles.is_complete());
    assert_eq!(outcome.roles.failed, vec![RoleKind::Premium, RoleKind::Warranty]);
    assert!(!outcome.welcomed);
    assert_eq!(env.store.count_actions(AuditAction::RolesRestored), 0);
    // The durable entitlement is untouched
    assert!(env.store.snapshot(user).unwrap().has_warranty);
}

#[tokio::test]
async fn test_join_fails_when_store_is_down() {
    let env = TestEnv::new();
    let user = unique_user();
    env.platform.join(user);
    env.store.fail_next("find", 1);

    let err = env
        .reconciler()
        .on_member_join(user, Utc::now())
        .await
        .unwrap_err();

    assert!(err.is_transient());
}

// ============================================================================
// Integrity sweep
// ============================================================================

#[tokio::test]
async fn test_integrity_sweep_repairs_missing_roles() {
    let env = TestEnv::new();
    let expires = Utc::now() + Duration::days(120);

    let stripped = unique_user();
    env.store.insert_snapshot(snapshot(stripped, true, true, Some(expires)));
    env.platform.join_with_roles(stripped, &[PREMIUM_ROLE]);

    let intact = unique_user();
    env.store.insert_snapshot(snapshot(intact, true, true, Some(expires)));
    env.platform
        .join_with_roles(intact, &[PREMIUM_ROLE, WARRANTY_ROLE]);

    let departed = unique_user();
    env.store.insert_snapshot(snapshot(departed, true, true, Some(expires)));

    let lapsed = unique_user();
    env.store.insert_snapshot(snapshot(
        lapsed,
        true,
        true,
        Some(Utc::now() - Duration::days(1)),
    ));
    env.platform.join(lapsed);

    let report = env.reconciler().sweep_guild(Utc::now()).await.unwrap();

    assert_eq!(report.checked, 3);
    assert_eq!(report.repaired, 1);
    assert_eq!(report.not_members, 1);
    assert_eq!(report.failures, 0);
    assert!(env.platform.has_role(stripped, WARRANTY_ROLE));
    // Sweeps only grant what is still running
    assert_eq!(env.platform.roles_of(lapsed), Some(vec![]));
    assert_eq!(env.store.actions_for(stripped), vec![AuditAction::RolesRestored]);

    let again = env.reconciler().sweep_guild(Utc::now()).await.unwrap();
    assert_eq!(again.repaired, 0);
    assert_eq!(env.store.count_actions(AuditAction::RolesRestored), 1);
}

#[tokio::test]
async fn test_integrity_sweep_counts_refused_grants() {
    let env = TestEnv::new();
    let user = unique_user();
    env.store.insert_snapshot(snapshot(
        user,
        true,
        true,
        Some(Utc::now() + Duration::days(10)),
    ));
    env.platform.join(user);
    env.platform.set_reject_grants(true);

    let report = env.reconciler().sweep_guild(Utc::now()).await.unwrap();

    assert_eq!(report.checked, 1);
    assert_eq!(report.repaired, 0);
    assert_eq!(report.failures, 1);
}

// ============================================================================
// Member role backfill
// ============================================================================

#[tokio::test]
async fn test_member_role_backfill_skips_bots_and_holders() {
    let env = TestEnv::new();
    let newcomer = unique_user();
    let holder = unique_user();
    let bot = unique_user();
    env.platform.join_with_roles(newcomer, &[PREMIUM_ROLE]);
    env.platform.join_with_roles(holder, &[MEMBER_ROLE]);
    env.platform.join_bot(bot);

    let report = env
        .reconciler()
        .assign_member_role_to_all(OPERATOR)
        .await
        .unwrap();

    assert_eq!(report.assigned, 1);
    assert_eq!(report.already_held, 1);
    assert_eq!(report.bots_skipped, 1);
    assert_eq!(report.failures, 0);
    assert_eq!(
        env.platform.roles_of(newcomer),
        Some(vec![PREMIUM_ROLE, MEMBER_ROLE])
    );
    assert!(!env.platform.has_role(bot, MEMBER_ROLE));
    assert_eq!(env.platform.grant_count(holder, MEMBER_ROLE), 0);
}

#[tokio::test]
async fn test_member_role_backfill_walks_every_page() {
    let env = TestEnv::new();
    let total = usize::from(MEMBER_PAGE_SIZE) + 3;
    for _ in 0..total {
        env.platform.join(unique_user());
    }

    let report = env
        .reconciler()
        .assign_member_role_to_all(OPERATOR)
        .await
        .unwrap();

    assert_eq!(report.assigned, total);
    let pages = env
        .platform
        .calls()
        .into_iter()
        .filter(|c| matches!(c, PlatformCall::ListMembers(_)))
        .count();
    assert_eq!(pages, 2);
}

#[tokio::test]
async fn test_member_role_backfill_needs_role_and_platform() {
    let env = TestEnv::with_roles(RoleConfig {
        premium: Some(PREMIUM_ROLE),
        warranty: Some(WARRANTY_ROLE),
        member: None,
    });
    let err = env
        .reconciler()
        .assign_member_role_to_all(OPERATOR)
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "VALIDATION_ERROR");

    let env = TestEnv::new();
    env.platform.set_unavailable(true);
    let err = env
        .reconciler()
        .assign_member_role_to_all(OPERATOR)
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "EXTERNAL_SERVICE_ERROR");
}

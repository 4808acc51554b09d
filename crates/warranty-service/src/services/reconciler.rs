//! Role reconciler
//!
//! Pushes the durable entitlement snapshot outward onto the platform role
//! surface. Grants are idempotent and never remove anything; the only removal
//! path is `revoke_warranty`, driven by the expiry sweep. Platform failures are
//! logged and reported in the returned structs, never propagated: the next
//! join or sweep converges the drift.

use chrono::{DateTime, Utc};
use tracing::{info, instrument, warn};
use warranty_common::{AppError, RoleConfig};
use warranty_core::entities::{Actor, AuditAction, EntitlementSnapshot, NewAuditEntry, Notice};
use warranty_core::Snowflake;

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};

/// Members requested per listing page
pub const MEMBER_PAGE_SIZE: u16 = 1000;

/// A role managed by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoleKind {
    /// Default role granted on every join, not entitlement-gated
    Member,
    Premium,
    Warranty,
}

impl RoleKind {
    /// Configured platform role id, if any
    pub fn role_id(&self, roles: &RoleConfig) -> Option<Snowflake> {
        match self {
            Self::Member => roles.member,
            Self::Premium => roles.premium,
            Self::Warranty => roles.warranty,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Member => "member",
            Self::Premium => "premium",
            Self::Warranty => "warranty",
        }
    }
}

/// Result of pushing one snapshot onto the platform
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleApplication {
    /// Whether the user was found in the community
    pub member: bool,
    pub granted: Vec<RoleKind>,
    /// Roles that should have been granted but the platform call failed
    pub failed: Vec<RoleKind>,
}

impl RoleApplication {
    pub fn granted(&self, kind: RoleKind) -> bool {
        self.granted.contains(&kind)
    }

    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Result of handling a member join
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinOutcome {
    pub user_id: Snowflake,
    pub member_role_granted: bool,
    /// A lapsed warranty flag was cleared instead of restoring the role
    pub warranty_expired: bool,
    pub snapshot: Option<EntitlementSnapshot>,
    pub roles: RoleApplication,
    pub welcomed: bool,
}

/// Result of removing the warranty role from one user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleRevocation {
    Removed,
    NotHeld,
    NotMember,
    NotConfigured,
    Failed,
}

/// Totals from one integrity sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub checked: usize,
    pub repaired: usize,
    pub not_members: usize,
    pub failures: usize,
}

/// Totals from granting the member role across the whole community
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemberRoleReport {
    pub assigned: usize,
    pub already_held: usize,
    pub bots_skipped: usize,
    pub failures: usize,
}

/// Role reconciler
pub struct RoleReconciler<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> RoleReconciler<'a> {
    /// Create a new RoleReconciler
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Grant the entitled roles the member does not hold yet
    pub async fn apply_snapshot(
        &self,
        snapshot: &EntitlementSnapshot,
        now: DateTime<Utc>,
    ) -> RoleApplication {
        let user_id = snapshot.user_id;
        let entitled = snapshot.entitled_roles(now);

        let mut wanted = Vec::with_capacity(2);
        if entitled.premium {
            wanted.push(RoleKind::Premium);
        }
        if entitled.warranty {
            wanted.push(RoleKind::Warranty);
        }

        let held = match self.ctx.platform().member_roles(user_id).await {
            Ok(Some(held)) => held,
            Ok(None) => return RoleApplication::default(),
            Err(e) => {
                warn!(error = %e, user_id = %user_id, "Member lookup failed, roles not applied");
                return RoleApplication {
                    member: false,
                    granted: Vec::new(),
                    failed: wanted,
                };
            }
        };

        let mut application = RoleApplication {
            member: true,
            ..RoleApplication::default()
        };

        for kind in wanted {
            let Some(role_id) = kind.role_id(self.ctx.roles()) else {
                continue;
            };
            if held.contains(&role_id) {
                continue;
            }
            match self.ctx.platform().add_role(user_id, role_id).await {
                Ok(()) => application.granted.push(kind),
                Err(e) => {
                    warn!(error = %e, user_id = %user_id, role = kind.as_str(), "Role grant failed");
                    application.failed.push(kind);
                }
            }
        }

        application
    }

    /// Handle a user (re)joining the community
    #[instrument(skip(self))]
    pub async fn on_member_join(
        &self,
        user_id: Snowflake,
        now: DateTime<Utc>,
    ) -> ServiceResult<JoinOutcome> {
        let member_role_granted = self.grant_member_role(user_id).await;

        let snapshot = self
            .ctx
            .store("find snapshot", self.ctx.entitlement_repo().find(user_id))
            .await?;

        let Some(mut snapshot) = snapshot else {
            return Ok(JoinOutcome {
                user_id,
                member_role_granted,
                warranty_expired: false,
                snapshot: None,
                roles: RoleApplication::default(),
                welcomed: false,
            });
        };

        let mut warranty_expired = false;
        if snapshot.is_warranty_stale(now) {
            let cleared = self
                .ctx
                .store(
                    "clear warranty",
                    self.ctx.entitlement_repo().clear_warranty(user_id, now),
                )
                .await?;
            snapshot.has_warranty = false;
            if cleared {
                warranty_expired = true;
                self.ctx
                    .record(
                        NewAuditEntry::new(AuditAction::WarrantyExpired, Actor::System)
                            .user(user_id)
                            .detail("warranty lapsed while away"),
                    )
                    .await;
            }
        }

        let roles = self.apply_snapshot(&snapshot, now).await;

        let mut welcomed = false;
        if roles.granted(RoleKind::Premium) || roles.granted(RoleKind::Warranty) {
            self.ctx
                .record(
                    NewAuditEntry::new(AuditAction::RolesRestored, Actor::System)
                        .user(user_id)
                        .detail(format!("restored on join: {}", describe(&roles.granted))),
                )
                .await;

            let notice = Notice::WelcomeBack {
                premium: roles.granted(RoleKind::Premium),
                warranty_expires_at: roles
                    .granted(RoleKind::Warranty)
                    .then_some(snapshot.warranty_expires_at)
                    .flatten(),
            };
            welcomed = self.ctx.notify(user_id, &notice).await;
            info!(user_id = %user_id, "Roles restored on join");
        }

        Ok(JoinOutcome {
            user_id,
            member_role_granted,
            warranty_expired,
            snapshot: Some(snapshot),
            roles,
            welcomed,
        })
    }

    /// Capture what the platform showed at departure
    ///
    /// Returns `None` when the user held no managed role and had no snapshot.
    #[instrument(skip(self, roles_at_departure))]
    pub async fn on_member_leave(
        &self,
        user_id: Snowflake,
        roles_at_departure: &[Snowflake],
        now: DateTime<Utc>,
    ) -> ServiceResult<Option<EntitlementSnapshot>> {
        let existing = self
            .ctx
            .store("find snapshot", self.ctx.entitlement_repo().find(user_id))
            .await?;

        let roles = self.ctx.roles();
        // An unconfigured role cannot be observed; keep what was stored
        let held = |role: Option<Snowflake>, stored: fn(&EntitlementSnapshot) -> bool| match role {
            Some(role_id) => roles_at_departure.contains(&role_id),
            None => existing.as_ref().is_some_and(stored),
        };
        let had_premium = held(roles.premium, |s| s.has_premium);
        let had_warranty = held(roles.warranty, |s| s.has_warranty);

        if existing.is_none() && !had_premium && !had_warranty {
            return Ok(None);
        }

        let snapshot = self
            .ctx
            .store(
                "record departure",
                self.ctx
                    .entitlement_repo()
                    .record_departure(user_id, had_premium, had_warranty, now),
            )
            .await?;

        self.ctx
            .record(
                NewAuditEntry::new(AuditAction::UserLeft, Actor::System)
                    .user(user_id)
                    .detail(format!("premium={had_premium}, warranty={had_warranty}")),
            )
            .await;

        info!(user_id = %user_id, had_premium, had_warranty, "Departure recorded");
        Ok(Some(snapshot))
    }

    /// Remove the warranty role; the premium role is independent and kept
    #[instrument(skip(self))]
    pub async fn revoke_warranty(&self, user_id: Snowflake) -> RoleRevocation {
        let Some(role_id) = self.ctx.roles().warranty else {
            return RoleRevocation::NotConfigured;
        };

        let held = match self.ctx.platform().member_roles(user_id).await {
            Ok(Some(held)) => held,
            Ok(None) => return RoleRevocation::NotMember,
            Err(e) => {
                warn!(error = %e, user_id = %user_id, "Member lookup failed, warranty role kept");
                return RoleRevocation::Failed;
            }
        };

        if !held.contains(&role_id) {
            return RoleRevocation::NotHeld;
        }

        match self.ctx.platform().remove_role(user_id, role_id).await {
            Ok(()) => RoleRevocation::Removed,
            Err(e) => {
                warn!(error = %e, user_id = %user_id, "Warranty role removal failed");
                RoleRevocation::Failed
            }
        }
    }

    /// Repair missing roles for every user with an active warranty
    #[instrument(skip(self))]
    pub async fn sweep_guild(&self, now: DateTime<Utc>) -> ServiceResult<SweepReport> {
        let snapshots = self
            .ctx
            .store(
                "find active warranties",
                self.ctx.entitlement_repo().find_active_warranties(now),
            )
            .await?;

        let mut report = SweepReport::default();
        for snapshot in &snapshots {
            report.checked += 1;
            let roles = self.apply_snapshot(snapshot, now).await;

            if !roles.is_complete() {
                report.failures += 1;
            } else if !roles.member {
                report.not_members += 1;
            }

            if !roles.granted.is_empty() {
                report.repaired += 1;
                self.ctx
                    .record(
                        NewAuditEntry::new(AuditAction::RolesRestored, Actor::System)
                            .user(snapshot.user_id)
                            .detail(format!("integrity sweep: {}", describe(&roles.granted))),
                    )
                    .await;
            }
        }

        info!(
            checked = report.checked,
            repaired = report.repaired,
            not_members = report.not_members,
            failures = report.failures,
            "Integrity sweep finished"
        );
        Ok(report)
    }

    /// Grant the member role to every human member who lacks it
    ///
    /// Backfill for members who joined before the role was configured. Bots
    /// are left alone; a failed grant is counted and the pass continues.
    #[instrument(skip(self))]
    pub async fn assign_member_role_to_all(
        &self,
        admin_id: Snowflake,
    ) -> ServiceResult<MemberRoleReport> {
        let Some(role_id) = RoleKind::Member.role_id(self.ctx.roles()) else {
            return Err(ServiceError::validation("member role is not configured"));
        };

        let mut report = MemberRoleReport::default();
        let mut after = None;
        loop {
            let page = self
                .ctx
                .platform()
                .list_members(after, MEMBER_PAGE_SIZE)
                .await
                .map_err(|e| AppError::ExternalService(format!("Failed to list members: {e}")))?;

            for member in &page {
                if member.bot {
                    report.bots_skipped += 1;
                } else if member.roles.contains(&role_id) {
                    report.already_held += 1;
                } else {
                    match self.ctx.platform().add_role(member.user_id, role_id).await {
                        Ok(()) => report.assigned += 1,
                        Err(e) => {
                            warn!(error = %e, user_id = %member.user_id, "Member role grant failed");
                            report.failures += 1;
                        }
                    }
                }
            }

            if page.len() < usize::from(MEMBER_PAGE_SIZE) {
                break;
            }
            after = page.last().map(|m| m.user_id);
        }

        info!(
            admin_id = %admin_id,
            assigned = report.assigned,
            already_held = report.already_held,
            bots_skipped = report.bots_skipped,
            failures = report.failures,
            "Member role backfill finished"
        );
        Ok(report)
    }

    async fn grant_member_role(&self, user_id: Snowflake) -> bool {
        let Some(role_id) = RoleKind::Member.role_id(self.ctx.roles()) else {
            return false;
        };
        match self.ctx.platform().add_role(user_id, role_id).await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, user_id = %user_id, "Member role grant failed");
                false
            }
        }
    }
}

pub(crate) fn describe(kinds: &[RoleKind]) -> String {
    kinds
        .iter()
        .map(RoleKind::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

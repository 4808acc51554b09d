//! Activation engine
//!
//! The only writer of code records. Each operation follows the same order:
//! conditional store write, snapshot refresh, role reconciliation, audit entry.
//! Nothing past the store write is attempted when that write fails.

use chrono::{DateTime, Utc};
use tracing::{error, info, instrument, warn};
use warranty_common::AppError;
use warranty_core::entities::{Actor, AuditAction, Code, EntitlementSnapshot, NewAuditEntry, Notice};
use warranty_core::{CodeValue, DomainError, Snowflake};

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};
use super::reconciler::{describe, RoleApplication, RoleReconciler};

/// Maximum days a single extension may add
pub const MAX_EXTENSION_DAYS: i64 = 3650;

/// Result of a code lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeValidation {
    pub value: CodeValue,
    pub already_linked: bool,
    pub warranty_activated: bool,
}

/// Result of linking a code to a user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkResult {
    pub code: Code,
    /// False when the code was already linked to the same user
    pub newly_linked: bool,
    /// The code was activated before the link; the user takes over its term
    pub inherited_warranty: bool,
    pub roles: RoleApplication,
}

/// Result of an operator activation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivationResult {
    pub code: Code,
    /// The activation also bound the supplied user
    pub newly_linked: bool,
    /// Present only when a user is bound to the code
    pub roles: Option<RoleApplication>,
    pub notified: bool,
}

/// Result of creating a code, with the optional follow-up step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedCode {
    pub code: Code,
    pub link: Option<LinkResult>,
    pub activation: Option<ActivationResult>,
}

/// Activation engine
pub struct ActivationEngine<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> ActivationEngine<'a> {
    /// Create a new ActivationEngine
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    fn reconciler(&self) -> RoleReconciler<'a> {
        RoleReconciler::new(self.ctx)
    }

    /// Look a code up without changing it
    #[instrument(skip(self))]
    pub async fn validate(&self, raw: &str) -> ServiceResult<CodeValidation> {
        let value = parse_code(raw)?;
        let code = self.find_code(&value).await?;

        Ok(CodeValidation {
            value: code.value,
            already_linked: code.is_used,
            warranty_activated: code.warranty_activated,
        })
    }

    /// Redeem a code for the submitting user
    #[instrument(skip(self))]
    pub async fn redeem(&self, raw: &str, user_id: Snowflake) -> ServiceResult<LinkResult> {
        let value = parse_code(raw)?;
        self.link(&value, user_id, Actor::User(user_id)).await
    }

    /// Link a code on a buyer's behalf
    #[instrument(skip(self))]
    pub async fn assign(
        &self,
        raw: &str,
        user_id: Snowflake,
        admin_id: Snowflake,
    ) -> ServiceResult<LinkResult> {
        let value = parse_code(raw)?;
        self.link(&value, user_id, Actor::Admin(admin_id)).await
    }

    /// Activate the warranty on a code, optionally binding a user in the same step
    #[instrument(skip(self))]
    pub async fn admin_activate(
        &self,
        raw: &str,
        admin_id: Snowflake,
        user_id: Option<Snowflake>,
    ) -> ServiceResult<ActivationResult> {
        let value = parse_code(raw)?;
        self.activate(&value, admin_id, user_id).await
    }

    /// Push a code's expiry out by `days`; `reason` lands in the audit detail
    #[instrument(skip(self))]
    pub async fn extend(
        &self,
        raw: &str,
        days: i64,
        admin_id: Snowflake,
        reason: Option<&str>,
    ) -> ServiceResult<Code> {
        if !(1..=MAX_EXTENSION_DAYS).contains(&days) {
            return Err(ServiceError::validation(format!(
                "days must be between 1 and {MAX_EXTENSION_DAYS}"
            )));
        }
        let value = parse_code(raw)?;

        let code = self
            .ctx
            .store("extend warranty", self.ctx.code_repo().extend(&value, days))
            .await?;

        // The new term gets its own reminders
        if let Err(e) = self
            .ctx
            .store(
                "clear reminder claims",
                self.ctx.reminder_repo().clear_for_code(&value),
            )
            .await
        {
            warn!(error = %e, code = %value, "Failed to clear reminder claims");
        }

        let now = Utc::now();
        let mut sync_error = None;
        if let Some(user_id) = code.user_id {
            match self.sync(user_id, now).await {
                Ok(Some(snapshot)) => {
                    self.reconciler().apply_snapshot(&snapshot, now).await;
                }
                Ok(None) => {}
                Err(e) => sync_error = Some(e),
            }
        }

        let expires = code
            .warranty_expires_at
            .map(|exp| exp.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        let mut detail = format!("+{days} days, expires {expires}");
        if let Some(reason) = reason.map(str::trim).filter(|r| !r.is_empty()) {
            detail.push_str(&format!(": {reason}"));
        }
        self.ctx
            .record(
                NewAuditEntry::new(AuditAction::Extend, Actor::Admin(admin_id))
                    .maybe_user(code.user_id)
                    .code(value.as_str())
                    .detail(detail),
            )
            .await;

        if let Some(e) = sync_error {
            return Err(e);
        }

        info!(code = %value, days, "Warranty extended");
        Ok(code)
    }

    /// Create a code, then optionally assign and/or activate it
    #[instrument(skip(self, product_info))]
    pub async fn create_code(
        &self,
        raw: Option<&str>,
        product_info: Option<String>,
        assign_to: Option<Snowflake>,
        activate_warranty: bool,
        admin_id: Snowflake,
    ) -> ServiceResult<CreatedCode> {
        let value = match raw {
            Some(raw) => parse_code(raw)?,
            None => CodeValue::generate(),
        };

        let code = Code::new(value.clone(), product_info);
        self.ctx
            .store("create code", self.ctx.code_repo().create(&code))
            .await?;

        self.ctx
            .record(
                NewAuditEntry::new(AuditAction::CodeCreated, Actor::Admin(admin_id))
                    .code(value.as_str())
                    .detail(code.product_info.clone().unwrap_or_default()),
            )
            .await;

        info!(code = %value, "Code created");

        if activate_warranty {
            let activation = self.activate(&value, admin_id, assign_to).await?;
            return Ok(CreatedCode {
                code: activation.code.clone(),
                link: None,
                activation: Some(activation),
            });
        }

        if let Some(user_id) = assign_to {
            let link = self.link(&value, user_id, Actor::Admin(admin_id)).await?;
            return Ok(CreatedCode {
                code: link.code.clone(),
                link: Some(link),
                activation: None,
            });
        }

        Ok(CreatedCode {
            code,
            link: None,
            activation: None,
        })
    }

    /// Re-derive a member's snapshot from their codes and reapply roles
    #[instrument(skip(self))]
    pub async fn force_restore(
        &self,
        user_id: Snowflake,
        admin_id: Snowflake,
    ) -> ServiceResult<RoleApplication> {
        match self.ctx.platform().member_roles(user_id).await {
            Ok(Some(_)) => {}
            Ok(None) => return Err(ServiceError::not_found("Member", user_id.to_string())),
            Err(e) => return Err(AppError::ExternalService(e.to_string()).into()),
        }

        let now = Utc::now();
        let snapshot = self
            .sync(user_id, now)
            .await?
            .ok_or_else(|| ServiceError::not_found("Entitlement", user_id.to_string()))?;

        let roles = self.reconciler().apply_snapshot(&snapshot, now).await;

        if !roles.granted.is_empty() {
            self.ctx
                .record(
                    NewAuditEntry::new(AuditAction::RolesRestored, Actor::Admin(admin_id))
                        .user(user_id)
                        .detail(format!("forced restore: {}", describe(&roles.granted))),
                )
                .await;
        }

        Ok(roles)
    }

    async fn find_code(&self, value: &CodeValue) -> ServiceResult<Code> {
        self.ctx
            .store("find code", self.ctx.code_repo().find_by_value(value))
            .await?
            .ok_or_else(|| DomainError::CodeNotFound(value.to_string()).into())
    }

    async fn sync(
        &self,
        user_id: Snowflake,
        now: DateTime<Utc>,
    ) -> ServiceResult<Option<EntitlementSnapshot>> {
        let result = self
            .ctx
            .store(
                "sync entitlement",
                self.ctx.entitlement_repo().sync_from_codes(user_id, now),
            )
            .await;
        if let Err(e) = &result {
            error!(error = %e, user_id = %user_id, "Entitlement refresh failed after committed write");
        }
        result
    }

    async fn link(
        &self,
        value: &CodeValue,
        user_id: Snowflake,
        actor: Actor,
    ) -> ServiceResult<LinkResult> {
        let now = Utc::now();
        let outcome = self
            .ctx
            .store("link code", self.ctx.code_repo().link(value, user_id, now))
            .await?;

        let synced = self.sync(user_id, now).await;
        let roles = match &synced {
            Ok(Some(snapshot)) => self.reconciler().apply_snapshot(snapshot, now).await,
            _ => RoleApplication::default(),
        };

        if outcome.newly_linked {
            let detail = match outcome.warranty_expires_at() {
                Some(exp) if outcome.inherits_warranty() => {
                    format!("linked, inherits warranty until {}", exp.format("%Y-%m-%d"))
                }
                _ => "linked".to_string(),
            };
            self.ctx
                .record(
                    NewAuditEntry::new(AuditAction::CodeLinked, actor)
                        .user(user_id)
                        .code(value.as_str())
                        .detail(detail),
                )
                .await;
            info!(code = %value, user_id = %user_id, "Code linked");
        }

        // The link stands; a retry by the same user is idempotent and refreshes
        synced?;

        Ok(LinkResult {
            inherited_warranty: outcome.inherits_warranty(),
            newly_linked: outcome.newly_linked,
            code: outcome.code,
            roles,
        })
    }

    async fn activate(
        &self,
        value: &CodeValue,
        admin_id: Snowflake,
        user_id: Option<Snowflake>,
    ) -> ServiceResult<ActivationResult> {
        let now = Utc::now();
        let outcome = self
            .ctx
            .store(
                "activate warranty",
                self.ctx.code_repo().activate(value, admin_id, user_id, now),
            )
            .await?;

        let bound = outcome.code.user_id;
        let mut roles = None;
        let mut notified = false;
        let mut sync_error = None;

        if let Some(user_id) = bound {
            match self.sync(user_id, now).await {
                Ok(Some(snapshot)) => {
                    roles = Some(self.reconciler().apply_snapshot(&snapshot, now).await);
                }
                Ok(None) => roles = Some(RoleApplication::default()),
                Err(e) => sync_error = Some(e),
            }

            if let Some(expires_at) = outcome.code.warranty_expires_at {
                let notice = Notice::WarrantyActivated {
                    code: value.to_string(),
                    expires_at,
                };
                notified = self.ctx.notify(user_id, &notice).await;
            }
        }

        let mut detail = match outcome.code.warranty_expires_at {
            Some(exp) => format!("expires {}", exp.format("%Y-%m-%d")),
            None => String::new(),
        };
        if outcome.newly_linked {
            detail.push_str("; linked in the same step");
        } else if bound.is_none() {
            detail.push_str("; no user bound");
        }
        self.ctx
            .record(
                NewAuditEntry::new(AuditAction::Activate, Actor::Admin(admin_id))
                    .maybe_user(bound)
                    .code(value.as_str())
                    .detail(detail),
            )
            .await;

        if let Some(e) = sync_error {
            return Err(e);
        }

        info!(code = %value, user_id = ?bound, "Warranty activated");
        Ok(ActivationResult {
            code: outcome.code,
            newly_linked: outcome.newly_linked,
            roles,
            notified,
        })
    }
}

fn parse_code(raw: &str) -> ServiceResult<CodeValue> {
    CodeValue::parse(raw).map_err(|e| DomainError::from(e).into())
}

//! Service context - dependency container for services
//!
//! Holds the repositories, the membership platform ports and the injected
//! configuration. Also provides the bounded store round trip and the
//! best-effort side effects (audit append, direct message) shared by every
//! service.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, warn};
use warranty_common::{AppConfig, RoleConfig};
use warranty_core::entities::{NewAuditEntry, Notice};
use warranty_core::traits::{
    AuditLogRepository, CodeRepository, EntitlementRepository, MembershipPlatform, Notifier,
    ReminderRepository, RepoResult,
};
use warranty_core::{DomainError, Snowflake};
use warranty_db::{
    PgAuditLogRepository, PgCodeRepository, PgEntitlementRepository, PgPool, PgReminderRepository,
};

use super::error::{ServiceError, ServiceResult};

/// Service context containing all dependencies
#[derive(Clone)]
pub struct ServiceContext {
    // Repositories
    code_repo: Arc<dyn CodeRepository>,
    entitlement_repo: Arc<dyn EntitlementRepository>,
    audit_repo: Arc<dyn AuditLogRepository>,
    reminder_repo: Arc<dyn ReminderRepository>,

    // Platform
    platform: Arc<dyn MembershipPlatform>,
    notifier: Arc<dyn Notifier>,

    // Settings
    roles: RoleConfig,
    store_timeout: Duration,
}

impl ServiceContext {
    /// Create a new service context with all dependencies
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        code_repo: Arc<dyn CodeRepository>,
        entitlement_repo: Arc<dyn EntitlementRepository>,
        audit_repo: Arc<dyn AuditLogRepository>,
        reminder_repo: Arc<dyn ReminderRepository>,
        platform: Arc<dyn MembershipPlatform>,
        notifier: Arc<dyn Notifier>,
        roles: RoleConfig,
        store_timeout: Duration,
    ) -> Self {
        Self {
            code_repo,
            entitlement_repo,
            audit_repo,
            reminder_repo,
            platform,
            notifier,
            roles,
            store_timeout,
        }
    }

    // === Repositories ===

    /// Get the code repository
    pub fn code_repo(&self) -> &dyn CodeRepository {
        self.code_repo.as_ref()
    }

    /// Get the entitlement snapshot repository
    pub fn entitlement_repo(&self) -> &dyn EntitlementRepository {
        self.entitlement_repo.as_ref()
    }

    /// Get the audit log repository
    pub fn audit_repo(&self) -> &dyn AuditLogRepository {
        self.audit_repo.as_ref()
    }

    /// Get the reminder repository
    pub fn reminder_repo(&self) -> &dyn ReminderRepository {
        self.reminder_repo.as_ref()
    }

    // === Platform ===

    /// Get the membership platform
    pub fn platform(&self) -> &dyn MembershipPlatform {
        self.platform.as_ref()
    }

    /// Get the direct-message notifier
    pub fn notifier(&self) -> &dyn Notifier {
        self.notifier.as_ref()
    }

    // === Settings ===

    /// Managed role identifiers
    pub fn roles(&self) -> &RoleConfig {
        &self.roles
    }

    /// Upper bound for a single store round trip
    pub fn store_timeout(&self) -> Duration {
        self.store_timeout
    }

    // === Shared helpers ===

    /// Run one store operation under the configured timeout
    ///
    /// An elapsed timeout is reported as `TransientStoreFailure`; the
    /// operation is not retried.
    pub async fn store<T, F>(&self, operation: &'static str, fut: F) -> ServiceResult<T>
    where
        F: Future<Output = RepoResult<T>>,
    {
        match tokio::time::timeout(self.store_timeout, fut).await {
            Ok(result) => result.map_err(ServiceError::from),
            Err(_) => {
                warn!(operation, timeout = ?self.store_timeout, "Store operation timed out");
                Err(DomainError::TransientStoreFailure(format!(
                    "{operation} timed out after {:?}",
                    self.store_timeout
                ))
                .into())
            }
        }
    }

    /// Append an audit entry for a transition that is already committed
    ///
    /// Failures are logged; the transition stands.
    pub async fn record(&self, entry: NewAuditEntry) {
        if let Err(e) = self.store("append audit entry", self.audit_repo.append(&entry)).await {
            error!(
                error = %e,
                action = %entry.action,
                user_id = ?entry.user_id,
                code = ?entry.code,
                "Failed to append audit entry"
            );
        }
    }

    /// Send a direct message; returns whether it was delivered
    pub async fn notify(&self, user_id: Snowflake, notice: &Notice) -> bool {
        match self.notifier.send_direct_message(user_id, notice).await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, user_id = %user_id, "Direct message not delivered");
                false
            }
        }
    }
}

impl std::fmt::Debug for ServiceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceContext")
            .field("repositories", &"...")
            .field("platform", &"...")
            .field("roles", &self.roles)
            .field("store_timeout", &self.store_timeout)
            .finish()
    }
}

/// Builder for creating ServiceContext with custom configuration
pub struct ServiceContextBuilder {
    code_repo: Option<Arc<dyn CodeRepository>>,
    entitlement_repo: Option<Arc<dyn EntitlementRepository>>,
    audit_repo: Option<Arc<dyn AuditLogRepository>>,
    reminder_repo: Option<Arc<dyn ReminderRepository>>,
    platform: Option<Arc<dyn MembershipPlatform>>,
    notifier: Option<Arc<dyn Notifier>>,
    roles: RoleConfig,
    store_timeout: Duration,
}

impl ServiceContextBuilder {
    pub fn new() -> Self {
        Self {
            code_repo: None,
            entitlement_repo: None,
            audit_repo: None,
            reminder_repo: None,
            platform: None,
            notifier: None,
            roles: RoleConfig::default(),
            store_timeout: Duration::from_secs(10),
        }
    }

    /// Use the PostgreSQL repositories for every store port
    pub fn postgres(self, pool: &PgPool) -> Self {
        self.code_repo(Arc::new(PgCodeRepository::new(pool.clone())))
            .entitlement_repo(Arc::new(PgEntitlementRepository::new(pool.clone())))
            .audit_repo(Arc::new(PgAuditLogRepository::new(pool.clone())))
            .reminder_repo(Arc::new(PgReminderRepository::new(pool.clone())))
    }

    /// Take role ids and the store timeout from the loaded configuration
    pub fn config(self, config: &AppConfig) -> Self {
        self.roles(config.roles)
            .store_timeout(config.engine.store_timeout())
    }

    pub fn code_repo(mut self, repo: Arc<dyn CodeRepository>) -> Self {
        self.code_repo = Some(repo);
        self
    }

    pub fn entitlement_repo(mut self, repo: Arc<dyn EntitlementRepository>) -> Self {
        self.entitlement_repo = Some(repo);
        self
    }

    pub fn audit_repo(mut self, repo: Arc<dyn AuditLogRepository>) -> Self {
        self.audit_repo = Some(repo);
        self
    }

    pub fn reminder_repo(mut self, repo: Arc<dyn ReminderRepository>) -> Self {
        self.reminder_repo = Some(repo);
        self
    }

    pub fn platform(mut self, platform: Arc<dyn MembershipPlatform>) -> Self {
        self.platform = Some(platform);
        self
    }

    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn roles(mut self, roles: RoleConfig) -> Self {
        self.roles = roles;
        self
    }

    pub fn store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    /// Build the ServiceContext
    ///
    /// # Errors
    /// Returns `ServiceError::Validation` if any required dependency is missing
    pub fn build(self) -> ServiceResult<ServiceContext> {
        Ok(ServiceContext::new(
            self.code_repo
                .ok_or_else(|| ServiceError::validation("code_repo is required"))?,
            self.entitlement_repo
                .ok_or_else(|| ServiceError::validation("entitlement_repo is required"))?,
            self.audit_repo
                .ok_or_else(|| ServiceError::validation("audit_repo is required"))?,
            self.reminder_repo
                .ok_or_else(|| ServiceError::validation("reminder_repo is required"))?,
            self.platform
                .ok_or_else(|| ServiceError::validation("platform is required"))?,
            self.notifier
                .ok_or_else(|| ServiceError::validation("notifier is required"))?,
            self.roles,
            self.store_timeout,
        ))
    }
}

impl Default for ServiceContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}

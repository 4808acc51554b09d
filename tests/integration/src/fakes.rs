//! In-memory implementations of the repository and platform ports
//!
//! All store state sits behind one `parking_lot` lock, so every repository
//! call is atomic the way each PostgreSQL statement is. Failures and latency
//! can be injected per operation for resilience tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use warranty_core::{
    ActivationOutcome, AuditAction, AuditEntry, AuditLogRepository, Code, CodeRepository,
    CodeValue, DomainError, EntitlementRepository, EntitlementSnapshot, LinkOutcome, ListedMember,
    MembershipPlatform, NewAuditEntry, Notice, Notifier, PlatformError, PlatformResult,
    ReminderRepository, ReminderThreshold, RepoResult, Snowflake,
};

// ============================================================================
// Store
// ============================================================================

#[derive(Debug, Default)]
struct StoreState {
    codes: HashMap<CodeValue, Code>,
    snapshots: HashMap<Snowflake, EntitlementSnapshot>,
    audit: Vec<AuditEntry>,
    reminders: HashSet<(CodeValue, ReminderThreshold)>,
}

impl StoreState {
    fn codes_of(&self, user_id: Snowflake) -> impl Iterator<Item = &Code> {
        self.codes.values().filter(move |c| c.user_id == Some(user_id))
    }

    fn latest_expiry(&self, user_id: Snowflake) -> Option<DateTime<Utc>> {
        self.codes_of(user_id)
            .filter(|c| c.warranty_activated)
            .filter_map(|c| c.warranty_expires_at)
            .max()
    }
}

/// Shared store implementing all four repository ports
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<StoreState>,
    failures: Mutex<HashMap<&'static str, usize>>,
    delay: Mutex<Option<Duration>>,
    /// Snapshots written right after a successful `clear_warranty`
    renewals: Mutex<HashMap<Snowflake, EntitlementSnapshot>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `count` calls of `operation` with a transient error
    pub fn fail_next(&self, operation: &'static str, count: usize) {
        *self.failures.lock().entry(operation).or_default() += count;
    }

    /// Replace the user's snapshot with `snapshot` as soon as a sweep clears
    /// the warranty flag, as an extension landing in between would
    pub fn renew_after_clear(&self, snapshot: EntitlementSnapshot) {
        self.renewals.lock().insert(snapshot.user_id, snapshot);
    }

    /// Delay every call, to run into the store timeout
    pub fn set_delay(&self, delay: Option<Duration>) {
        *self.delay.lock() = delay;
    }

    async fn check(&self, operation: &'static str) -> RepoResult<()> {
        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut failures = self.failures.lock();
        match failures.get_mut(operation) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                Err(DomainError::TransientStoreFailure(format!(
                    "injected failure in {operation}"
                )))
            }
            _ => Ok(()),
        }
    }

    /// Seed a code as-is
    pub fn insert_code(&self, code: Code) {
        self.state.write().codes.insert(code.value.clone(), code);
    }

    pub fn code(&self, raw: &str) -> Option<Code> {
        let value = CodeValue::parse(raw).ok()?;
        self.state.read().codes.get(&value).cloned()
    }

    /// Seed a snapshot as-is
    pub fn insert_snapshot(&self, snapshot: EntitlementSnapshot) {
        self.state
            .write()
            .snapshots
            .insert(snapshot.user_id, snapshot);
    }

    pub fn snapshot(&self, user_id: Snowflake) -> Option<EntitlementSnapshot> {
        self.state.read().snapshots.get(&user_id).cloned()
    }

    /// Every audit entry, oldest first
    pub fn audit_entries(&self) -> Vec<AuditEntry> {
        self.state.read().audit.clone()
    }

    /// Actions recorded for a user, oldest first
    pub fn actions_for(&self, user_id: Snowflake) -> Vec<AuditAction> {
        self.state
            .read()
            .audit
            .iter()
            .filter(|e| e.user_id == Some(user_id))
            .map(|e| e.action)
            .collect()
    }

    pub fn count_actions(&self, action: AuditAction) -> usize {
        self.state
            .read()
            .audit
            .iter()
            .filter(|e| e.action == action)
            .count()
    }

    pub fn is_claimed(&self, raw: &str, threshold: ReminderThreshold) -> bool {
        CodeValue::parse(raw).is_ok_and(|value| {
            self.state.read().reminders.contains(&(value, threshold))
        })
    }
}

#[async_trait]
impl CodeRepository for InMemoryStore {
    async fn create(&self, code: &Code) -> RepoResult<()> {
        self.check("create").await?;
        let mut state = self.state.write();
        if state.codes.contains_key(&code.value) {
            return Err(DomainError::CodeAlreadyExists(code.value.to_string()));
        }
        state.codes.insert(code.value.clone(), code.clone());
        Ok(())
    }

    async fn find_by_value(&self, value: &CodeValue) -> RepoResult<Option<Code>> {
        self.check("find_by_value").await?;
        Ok(self.state.read().codes.get(value).cloned())
    }

    async fn link(
        &self,
        value: &CodeValue,
        user_id: Snowflake,
        now: DateTime<Utc>,
    ) -> RepoResult<LinkOutcome> {
        self.check("link").await?;
        let mut state = self.state.write();
        let code = state
            .codes
            .get_mut(value)
            .ok_or_else(|| DomainError::CodeNotFound(value.to_string()))?;

        match code.user_id {
            None => {
                code.user_id = Some(user_id);
                code.is_used = true;
                code.linked_at = Some(now);
                Ok(LinkOutcome {
                    code: code.clone(),
                    newly_linked: true,
                })
            }
            Some(bound) if bound == user_id => Ok(LinkOutcome {
                code: code.clone(),
                newly_linked: false,
            }),
            Some(_) => Err(DomainError::CodeAlreadyLinked(value.to_string())),
        }
    }

    async fn activate(
        &self,
        value: &CodeValue,
        admin_id: Snowflake,
        user_id: Option<Snowflake>,
        now: DateTime<Utc>,
    ) -> RepoResult<ActivationOutcome> {
        self.check("activate").await?;
        let mut state = self.state.write();
        let code = state
            .codes
            .get_mut(value)
            .ok_or_else(|| DomainError::CodeNotFound(value.to_string()))?;

        if code.warranty_activated {
            return Err(DomainError::CodeAlreadyActivated(value.to_string()));
        }
        if let (Some(bound), Some(requested)) = (code.user_id, user_id) {
            if bound != requested {
                return Err(DomainError::CodeAlreadyLinked(value.to_string()));
            }
        }

        let newly_linked = code.user_id.is_none() && user_id.is_some();
        if newly_linked {
            code.user_id = user_id;
            code.linked_at = Some(now);
        }
        code.is_used = code.user_id.is_some();
        code.warranty_activated = true;
        code.warranty_activated_by = Some(admin_id);
        code.warranty_activated_at = Some(now);
        code.warranty_expires_at = Some(Code::warranty_expiry_from(now));

        Ok(ActivationOutcome {
            code: code.clone(),
            newly_linked,
        })
    }

    async fn extend(&self, value: &CodeValue, days: i64) -> RepoResult<Code> {
        self.check("extend").await?;
        let mut state = self.state.write();
        let code = state
            .codes
            .get_mut(value)
            .ok_or_else(|| DomainError::CodeNotFound(value.to_string()))?;

        if !code.warranty_activated {
            return Err(DomainError::WarrantyNotActivated(value.to_string()));
        }
        code.warranty_expires_at = code
            .warranty_expires_at
            .map(|exp| exp + chrono::Duration::days(days));
        Ok(code.clone())
    }

    async fn find_pending(&self, created_since: Option<DateTime<Utc>>) -> RepoResult<Vec<Code>> {
        self.check("find_pending").await?;
        let state = self.state.read();
        let mut codes: Vec<Code> = state
            .codes
            .values()
            .filter(|c| c.user_id.is_some() && !c.warranty_activated)
            .filter(|c| created_since.map_or(true, |since| c.created_at >= since))
            .cloned()
            .collect();
        codes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(codes)
    }

    async fn find_expiring(
        &self,
        after: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> RepoResult<Vec<Code>> {
        self.check("find_expiring").await?;
        let state = self.state.read();
        let mut codes: Vec<Code> = state
            .codes
            .values()
            .filter(|c| c.warranty_activated)
            .filter(|c| {
                c.warranty_expires_at
                    .is_some_and(|exp| exp > after && exp <= until)
            })
            .cloned()
            .collect();
        codes.sort_by_key(|c| c.warranty_expires_at);
        Ok(codes)
    }

    async fn find_by_user(&self, user_id: Snowflake) -> RepoResult<Vec<Code>> {
        self.check("find_by_user").await?;
        let state = self.state.read();
        let mut codes: Vec<Code> = state.codes_of(user_id).cloned().collect();
        codes.sort_by(|a, b| b.linked_at.cmp(&a.linked_at));
        Ok(codes)
    }
}

#[async_trait]
impl EntitlementRepository for InMemoryStore {
    async fn find(&self, user_id: Snowflake) -> RepoResult<Option<EntitlementSnapshot>> {
        self.check("find").await?;
        Ok(self.state.read().snapshots.get(&user_id).cloned())
    }

    async fn sync_from_codes(
        &self,
        user_id: Snowflake,
        now: DateTime<Utc>,
    ) -> RepoResult<Option<EntitlementSnapshot>> {
        self.check("sync_from_codes").await?;
        let mut state = self.state.write();
        if state.codes_of(user_id).next().is_none() {
            return Ok(None);
        }

        let expires_at = state.latest_expiry(user_id);
        let snapshot = EntitlementSnapshot {
            user_id,
            has_premium: true,
            has_warranty: expires_at.is_some_and(|exp| exp > now),
            code_linked: true,
            warranty_expires_at: expires_at,
            last_updated: now,
        };
        state.snapshots.insert(user_id, snapshot.clone());
        Ok(Some(snapshot))
    }

    async fn record_departure(
        &self,
        user_id: Snowflake,
        has_premium: bool,
        has_warranty: bool,
        now: DateTime<Utc>,
    ) -> RepoResult<EntitlementSnapshot> {
        self.check("record_departure").await?;
        let mut state = self.state.write();
        let code_linked = state.codes_of(user_id).next().is_some();
        let latest = state.latest_expiry(user_id);

        let snapshot = match state.snapshots.get(&user_id) {
            Some(existing) => EntitlementSnapshot {
                user_id,
                has_premium,
                has_warranty,
                code_linked: existing.code_linked || code_linked,
                warranty_expires_at: existing.warranty_expires_at.or(latest),
                last_updated: now,
            },
            None => EntitlementSnapshot {
                user_id,
                has_premium,
                has_warranty,
                code_linked,
                warranty_expires_at: latest,
                last_updated: now,
            },
        };
        state.snapshots.insert(user_id, snapshot.clone());
        Ok(snapshot)
    }

    async fn clear_warranty(&self, user_id: Snowflake, now: DateTime<Utc>) -> RepoResult<bool> {
        self.check("clear_warranty").await?;
        let mut state = self.state.write();
        match state.snapshots.get_mut(&user_id) {
            Some(snapshot)
                if snapshot.has_warranty
                    && snapshot.warranty_expires_at.map_or(true, |exp| exp <= now) =>
            {
                snapshot.has_warranty = false;
                snapshot.last_updated = now;
                if let Some(renewed) = self.renewals.lock().remove(&user_id) {
                    *snapshot = renewed;
                }
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn find_expired(&self, now: DateTime<Utc>) -> RepoResult<Vec<EntitlementSnapshot>> {
        self.check("find_expired").await?;
        let state = self.state.read();
        let mut snapshots: Vec<EntitlementSnapshot> = state
            .snapshots
            .values()
            .filter(|s| s.has_warranty && s.warranty_expires_at.map_or(true, |exp| exp <= now))
            .cloned()
            .collect();
        snapshots.sort_by_key(|s| s.warranty_expires_at);
        Ok(snapshots)
    }

    async fn find_active_warranties(
        &self,
        now: DateTime<Utc>,
    ) -> RepoResult<Vec<EntitlementSnapshot>> {
        self.check("find_active_warranties").await?;
        let state = self.state.read();
        let mut snapshots: Vec<EntitlementSnapshot> = state
            .snapshots
            .values()
            .filter(|s| s.warranty_active_at(now))
            .cloned()
            .collect();
        snapshots.sort_by_key(|s| s.user_id);
        Ok(snapshots)
    }
}

#[async_trait]
impl AuditLogRepository for InMemoryStore {
    async fn append(&self, entry: &NewAuditEntry) -> RepoResult<AuditEntry> {
        self.check("append").await?;
        let mut state = self.state.write();
        let stored = AuditEntry {
            id: state.audit.len() as i64 + 1,
            user_id: entry.user_id,
            actor: entry.actor,
            code: entry.code.clone(),
            action: entry.action,
            detail: entry.detail.clone(),
            created_at: Utc::now(),
        };
        state.audit.push(stored.clone());
        Ok(stored)
    }

    async fn find_by_user(&self, user_id: Snowflake, limit: i64) -> RepoResult<Vec<AuditEntry>> {
        self.check("find_audit_by_user").await?;
        let state = self.state.read();
        Ok(state
            .audit
            .iter()
            .rev()
            .filter(|e| e.user_id == Some(user_id))
            .take(usize::try_from(limit).unwrap_or(0))
            .cloned()
            .collect())
    }

    async fn find_by_code(&self, code: &CodeValue, limit: i64) -> RepoResult<Vec<AuditEntry>> {
        self.check("find_audit_by_code").await?;
        let state = self.state.read();
        Ok(state
            .audit
            .iter()
            .rev()
            .filter(|e| e.code.as_deref() == Some(code.as_str()))
            .take(usize::try_from(limit).unwrap_or(0))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ReminderRepository for InMemoryStore {
    async fn try_claim(
        &self,
        code: &CodeValue,
        threshold: ReminderThreshold,
        _now: DateTime<Utc>,
    ) -> RepoResult<bool> {
        self.check("try_claim").await?;
        Ok(self
            .state
            .write()
            .reminders
            .insert((code.clone(), threshold)))
    }

    async fn release(&self, code: &CodeValue, threshold: ReminderThreshold) -> RepoResult<()> {
        self.check("release").await?;
        self.state
            .write()
            .reminders
            .remove(&(code.clone(), threshold));
        Ok(())
    }

    async fn clear_for_code(&self, code: &CodeValue) -> RepoResult<u64> {
        self.check("clear_for_code").await?;
        let mut state = self.state.write();
        let before = state.reminders.len();
        state.reminders.retain(|(value, _)| value != code);
        Ok((before - state.reminders.len()) as u64)
    }
}

// ============================================================================
// Platform
// ============================================================================

/// A call received by the fake platform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformCall {
    Lookup(Snowflake),
    AddRole(Snowflake, Snowflake),
    RemoveRole(Snowflake, Snowflake),
    ListMembers(Option<Snowflake>),
}

/// Community membership and roles held in memory
#[derive(Debug, Default)]
pub struct FakePlatform {
    members: RwLock<HashMap<Snowflake, Vec<Snowflake>>>,
    bots: RwLock<HashSet<Snowflake>>,
    calls: Mutex<Vec<PlatformCall>>,
    unavailable: AtomicBool,
    reject_grants: AtomicBool,
}

impl FakePlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn join(&self, user_id: Snowflake) {
        self.members.write().entry(user_id).or_default();
    }

    pub fn join_with_roles(&self, user_id: Snowflake, roles: &[Snowflake]) {
        self.members.write().insert(user_id, roles.to_vec());
    }

    /// Add a bot account to the community
    pub fn join_bot(&self, user_id: Snowflake) {
        self.join(user_id);
        self.bots.write().insert(user_id);
    }

    /// Remove the member; returns the roles held at departure
    pub fn leave(&self, user_id: Snowflake) -> Vec<Snowflake> {
        self.members.write().remove(&user_id).unwrap_or_default()
    }

    pub fn roles_of(&self, user_id: Snowflake) -> Option<Vec<Snowflake>> {
        self.members.read().get(&user_id).cloned()
    }

    pub fn has_role(&self, user_id: Snowflake, role_id: Snowflake) -> bool {
        self.members
            .read()
            .get(&user_id)
            .is_some_and(|roles| roles.contains(&role_id))
    }

    /// Simulate an operator removing a role by hand
    pub fn strip_role(&self, user_id: Snowflake, role_id: Snowflake) {
        if let Some(roles) = self.members.write().get_mut(&user_id) {
            roles.retain(|r| *r != role_id);
        }
    }

    /// Every call fails as if the platform were down
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Role grants are refused as if permissions were missing
    pub fn set_reject_grants(&self, reject: bool) {
        self.reject_grants.store(reject, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<PlatformCall> {
        self.calls.lock().clone()
    }

    /// Number of grant calls for one role
    pub fn grant_count(&self, user_id: Snowflake, role_id: Snowflake) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|c| **c == PlatformCall::AddRole(user_id, role_id))
            .count()
    }

    fn enter(&self, call: PlatformCall) -> PlatformResult<()> {
        self.calls.lock().push(call);
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(PlatformError::Unavailable("HTTP 503: upstream down".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl MembershipPlatform for FakePlatform {
    async fn member_roles(&self, user_id: Snowflake) -> PlatformResult<Option<Vec<Snowflake>>> {
        self.enter(PlatformCall::Lookup(user_id))?;
        Ok(self.roles_of(user_id))
    }

    async fn add_role(&self, user_id: Snowflake, role_id: Snowflake) -> PlatformResult<()> {
        self.enter(PlatformCall::AddRole(user_id, role_id))?;
        if self.reject_grants.load(Ordering::SeqCst) {
            return Err(PlatformError::Rejected("HTTP 403: Missing Permissions".to_string()));
        }

        let mut members = self.members.write();
        let roles = members
            .get_mut(&user_id)
            .ok_or_else(|| PlatformError::Rejected("HTTP 404: Unknown Member".to_string()))?;
        if !roles.contains(&role_id) {
            roles.push(role_id);
        }
        Ok(())
    }

    async fn remove_role(&self, user_id: Snowflake, role_id: Snowflake) -> PlatformResult<()> {
        self.enter(PlatformCall::RemoveRole(user_id, role_id))?;
        let mut members = self.members.write();
        let roles = members
            .get_mut(&user_id)
            .ok_or_else(|| PlatformError::Rejected("HTTP 404: Unknown Member".to_string()))?;
        roles.retain(|r| *r != role_id);
        Ok(())
    }

    async fn list_members(
        &self,
        after: Option<Snowflake>,
        limit: u16,
    ) -> PlatformResult<Vec<ListedMember>> {
        self.enter(PlatformCall::ListMembers(after))?;
        let bots = self.bots.read();
        let mut page: Vec<ListedMember> = self
            .members
            .read()
            .iter()
            .filter(|(id, _)| after.map_or(true, |after| **id > after))
            .map(|(id, roles)| ListedMember {
                user_id: *id,
                roles: roles.clone(),
                bot: bots.contains(id),
            })
            .collect();
        page.sort_by_key(|m| m.user_id);
        page.truncate(usize::from(limit));
        Ok(page)
    }
}

// ============================================================================
// Notifier
// ============================================================================

/// Records direct messages instead of sending them
#[derive(Debug, Default)]
pub struct FakeNotifier {
    sent: Mutex<Vec<(Snowflake, Notice)>>,
    failing: AtomicBool,
}

impl FakeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse every message as if the user had closed their DMs
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<(Snowflake, Notice)> {
        self.sent.lock().clone()
    }

    pub fn sent_to(&self, user_id: Snowflake) -> Vec<Notice> {
        self.sent
            .lock()
            .iter()
            .filter(|(to, _)| *to == user_id)
            .map(|(_, notice)| notice.clone())
            .collect()
    }
}

#[async_trait]
impl Notifier for FakeNotifier {
    async fn send_direct_message(&self, user_id: Snowflake, notice: &Notice) -> PlatformResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(PlatformError::Rejected(
                "HTTP 403: Cannot send messages to this user".to_string(),
            ));
        }
        self.sent.lock().push((user_id, notice.clone()));
        Ok(())
    }
}

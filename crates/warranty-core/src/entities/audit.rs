//! Audit log entries - append-only record of every state transition

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::value_objects::Snowflake;

/// Who caused a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Actor {
    User(Snowflake),
    Admin(Snowflake),
    System,
}

impl Actor {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::User(_) => "user",
            Self::Admin(_) => "admin",
            Self::System => "system",
        }
    }

    pub fn id(&self) -> Option<Snowflake> {
        match self {
            Self::User(id) | Self::Admin(id) => Some(*id),
            Self::System => None,
        }
    }

    /// Rebuild from the stored (kind, id) pair
    pub fn from_parts(kind: &str, id: Option<Snowflake>) -> Option<Self> {
        match (kind, id) {
            ("user", Some(id)) => Some(Self::User(id)),
            ("admin", Some(id)) => Some(Self::Admin(id)),
            ("system", _) => Some(Self::System),
            _ => None,
        }
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.id() {
            Some(id) => write!(f, "{}:{id}", self.kind()),
            None => f.write_str(self.kind()),
        }
    }
}

/// Kinds of audited transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    CodeCreated,
    CodeLinked,
    Activate,
    Extend,
    WarrantyExpired,
    UserLeft,
    RolesRestored,
    ReminderSent,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CodeCreated => "CODE_CREATED",
            Self::CodeLinked => "CODE_LINKED",
            Self::Activate => "ACTIVATE",
            Self::Extend => "EXTEND",
            Self::WarrantyExpired => "WARRANTY_EXPIRED",
            Self::UserLeft => "USER_LEFT",
            Self::RolesRestored => "ROLES_RESTORED",
            Self::ReminderSent => "REMINDER_SENT",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "CODE_CREATED" => Self::CodeCreated,
            "CODE_LINKED" => Self::CodeLinked,
            "ACTIVATE" => Self::Activate,
            "EXTEND" => Self::Extend,
            "WARRANTY_EXPIRED" => Self::WarrantyExpired,
            "USER_LEFT" => Self::UserLeft,
            "ROLES_RESTORED" => Self::RolesRestored,
            "REMINDER_SENT" => Self::ReminderSent,
            _ => return None,
        })
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Audit entry to be appended
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAuditEntry {
    pub user_id: Option<Snowflake>,
    pub actor: Actor,
    pub code: Option<String>,
    pub action: AuditAction,
    pub detail: String,
}

impl NewAuditEntry {
    pub fn new(action: AuditAction, actor: Actor) -> Self {
        Self {
            user_id: None,
            actor,
            code: None,
            action,
            detail: String::new(),
        }
    }

    pub fn user(mut self, user_id: Snowflake) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn maybe_user(mut self, user_id: Option<Snowflake>) -> Self {
        self.user_id = user_id;
        self
    }

    pub fn code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = detail.into();
        self
    }
}

/// Persisted audit entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEntry {
    pub id: i64,
    pub user_id: Option<Snowflake>,
    pub actor: Actor,
    pub code: Option<String>,
    pub action: AuditAction,
    pub detail: String,
    pub created_at: DateTime<Utc>,
}

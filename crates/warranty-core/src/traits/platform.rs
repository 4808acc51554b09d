//! Membership platform ports
//!
//! The platform is volatile and admin-editable. Failures here never undo a
//! committed transition; the next sweep or join converges the drift.

use async_trait::async_trait;
use thiserror::Error;

use crate::entities::Notice;
use crate::value_objects::Snowflake;

/// Errors from the external platform
#[derive(Debug, Error)]
pub enum PlatformError {
    /// Network failure, rate limit or server error
    #[error("platform unavailable: {0}")]
    Unavailable(String),

    /// The platform refused the call (missing permission, closed DMs, unknown role)
    #[error("platform rejected request: {0}")]
    Rejected(String),
}

pub type PlatformResult<T> = Result<T, PlatformError>;

/// One entry of a member listing page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedMember {
    pub user_id: Snowflake,
    pub roles: Vec<Snowflake>,
    pub bot: bool,
}

/// Role surface of the single configured community
#[async_trait]
pub trait MembershipPlatform: Send + Sync {
    /// Current role set of a member, `None` if the user is not a member
    async fn member_roles(&self, user_id: Snowflake) -> PlatformResult<Option<Vec<Snowflake>>>;

    async fn add_role(&self, user_id: Snowflake, role_id: Snowflake) -> PlatformResult<()>;

    async fn remove_role(&self, user_id: Snowflake, role_id: Snowflake) -> PlatformResult<()>;

    /// Up to `limit` members with ids above `after`, in ascending id order
    async fn list_members(
        &self,
        after: Option<Snowflake>,
        limit: u16,
    ) -> PlatformResult<Vec<ListedMember>>;
}

/// Best-effort direct messages
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_direct_message(&self, user_id: Snowflake, notice: &Notice) -> PlatformResult<()>;
}

//! Discord REST adapter
//!
//! Implements the membership and notification ports against the Discord HTTP
//! API for the one configured guild. Rate limits and 5xx responses surface as
//! `Unavailable`; every other non-success status is `Rejected`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, instrument};
use warranty_common::{AppError, DiscordConfig};
use warranty_core::entities::Notice;
use warranty_core::{
    ListedMember, MembershipPlatform, Notifier, PlatformError, PlatformResult, Snowflake,
};

/// Guild member as returned by `GET /guilds/{guild}/members/{user}`
#[derive(Debug, Deserialize)]
struct MemberPayload {
    #[serde(default)]
    roles: Vec<Snowflake>,
}

/// Entry of `GET /guilds/{guild}/members`
#[derive(Debug, Deserialize)]
struct ListedMemberPayload {
    user: UserPayload,
    #[serde(default)]
    roles: Vec<Snowflake>,
}

#[derive(Debug, Deserialize)]
struct UserPayload {
    id: Snowflake,
    #[serde(default)]
    bot: bool,
}

impl From<ListedMemberPayload> for ListedMember {
    fn from(payload: ListedMemberPayload) -> Self {
        Self {
            user_id: payload.user.id,
            roles: payload.roles,
            bot: payload.user.bot,
        }
    }
}

/// DM channel as returned by `POST /users/@me/channels`
#[derive(Debug, Deserialize)]
struct ChannelPayload {
    id: Snowflake,
}

/// Discord REST client scoped to one guild
#[derive(Clone)]
pub struct DiscordPlatform {
    client: Client,
    api_base: String,
    guild_id: Snowflake,
    token: String,
}

impl std::fmt::Debug for DiscordPlatform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordPlatform")
            .field("api_base", &self.api_base)
            .field("guild_id", &self.guild_id)
            .finish()
    }
}

impl DiscordPlatform {
    /// Build the client; `timeout` bounds every request
    pub fn new(config: &DiscordConfig, timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!(
                "DiscordBot (warranty-engine, ",
                env!("CARGO_PKG_VERSION"),
                ")"
            ))
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build Discord client: {e}")))?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            guild_id: config.guild_id,
            token: config.token.clone(),
        })
    }

    fn member_url(&self, user_id: Snowflake) -> String {
        format!("{}/guilds/{}/members/{}", self.api_base, self.guild_id, user_id)
    }

    /// Member listing page; needs the privileged server members intent
    fn members_url(&self, after: Option<Snowflake>, limit: u16) -> String {
        let after = after.map_or(0, Snowflake::into_inner);
        format!(
            "{}/guilds/{}/members?limit={limit}&after={after}",
            self.api_base, self.guild_id
        )
    }

    fn member_role_url(&self, user_id: Snowflake, role_id: Snowflake) -> String {
        format!("{}/roles/{}", self.member_url(user_id), role_id)
    }

    async fn execute(&self, request: RequestBuilder) -> PlatformResult<Response> {
        request
            .header(header::AUTHORIZATION, format!("Bot {}", self.token))
            .send()
            .await
            .map_err(|e| PlatformError::Unavailable(e.to_string()))
    }

    async fn send(&self, request: RequestBuilder) -> PlatformResult<Response> {
        ensure_success(self.execute(request).await?).await
    }

    async fn open_dm_channel(&self, user_id: Snowflake) -> PlatformResult<Snowflake> {
        let response = self
            .send(
                self.client
                    .post(format!("{}/users/@me/channels", self.api_base))
                    .json(&json!({ "recipient_id": user_id.to_string() })),
            )
            .await?;

        let channel: ChannelPayload = response
            .json()
            .await
            .map_err(|e| PlatformError::Rejected(format!("Unexpected channel payload: {e}")))?;
        Ok(channel.id)
    }
}

#[async_trait]
impl MembershipPlatform for DiscordPlatform {
    #[instrument(skip(self))]
    async fn member_roles(&self, user_id: Snowflake) -> PlatformResult<Option<Vec<Snowflake>>> {
        let response = self.execute(self.client.get(self.member_url(user_id))).await?;
        if response.status() == StatusCode::NOT_FOUND {
            debug!(user_id = %user_id, "Not a guild member");
            return Ok(None);
        }
        let response = ensure_success(response).await?;

        let member: MemberPayload = response
            .json()
            .await
            .map_err(|e| PlatformError::Rejected(format!("Unexpected member payload: {e}")))?;
        Ok(Some(member.roles))
    }

    #[instrument(skip(self))]
    async fn add_role(&self, user_id: Snowflake, role_id: Snowflake) -> PlatformResult<()> {
        self.send(
            self.client
                .put(self.member_role_url(user_id, role_id))
                .header(header::CONTENT_LENGTH, "0"),
        )
        .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn remove_role(&self, user_id: Snowflake, role_id: Snowflake) -> PlatformResult<()> {
        self.send(self.client.delete(self.member_role_url(user_id, role_id)))
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_members(
        &self,
        after: Option<Snowflake>,
        limit: u16,
    ) -> PlatformResult<Vec<ListedMember>> {
        let response = self
            .send(self.client.get(self.members_url(after, limit)))
            .await?;

        let page: Vec<ListedMemberPayload> = response
            .json()
            .await
            .map_err(|e| PlatformError::Rejected(format!("Unexpected member list payload: {e}")))?;
        debug!(count = page.len(), "Listed guild members");
        Ok(page.into_iter().map(ListedMember::from).collect())
    }
}

#[async_trait]
impl Notifier for DiscordPlatform {
    #[instrument(skip(self, notice))]
    async fn send_direct_message(&self, user_id: Snowflake, notice: &Notice) -> PlatformResult<()> {
        let channel_id = self.open_dm_channel(user_id).await?;
        self.send(
            self.client
                .post(format!("{}/channels/{}/messages", self.api_base, channel_id))
                .json(&json!({ "content": notice.render() })),
        )
        .await?;
        Ok(())
    }
}

async fn ensure_success(response: Response) -> PlatformResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(classify(status, body))
}

fn classify(status: StatusCode, body: String) -> PlatformError {
    let msg = format!("HTTP {}: {body}", status.as_u16());
    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        PlatformError::Unavailable(msg)
    } else {
        PlatformError::Rejected(msg)
    }
}

//! REST client for the platform API.
//!
//! One client serves one guild. Calls are plain request/response; there is
//! no retry and no client-side rate limiting.

use crate::commands::CommandDefinition;
use crate::config::NodeConfig;
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use staffrank_core::{
    ChannelId, GuildId, Message, Platform, PlatformError, PlatformResult, RoleId, UserId,
};
use tracing::debug;

#[derive(Debug, Clone, Deserialize)]
pub struct CurrentUser {
    pub id: UserId,
    pub username: String,
}

#[derive(Debug, Deserialize)]
struct GuildRole {
    id: RoleId,
    name: String,
}

#[derive(Debug, Deserialize)]
struct Guild {
    name: String,
}

#[derive(Debug, Deserialize)]
struct Channel {
    id: ChannelId,
}

/// Posting the deferred reply once a transition finishes.
#[async_trait]
pub trait FollowUp: Send + Sync {
    /// Replace the deferred "thinking" response with `message`.
    async fn edit_original(&self, token: &str, message: &Message) -> PlatformResult<()>;
}

fn transport(e: reqwest::Error) -> PlatformError {
    PlatformError::Transport(e.to_string())
}

/// Bot-authenticated API client.
pub struct DiscordClient {
    http: Client,
    api_base: String,
    token: String,
    application_id: String,
    guild_id: GuildId,
}

impl DiscordClient {
    /// Build a client from node config.
    pub fn new(config: &NodeConfig) -> PlatformResult<Self> {
        let http = Client::builder()
            .user_agent(concat!(
                "DiscordBot (https://github.com/staffrank/staffrank, ",
                env!("CARGO_PKG_VERSION"),
                ")"
            ))
            .build()
            .map_err(transport)?;

        Ok(Self {
            http,
            api_base: config.api_base.clone(),
            token: config.token.clone(),
            application_id: config.application_id.clone(),
            guild_id: config.guild_id.clone(),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}{}", self.api_base, path))
            .header(reqwest::header::AUTHORIZATION, format!("Bot {}", self.token))
    }

    async fn send(&self, request: RequestBuilder) -> PlatformResult<Response> {
        let response = request.send().await.map_err(transport)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(PlatformError::Status {
            status: status.as_u16(),
            body,
        })
    }

    async fn fetch<T: DeserializeOwned>(&self, path: &str) -> PlatformResult<T> {
        let response = self.send(self.request(Method::GET, path)).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| PlatformError::Decode(e.to_string()))
    }

    /// The bot account behind the token.
    pub async fn current_user(&self) -> PlatformResult<CurrentUser> {
        self.fetch("/users/@me").await
    }

    /// Bulk-overwrite the guild's commands; returns how many are registered.
    pub async fn register_commands(&self, commands: &[CommandDefinition]) -> PlatformResult<usize> {
        let path = format!(
            "/applications/{}/guilds/{}/commands",
            self.application_id, self.guild_id
        );
        let response = self
            .send(self.request(Method::PUT, &path).json(commands))
            .await?;
        let registered: Vec<serde_json::Value> = response
            .json()
            .await
            .map_err(|e| PlatformError::Decode(e.to_string()))?;
        Ok(registered.len())
    }

    async fn open_dm(&self, user: &UserId) -> PlatformResult<ChannelId> {
        let response = self
            .send(
                self.request(Method::POST, "/users/@me/channels")
                    .json(&json!({ "recipient_id": user })),
            )
            .await?;
        let channel: Channel = response
            .json()
            .await
            .map_err(|e| PlatformError::Decode(e.to_string()))?;
        Ok(channel.id)
    }

    fn member_role_path(&self, user: &UserId, role: &RoleId) -> String {
        format!("/guilds/{}/members/{}/roles/{}", self.guild_id, user, role)
    }
}

#[async_trait]
impl Platform for DiscordClient {
    async fn add_role(&self, user: &UserId, role: &RoleId) -> PlatformResult<()> {
        let path = self.member_role_path(user, role);
        self.send(self.request(Method::PUT, &path)).await?;
        Ok(())
    }

    async fn remove_role(&self, user: &UserId, role: &RoleId) -> PlatformResult<()> {
        let path = self.member_role_path(user, role);
        self.send(self.request(Method::DELETE, &path)).await?;
        Ok(())
    }

    async fn set_nickname(&self, user: &UserId, nickname: &str) -> PlatformResult<()> {
        let path = format!("/guilds/{}/members/{}", self.guild_id, user);
        self.send(
            self.request(Method::PATCH, &path)
                .json(&json!({ "nick": nickname })),
        )
        .await?;
        Ok(())
    }

    async fn send_direct_message(&self, user: &UserId, message: &Message) -> PlatformResult<()> {
        let channel = self.open_dm(user).await?;
        self.send_channel_message(&channel, message).await
    }

    async fn send_channel_message(&self, channel: &ChannelId, message: &Message) -> PlatformResult<()> {
        let path = format!("/channels/{}/messages", channel);
        self.send(self.request(Method::POST, &path).json(message))
            .await?;
        Ok(())
    }

    async fn role_name(&self, role: &RoleId) -> Option<String> {
        let path = format!("/guilds/{}/roles", self.guild_id);
        match self.fetch::<Vec<GuildRole>>(&path).await {
            Ok(roles) => roles.into_iter().find(|r| &r.id == role).map(|r| r.name),
            Err(e) => {
                debug!(role = %role, "role lookup failed: {}", e);
                None
            }
        }
    }

    async fn guild_name(&self) -> Option<String> {
        let path = format!("/guilds/{}", self.guild_id);
        match self.fetch::<Guild>(&path).await {
            Ok(guild) => Some(guild.name),
            Err(e) => {
                debug!(guild = %self.guild_id, "guild lookup failed: {}", e);
                None
            }
        }
    }
}

#[async_trait]
impl FollowUp for DiscordClient {
    async fn edit_original(&self, token: &str, message: &Message) -> PlatformResult<()> {
        let path = format!(
            "/webhooks/{}/{}/messages/@original",
            self.application_id, token
        );
        self.send(self.request(Method::PATCH, &path).json(message))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(api_base: &str) -> NodeConfig {
        let env = HashMap::from([
            ("STAFFRANK_TOKEN", "tok".to_string()),
            ("STAFFRANK_APP_ID", "app".to_string()),
            ("STAFFRANK_PUBLIC_KEY", "ab".repeat(32)),
            ("STAFFRANK_GUILD_ID", "guild".to_string()),
            ("STAFFRANK_LADDER", "a,b".to_string()),
            ("STAFFRANK_ALLOWED_ROLES", "boss".to_string()),
            ("STAFFRANK_LOG_CHANNEL", "log".to_string()),
            ("STAFFRANK_API_BASE", api_base.to_string()),
        ]);
        NodeConfig::from_lookup(|k| env.get(k).cloned()).unwrap()
    }

    #[test]
    fn role_path_is_scoped_to_guild() {
        let client = DiscordClient::new(&config("http://localhost")).unwrap();
        assert_eq!(
            client.member_role_path(&UserId::from("u"), &RoleId::from("r")),
            "/guilds/guild/members/u/roles/r"
        );
    }

    #[tokio::test]
    async fn unreachable_api_is_a_transport_error() {
        // port 9 (discard) on loopback refuses connections
        let client = DiscordClient::new(&config("http://127.0.0.1:9")).unwrap();

        let err = client
            .add_role(&UserId::from("u"), &RoleId::from("r"))
            .await
            .unwrap_err();
        assert!(matches!(err, PlatformError::Transport(_)));

        assert_eq!(client.role_name(&RoleId::from("r")).await, None);
        assert_eq!(client.guild_name().await, None);
    }
}

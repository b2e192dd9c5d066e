//! The outbound seam to the chat platform.
//!
//! Every call is scoped to the single guild the node serves.

use crate::error::PlatformResult;
use crate::ids::{ChannelId, RoleId, UserId};
use crate::notify::Message;
use async_trait::async_trait;

/// Remote mutations and lookups the transition handler needs.
#[async_trait]
pub trait Platform: Send + Sync {
    /// Grant `role` to `user`.
    async fn add_role(&self, user: &UserId, role: &RoleId) -> PlatformResult<()>;

    /// Take `role` away from `user`.
    async fn remove_role(&self, user: &UserId, role: &RoleId) -> PlatformResult<()>;

    /// Set the guild nickname of `user`.
    async fn set_nickname(&self, user: &UserId, nickname: &str) -> PlatformResult<()>;

    /// Open (or reuse) a DM channel with `user` and post `message`.
    async fn send_direct_message(&self, user: &UserId, message: &Message) -> PlatformResult<()>;

    /// Post `message` to a guild channel.
    async fn send_channel_message(&self, channel: &ChannelId, message: &Message) -> PlatformResult<()>;

    /// Display name of a guild role, if it exists.
    async fn role_name(&self, role: &RoleId) -> Option<String>;

    /// Display name of the guild, if it can be fetched.
    async fn guild_name(&self) -> Option<String>;
}

//! Cards and messages sent to the audit channel, the target and the invoker.
//!
//! Types serialize straight into the platform's message JSON.

use crate::error::CommandError;
use crate::ids::UserId;
use crate::rank::Direction;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

/// Card accent colour.
pub const CARD_COLOR: u32 = 0x00A8FF;

/// Footer text on every card.
pub const CARD_FOOTER: &str = "Staff Management System";

/// Placeholder for a rank whose role cannot be looked up.
pub const UNKNOWN_RANK: &str = "Unknown Rank";

/// Placeholder for a guild whose name cannot be looked up.
pub const UNKNOWN_GUILD: &str = "the server";

/// Message flag: visible only to the invoker.
pub const FLAG_EPHEMERAL: u64 = 1 << 6;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmbedImage {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmbedFooter {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
}

/// A formatted card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Embed {
    pub title: String,
    pub description: String,
    pub color: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<EmbedImage>,
    pub footer: EmbedFooter,
    /// RFC 3339.
    pub timestamp: String,
}

impl Embed {
    /// House-style card: accent colour, avatar thumbnail and footer, stamped
    /// with `at`.
    pub fn card(
        title: impl Into<String>,
        description: impl Into<String>,
        avatar_url: Option<&str>,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            color: CARD_COLOR,
            thumbnail: avatar_url.map(|url| EmbedImage {
                url: url.to_string(),
            }),
            footer: EmbedFooter {
                text: CARD_FOOTER.to_string(),
                icon_url: avatar_url.map(str::to_string),
            },
            timestamp: at.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

/// Outbound message body: text, cards, or both.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Message {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub embeds: Vec<Embed>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flags: Option<u64>,
}

impl Message {
    /// Plain text message.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Default::default()
        }
    }

    /// Single-card message.
    pub fn embed(embed: Embed) -> Self {
        Self {
            embeds: vec![embed],
            ..Default::default()
        }
    }

    /// Only the invoker will see it.
    #[must_use]
    pub fn ephemeral(mut self) -> Self {
        self.flags = Some(FLAG_EPHEMERAL);
        self
    }

    /// Whether the ephemeral flag is set.
    pub fn is_ephemeral(&self) -> bool {
        self.flags.is_some_and(|f| f & FLAG_EPHEMERAL != 0)
    }
}

impl From<&CommandError> for Message {
    fn from(err: &CommandError) -> Self {
        let msg = Message::text(err.to_string());
        if err.is_private() {
            msg.ephemeral()
        } else {
            msg
        }
    }
}

/// What happened in one successful transition. Lives only as long as the
/// invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionRecord {
    pub direction: Direction,
    pub target: UserId,
    pub invoker: UserId,
    pub old_rank_name: String,
    pub new_rank_name: String,
}

impl TransitionRecord {
    /// Audit-channel card.
    pub fn audit_card(&self, avatar_url: Option<&str>, at: DateTime<Utc>) -> Embed {
        let title = match self.direction {
            Direction::Promote => "📈 Promotion",
            Direction::Demote => "📉 Demotion",
        };
        let description = format!(
            "**User:** {}\n**Old Rank:** {}\n**New Rank:** {}\n**By:** {}",
            self.target.mention(),
            self.old_rank_name,
            self.new_rank_name,
            self.invoker.mention(),
        );
        Embed::card(title, description, avatar_url, at)
    }

    /// Direct-message card for the target.
    pub fn direct_card(&self, guild_name: &str, avatar_url: Option<&str>, at: DateTime<Utc>) -> Embed {
        let (title, description) = match self.direction {
            Direction::Promote => (
                "🎉 You Were Promoted!",
                format!("You are now **{}** in {}!", self.new_rank_name, guild_name),
            ),
            Direction::Demote => (
                "⚠️ You Were Demoted",
                format!("You are now **{}** in {}.", self.new_rank_name, guild_name),
            ),
        };
        Embed::card(title, description, avatar_url, at)
    }

    /// Confirmation card for the invoker.
    pub fn reply_card(&self, avatar_url: Option<&str>, at: DateTime<Utc>) -> Embed {
        let (title, verb) = match self.direction {
            Direction::Promote => ("Promotion Complete", "Promoted"),
            Direction::Demote => ("Demotion Complete", "Demoted"),
        };
        let description = format!(
            "{} {}: **{}** → **{}**",
            verb,
            self.target.mention(),
            self.old_rank_name,
            self.new_rank_name
        );
        Embed::card(title, description, avatar_url, at)
    }
}

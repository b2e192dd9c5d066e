//! Inbound interaction payloads and the responses sent back for them.
//!
//! Only the fields the node reads are modelled; everything else in the
//! payload is ignored.

use serde::{Deserialize, Serialize};
use staffrank_core::{GuildId, Invocation, Member, Message, RoleId, UserId};
use std::collections::HashMap;

/// Interaction type: endpoint health check.
pub const PING: u8 = 1;
/// Interaction type: slash command.
pub const APPLICATION_COMMAND: u8 = 2;

/// Response type: answer a PING.
pub const PONG: u8 = 1;
/// Response type: reply with a message now.
pub const CHANNEL_MESSAGE_WITH_SOURCE: u8 = 4;
/// Response type: acknowledge now, edit the reply in later.
pub const DEFERRED_CHANNEL_MESSAGE_WITH_SOURCE: u8 = 5;

/// Name of the target option on both commands.
pub const TARGET_OPTION: &str = "user";

#[derive(Debug, Clone, Deserialize)]
pub struct Interaction {
    #[serde(rename = "type")]
    pub kind: u8,
    /// Continuation token for follow-up edits.
    #[serde(default)]
    pub token: String,
    /// Absent for DM invocations.
    #[serde(default)]
    pub guild_id: Option<GuildId>,
    /// Present when invoked inside a guild.
    #[serde(default)]
    pub member: Option<InteractionMember>,
    /// Present when invoked in a DM.
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub data: Option<CommandData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InteractionMember {
    pub user: User,
    #[serde(default)]
    pub roles: Vec<RoleId>,
}

/// Member data inside `resolved`; the user object lives next to it.
#[derive(Debug, Clone, Deserialize)]
pub struct ResolvedMember {
    #[serde(default)]
    pub roles: Vec<RoleId>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Resolved {
    #[serde(default)]
    pub users: HashMap<UserId, User>,
    #[serde(default)]
    pub members: HashMap<UserId, ResolvedMember>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommandOption {
    pub name: String,
    #[serde(default)]
    pub value: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommandData {
    pub name: String,
    #[serde(default)]
    pub options: Vec<CommandOption>,
    #[serde(default)]
    pub resolved: Resolved,
}

impl Interaction {
    /// Whether the interaction came from a guild other than `home`.
    ///
    /// DM invocations carry no guild and are left to the permission guard.
    pub fn is_foreign(&self, home: &GuildId) -> bool {
        self.guild_id.as_ref().is_some_and(|g| g != home)
    }

    /// Who ran the command.
    pub fn invoker(&self) -> Option<&User> {
        self.member.as_ref().map(|m| &m.user).or(self.user.as_ref())
    }

    /// The target member, if the `user` option names someone who is in the
    /// guild.
    pub fn target(&self) -> Option<Member> {
        let data = self.data.as_ref()?;
        let id = data
            .options
            .iter()
            .find(|o| o.name == TARGET_OPTION)?
            .value
            .as_ref()?
            .as_str()
            .map(UserId::from)?;

        let user = data.resolved.users.get(&id)?;
        let member = data.resolved.members.get(&id)?;
        Some(Member::new(
            id,
            user.username.clone(),
            member.roles.iter().cloned(),
        ))
    }

    /// Flatten into what the transition handler needs.
    ///
    /// Outside a guild the invoker has no roles, so the guard refuses it.
    pub fn invocation(&self) -> Invocation {
        Invocation {
            command: self
                .data
                .as_ref()
                .map(|d| d.name.clone())
                .unwrap_or_default(),
            invoker: self
                .invoker()
                .map(|u| u.id.clone())
                .unwrap_or_else(|| UserId::new("0")),
            invoker_roles: self
                .member
                .as_ref()
                .map(|m| m.roles.iter().cloned().collect())
                .unwrap_or_default(),
            target: self.target(),
        }
    }
}

/// Body returned from the interaction endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InteractionResponse {
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Message>,
}

impl InteractionResponse {
    pub fn pong() -> Self {
        Self {
            kind: PONG,
            data: None,
        }
    }

    pub fn message(message: Message) -> Self {
        Self {
            kind: CHANNEL_MESSAGE_WITH_SOURCE,
            data: Some(message),
        }
    }

    pub fn deferred() -> Self {
        Self {
            kind: DEFERRED_CHANNEL_MESSAGE_WITH_SOURCE,
            data: None,
        }
    }
}

//! Rank ladder and the immutable policy built around it.
//!
//! The ladder is an ordered list of role ids, lowest rank first. It is
//! validated once at startup and never changes while the node runs.

use crate::error::{Error, Result};
use crate::ids::{ChannelId, RoleId, UserId};
use std::collections::{BTreeSet, HashSet};

/// Ordered rank roles, index 0 = lowest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankLadder {
    roles: Vec<RoleId>,
}

impl RankLadder {
    /// Build a ladder from role ids, lowest rank first.
    ///
    /// Needs at least two rungs and no repeated ids.
    pub fn new(roles: Vec<RoleId>) -> Result<Self> {
        if roles.len() < 2 {
            return Err(Error::InvalidLadder(format!(
                "need at least 2 ranks, got {}",
                roles.len()
            )));
        }

        let mut seen = HashSet::with_capacity(roles.len());
        for role in &roles {
            if !seen.insert(role) {
                return Err(Error::InvalidLadder(format!("role {} appears twice", role)));
            }
        }

        Ok(Self { roles })
    }

    /// Role at `index`, if any.
    pub fn get(&self, index: usize) -> Option<&RoleId> {
        self.roles.get(index)
    }

    /// Number of rungs.
    pub fn len(&self) -> usize {
        self.roles.len()
    }

    /// Always false for a constructed ladder; kept for the `len` pairing.
    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }

    /// Index of the top rung.
    pub fn top(&self) -> usize {
        self.roles.len() - 1
    }

    /// All rungs, lowest first.
    pub fn roles(&self) -> &[RoleId] {
        &self.roles
    }

    /// Whether `role` is one of the rungs.
    pub fn contains(&self, role: &RoleId) -> bool {
        self.roles.contains(role)
    }

    /// Iterate rungs with their index, lowest first.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &RoleId)> {
        self.roles.iter().enumerate()
    }
}

/// Roles whose holders may run promote/demote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowedRoles {
    roles: HashSet<RoleId>,
}

impl AllowedRoles {
    /// Build the allow-list. An empty list would lock everyone out, so it is
    /// rejected.
    pub fn new(roles: impl IntoIterator<Item = RoleId>) -> Result<Self> {
        let roles: HashSet<RoleId> = roles.into_iter().collect();
        if roles.is_empty() {
            return Err(Error::InvalidConfig(
                "allowed roles must name at least one role".to_string(),
            ));
        }
        Ok(Self { roles })
    }

    /// True iff the invoker holds at least one allowed role.
    pub fn authorize(&self, invoker_roles: &BTreeSet<RoleId>) -> bool {
        invoker_roles.iter().any(|r| self.roles.contains(r))
    }

    /// Number of allowed roles.
    pub fn len(&self) -> usize {
        self.roles.len()
    }

    /// Never true for a constructed allow-list.
    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }
}

/// Everything a transition needs to know about the deployment.
#[derive(Debug, Clone)]
pub struct RankPolicy {
    /// The rank ladder.
    pub ladder: RankLadder,
    /// Who may invoke commands.
    pub allowed: AllowedRoles,
    /// Channel that receives audit cards.
    pub log_channel: ChannelId,
    /// Image used on every card; purely decorative.
    pub avatar_url: Option<String>,
}

impl RankPolicy {
    /// Assemble a policy from already-validated parts.
    pub fn new(ladder: RankLadder, allowed: AllowedRoles, log_channel: ChannelId) -> Self {
        Self {
            ladder,
            allowed,
            log_channel,
            avatar_url: None,
        }
    }

    /// Set the card avatar.
    #[must_use]
    pub fn with_avatar(mut self, url: impl Into<String>) -> Self {
        self.avatar_url = Some(url.into());
        self
    }
}

/// A guild member as seen in one interaction.
///
/// This is a snapshot; the platform owns the real state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    /// Account id.
    pub id: UserId,
    /// Base account name (not the nickname).
    pub username: String,
    /// Roles held at the time of the interaction.
    pub roles: BTreeSet<RoleId>,
}

impl Member {
    /// Build a member snapshot.
    pub fn new(
        id: impl Into<UserId>,
        username: impl Into<String>,
        roles: impl IntoIterator<Item = RoleId>,
    ) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
            roles: roles.into_iter().collect(),
        }
    }

    /// Whether the member holds `role`.
    pub fn has_role(&self, role: &RoleId) -> bool {
        self.roles.contains(role)
    }
}

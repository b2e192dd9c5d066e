//! Rank resolution and the promote/demote state machine.
//!
//! Rank position is never stored. It is recomputed from the member's live
//! role set on every command.

use crate::error::CommandError;
use crate::ids::RoleId;
use crate::ladder::RankLadder;
use std::collections::BTreeSet;
use std::fmt;

/// Where a member sits on the ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankPosition {
    /// Holds no ladder role.
    Unranked,
    /// Index into the ladder.
    Ranked(usize),
}

/// Position classified against the ladder bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankState {
    /// No ladder role.
    Unranked,
    /// Index 0.
    AtFloor,
    /// Strictly between floor and ceiling.
    Mid(usize),
    /// Index N-1.
    AtCeiling,
}

impl RankState {
    /// Classify `position` on `ladder`.
    pub fn classify(position: RankPosition, ladder: &RankLadder) -> Self {
        match position {
            RankPosition::Unranked => RankState::Unranked,
            RankPosition::Ranked(0) => RankState::AtFloor,
            RankPosition::Ranked(i) if i >= ladder.top() => RankState::AtCeiling,
            RankPosition::Ranked(i) => RankState::Mid(i),
        }
    }
}

/// Scan the ladder lowest-first and return the first rung the member holds.
///
/// A member holding several rungs resolves to the lowest one.
pub fn resolve(roles: &BTreeSet<RoleId>, ladder: &RankLadder) -> RankPosition {
    ladder
        .iter()
        .find(|(_, role)| roles.contains(*role))
        .map_or(RankPosition::Unranked, |(i, _)| RankPosition::Ranked(i))
}

/// Which way a command moves the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// One rung up.
    Promote,
    /// One rung down.
    Demote,
}

impl Direction {
    /// Parse the slash-command name.
    pub fn from_command(name: &str) -> Result<Self, CommandError> {
        match name {
            "promote" => Ok(Direction::Promote),
            "demote" => Ok(Direction::Demote),
            other => Err(CommandError::UnknownCommand(other.to_string())),
        }
    }

    /// Slash-command name.
    pub fn command_name(self) -> &'static str {
        match self {
            Direction::Promote => "promote",
            Direction::Demote => "demote",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.command_name())
    }
}

/// A single step on the ladder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// Rung before the move.
    pub from: usize,
    /// Rung after the move.
    pub to: usize,
    /// Role at `from`.
    pub old_role: RoleId,
    /// Role at `to`.
    pub new_role: RoleId,
}

/// Apply the state machine: refuse at the boundaries, otherwise step once.
pub fn plan(
    direction: Direction,
    position: RankPosition,
    ladder: &RankLadder,
) -> Result<Transition, CommandError> {
    let state = RankState::classify(position, ladder);
    let from = match (direction, state) {
        (_, RankState::Unranked) => return Err(CommandError::NoRank),
        (Direction::Promote, RankState::AtCeiling) => return Err(CommandError::AtCeiling),
        (Direction::Demote, RankState::AtFloor) => return Err(CommandError::AtFloor),
        (_, RankState::AtFloor) => 0,
        (_, RankState::AtCeiling) => ladder.top(),
        (_, RankState::Mid(i)) => i,
    };

    let to = match direction {
        Direction::Promote => from + 1,
        Direction::Demote => from - 1,
    };

    match (ladder.get(from), ladder.get(to)) {
        (Some(old_role), Some(new_role)) => Ok(Transition {
            from,
            to,
            old_role: old_role.clone(),
            new_role: new_role.clone(),
        }),
        // classify keeps both indices in range
        _ => Err(CommandError::NoRank),
    }
}

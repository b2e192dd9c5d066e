//! Error types for staffrank-core.

use thiserror::Error;

/// Result type for staffrank-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while building the rank policy.
#[derive(Debug, Error)]
pub enum Error {
    /// The ladder cannot be used for transitions.
    #[error("invalid ladder: {0}")]
    InvalidLadder(String),

    /// A policy value is missing or malformed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Reasons a promote/demote command is refused before any mutation.
///
/// The `Display` text is exactly what the invoker sees.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// Invoker holds none of the allowed roles.
    #[error("❌ You are NOT allowed to use staff commands.")]
    Unauthorized,

    /// The `user` option did not resolve to a guild member.
    #[error("❌ User not found.")]
    TargetNotFound,

    /// Target holds no ladder role.
    #[error("❌ That user has **no staff rank**.")]
    NoRank,

    /// Promote on the top rung.
    #[error("❌ Already at **highest rank**.")]
    AtCeiling,

    /// Demote on the bottom rung.
    #[error("❌ Already at **lowest rank**.")]
    AtFloor,

    /// Command name is neither promote nor demote.
    #[error("❌ Unknown command `{0}`.")]
    UnknownCommand(String),

    /// Invoked from a guild other than the one this node serves.
    #[error("❌ Staff commands only work in this bot's home server.")]
    ForeignGuild,
}

impl CommandError {
    /// Whether the rejection should only be visible to the invoker.
    pub fn is_private(&self) -> bool {
        matches!(self, CommandError::Unauthorized | CommandError::ForeignGuild)
    }
}

/// Failure of a single remote call against the chat platform.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// The request never produced a response.
    #[error("transport error: {0}")]
    Transport(String),

    /// The platform answered with a non-success status.
    #[error("platform returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),
}

/// Result type for a single platform call.
pub type PlatformResult<T> = std::result::Result<T, PlatformError>;

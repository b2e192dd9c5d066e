//! Node configuration.
//!
//! Settings come from environment variables. Non-secret settings may also
//! live in a JSON file named by `STAFFRANK_CONFIG`; environment variables win
//! over the file. The bot token and the interaction public key are only ever
//! read from the environment.

use crate::error::{Error, Result};
use serde::Deserialize;
use staffrank_core::{AllowedRoles, ChannelId, GuildId, RankLadder, RankPolicy, RoleId};
use std::fmt;
use std::net::SocketAddr;
use std::path::Path;

/// REST API root used when `STAFFRANK_API_BASE` is unset.
pub const DEFAULT_API_BASE: &str = "https://discord.com/api/v10";

/// Listen address used when none is configured.
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";

/// Configuration for a staffrank node.
#[derive(Clone)]
pub struct NodeConfig {
    /// Bot token
    pub token: String,

    /// Application id (commands are registered under it)
    pub application_id: String,

    /// Hex Ed25519 key used to verify inbound interactions
    pub public_key: String,

    /// The one guild this node serves
    pub guild_id: GuildId,

    /// Rank roles, lowest first
    pub ladder: Vec<RoleId>,

    /// Roles allowed to run commands
    pub allowed_roles: Vec<RoleId>,

    /// Audit card channel
    pub log_channel: ChannelId,

    /// Card thumbnail/footer image
    pub avatar_url: Option<String>,

    /// Interaction endpoint listen address
    pub listen_addr: SocketAddr,

    /// REST API root
    pub api_base: String,
}

// Keeps the token out of logs.
impl fmt::Debug for NodeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeConfig")
            .field("token", &"<redacted>")
            .field("application_id", &self.application_id)
            .field("public_key", &self.public_key)
            .field("guild_id", &self.guild_id)
            .field("ladder", &self.ladder)
            .field("allowed_roles", &self.allowed_roles)
            .field("log_channel", &self.log_channel)
            .field("avatar_url", &self.avatar_url)
            .field("listen_addr", &self.listen_addr)
            .field("api_base", &self.api_base)
            .finish()
    }
}

/// Non-secret settings accepted from the JSON file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    guild_id: Option<String>,
    ladder: Option<Vec<String>>,
    allowed_roles: Option<Vec<String>>,
    log_channel: Option<String>,
    avatar_url: Option<String>,
    listen_addr: Option<String>,
}

impl FileConfig {
    fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

impl NodeConfig {
    /// Create config from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create config from an arbitrary key lookup (the environment in
    /// production).
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let file = match get("STAFFRANK_CONFIG") {
            Some(path) => FileConfig::load(Path::new(&path))?,
            None => FileConfig::default(),
        };

        let required = |key: &str| get(key).ok_or_else(|| Error::Config(format!("{key} is not set")));

        let token = required("STAFFRANK_TOKEN")?;
        let application_id = required("STAFFRANK_APP_ID")?;
        let public_key = required("STAFFRANK_PUBLIC_KEY")?;

        let guild_id = get("STAFFRANK_GUILD_ID")
            .or(file.guild_id)
            .map(GuildId::new)
            .ok_or_else(|| Error::Config("STAFFRANK_GUILD_ID is not set".to_string()))?;

        let ladder = get("STAFFRANK_LADDER")
            .map(|s| split_ids(&s))
            .or_else(|| file.ladder.map(|v| v.into_iter().map(RoleId::new).collect()))
            .ok_or_else(|| Error::Config("STAFFRANK_LADDER is not set".to_string()))?;

        let allowed_roles = get("STAFFRANK_ALLOWED_ROLES")
            .map(|s| split_ids(&s))
            .or_else(|| file.allowed_roles.map(|v| v.into_iter().map(RoleId::new).collect()))
            .ok_or_else(|| Error::Config("STAFFRANK_ALLOWED_ROLES is not set".to_string()))?;

        let log_channel = get("STAFFRANK_LOG_CHANNEL")
            .or(file.log_channel)
            .map(ChannelId::new)
            .ok_or_else(|| Error::Config("STAFFRANK_LOG_CHANNEL is not set".to_string()))?;

        let avatar_url = get("STAFFRANK_AVATAR_URL").or(file.avatar_url);

        let listen_raw = get("STAFFRANK_LISTEN_ADDR")
            .or(file.listen_addr)
            .unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string());
        let listen_addr = listen_raw
            .parse::<SocketAddr>()
            .map_err(|e| Error::Config(format!("invalid listen address {listen_raw:?}: {e}")))?;

        let api_base = get("STAFFRANK_API_BASE")
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            token,
            application_id,
            public_key,
            guild_id,
            ladder,
            allowed_roles,
            log_channel,
            avatar_url,
            listen_addr,
            api_base,
        })
    }

    /// Validate ladder and allow-list into the immutable policy.
    pub fn policy(&self) -> Result<RankPolicy> {
        let ladder = RankLadder::new(self.ladder.clone())?;
        let allowed = AllowedRoles::new(self.allowed_roles.clone())?;
        let policy = RankPolicy::new(ladder, allowed, self.log_channel.clone());
        Ok(match &self.avatar_url {
            Some(url) => policy.with_avatar(url.clone()),
            None => policy,
        })
    }
}

fn split_ids(raw: &str) -> Vec<RoleId> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(RoleId::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn base_env() -> HashMap<&'static str, String> {
        HashMap::from([
            ("STAFFRANK_TOKEN", "secret-token".to_string()),
            ("STAFFRANK_APP_ID", "app".to_string()),
            ("STAFFRANK_PUBLIC_KEY", "ab".repeat(32)),
            ("STAFFRANK_GUILD_ID", "guild".to_string()),
            ("STAFFRANK_LADDER", "jr, helper ,sr".to_string()),
            ("STAFFRANK_ALLOWED_ROLES", "owner,founder".to_string()),
            ("STAFFRANK_LOG_CHANNEL", "log".to_string()),
        ])
    }

    fn load(env: &HashMap<&'static str, String>) -> Result<NodeConfig> {
        NodeConfig::from_lookup(|k| env.get(k).cloned())
    }

    #[test]
    fn reads_environment_with_defaults() {
        let config = load(&base_env()).unwrap();
        assert_eq!(config.ladder, vec![RoleId::from("jr"), RoleId::from("helper"), RoleId::from("sr")]);
        assert_eq!(config.allowed_roles.len(), 2);
        assert_eq!(config.listen_addr, DEFAULT_LISTEN_ADDR.parse().unwrap());
        assert_eq!(config.api_base, DEFAULT_API_BASE);
        assert_eq!(config.avatar_url, None);

        let policy = config.policy().unwrap();
        assert_eq!(policy.ladder.len(), 3);
    }

    #[test]
    fn missing_token_is_an_error() {
        let mut env = base_env();
        env.remove("STAFFRANK_TOKEN");
        let err = load(&env).unwrap_err();
        assert!(err.to_string().contains("STAFFRANK_TOKEN"));
    }

    #[test]
    fn blank_values_count_as_missing() {
        let mut env = base_env();
        env.insert("STAFFRANK_LOG_CHANNEL", "  ".to_string());
        assert!(load(&env).is_err());
    }

    #[test]
    fn bad_listen_address_is_an_error() {
        let mut env = base_env();
        env.insert("STAFFRANK_LISTEN_ADDR", "not-an-addr".to_string());
        assert!(matches!(load(&env), Err(Error::Config(_))));
    }

    #[test]
    fn duplicate_ladder_fails_policy() {
        let mut env = base_env();
        env.insert("STAFFRANK_LADDER", "jr,jr".to_string());
        let config = load(&env).unwrap();
        assert!(matches!(config.policy(), Err(Error::Policy(_))));
    }

    #[test]
    fn file_values_yield_to_environment() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("staffrank.json");
        std::fs::write(
            &path,
            r#"{
                "guild_id": "file-guild",
                "ladder": ["a", "b"],
                "allowed_roles": ["boss"],
                "log_channel": "file-log",
                "avatar_url": "https://img/a.png",
                "listen_addr": "127.0.0.1:9000"
            }"#,
        )
        .unwrap();

        let mut env = base_env();
        env.remove("STAFFRANK_LADDER");
        env.remove("STAFFRANK_ALLOWED_ROLES");
        env.insert("STAFFRANK_CONFIG", path.display().to_string());

        let config = load(&env).unwrap();

        assert_eq!(config.ladder, vec![RoleId::from("a"), RoleId::from("b")]);
        assert_eq!(config.allowed_roles, vec![RoleId::from("boss")]);
        // env wins
        assert_eq!(config.guild_id, GuildId::from("guild"));
        assert_eq!(config.log_channel, ChannelId::from("log"));
        assert_eq!(config.avatar_url.as_deref(), Some("https://img/a.png"));
        assert_eq!(config.listen_addr.port(), 9000);
    }

    #[test]
    fn debug_redacts_token() {
        let config = load(&base_env()).unwrap();
        let printed = format!("{config:?}");
        assert!(!printed.contains("secret-token"));
        assert!(printed.contains("<redacted>"));
    }
}

//! Staffrank Node - the main application entry point.
//!
//! Startup order:
//! - validate config into the rank policy
//! - confirm the token works (logged, not fatal)
//! - register the slash commands (fatal on failure)
//! - serve the interaction endpoint

use crate::api::{self, AppState};
use crate::commands::staff_commands;
use crate::config::NodeConfig;
use crate::discord::{DiscordClient, FollowUp};
use crate::error::Result;
use crate::signature::InteractionVerifier;
use staffrank_core::{Platform, TransitionHandler};
use std::sync::Arc;

/// A staffrank node instance.
pub struct StaffNode {
    config: NodeConfig,
    discord: Arc<DiscordClient>,
    state: Arc<AppState>,
}

impl StaffNode {
    /// Create a new node. Fails on an invalid ladder, allow-list or public key.
    pub fn new(config: NodeConfig) -> Result<Self> {
        let policy = Arc::new(config.policy()?);
        let verifier = InteractionVerifier::from_hex(&config.public_key)?;
        let discord = Arc::new(DiscordClient::new(&config)?);

        let state = Arc::new(AppState {
            guild_id: config.guild_id.clone(),
            handler: TransitionHandler::new(policy, Arc::clone(&discord) as Arc<dyn Platform>),
            verifier,
            follow_up: Arc::clone(&discord) as Arc<dyn FollowUp>,
        });

        Ok(Self {
            config,
            discord,
            state,
        })
    }

    /// Register commands, then serve until the listener fails.
    pub async fn run(self) -> Result<()> {
        let policy = self.state.handler.policy();
        tracing::info!("Staffrank node starting");
        tracing::info!("  Listen: http://{}/interactions", self.config.listen_addr);
        tracing::info!("  Guild: {}", self.config.guild_id);
        tracing::info!("  Ladder: {} ranks", policy.ladder.len());
        tracing::info!("  Allowed roles: {}", policy.allowed.len());
        tracing::info!("  Log channel: {}", policy.log_channel);

        match self.discord.current_user().await {
            Ok(user) => tracing::info!("Logged in as {} ({})", user.username, user.id),
            Err(e) => tracing::warn!("Could not fetch bot identity: {}", e),
        }

        tracing::info!("Registering commands...");
        let registered = self.discord.register_commands(&staff_commands()).await?;
        tracing::info!("Slash commands registered ({})", registered);

        let app = api::build_router(Arc::clone(&self.state));

        let listener = tokio::net::TcpListener::bind(self.config.listen_addr).await?;
        tracing::info!("HTTP server listening on {}", self.config.listen_addr);

        axum::serve(listener, app).await?;

        Ok(())
    }
}

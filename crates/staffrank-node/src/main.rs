//! Staffrank Node binary
//!
//! Serves the promote/demote slash commands for one guild.

use staffrank_node::{NodeConfig, StaffNode};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "staffrank_node=info,staffrank_core=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Staffrank Node");

    let config = NodeConfig::from_env()?;

    let node = StaffNode::new(config)?;
    node.run().await?;

    Ok(())
}

//! Staffrank Node - slash-command endpoint for staff rank changes
//!
//! Receives promote/demote interactions over HTTP, runs them through
//! [`staffrank_core::TransitionHandler`], and talks to the platform REST API
//! for every side effect.
//!
//! # Architecture
//!
//! - **Config**: environment (plus optional JSON file) to [`NodeConfig`]
//! - **Signature**: Ed25519 check on every inbound request
//! - **Interaction**: payload model and response shapes
//! - **Commands**: slash-command definitions registered at startup
//! - **Discord**: REST client implementing the core `Platform` seam
//! - **API**: axum router for `/interactions` and health checks
//!
//! # Example
//!
//! ```no_run
//! use staffrank_node::{NodeConfig, StaffNode};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = NodeConfig::from_env()?;
//!     let node = StaffNode::new(config)?;
//!     node.run().await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod commands;
pub mod config;
pub mod discord;
pub mod error;
pub mod interaction;
pub mod node;
pub mod signature;

pub use config::NodeConfig;
pub use discord::DiscordClient;
pub use error::{Error, Result};
pub use node::StaffNode;

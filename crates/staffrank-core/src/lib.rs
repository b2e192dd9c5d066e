//! Staffrank Core - rank ladder transitions for a staff team
//!
//! Moves a guild member one rung up or down a fixed, ordered ladder of
//! roles and keeps their role set and nickname in line with the new rung.
//!
//! # Architecture
//!
//! - **Ladder**: ordered rank roles plus the immutable [`RankPolicy`]
//! - **Rank**: resolve a member's rung, promote/demote state machine
//! - **Reconcile**: strip every other rung, grant the target rung
//! - **Nickname**: `"{rank} | {username}"`, capped at 32 characters
//! - **Notify**: audit, DM and reply cards
//! - **Platform**: the async seam to the chat platform
//! - **Transition**: [`TransitionHandler`], the single entry point
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use staffrank_core::{Invocation, Platform, RankPolicy, TransitionHandler};
//!
//! async fn run(policy: RankPolicy, platform: Arc<dyn Platform>, invocation: Invocation) {
//!     let handler = TransitionHandler::new(Arc::new(policy), platform);
//!     let reply = handler.handle(&invocation).await;
//!     println!("{:?}", reply);
//! }
//! ```

pub mod error;
pub mod ids;
pub mod ladder;
pub mod nickname;
pub mod notify;
pub mod outcome;
pub mod platform;
pub mod rank;
pub mod reconcile;
pub mod transition;

pub use error::{CommandError, Error, PlatformError, PlatformResult, Result};
pub use ids::{ChannelId, GuildId, RoleId, UserId};
pub use ladder::{AllowedRoles, Member, RankLadder, RankPolicy};
pub use nickname::{format_nickname, MAX_NICKNAME_CHARS};
pub use notify::{Embed, Message, TransitionRecord};
pub use outcome::{ReconcileReport, SideEffectReport, StepOutcome};
pub use platform::Platform;
pub use rank::{plan, resolve, Direction, RankPosition, RankState, Transition};
pub use reconcile::reconcile;
pub use transition::{Invocation, TransitionHandler, TransitionOutcome, TransitionPlan};

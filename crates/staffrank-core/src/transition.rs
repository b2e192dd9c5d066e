//! Promote/demote orchestration.
//!
//! A command runs in two phases. [`TransitionHandler::check`] is pure and
//! decides whether anything will change. [`TransitionHandler::apply`] then
//! performs the remote side effects in a fixed order:
//!
//! 1. reconcile roles toward the new rung
//! 2. rename the target
//! 3. post the audit card
//! 4. DM the target
//! 5. build the confirmation reply
//!
//! Steps 1-4 are best-effort. Their outcomes are collected and logged, and
//! the reply reports success either way.
//!
//! The handler holds no state across invocations and takes no lock on the
//! target; two concurrent commands on one member may interleave.

use crate::error::CommandError;
use crate::ids::{RoleId, UserId};
use crate::ladder::{Member, RankPolicy};
use crate::nickname::format_nickname;
use crate::notify::{Message, TransitionRecord, UNKNOWN_GUILD, UNKNOWN_RANK};
use crate::outcome::{SideEffectReport, StepOutcome};
use crate::platform::Platform;
use crate::rank::{plan, resolve, Direction, Transition};
use crate::reconcile::reconcile;
use chrono::Utc;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{info, warn};

/// One inbound slash command, as extracted from the platform event.
#[derive(Debug, Clone)]
pub struct Invocation {
    /// Command name.
    pub command: String,
    /// Who ran it.
    pub invoker: UserId,
    /// Roles the invoker holds.
    pub invoker_roles: BTreeSet<RoleId>,
    /// The `user` option, if it resolved to a guild member.
    pub target: Option<Member>,
}

/// A transition that passed every check and is ready to apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionPlan {
    pub direction: Direction,
    pub invoker: UserId,
    pub target: Member,
    pub transition: Transition,
}

/// Result of applying a plan.
#[derive(Debug, Clone)]
pub struct TransitionOutcome {
    pub record: TransitionRecord,
    pub report: SideEffectReport,
    /// Confirmation for the invoker.
    pub reply: Message,
}

/// Composes resolver, reconciler, formatter and notifier against one
/// platform.
pub struct TransitionHandler {
    policy: Arc<RankPolicy>,
    platform: Arc<dyn Platform>,
}

impl TransitionHandler {
    /// Create a handler for `policy` talking to `platform`.
    pub fn new(policy: Arc<RankPolicy>, platform: Arc<dyn Platform>) -> Self {
        Self { policy, platform }
    }

    /// The policy this handler enforces.
    pub fn policy(&self) -> &RankPolicy {
        &self.policy
    }

    /// Decide whether the invocation leads to a transition. No remote calls.
    ///
    /// Checks run in order: permission guard, target present, command name,
    /// current rank, ladder boundary.
    pub fn check(&self, invocation: &Invocation) -> Result<TransitionPlan, CommandError> {
        if !self.policy.allowed.authorize(&invocation.invoker_roles) {
            return Err(CommandError::Unauthorized);
        }

        let target = invocation
            .target
            .as_ref()
            .ok_or(CommandError::TargetNotFound)?;

        let direction = Direction::from_command(&invocation.command)?;
        let position = resolve(&target.roles, &self.policy.ladder);
        let transition = plan(direction, position, &self.policy.ladder)?;

        Ok(TransitionPlan {
            direction,
            invoker: invocation.invoker.clone(),
            target: target.clone(),
            transition,
        })
    }

    /// Perform the side effects of a checked plan.
    pub async fn apply(&self, plan: TransitionPlan) -> TransitionOutcome {
        let TransitionPlan {
            direction,
            invoker,
            target,
            transition,
        } = plan;
        let avatar = self.policy.avatar_url.as_deref();

        let roles = reconcile(
            self.platform.as_ref(),
            &target,
            &self.policy.ladder,
            &transition.new_role,
        )
        .await;

        let new_rank_name = self.rank_name(&transition.new_role).await;
        let nickname = format_nickname(&new_rank_name, &target.username);
        let nickname_outcome =
            StepOutcome::from(self.platform.set_nickname(&target.id, &nickname).await);
        if let StepOutcome::Failed(e) = &nickname_outcome {
            warn!(user = %target.id, "set nickname failed: {}", e);
        }

        let record = TransitionRecord {
            direction,
            target: target.id.clone(),
            invoker,
            old_rank_name: self.rank_name(&transition.old_role).await,
            new_rank_name,
        };

        let audit = Message::embed(record.audit_card(avatar, Utc::now()));
        let audit_log = StepOutcome::from(
            self.platform
                .send_channel_message(&self.policy.log_channel, &audit)
                .await,
        );
        if let StepOutcome::Failed(e) = &audit_log {
            warn!(channel = %self.policy.log_channel, "audit log failed: {}", e);
        }

        let guild = self
            .platform
            .guild_name()
            .await
            .unwrap_or_else(|| UNKNOWN_GUILD.to_string());
        let dm = Message::embed(record.direct_card(&guild, avatar, Utc::now()));
        let direct_message =
            StepOutcome::from(self.platform.send_direct_message(&target.id, &dm).await);
        if let StepOutcome::Failed(e) = &direct_message {
            warn!(user = %target.id, "direct message failed: {}", e);
        }

        let report = SideEffectReport {
            roles,
            nickname: nickname_outcome,
            audit_log,
            direct_message,
        };

        info!(
            command = %direction,
            user = %record.target,
            by = %record.invoker,
            from = %record.old_rank_name,
            to = %record.new_rank_name,
            failures = report.failures(),
            "transition applied"
        );

        let reply = Message::embed(record.reply_card(avatar, Utc::now()));
        TransitionOutcome {
            record,
            report,
            reply,
        }
    }

    /// Check then apply; refusals become the reply.
    pub async fn handle(&self, invocation: &Invocation) -> Message {
        match self.check(invocation) {
            Ok(plan) => self.apply(plan).await.reply,
            Err(e) => {
                info!(command = %invocation.command, by = %invocation.invoker, "refused: {:?}", e);
                Message::from(&e)
            }
        }
    }

    async fn rank_name(&self, role: &RoleId) -> String {
        self.platform
            .role_name(role)
            .await
            .unwrap_or_else(|| UNKNOWN_RANK.to_string())
    }
}

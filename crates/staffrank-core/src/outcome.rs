//! Per-step outcomes of the best-effort side effects.
//!
//! Failures are collected here instead of being dropped on the floor. They
//! never turn a transition into an error reply.

use crate::error::PlatformResult;
use crate::ids::RoleId;

/// Result of one remote call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// The platform accepted the call.
    Applied,
    /// The call failed; the message is kept for logging.
    Failed(String),
}

impl StepOutcome {
    /// Whether the call failed.
    pub fn is_failed(&self) -> bool {
        matches!(self, StepOutcome::Failed(_))
    }
}

impl<T> From<PlatformResult<T>> for StepOutcome {
    fn from(result: PlatformResult<T>) -> Self {
        match result {
            Ok(_) => StepOutcome::Applied,
            Err(e) => StepOutcome::Failed(e.to_string()),
        }
    }
}

/// Outcome of role reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileReport {
    /// One entry per ladder role the member held other than the target.
    pub removals: Vec<(RoleId, StepOutcome)>,
    /// The add of the target role.
    pub addition: StepOutcome,
}

impl ReconcileReport {
    /// Number of failed calls.
    pub fn failures(&self) -> usize {
        self.removals.iter().filter(|(_, o)| o.is_failed()).count()
            + usize::from(self.addition.is_failed())
    }
}

/// Everything one transition tried to do, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SideEffectReport {
    pub roles: ReconcileReport,
    pub nickname: StepOutcome,
    pub audit_log: StepOutcome,
    pub direct_message: StepOutcome,
}

impl SideEffectReport {
    /// Number of failed calls across all steps.
    pub fn failures(&self) -> usize {
        self.roles.failures()
            + [&self.nickname, &self.audit_log, &self.direct_message]
                .iter()
                .filter(|o| o.is_failed())
                .count()
    }

    /// True when every attempted call went through.
    pub fn is_clean(&self) -> bool {
        self.failures() == 0
    }
}

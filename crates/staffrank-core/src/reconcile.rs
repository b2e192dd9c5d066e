//! Role reconciliation: leave the member holding exactly one ladder role.

use crate::ids::RoleId;
use crate::ladder::{Member, RankLadder};
use crate::outcome::{ReconcileReport, StepOutcome};
use crate::platform::Platform;
use tracing::{debug, warn};

/// Remove every other ladder role the member holds, then add `target`.
///
/// Calls are issued one at a time, in ladder order. Each one may fail on its
/// own; the rest still run. Nothing is rolled back, so a partial failure can
/// leave zero or several ladder roles held until the next command.
pub async fn reconcile(
    platform: &dyn Platform,
    member: &Member,
    ladder: &RankLadder,
    target: &RoleId,
) -> ReconcileReport {
    let mut removals = Vec::new();

    for (_, role) in ladder.iter() {
        if role == target || !member.has_role(role) {
            continue;
        }
        let outcome = StepOutcome::from(platform.remove_role(&member.id, role).await);
        match &outcome {
            StepOutcome::Failed(e) => warn!(user = %member.id, role = %role, "remove role failed: {}", e),
            _ => debug!(user = %member.id, role = %role, "removed ladder role"),
        }
        removals.push((role.clone(), outcome));
    }

    let addition = StepOutcome::from(platform.add_role(&member.id, target).await);
    if let StepOutcome::Failed(e) = &addition {
        warn!(user = %member.id, role = %target, "add role failed: {}", e);
    }

    ReconcileReport { removals, addition }
}

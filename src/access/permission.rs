//! Permission evaluation for accounts and print jobs.
//!
//! Every UI surface that renders a mutation control asks these functions;
//! nothing is cached between calls.

use crate::access::hierarchy::{has_capability, oversees_all_jobs, AccountCap};
use crate::core::error::{Anomaly, Diagnostics};
use crate::models::account::Account;
use crate::models::job::{JobStatus, PrintJob};
use crate::models::role::Role;
use serde::Serialize;
use tracing::debug;

/// Account-level action an actor may attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    View,
    Edit,
    ToggleActive,
    Delete,
    Verify,
    /// Create a new account that will carry the given role
    CreateWithRole(Role),
}

impl Action {
    fn capability(&self) -> u8 {
        match self {
            Action::View => AccountCap::VIEW,
            Action::Edit => AccountCap::EDIT,
            Action::ToggleActive => AccountCap::TOGGLE_ACTIVE,
            Action::Delete => AccountCap::DELETE,
            Action::Verify => AccountCap::VERIFY,
            Action::CreateWithRole(_) => AccountCap::CREATE,
        }
    }
}

/// Role-level check. For `CreateWithRole(r)` the role being created is
/// the target and `target` is ignored.
pub fn can_act_on(actor: Role, target: Role, action: Action) -> bool {
    match action {
        Action::CreateWithRole(created) => has_capability(actor, created, action.capability()),
        _ => has_capability(actor, target, action.capability()),
    }
}

/// Same check over raw role codes straight from the feed. Unknown codes
/// deny the action and are recorded as anomalies.
pub fn can_act_on_codes(
    actor: &str,
    target: &str,
    action: Action,
    diagnostics: &mut Diagnostics,
) -> bool {
    let actor_role = actor.parse::<Role>();
    let target_role = target.parse::<Role>();

    if actor_role.is_err() {
        diagnostics.record(Anomaly::UnknownRole {
            context: "permission actor".to_string(),
            value: actor.to_string(),
        });
    }
    if target_role.is_err() {
        diagnostics.record(Anomaly::UnknownRole {
            context: "permission target".to_string(),
            value: target.to_string(),
        });
    }

    match (actor_role, target_role) {
        (Ok(a), Ok(t)) => can_act_on(a, t, action),
        _ => {
            debug!(actor, target, action = ?action, "Denied: unrecognized role");
            false
        }
    }
}

/// Account-level check: adds self-view and account state on top of the
/// role table.
pub fn can_act_on_account(actor: &Account, target: &Account, action: Action) -> bool {
    if action == Action::View && actor.id == target.id {
        return true;
    }
    if action == Action::Verify && target.verified {
        return false;
    }
    can_act_on(actor.role, target.role, action)
}

/// Per-row action availability for an account listing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RowActions {
    pub view: bool,
    pub edit: bool,
    pub toggle_active: bool,
    pub delete: bool,
    pub verify: bool,
}

impl RowActions {
    pub fn for_target(actor: &Account, target: &Account) -> Self {
        Self {
            view: can_act_on_account(actor, target, Action::View),
            edit: can_act_on_account(actor, target, Action::Edit),
            toggle_active: can_act_on_account(actor, target, Action::ToggleActive),
            delete: can_act_on_account(actor, target, Action::Delete),
            verify: can_act_on_account(actor, target, Action::Verify),
        }
    }

    pub fn any_mutation(&self) -> bool {
        self.edit || self.toggle_active || self.delete || self.verify
    }
}

/// Print job operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobAction {
    Approve,
    Reject,
    Start,
    Complete,
    Fail,
    Cancel,
}

impl JobAction {
    pub const ALL: [JobAction; 6] = [
        JobAction::Approve,
        JobAction::Reject,
        JobAction::Start,
        JobAction::Complete,
        JobAction::Fail,
        JobAction::Cancel,
    ];

    /// Status the job ends up in after this action.
    pub fn target_status(&self) -> JobStatus {
        match self {
            JobAction::Approve => JobStatus::Approved,
            JobAction::Reject => JobStatus::Rejected,
            JobAction::Start => JobStatus::Printing,
            JobAction::Complete => JobStatus::Completed,
            JobAction::Fail => JobStatus::Failed,
            JobAction::Cancel => JobStatus::Cancelled,
        }
    }
}

pub fn can_view_job(actor: &Account, job: &PrintJob) -> bool {
    oversees_all_jobs(actor.role) || job.owner_id == actor.id
}

/// Staff run the workflow; owners may also cancel their own jobs. The
/// move must also be legal from the job's current status.
pub fn can_act_on_job(actor: &Account, job: &PrintJob, action: JobAction) -> bool {
    let allowed = match action {
        JobAction::Cancel => job.owner_id == actor.id || oversees_all_jobs(actor.role),
        _ => oversees_all_jobs(actor.role),
    };
    allowed && job.status.can_transition_to(action.target_status())
}

/// Jobs the actor is allowed to see, in input order.
pub fn visible_jobs<'a>(actor: &Account, jobs: &'a [PrintJob]) -> Vec<&'a PrintJob> {
    jobs.iter().filter(|job| can_view_job(actor, job)).collect()
}

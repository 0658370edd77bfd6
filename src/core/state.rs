// Console state (ConsoleState)

use crate::access::permission::{can_act_on, can_act_on_account, can_act_on_job, Action, JobAction};
use crate::core::config::Config;
use crate::core::error::{Anomaly, Diagnostics, MutationError, PricingError, TransitionError};
use crate::core::startup::Ingested;
use crate::models::account::{Account, Department};
use crate::models::job::PrintJob;
use crate::models::pricing::{check_submission, QuoteRequest};
use crate::models::printer::Printer;
use crate::models::quantity::Money;
use crate::stores::record_store::RecordStore;
use chrono::{DateTime, Utc};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::info;

/// Shared console state
///
/// Holds the local copy of every backend collection. Mutations are applied
/// optimistically and leave the affected store stale until [`refresh`]
/// brings in the next fetch.
///
/// [`refresh`]: ConsoleState::refresh
#[derive(Clone)]
pub struct ConsoleState {
    pub accounts: Arc<RecordStore<Account>>,
    pub jobs: Arc<RecordStore<PrintJob>>,
    pub printers: Arc<RecordStore<Printer>>,
    pub departments: Arc<RwLock<Vec<Department>>>,
    pub config: Arc<Config>,
}

impl ConsoleState {
    pub fn new(config: Config) -> Self {
        Self {
            accounts: Arc::new(RecordStore::new()),
            jobs: Arc::new(RecordStore::new()),
            printers: Arc::new(RecordStore::new()),
            departments: Arc::new(RwLock::new(Vec::new())),
            config: Arc::new(config),
        }
    }

    /// Replace local collections with a fresh fetch.
    ///
    /// An incoming job whose status cannot be reached from the local one
    /// (a backward move, or a swap between finished statuses) is ignored
    /// in favour of the local copy.
    pub fn refresh(&self, ingested: Ingested, diagnostics: &mut Diagnostics) {
        let mut jobs = Vec::with_capacity(ingested.jobs.len());
        for incoming in ingested.jobs {
            match self.jobs.get(incoming.id) {
                Some(local) if incoming.status != local.status && !local.status.can_reach(incoming.status) => {
                    diagnostics.record(Anomaly::StatusRegression {
                        job_id: incoming.id,
                        from: local.status,
                        to: incoming.status,
                    });
                    jobs.push(PrintJob::clone(&local));
                }
                _ => jobs.push(incoming),
            }
        }

        self.accounts.replace_all(ingested.accounts);
        self.jobs.replace_all(jobs);
        self.printers.replace_all(ingested.printers);
        // Assignment is whole, so a poisoned lock holds no partial list
        *self.departments.write().unwrap_or_else(PoisonError::into_inner) = ingested.departments;

        info!(
            accounts = self.accounts.len(),
            jobs = self.jobs.len(),
            printers = self.printers.len(),
            "Console state refreshed"
        );
    }

    /// Whether any local mutation is waiting for a re-fetch.
    pub fn needs_refresh(&self) -> bool {
        self.accounts.is_stale() || self.jobs.is_stale() || self.printers.is_stale()
    }

    pub fn account(&self, id: u32) -> Result<Arc<Account>, MutationError> {
        self.accounts.get(id).ok_or(MutationError::AccountNotFound(id))
    }

    fn check_account_action(&self, actor: &Account, target_id: u32, action: Action) -> Result<Arc<Account>, MutationError> {
        let target = self.account(target_id)?;
        if !can_act_on_account(actor, &target, action) {
            return Err(forbidden(actor, action, target_id));
        }
        Ok(target)
    }

    /// Verify a pending account. Verification happens once; only actors
    /// allowed to verify learn that it already happened.
    pub fn verify_account(&self, actor: &Account, target_id: u32) -> Result<Arc<Account>, MutationError> {
        let target = self.account(target_id)?;
        if !can_act_on(actor.role, target.role, Action::Verify) {
            return Err(forbidden(actor, Action::Verify, target_id));
        }
        if target.verified {
            return Err(MutationError::AlreadyVerified(target_id));
        }

        let updated = self
            .accounts
            .update(target_id, |account| {
                account.verified = true;
                Ok::<(), MutationError>(())
            })
            .ok_or(MutationError::AccountNotFound(target_id))??;

        info!(actor_id = actor.id, account_id = target_id, "Account verified");
        Ok(updated)
    }

    pub fn set_account_active(
        &self,
        actor: &Account,
        target_id: u32,
        active: bool,
    ) -> Result<Arc<Account>, MutationError> {
        self.check_account_action(actor, target_id, Action::ToggleActive)?;

        let updated = self
            .accounts
            .update(target_id, |account| {
                account.active = active;
                Ok::<(), MutationError>(())
            })
            .ok_or(MutationError::AccountNotFound(target_id))??;

        info!(actor_id = actor.id, account_id = target_id, active, "Account activation changed");
        Ok(updated)
    }

    /// Remove the account locally; the backend delete happens elsewhere.
    pub fn delete_account(&self, actor: &Account, target_id: u32) -> Result<Arc<Account>, MutationError> {
        self.check_account_action(actor, target_id, Action::Delete)?;
        let removed = self
            .accounts
            .remove(target_id)
            .ok_or(MutationError::AccountNotFound(target_id))?;

        info!(actor_id = actor.id, account_id = target_id, "Account removed");
        Ok(removed)
    }

    /// Run a workflow action on a job, stamping the matching timestamp.
    pub fn act_on_job(
        &self,
        actor: &Account,
        job_id: u32,
        action: JobAction,
        at: DateTime<Utc>,
    ) -> Result<Arc<PrintJob>, MutationError> {
        let job = self.jobs.get(job_id).ok_or(MutationError::JobNotFound(job_id))?;
        if !can_act_on_job(actor, &job, action) {
            // Tell an illegal move apart from a missing permission
            if !job.status.can_transition_to(action.target_status()) {
                return Err(MutationError::Transition(TransitionError {
                    from: job.status,
                    to: action.target_status(),
                }));
            }
            return Err(MutationError::Forbidden(format!(
                "{} may not {:?} job {}",
                actor.role, action, job_id
            )));
        }

        let updated = self
            .jobs
            .update(job_id, |job| job.transition(action.target_status(), at))
            .ok_or(MutationError::JobNotFound(job_id))??;

        info!(
            actor_id = actor.id,
            job_id,
            action = ?action,
            status = %updated.status,
            "Job status changed"
        );
        Ok(updated)
    }

    /// Price a prospective job for `actor` and check that they may submit it.
    pub fn quote_submission(&self, actor: &Account, request: &QuoteRequest) -> Result<Money, PricingError> {
        let pricing = self.config.pricing.as_ref().ok_or(PricingError::NoPricingConfig)?;
        let cost = pricing.quote(request, actor.role, actor.credit.discount_percentage);
        check_submission(actor, &self.jobs.snapshot(), cost)?;

        info!(
            actor_id = actor.id,
            minutes = request.minutes,
            material = %request.material,
            cost = %cost,
            "Submission quoted"
        );
        Ok(cost)
    }
}

fn forbidden(actor: &Account, action: Action, target_id: u32) -> MutationError {
    MutationError::Forbidden(format!("{} may not {:?} account {}", actor.role, action, target_id))
}

use crate::access::hierarchy::assignable_roles;
use crate::access::permission::{can_act_on_account, can_act_on_job, visible_jobs, Action, JobAction, RowActions};
use crate::filter::accounts::{filter_accounts, AccountFilter};
use crate::filter::jobs::JobQuery;
use crate::models::account::Account;
use crate::models::job::PrintJob;
use crate::models::role::Role;
use crate::view::pagination::{Page, PageCursor};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Serialize)]
pub struct AccountRow<'a> {
    pub account: &'a Account,
    pub actions: RowActions,
}

#[derive(Debug, Serialize)]
pub struct AccountPage<'a> {
    #[serde(flatten)]
    pub page: Page<AccountRow<'a>>,
    /// Roles the actor may pick in the create form; empty hides the form
    pub can_create: Vec<Role>,
}

/// Account listing: filter, keep rows the actor may view, paginate.
pub struct AccountTable<'a> {
    actor: &'a Account,
}

impl<'a> AccountTable<'a> {
    pub fn new(actor: &'a Account) -> Self {
        Self { actor }
    }

    pub fn render(
        &self,
        accounts: &'a [Account],
        filter: &AccountFilter,
        cursor: &mut PageCursor,
    ) -> AccountPage<'a> {
        let visible: Vec<&Account> = filter_accounts(accounts, filter)
            .into_iter()
            .filter(|target| can_act_on_account(self.actor, target, Action::View))
            .collect();

        let window = cursor.resolve(filter, visible.len());
        let rows = window
            .slice(&visible)
            .iter()
            .map(|target| AccountRow {
                account: *target,
                actions: RowActions::for_target(self.actor, target),
            })
            .collect();

        debug!(
            actor_id = self.actor.id,
            matches = visible.len(),
            page = window.page,
            total_pages = window.total_pages,
            "Rendered account page"
        );

        AccountPage {
            page: Page {
                data: rows,
                total: visible.len(),
                window,
            },
            can_create: assignable_roles(self.actor.role),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct JobRow<'a> {
    pub job: &'a PrintJob,
    /// Actions the actor may take on this job right now
    pub actions: Vec<JobAction>,
}

/// Job listing scoped to what the actor may see.
pub struct JobList<'a> {
    actor: &'a Account,
}

impl<'a> JobList<'a> {
    pub fn new(actor: &'a Account) -> Self {
        Self { actor }
    }

    pub fn render(
        &self,
        jobs: &'a [PrintJob],
        query: &JobQuery,
        cursor: &mut PageCursor,
        now: DateTime<Utc>,
    ) -> Page<JobRow<'a>> {
        let sorted = query.apply(visible_jobs(self.actor, jobs), now);

        let window = cursor.resolve(query, sorted.len());
        let data = window
            .slice(&sorted)
            .iter()
            .map(|job| JobRow {
                job: *job,
                actions: JobAction::ALL
                    .into_iter()
                    .filter(|action| can_act_on_job(self.actor, job, *action))
                    .collect(),
            })
            .collect();

        Page {
            data,
            total: sorted.len(),
            window,
        }
    }
}

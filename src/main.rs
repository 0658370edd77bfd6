use anyhow::{bail, Context, Result};
use chrono::Utc;
use printlab::access::hierarchy::oversees_all_jobs;
use printlab::access::permission::visible_jobs;
use printlab::access::sections::{navigation, Section};
use printlab::core::config::Config;
use printlab::core::error::{Anomaly, Diagnostics};
use printlab::core::startup::ingest;
use printlab::core::state::ConsoleState;
use printlab::core::tracing_init::init_tracing;
use printlab::feed::snapshot::Snapshot;
use printlab::filter::accounts::AccountFilter;
use printlab::filter::jobs::{JobQuery, StatusGroup};
use printlab::metrics::aggregator::{aggregate, Metrics};
use printlab::metrics::dashboard::{system_alerts, AdminDashboard, SystemAlert};
use printlab::models::account::Account;
use printlab::models::pricing::SubmissionStatus;
use printlab::view::pagination::{Page, PageCursor};
use printlab::view::table::{AccountPage, AccountTable, JobList, JobRow};
use serde::Serialize;
use std::env;
use std::path::PathBuf;
use tracing::info;

#[derive(Serialize)]
struct Report<'a> {
    actor: &'a Account,
    navigation: Vec<Section>,
    accounts: AccountPage<'a>,
    active_jobs: Page<JobRow<'a>>,
    metrics: Metrics,
    submission: SubmissionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    admin: Option<AdminDashboard>,
    alerts: Vec<SystemAlert>,
    anomalies: &'a [Anomaly],
}

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    let config_path = if args.len() > 1 {
        PathBuf::from(&args[1])
    } else {
        PathBuf::from("config.toml")
    };

    let config = Config::from_file(&config_path)
        .context(format!("Failed to load configuration from '{}'", config_path.display()))?;

    init_tracing(&config.logging)?;

    let Some(actor_arg) = args.get(2) else {
        bail!("Usage: printlab [config.toml] <actor_id> [filter-query]");
    };
    let actor_id: u32 = actor_arg
        .parse()
        .context(format!("Invalid actor id '{}'", actor_arg))?;
    let filter_query = args.get(3).map(String::as_str).unwrap_or("");

    let snapshot_path = config.snapshot_path(&config_path);
    info!(
        config_path = %config_path.display(),
        snapshot_path = %snapshot_path.display(),
        page_size = config.console.page_size,
        log_level = %config.logging.level,
        "Print lab console starting"
    );

    let snapshot = Snapshot::from_file(&snapshot_path)?;
    let filter = AccountFilter::from_query(filter_query)?;

    let mut diagnostics = Diagnostics::new();
    let ingested = ingest(snapshot, &config, &mut diagnostics);
    let departments = ingested.departments.clone();

    let state = ConsoleState::new(config);
    state.refresh(ingested, &mut diagnostics);

    let actor = state
        .account(actor_id)
        .context(format!("Actor {} is not in the snapshot", actor_id))?;

    let accounts = state.accounts.snapshot();
    let jobs = state.jobs.snapshot();
    let printers = state.printers.snapshot();
    let now = Utc::now();

    let mut account_cursor = PageCursor::new(state.config.console.page_size);
    let account_page = AccountTable::new(&actor).render(&accounts, &filter, &mut account_cursor);

    let mut job_cursor = PageCursor::new(state.config.console.page_size);
    let active_jobs = JobList::new(&actor).render(
        &jobs,
        &JobQuery::in_group(StatusGroup::Active),
        &mut job_cursor,
        now,
    );

    let metrics = aggregate(visible_jobs(&actor, &jobs));
    let submission = SubmissionStatus::for_account(&actor, &jobs);

    let staff = oversees_all_jobs(actor.role);
    let admin = staff.then(|| AdminDashboard::build(&accounts, &jobs, &printers, &departments, now));
    let alerts = if staff {
        system_alerts(&accounts, &jobs, &printers)
    } else {
        Vec::new()
    };

    info!(
        actor_id,
        role = %actor.role,
        accounts_shown = account_page.page.data.len(),
        visible_jobs = metrics.total_jobs,
        anomalies = diagnostics.len(),
        "Report built"
    );

    let report = Report {
        actor: &actor,
        navigation: navigation(actor.role),
        accounts: account_page,
        active_jobs,
        metrics,
        submission,
        admin,
        alerts,
        anomalies: diagnostics.anomalies(),
    };

    let output = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
    println!("{}", output);

    Ok(())
}

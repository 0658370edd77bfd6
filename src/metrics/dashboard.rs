use crate::metrics::aggregator::{aggregate_with_owners, ranked, CategoryCount, DepartmentCount};
use crate::models::account::{Account, Department};
use crate::models::job::{JobStatus, MaterialType, PrintJob};
use crate::models::printer::{Printer, PrinterStatus};
use crate::models::quantity::Money;
use crate::models::role::Role;
use crate::utils::time::is_same_day;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct AccountSummary {
    pub total: u64,
    pub active: u64,
    pub inactive: u64,
    pub pending_verification: u64,
    pub per_role: Vec<CategoryCount<Role>>,
}

impl AccountSummary {
    pub fn from_accounts(accounts: &[Account]) -> Self {
        let mut summary = AccountSummary::default();
        let mut roles = BTreeMap::new();
        for account in accounts {
            summary.total += 1;
            if account.active {
                summary.active += 1;
            } else {
                summary.inactive += 1;
            }
            if !account.verified {
                summary.pending_verification += 1;
            }
            *roles.entry(account.role).or_insert(0) += 1;
        }
        summary.per_role = ranked(&roles);
        summary
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PrinterSummary {
    pub total: u64,
    /// Printers not retired
    pub active: u64,
    pub per_status: Vec<CategoryCount<PrinterStatus>>,
    pub needing_maintenance: u64,
    pub total_print_hours: f64,
}

impl PrinterSummary {
    /// Status and maintenance figures cover active printers only.
    pub fn from_printers(printers: &[Printer]) -> Self {
        let mut summary = PrinterSummary::default();
        let mut statuses = BTreeMap::new();
        for printer in printers {
            summary.total += 1;
            summary.total_print_hours += printer.total_print_hours;
            if !printer.is_active {
                continue;
            }
            summary.active += 1;
            *statuses.entry(printer.status).or_insert(0) += 1;
            if printer.needs_maintenance() {
                summary.needing_maintenance += 1;
            }
        }
        summary.per_status = ranked(&statuses);
        summary
    }
}

/// Staff-wide overview over the whole snapshot.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AdminDashboard {
    pub total_printers: u64,
    pub total_users: u64,
    pub total_jobs: u64,
    pub total_departments: u64,
    pub jobs_today: u64,
    pub jobs_by_status: Vec<CategoryCount<JobStatus>>,
    pub users_by_role: Vec<CategoryCount<Role>>,
    pub material_usage: Vec<CategoryCount<MaterialType>>,
    pub jobs_by_department: Vec<DepartmentCount>,
    pub printers_by_status: Vec<CategoryCount<PrinterStatus>>,
    pub printers_needing_maintenance: u64,
    /// Actual minutes of completed jobs, same definition as the user dashboard
    pub total_print_time_minutes: u64,
    /// Cost of completed jobs
    pub total_revenue: Money,
    pub unattributed_jobs: u64,
}

impl AdminDashboard {
    pub fn build(
        accounts: &[Account],
        jobs: &[PrintJob],
        printers: &[Printer],
        departments: &[Department],
        now: DateTime<Utc>,
    ) -> Self {
        let metrics = aggregate_with_owners(jobs, accounts);
        let users = AccountSummary::from_accounts(accounts);
        let fleet = PrinterSummary::from_printers(printers);

        let jobs_today = jobs
            .iter()
            .filter(|job| is_same_day(job.uploaded_at, now))
            .count() as u64;

        Self {
            total_printers: fleet.active,
            total_users: users.active,
            total_jobs: metrics.total_jobs,
            total_departments: departments.len() as u64,
            jobs_today,
            jobs_by_status: metrics.per_status,
            users_by_role: users.per_role,
            material_usage: metrics.per_material,
            jobs_by_department: metrics.per_department,
            printers_by_status: fleet.per_status,
            printers_needing_maintenance: fleet.needing_maintenance,
            total_print_time_minutes: metrics.total_print_time_minutes,
            total_revenue: metrics.total_spent,
            unattributed_jobs: metrics.unattributed,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    PendingVerification,
    PendingApproval,
    MaintenanceDue,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SystemAlert {
    pub kind: AlertKind,
    pub count: u64,
    pub message: String,
}

/// Alerts for the staff dashboard; empty when nothing needs attention.
pub fn system_alerts(accounts: &[Account], jobs: &[PrintJob], printers: &[Printer]) -> Vec<SystemAlert> {
    let unverified = accounts.iter().filter(|a| !a.verified).count() as u64;
    let pending = jobs.iter().filter(|j| j.status == JobStatus::Pending).count() as u64;
    let maintenance = printers
        .iter()
        .filter(|p| p.is_active && p.needs_maintenance())
        .count() as u64;

    let mut alerts = Vec::new();
    if unverified > 0 {
        alerts.push(SystemAlert {
            kind: AlertKind::PendingVerification,
            count: unverified,
            message: format!("{} users pending verification", unverified),
        });
    }
    if pending > 0 {
        alerts.push(SystemAlert {
            kind: AlertKind::PendingApproval,
            count: pending,
            message: format!("{} jobs pending approval", pending),
        });
    }
    if maintenance > 0 {
        alerts.push(SystemAlert {
            kind: AlertKind::MaintenanceDue,
            count: maintenance,
            message: format!("{} printers need maintenance", maintenance),
        });
    }
    alerts
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 10, 15, 0, 0).unwrap()
    }

    fn account(id: u32, role: Role, active: bool, verified: bool) -> Account {
        let mut account = Account::new(id, format!("user{}", id), role, now());
        account.active = active;
        account.verified = verified;
        account
    }

    fn printer(id: u32, status: PrinterStatus, hours: f64) -> Printer {
        let mut printer = Printer::new(id, format!("printer{}", id), status);
        printer.maintenance_interval_hours = 500;
        printer.total_print_hours = hours;
        printer
    }

    #[test]
    fn test_account_summary() {
        let accounts = vec![
            account(1, Role::Student, true, false),
            account(2, Role::Student, false, true),
            account(3, Role::Admin, true, true),
        ];
        let summary = AccountSummary::from_accounts(&accounts);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.active, 2);
        assert_eq!(summary.inactive, 1);
        assert_eq!(summary.pending_verification, 1);
        assert_eq!(summary.per_role[0].category, Role::Student);
        assert_eq!(summary.per_role[0].count, 2);

        assert_eq!(AccountSummary::from_accounts(&[]), AccountSummary::default());
    }

    #[test]
    fn test_printer_summary_skips_retired_printers() {
        let mut retired = printer(3, PrinterStatus::Offline, 900.0);
        retired.is_active = false;
        let printers = vec![
            printer(1, PrinterStatus::Online, 120.0),
            printer(2, PrinterStatus::Busy, 510.0),
            retired,
        ];

        let summary = PrinterSummary::from_printers(&printers);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.active, 2);
        assert_eq!(summary.needing_maintenance, 1);
        assert_eq!(summary.per_status.len(), 2);
        assert!((summary.total_print_hours - 1530.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_admin_dashboard() {
        let mut teacher = account(2, Role::Teacher, true, true);
        let engineering = Department {
            id: 1,
            name: "Engineering".to_string(),
            code: "ENG".to_string(),
        };
        teacher.department = Some(engineering.clone());
        let accounts = vec![account(1, Role::Student, true, false), teacher];

        let mut done = PrintJob::new(10, 2, MaterialType::Pla, now() - Duration::days(3));
        done.status = JobStatus::Completed;
        done.print_time_actual = Some(90);
        done.print_time_estimated = 600;
        done.cost = Money::from_cents(830);
        let today = PrintJob::new(11, 1, MaterialType::Abs, now() - Duration::hours(2));
        let jobs = vec![done, today];
        let printers = vec![printer(1, PrinterStatus::Online, 600.0)];

        let dashboard = AdminDashboard::build(&accounts, &jobs, &printers, &[engineering], now());
        assert_eq!(dashboard.total_users, 2);
        assert_eq!(dashboard.total_jobs, 2);
        assert_eq!(dashboard.total_printers, 1);
        assert_eq!(dashboard.total_departments, 1);
        assert_eq!(dashboard.jobs_today, 1);
        assert_eq!(dashboard.total_print_time_minutes, 90);
        assert_eq!(dashboard.total_revenue, Money::from_cents(830));
        assert_eq!(dashboard.printers_needing_maintenance, 1);
        assert_eq!(dashboard.jobs_by_department.len(), 1);
        assert_eq!(dashboard.unattributed_jobs, 0);
    }

    #[test]
    fn test_system_alerts() {
        assert!(system_alerts(&[], &[], &[]).is_empty());

        let accounts = vec![account(1, Role::Student, true, false), account(2, Role::Student, true, false)];
        let jobs = vec![PrintJob::new(1, 1, MaterialType::Pla, now())];
        let printers = vec![printer(1, PrinterStatus::Online, 10.0)];

        let alerts = system_alerts(&accounts, &jobs, &printers);
        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0].kind, AlertKind::PendingVerification);
        assert_eq!(alerts[0].message, "2 users pending verification");
        assert_eq!(alerts[1].kind, AlertKind::PendingApproval);
        assert_eq!(alerts[1].count, 1);
    }
}

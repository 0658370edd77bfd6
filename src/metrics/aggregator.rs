//! Pure reduction of a job collection into dashboard counters and sums.
//!
//! Nothing here is cached: callers re-run the aggregation whenever the
//! snapshot changes, so a stale or optimistically edited snapshot is
//! corrected by the next pass.

use crate::models::account::Account;
use crate::models::job::{JobStatus, MaterialType, PrintJob};
use crate::models::quantity::{Grams, Money};
use crate::models::role::Role;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// One row of a categorical breakdown.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CategoryCount<K> {
    pub category: K,
    pub count: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DepartmentCount {
    pub department_id: u32,
    pub name: String,
    pub count: u64,
}

/// Sort a breakdown by count, descending. The map iterates in the key's
/// natural order and the sort is stable, so ties stay in that order.
pub(crate) fn ranked<K: Ord + Copy>(counts: &BTreeMap<K, u64>) -> Vec<CategoryCount<K>> {
    let mut rows: Vec<CategoryCount<K>> = counts
        .iter()
        .map(|(category, count)| CategoryCount {
            category: *category,
            count: *count,
        })
        .collect();
    rows.sort_by(|a, b| b.count.cmp(&a.count));
    rows
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Metrics {
    pub total_jobs: u64,
    pub pending: u64,
    pub approved: u64,
    pub printing: u64,
    pub completed_count: u64,
    pub failed: u64,
    pub cancelled: u64,
    pub rejected: u64,
    /// Pending, approved or printing
    pub active: u64,
    /// Any terminal status
    pub finished: u64,

    /// Actual minutes of completed jobs; a missing actual counts as 0
    pub total_print_time_minutes: u64,
    pub total_filament_grams: Grams,
    pub total_spent: Money,
    pub average_print_time_minutes: u64,
    pub average_cost: Money,

    /// Estimated minutes still queued or on a printer
    pub active_load_minutes: u64,

    pub per_status: Vec<CategoryCount<JobStatus>>,
    pub per_material: Vec<CategoryCount<MaterialType>>,
    pub per_role: Vec<CategoryCount<Role>>,
    pub per_department: Vec<DepartmentCount>,
    /// Jobs whose owner is missing from the account set
    pub unattributed: u64,
}

#[derive(Default)]
struct Accumulator {
    metrics: Metrics,
    statuses: BTreeMap<JobStatus, u64>,
    materials: BTreeMap<MaterialType, u64>,
    roles: BTreeMap<Role, u64>,
    departments: BTreeMap<u32, (String, u64)>,
}

impl Accumulator {
    fn add(&mut self, job: &PrintJob) {
        let m = &mut self.metrics;
        m.total_jobs += 1;
        *self.statuses.entry(job.status).or_insert(0) += 1;
        *self.materials.entry(job.material).or_insert(0) += 1;

        match job.status {
            JobStatus::Pending => m.pending += 1,
            JobStatus::Approved => m.approved += 1,
            JobStatus::Printing => m.printing += 1,
            JobStatus::Completed => {
                m.completed_count += 1;
                m.total_print_time_minutes += u64::from(job.print_time_actual.unwrap_or(0));
                m.total_filament_grams += job.filament_used;
                m.total_spent += job.cost;
            }
            JobStatus::Failed => m.failed += 1,
            JobStatus::Cancelled => m.cancelled += 1,
            JobStatus::Rejected => m.rejected += 1,
        }

        if job.status.is_active() {
            m.active += 1;
            m.active_load_minutes += u64::from(job.print_time_estimated);
        } else {
            m.finished += 1;
        }
    }

    fn attribute(&mut self, owner: Option<&Account>) {
        match owner {
            Some(account) => {
                *self.roles.entry(account.role).or_insert(0) += 1;
                if let Some(department) = &account.department {
                    self.departments
                        .entry(department.id)
                        .or_insert_with(|| (department.name.clone(), 0))
                        .1 += 1;
                }
            }
            None => self.metrics.unattributed += 1,
        }
    }

    fn finish(mut self) -> Metrics {
        let m = &mut self.metrics;
        if m.completed_count > 0 {
            let count = m.completed_count;
            m.average_print_time_minutes = (m.total_print_time_minutes + count / 2) / count;
            m.average_cost = Money::average(m.total_spent, count);
        }

        m.per_status = ranked(&self.statuses);
        m.per_material = ranked(&self.materials);
        m.per_role = ranked(&self.roles);

        let mut departments: Vec<DepartmentCount> = self
            .departments
            .into_iter()
            .map(|(department_id, (name, count))| DepartmentCount {
                department_id,
                name,
                count,
            })
            .collect();
        departments.sort_by(|a, b| b.count.cmp(&a.count));
        m.per_department = departments;

        self.metrics
    }
}

/// Single pass over `jobs`. Role and department breakdowns stay empty;
/// use [`aggregate_with_owners`] when the account set is at hand.
pub fn aggregate<'a, I>(jobs: I) -> Metrics
where
    I: IntoIterator<Item = &'a PrintJob>,
{
    let mut acc = Accumulator::default();
    for job in jobs {
        acc.add(job);
    }
    acc.finish()
}

/// Like [`aggregate`], also breaking jobs down by the owner's role and
/// department. Jobs with an unknown owner still count everywhere else.
pub fn aggregate_with_owners<'a, I>(jobs: I, accounts: &[Account]) -> Metrics
where
    I: IntoIterator<Item = &'a PrintJob>,
{
    let owners: HashMap<u32, &Account> = accounts.iter().map(|a| (a.id, a)).collect();
    let mut acc = Accumulator::default();
    for job in jobs {
        acc.add(job);
        acc.attribute(owners.get(&job.owner_id).copied());
    }
    acc.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::jobs::{filter_jobs_by_status_group, StatusGroup};
    use crate::models::account::Department;
    use chrono::{TimeZone, Utc};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn job(id: u32, owner_id: u32, status: JobStatus, material: MaterialType) -> PrintJob {
        let mut job = PrintJob::new(id, owner_id, material, Utc.with_ymd_and_hms(2024, 4, 1, 10, 0, 0).unwrap());
        job.status = status;
        job
    }

    fn account(id: u32, role: Role, department: Option<(u32, &str)>) -> Account {
        let mut account = Account::new(id, format!("user{}", id), role, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        account.department = department.map(|(id, name)| Department {
            id,
            name: name.to_string(),
            code: name[..3].to_uppercase(),
        });
        account
    }

    #[test]
    fn test_empty_input_is_all_zero() {
        let jobs: Vec<PrintJob> = Vec::new();
        let metrics = aggregate(&jobs);
        assert_eq!(metrics, Metrics::default());
        assert_eq!(metrics.total_spent, Money::ZERO);
        assert_eq!(metrics.total_filament_grams, Grams::ZERO);
        assert!(metrics.per_status.is_empty());

        let json = serde_json::to_value(&metrics).unwrap();
        assert!(json.as_object().unwrap().values().all(|v| !v.is_null()));
    }

    #[test]
    fn test_completed_and_pending_scenario() {
        let mut done = job(1, 1, JobStatus::Completed, MaterialType::Pla);
        done.print_time_actual = Some(120);
        done.filament_used = "50".parse().unwrap();
        done.cost = "12.5".parse().unwrap();
        let mut queued = job(2, 1, JobStatus::Pending, MaterialType::Pla);
        queued.print_time_estimated = 60;

        let metrics = aggregate(&[done, queued]);
        assert_eq!(metrics.pending, 1);
        assert_eq!(metrics.completed_count, 1);
        assert_eq!(metrics.total_print_time_minutes, 120);
        assert_eq!(metrics.total_filament_grams, Grams::whole(50));
        assert_eq!(metrics.total_spent, Money::from_cents(1250));
        assert_eq!(metrics.active_load_minutes, 60);
    }

    #[test]
    fn test_missing_actual_time_counts_as_zero() {
        let mut done = job(1, 1, JobStatus::Completed, MaterialType::Abs);
        done.print_time_estimated = 300;
        let metrics = aggregate(&[done]);
        assert_eq!(metrics.total_print_time_minutes, 0);
    }

    #[test]
    fn test_only_completed_jobs_are_summed() {
        let mut failed = job(1, 1, JobStatus::Failed, MaterialType::Pla);
        failed.print_time_actual = Some(45);
        failed.cost = Money::from_cents(300);
        let mut printing = job(2, 1, JobStatus::Printing, MaterialType::Pla);
        printing.filament_used = Grams::whole(20);

        let metrics = aggregate(&[failed, printing]);
        assert_eq!(metrics.total_print_time_minutes, 0);
        assert_eq!(metrics.total_spent, Money::ZERO);
        assert_eq!(metrics.total_filament_grams, Grams::ZERO);
        assert_eq!(metrics.failed, 1);
        assert_eq!(metrics.printing, 1);
        assert_eq!(metrics.active, 1);
        assert_eq!(metrics.finished, 1);
    }

    #[test]
    fn test_sums_are_exact() {
        let jobs: Vec<PrintJob> = (0..10)
            .map(|id| {
                let mut job = job(id, 1, JobStatus::Completed, MaterialType::Pla);
                job.cost = "0.1".parse().unwrap();
                job
            })
            .collect();
        let metrics = aggregate(&jobs);
        assert_eq!(metrics.total_spent, Money::from_cents(100));
        assert_eq!(metrics.average_cost, Money::from_cents(10));
    }

    #[test]
    fn test_breakdown_ties_follow_enum_order() {
        let jobs = vec![
            job(1, 1, JobStatus::Completed, MaterialType::Resin),
            job(2, 1, JobStatus::Completed, MaterialType::Abs),
            job(3, 1, JobStatus::Pending, MaterialType::Petg),
            job(4, 1, JobStatus::Pending, MaterialType::Petg),
            job(5, 1, JobStatus::Pending, MaterialType::Pla),
        ];
        let metrics = aggregate(&jobs);

        let materials: Vec<MaterialType> = metrics.per_material.iter().map(|c| c.category).collect();
        assert_eq!(
            materials,
            vec![MaterialType::Petg, MaterialType::Pla, MaterialType::Abs, MaterialType::Resin]
        );

        let statuses: Vec<(JobStatus, u64)> = metrics.per_status.iter().map(|c| (c.category, c.count)).collect();
        assert_eq!(statuses, vec![(JobStatus::Pending, 3), (JobStatus::Completed, 2)]);
    }

    #[test]
    fn test_breakdown_is_stable_under_input_order() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut jobs: Vec<PrintJob> = (0..300)
            .map(|id| {
                let status = JobStatus::ALL[rng.random_range(0..JobStatus::ALL.len())];
                let material = MaterialType::ALL[rng.random_range(0..MaterialType::ALL.len())];
                job(id, 1, status, material)
            })
            .collect();

        let forward = aggregate(&jobs);
        jobs.reverse();
        let backward = aggregate(&jobs);
        assert_eq!(forward, backward);
    }

    #[test]
    fn test_completed_count_matches_terminal_group() {
        let mut rng = StdRng::seed_from_u64(3);
        let jobs: Vec<PrintJob> = (0..100)
            .map(|id| job(id, 1, JobStatus::ALL[rng.random_range(0..JobStatus::ALL.len())], MaterialType::Pla))
            .collect();

        let metrics = aggregate(&jobs);
        let completed_in_terminal = filter_jobs_by_status_group(&jobs, StatusGroup::Terminal)
            .into_iter()
            .filter(|job| job.status == JobStatus::Completed)
            .count() as u64;
        assert_eq!(metrics.completed_count, completed_in_terminal);
        assert_eq!(metrics.active + metrics.finished, metrics.total_jobs);
    }

    #[test]
    fn test_per_role_and_department() {
        let accounts = vec![
            account(1, Role::Student, Some((2, "Design"))),
            account(2, Role::Teacher, Some((1, "Engineering"))),
            account(3, Role::Student, Some((1, "Engineering"))),
        ];
        let jobs = vec![
            job(10, 1, JobStatus::Completed, MaterialType::Pla),
            job(11, 2, JobStatus::Pending, MaterialType::Pla),
            job(12, 3, JobStatus::Pending, MaterialType::Pla),
            job(13, 99, JobStatus::Pending, MaterialType::Pla),
        ];

        let metrics = aggregate_with_owners(&jobs, &accounts);
        assert_eq!(metrics.total_jobs, 4);
        assert_eq!(metrics.pending, 3);
        assert_eq!(metrics.unattributed, 1);

        let roles: Vec<(Role, u64)> = metrics.per_role.iter().map(|c| (c.category, c.count)).collect();
        assert_eq!(roles, vec![(Role::Student, 2), (Role::Teacher, 1)]);

        let departments: Vec<(u32, u64)> = metrics
            .per_department
            .iter()
            .map(|d| (d.department_id, d.count))
            .collect();
        assert_eq!(departments, vec![(1, 2), (2, 1)]);
        assert_eq!(metrics.per_department[0].name, "Engineering");
    }

    #[test]
    fn test_averages_over_completed_jobs() {
        let mut a = job(1, 1, JobStatus::Completed, MaterialType::Pla);
        a.print_time_actual = Some(100);
        a.cost = Money::from_cents(1000);
        let mut b = job(2, 1, JobStatus::Completed, MaterialType::Pla);
        b.print_time_actual = Some(51);
        b.cost = Money::from_cents(501);
        let pending = job(3, 1, JobStatus::Pending, MaterialType::Pla);

        let metrics = aggregate(&[a, b, pending]);
        assert_eq!(metrics.average_print_time_minutes, 76);
        assert_eq!(metrics.average_cost, Money::from_cents(751));
    }
}

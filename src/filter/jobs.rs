use crate::filter::{contains_term, normalize_search, parse_optional};
use crate::models::job::{JobStatus, MaterialType, PrintJob};
use crate::utils::time::DateWindow;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Display partition of job statuses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusGroup {
    /// Pending, approved or printing
    Active,
    /// Completed, failed, cancelled or rejected
    Terminal,
    All,
}

impl StatusGroup {
    /// The one narrow group a status belongs to. Exhaustive, so a new
    /// status cannot be left out of both groups.
    pub fn of(status: JobStatus) -> StatusGroup {
        match status {
            JobStatus::Pending | JobStatus::Approved | JobStatus::Printing => StatusGroup::Active,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled | JobStatus::Rejected => {
                StatusGroup::Terminal
            }
        }
    }

    pub fn contains(&self, status: JobStatus) -> bool {
        match self {
            StatusGroup::All => true,
            group => StatusGroup::of(status) == *group,
        }
    }
}

/// Order-preserving status-group filter.
pub fn filter_jobs_by_status_group(jobs: &[PrintJob], group: StatusGroup) -> Vec<&PrintJob> {
    jobs.iter().filter(|job| group.contains(job.status)).collect()
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    Date,
    Cost,
    Hours,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Raw job query string (`search=gear&group=terminal&since=week&sort=cost&order=asc`).
#[derive(Debug, Default, Deserialize)]
pub struct JobQueryParams {
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub status: String,
    pub group: Option<StatusGroup>,
    #[serde(default)]
    pub material: String,
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub printer: String,
    pub since: Option<DateWindow>,
    pub sort: Option<SortKey>,
    pub order: Option<SortOrder>,
}

impl JobQueryParams {
    pub fn validate(self) -> Result<JobQuery> {
        Ok(JobQuery {
            search: normalize_search(&self.search),
            status: parse_optional(&self.status).context("Invalid status filter")?,
            group: self.group.unwrap_or(StatusGroup::All),
            material: parse_optional(&self.material).context("Invalid material filter")?,
            owner_id: parse_optional(&self.owner).context("Invalid owner filter")?,
            printer_id: parse_optional(&self.printer).context("Invalid printer filter")?,
            since: self.since,
            sort: self.sort.unwrap_or_default(),
            order: self.order.unwrap_or_default(),
        })
    }
}

/// Job history query: filters combine with AND, then a stable sort.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct JobQuery {
    pub search: Option<String>,
    pub status: Option<JobStatus>,
    pub group: StatusGroup,
    pub material: Option<MaterialType>,
    pub owner_id: Option<u32>,
    pub printer_id: Option<u32>,
    pub since: Option<DateWindow>,
    pub sort: SortKey,
    pub order: SortOrder,
}

impl Default for JobQuery {
    fn default() -> Self {
        Self {
            search: None,
            status: None,
            group: StatusGroup::All,
            material: None,
            owner_id: None,
            printer_id: None,
            since: None,
            sort: SortKey::Date,
            order: SortOrder::Desc,
        }
    }
}

impl JobQuery {
    pub fn from_query(query: &str) -> Result<Self> {
        let params: JobQueryParams =
            serde_urlencoded::from_str(query).context("Failed to decode job query")?;
        params.validate()
    }

    pub fn in_group(group: StatusGroup) -> Self {
        Self {
            group,
            ..Default::default()
        }
    }

    pub fn matches(&self, job: &PrintJob, now: DateTime<Utc>) -> bool {
        if !self.group.contains(job.status) {
            return false;
        }
        if self.status.is_some_and(|status| job.status != status) {
            return false;
        }
        if self.material.is_some_and(|material| job.material != material) {
            return false;
        }
        if self.owner_id.is_some_and(|owner| job.owner_id != owner) {
            return false;
        }
        if self.printer_id.is_some() && job.printer_id != self.printer_id {
            return false;
        }
        if let Some(window) = self.since {
            if !window.contains(job.uploaded_at, now) {
                return false;
            }
        }
        if let Some(term) = &self.search {
            return contains_term(&job.file_name, term)
                || contains_term(&job.reference, term)
                || contains_term(&job.notes, term);
        }
        true
    }

    fn compare(&self, a: &PrintJob, b: &PrintJob) -> Ordering {
        let ordering = match self.sort {
            SortKey::Date => a.uploaded_at.cmp(&b.uploaded_at),
            SortKey::Cost => a.cost.cmp(&b.cost),
            SortKey::Hours => a.display_minutes().cmp(&b.display_minutes()),
        };
        match self.order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    }

    /// Matching jobs, sorted. Equal keys keep their input order.
    pub fn apply<'a, I>(&self, jobs: I, now: DateTime<Utc>) -> Vec<&'a PrintJob>
    where
        I: IntoIterator<Item = &'a PrintJob>,
    {
        let mut matched: Vec<&PrintJob> = jobs.into_iter().filter(|job| self.matches(job, now)).collect();
        matched.sort_by(|a, b| self.compare(a, b));
        matched
    }
}

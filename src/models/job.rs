use crate::core::error::{ParseError, TransitionError};
use crate::models::quantity::{Grams, Money};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Print job status.
///
/// Jobs move forward along `Pending -> Approved -> Printing -> {Completed | Failed}`
/// or leave early through `Rejected` / `Cancelled` before printing starts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum JobStatus {
    Pending,
    Approved,
    Printing,
    Completed,
    Failed,
    Cancelled,
    Rejected,
}

impl JobStatus {
    pub const ALL: [JobStatus; 7] = [
        JobStatus::Pending,
        JobStatus::Approved,
        JobStatus::Printing,
        JobStatus::Completed,
        JobStatus::Failed,
        JobStatus::Cancelled,
        JobStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "PENDING",
            JobStatus::Approved => "APPROVED",
            JobStatus::Printing => "PRINTING",
            JobStatus::Completed => "COMPLETED",
            JobStatus::Failed => "FAILED",
            JobStatus::Cancelled => "CANCELLED",
            JobStatus::Rejected => "REJECTED",
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            JobStatus::Pending => "PEN",
            JobStatus::Approved => "APP",
            JobStatus::Printing => "PRI",
            JobStatus::Completed => "COM",
            JobStatus::Failed => "FAI",
            JobStatus::Cancelled => "CAN",
            JobStatus::Rejected => "REJ",
        }
    }

    /// Still occupying the queue or a printer.
    pub fn is_active(&self) -> bool {
        matches!(self, JobStatus::Pending | JobStatus::Approved | JobStatus::Printing)
    }

    pub fn is_terminal(&self) -> bool {
        !self.is_active()
    }

    /// Whether `self -> next` is a legal forward move.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        use JobStatus::*;
        matches!(
            (self, next),
            (Pending, Approved)
                | (Pending, Rejected)
                | (Pending, Cancelled)
                | (Approved, Printing)
                | (Approved, Rejected)
                | (Approved, Cancelled)
                | (Printing, Completed)
                | (Printing, Failed)
        )
    }

    /// Whether `next` lies strictly ahead of `self` through one or more
    /// legal moves. The graph is acyclic, so the walk terminates.
    pub fn can_reach(&self, next: JobStatus) -> bool {
        JobStatus::ALL
            .into_iter()
            .filter(|mid| self.can_transition_to(*mid))
            .any(|mid| mid == next || mid.can_reach(next))
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        JobStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == upper || status.code() == upper)
            .ok_or_else(|| ParseError::UnknownJobStatus(s.to_string()))
    }
}

impl TryFrom<String> for JobStatus {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, ParseError> {
        value.parse()
    }
}

impl From<JobStatus> for String {
    fn from(status: JobStatus) -> Self {
        status.as_str().to_string()
    }
}

/// Filament / resin type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum MaterialType {
    Pla,
    Abs,
    Petg,
    Tpu,
    Nylon,
    Resin,
    Other,
}

impl MaterialType {
    pub const ALL: [MaterialType; 7] = [
        MaterialType::Pla,
        MaterialType::Abs,
        MaterialType::Petg,
        MaterialType::Tpu,
        MaterialType::Nylon,
        MaterialType::Resin,
        MaterialType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MaterialType::Pla => "PLA",
            MaterialType::Abs => "ABS",
            MaterialType::Petg => "PETG",
            MaterialType::Tpu => "TPU",
            MaterialType::Nylon => "NYLON",
            MaterialType::Resin => "RESIN",
            MaterialType::Other => "OTHER",
        }
    }

    fn aliases(&self) -> &'static [&'static str] {
        match self {
            MaterialType::Pla => &["PLA"],
            MaterialType::Abs => &["ABS"],
            MaterialType::Petg => &["PETG", "PET"],
            MaterialType::Tpu => &["TPU"],
            MaterialType::Nylon => &["NYLON", "NYL"],
            MaterialType::Resin => &["RESIN", "RES", "RESINA"],
            MaterialType::Other => &["OTHER", "OTH"],
        }
    }
}

impl fmt::Display for MaterialType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MaterialType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        MaterialType::ALL
            .into_iter()
            .find(|material| material.aliases().contains(&upper.as_str()))
            .ok_or_else(|| ParseError::UnknownMaterial(s.to_string()))
    }
}

impl TryFrom<String> for MaterialType {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, ParseError> {
        value.parse()
    }
}

impl From<MaterialType> for String {
    fn from(material: MaterialType) -> Self {
        material.as_str().to_string()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PrintJob {
    pub id: u32,
    /// External job reference (UUID string on the backend)
    pub reference: String,
    /// Owning account id
    pub owner_id: u32,
    pub file_name: String,
    pub notes: String,
    pub printer_id: Option<u32>,
    pub status: JobStatus,
    pub material: MaterialType,
    /// Minutes
    pub print_time_estimated: u32,
    /// Minutes, known once printing finished
    pub print_time_actual: Option<u32>,
    pub filament_used: Grams,
    pub cost: Money,
    pub uploaded_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl PrintJob {
    /// A freshly uploaded pending job with no measurements yet.
    pub fn new(id: u32, owner_id: u32, material: MaterialType, uploaded_at: DateTime<Utc>) -> Self {
        Self {
            id,
            reference: String::new(),
            owner_id,
            file_name: String::new(),
            notes: String::new(),
            printer_id: None,
            status: JobStatus::Pending,
            material,
            print_time_estimated: 0,
            print_time_actual: None,
            filament_used: Grams::ZERO,
            cost: Money::ZERO,
            uploaded_at,
            approved_at: None,
            started_at: None,
            completed_at: None,
        }
    }

    /// Move the job forward, stamping the matching timestamp.
    pub fn transition(&mut self, next: JobStatus, at: DateTime<Utc>) -> Result<(), TransitionError> {
        if !self.status.can_transition_to(next) {
            return Err(TransitionError {
                from: self.status,
                to: next,
            });
        }

        match next {
            JobStatus::Approved => self.approved_at = Some(at),
            JobStatus::Printing => self.started_at = Some(at),
            JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled | JobStatus::Rejected => {
                self.completed_at = Some(at)
            }
            JobStatus::Pending => {}
        }
        self.status = next;
        Ok(())
    }

    /// Minutes used for sorting and display: actual when known, else estimate.
    pub fn display_minutes(&self) -> u32 {
        self.print_time_actual.unwrap_or(self.print_time_estimated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_status_codes_parse() {
        assert_eq!("PEN".parse::<JobStatus>().unwrap(), JobStatus::Pending);
        assert_eq!("completed".parse::<JobStatus>().unwrap(), JobStatus::Completed);
        assert_eq!("REJ".parse::<JobStatus>().unwrap(), JobStatus::Rejected);
        // Backend-only states outside the console model are not coerced
        assert!("PAU".parse::<JobStatus>().is_err());
        assert!("ASS".parse::<JobStatus>().is_err());
    }

    #[test]
    fn test_active_and_terminal_partition() {
        for status in JobStatus::ALL {
            assert_ne!(status.is_active(), status.is_terminal());
        }
        assert!(JobStatus::Printing.is_active());
        assert!(JobStatus::Rejected.is_terminal());
    }

    #[test]
    fn test_terminal_statuses_have_no_exits() {
        for from in JobStatus::ALL.into_iter().filter(|s| s.is_terminal()) {
            for to in JobStatus::ALL {
                assert!(!from.can_transition_to(to), "{} -> {} must be illegal", from, to);
            }
        }
    }

    #[test]
    fn test_no_backward_moves() {
        assert!(!JobStatus::Approved.can_transition_to(JobStatus::Pending));
        assert!(!JobStatus::Printing.can_transition_to(JobStatus::Approved));
        assert!(!JobStatus::Printing.can_transition_to(JobStatus::Cancelled));
        assert!(!JobStatus::Pending.can_transition_to(JobStatus::Printing));
    }

    #[test]
    fn test_reachability() {
        assert!(JobStatus::Pending.can_reach(JobStatus::Completed));
        assert!(JobStatus::Approved.can_reach(JobStatus::Failed));
        assert!(!JobStatus::Printing.can_reach(JobStatus::Pending));
        assert!(!JobStatus::Printing.can_reach(JobStatus::Cancelled));
        assert!(!JobStatus::Completed.can_reach(JobStatus::Failed));
        for status in JobStatus::ALL {
            assert!(!status.can_reach(status));
        }
    }

    #[test]
    fn test_transition_stamps_timestamps() {
        let mut job = PrintJob::new(1, 7, MaterialType::Pla, ts());
        job.transition(JobStatus::Approved, ts()).unwrap();
        assert_eq!(job.approved_at, Some(ts()));
        job.transition(JobStatus::Printing, ts()).unwrap();
        assert_eq!(job.started_at, Some(ts()));
        job.transition(JobStatus::Completed, ts()).unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.completed_at, Some(ts()));

        let err = job.transition(JobStatus::Printing, ts()).unwrap_err();
        assert_eq!(err.from, JobStatus::Completed);
        assert_eq!(err.to, JobStatus::Printing);
        assert_eq!(job.status, JobStatus::Completed);
    }

    #[test]
    fn test_material_aliases() {
        assert_eq!("PET".parse::<MaterialType>().unwrap(), MaterialType::Petg);
        assert_eq!("resina".parse::<MaterialType>().unwrap(), MaterialType::Resin);
        assert_eq!("NYL".parse::<MaterialType>().unwrap(), MaterialType::Nylon);
        assert!("WOOD".parse::<MaterialType>().is_err());
    }

    #[test]
    fn test_display_minutes_prefers_actual() {
        let mut job = PrintJob::new(1, 1, MaterialType::Abs, ts());
        job.print_time_estimated = 90;
        assert_eq!(job.display_minutes(), 90);
        job.print_time_actual = Some(75);
        assert_eq!(job.display_minutes(), 75);
    }
}

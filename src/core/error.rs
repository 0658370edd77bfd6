// Centralized error and diagnostic types for the console core

use crate::models::job::JobStatus;
use crate::models::quantity::Money;
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

/// Raw feed value that does not map onto the closed model vocabularies
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Unknown role: {0:?}")]
    UnknownRole(String),

    #[error("Unknown job status: {0:?}")]
    UnknownJobStatus(String),

    #[error("Unknown material: {0:?}")]
    UnknownMaterial(String),

    #[error("Unknown printer status: {0:?}")]
    UnknownPrinterStatus(String),

    #[error("Invalid amount: {0:?}")]
    InvalidAmount(String),
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Illegal status transition: {from} -> {to}")]
pub struct TransitionError {
    pub from: JobStatus,
    pub to: JobStatus,
}

/// Errors returned by optimistic snapshot mutations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MutationError {
    #[error("Account not found: {0}")]
    AccountNotFound(u32),

    #[error("Job not found: {0}")]
    JobNotFound(u32),

    #[error("Account {0} is already verified")]
    AlreadyVerified(u32),

    #[error("Action not permitted: {0}")]
    Forbidden(String),

    #[error(transparent)]
    Transition(#[from] TransitionError),
}

/// Reasons a job may not be quoted or submitted
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PricingError {
    #[error("No pricing configuration")]
    NoPricingConfig,

    #[error("Account {0} may not submit jobs (inactive or unverified)")]
    CannotPrint(u32),

    #[error("Concurrent job limit reached: {active} of {limit}")]
    ConcurrencyLimit { active: u32, limit: u32 },

    #[error("Insufficient credit: {amount} requested, {available} available")]
    InsufficientCredit { amount: Money, available: Money },
}

/// Data-integrity finding. Recorded instead of failing so a bad record
/// never aborts a render or an aggregation pass.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Anomaly {
    #[error("Unknown role {value:?} in {context}")]
    UnknownRole { context: String, value: String },

    #[error("Unknown job status {value:?} on job {job_id}")]
    UnknownJobStatus { job_id: u32, value: String },

    #[error("Unknown material {value:?} on job {job_id}")]
    UnknownMaterial { job_id: u32, value: String },

    #[error("Unknown printer status {value:?} on printer {printer_id}")]
    UnknownPrinterStatus { printer_id: u32, value: String },

    #[error("Invalid amount {value:?} in {context}")]
    InvalidAmount { context: String, value: String },

    #[error("Job {job_id} would move back from {from} to {to}")]
    StatusRegression { job_id: u32, from: JobStatus, to: JobStatus },

    #[error("Job {job_id} references unknown owner {owner_id}")]
    UnattributedJob { job_id: u32, owner_id: u32 },
}

/// Side channel collecting anomalies from pure evaluations.
#[derive(Debug, Default, Clone, Serialize)]
pub struct Diagnostics {
    anomalies: Vec<Anomaly>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log and keep an anomaly.
    pub fn record(&mut self, anomaly: Anomaly) {
        warn!(anomaly = %anomaly, "Data integrity anomaly");
        self.anomalies.push(anomaly);
    }

    pub fn anomalies(&self) -> &[Anomaly] {
        &self.anomalies
    }

    pub fn len(&self) -> usize {
        self.anomalies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.anomalies.is_empty()
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.anomalies.extend(other.anomalies);
    }
}

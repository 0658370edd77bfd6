use crate::models::account::Department;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;

/// One fetch of the backend collections, with codes still as raw strings.
#[derive(Debug, Default, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub accounts: Vec<RawAccount>,
    #[serde(default)]
    pub jobs: Vec<RawJob>,
    #[serde(default)]
    pub printers: Vec<RawPrinter>,
    #[serde(default)]
    pub departments: Vec<Department>,
    #[serde(default)]
    pub fetched_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct RawAccount {
    pub id: u32,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    /// Long name or backend code
    pub role: String,
    #[serde(default = "default_true", alias = "is_active")]
    pub active: bool,
    #[serde(default)]
    pub department: Option<Department>,
    #[serde(default, alias = "is_verified")]
    pub verified: bool,
    #[serde(alias = "date_joined")]
    pub joined_at: DateTime<Utc>,
    #[serde(default)]
    pub last_login: Option<DateTime<Utc>>,
    #[serde(default = "default_max_concurrent_jobs")]
    pub max_concurrent_jobs: u32,
    #[serde(default, alias = "pricing_profile")]
    pub credit: Option<RawCredit>,
}

/// Account credit with amounts still as JSON numbers or decimal strings.
#[derive(Debug, Default, Deserialize)]
pub struct RawCredit {
    #[serde(default)]
    pub balance: Option<Value>,
    #[serde(default)]
    pub credit_limit: Option<Value>,
    #[serde(default)]
    pub total_spent: Option<Value>,
    #[serde(default)]
    pub discount_percentage: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct RawJob {
    pub id: u32,
    /// Backend job UUID
    #[serde(default, alias = "job_id")]
    pub reference: String,
    #[serde(alias = "user")]
    pub owner: u32,
    #[serde(default)]
    pub file_name: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub printer: Option<u32>,
    pub status: String,
    #[serde(alias = "material_type")]
    pub material: String,
    /// Minutes
    #[serde(default)]
    pub print_time_estimated: u32,
    /// Minutes
    #[serde(default)]
    pub print_time_actual: Option<u32>,
    /// Grams as a JSON number or decimal string
    #[serde(default)]
    pub filament_used: Option<Value>,
    /// Currency amount as a JSON number or decimal string
    #[serde(default)]
    pub cost: Option<Value>,
    #[serde(alias = "created_at")]
    pub uploaded_at: DateTime<Utc>,
    #[serde(default)]
    pub approved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct RawPrinter {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub location: String,
    pub status: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub supported_materials: Vec<String>,
    #[serde(default)]
    pub cost_per_hour: Option<Value>,
    #[serde(default)]
    pub cost_per_gram: Option<Value>,
    #[serde(default)]
    pub total_print_hours: f64,
    #[serde(default)]
    pub maintenance_interval_hours: Option<u32>,
    #[serde(default)]
    pub needs_maintenance: Option<bool>,
}

fn default_true() -> bool {
    true
}

fn default_max_concurrent_jobs() -> u32 {
    1
}

impl Snapshot {
    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content).context("Failed to parse snapshot JSON")
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read snapshot file: {}", path.display()))?;
        Self::from_json(&content)
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty() && self.jobs.is_empty() && self.printers.is_empty()
    }
}

/// Text form of a JSON amount, for parsing into fixed-point values.
/// `None` for anything that is not a number or a string.
pub fn amount_text(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        _ => None,
    }
}

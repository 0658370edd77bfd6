use std::collections::HashSet;
use std::str::FromStr;

use serde_json::Value;
use tracing::{debug, info};

use crate::core::config::Config;
use crate::core::error::{Anomaly, Diagnostics, ParseError};
use crate::feed::snapshot::{amount_text, RawAccount, RawCredit, RawJob, RawPrinter, Snapshot};
use crate::models::account::{Account, Department};
use crate::models::job::{JobStatus, MaterialType, PrintJob};
use crate::models::printer::{Printer, PrinterStatus};
use crate::models::pricing::CreditProfile;
use crate::models::quantity::{Factor, Grams, Money};
use crate::models::role::Role;

/// Models built from one snapshot. Records that failed to convert are
/// absent here and present in the diagnostics.
#[derive(Debug, Default)]
pub struct Ingested {
    pub accounts: Vec<Account>,
    pub jobs: Vec<PrintJob>,
    pub printers: Vec<Printer>,
    pub departments: Vec<Department>,
}

pub fn ingest(snapshot: Snapshot, config: &Config, diagnostics: &mut Diagnostics) -> Ingested {
    info!(
        accounts = snapshot.accounts.len(),
        jobs = snapshot.jobs.len(),
        printers = snapshot.printers.len(),
        fetched_at = ?snapshot.fetched_at,
        "Ingesting snapshot"
    );

    let accounts: Vec<Account> = snapshot
        .accounts
        .into_iter()
        .filter_map(|raw| convert_account(raw, diagnostics))
        .collect();

    let known_owners: HashSet<u32> = accounts.iter().map(|a| a.id).collect();
    let mut jobs = Vec::with_capacity(snapshot.jobs.len());
    for raw in snapshot.jobs {
        let Some(job) = convert_job(raw, diagnostics) else {
            continue;
        };
        // Kept: still counts toward status metrics
        if !known_owners.contains(&job.owner_id) {
            diagnostics.record(Anomaly::UnattributedJob {
                job_id: job.id,
                owner_id: job.owner_id,
            });
        }
        jobs.push(job);
    }

    let default_interval = config.maintenance.default_interval_hours;
    let printers: Vec<Printer> = snapshot
        .printers
        .into_iter()
        .filter_map(|raw| convert_printer(raw, default_interval, diagnostics))
        .collect();

    let mut departments = snapshot.departments;
    for department in accounts.iter().filter_map(|a| a.department.as_ref()) {
        if !departments.iter().any(|d| d.id == department.id) {
            departments.push(department.clone());
        }
    }

    info!(
        accounts = accounts.len(),
        jobs = jobs.len(),
        printers = printers.len(),
        departments = departments.len(),
        anomalies = diagnostics.len(),
        "Snapshot ingested"
    );

    Ingested {
        accounts,
        jobs,
        printers,
        departments,
    }
}

fn convert_account(raw: RawAccount, diagnostics: &mut Diagnostics) -> Option<Account> {
    let role = match raw.role.parse::<Role>() {
        Ok(role) => role,
        Err(_) => {
            diagnostics.record(Anomaly::UnknownRole {
                context: format!("account {}", raw.id),
                value: raw.role,
            });
            return None;
        }
    };

    let context = format!("account {}", raw.id);
    let credit = match raw.credit {
        Some(credit) => convert_credit(credit, &context, diagnostics)?,
        None => CreditProfile::default(),
    };

    Some(Account {
        id: raw.id,
        username: raw.username,
        email: raw.email,
        first_name: raw.first_name,
        last_name: raw.last_name,
        role,
        active: raw.active,
        department: raw.department,
        verified: raw.verified,
        joined_at: raw.joined_at,
        last_login: raw.last_login,
        max_concurrent_jobs: raw.max_concurrent_jobs.max(1),
        credit,
    })
}

fn convert_credit(raw: RawCredit, context: &str, diagnostics: &mut Diagnostics) -> Option<CreditProfile> {
    let defaults = CreditProfile::default();
    Some(CreditProfile {
        balance: parse_amount(raw.balance.as_ref(), context, diagnostics)?,
        credit_limit: parse_amount_or(raw.credit_limit.as_ref(), defaults.credit_limit, context, diagnostics)?,
        total_spent: parse_amount(raw.total_spent.as_ref(), context, diagnostics)?,
        discount_percentage: parse_amount::<Factor>(raw.discount_percentage.as_ref(), context, diagnostics)?,
    })
}

fn convert_job(raw: RawJob, diagnostics: &mut Diagnostics) -> Option<PrintJob> {
    let status = match raw.status.parse::<JobStatus>() {
        Ok(status) => status,
        Err(_) => {
            diagnostics.record(Anomaly::UnknownJobStatus {
                job_id: raw.id,
                value: raw.status,
            });
            return None;
        }
    };
    let material = match raw.material.parse::<MaterialType>() {
        Ok(material) => material,
        Err(_) => {
            diagnostics.record(Anomaly::UnknownMaterial {
                job_id: raw.id,
                value: raw.material,
            });
            return None;
        }
    };

    let context = format!("job {}", raw.id);
    let filament_used = parse_amount::<Grams>(raw.filament_used.as_ref(), &context, diagnostics)?;
    let cost = parse_amount::<Money>(raw.cost.as_ref(), &context, diagnostics)?;

    Some(PrintJob {
        id: raw.id,
        reference: raw.reference,
        owner_id: raw.owner,
        file_name: raw.file_name,
        notes: raw.notes,
        printer_id: raw.printer,
        status,
        material,
        print_time_estimated: raw.print_time_estimated,
        print_time_actual: raw.print_time_actual,
        filament_used,
        cost,
        uploaded_at: raw.uploaded_at,
        approved_at: raw.approved_at,
        started_at: raw.started_at,
        completed_at: raw.completed_at,
    })
}

fn convert_printer(raw: RawPrinter, default_interval: u32, diagnostics: &mut Diagnostics) -> Option<Printer> {
    let status = match raw.status.parse::<PrinterStatus>() {
        Ok(status) => status,
        Err(_) => {
            diagnostics.record(Anomaly::UnknownPrinterStatus {
                printer_id: raw.id,
                value: raw.status,
            });
            return None;
        }
    };

    // An unknown material only narrows what the printer accepts
    let mut supported_materials = Vec::with_capacity(raw.supported_materials.len());
    for code in &raw.supported_materials {
        match code.parse::<MaterialType>() {
            Ok(material) if !supported_materials.contains(&material) => supported_materials.push(material),
            Ok(_) => {}
            Err(_) => debug!(printer_id = raw.id, material = %code, "Skipping unknown printer material"),
        }
    }

    let context = format!("printer {}", raw.id);
    let cost_per_hour = parse_amount::<Money>(raw.cost_per_hour.as_ref(), &context, diagnostics)?;
    let cost_per_gram = parse_amount::<Money>(raw.cost_per_gram.as_ref(), &context, diagnostics)?;

    Some(Printer {
        id: raw.id,
        name: raw.name,
        location: raw.location,
        status,
        is_active: raw.is_active,
        supported_materials,
        cost_per_hour,
        cost_per_gram,
        total_print_hours: raw.total_print_hours,
        maintenance_interval_hours: raw.maintenance_interval_hours.unwrap_or(default_interval),
        maintenance_flag: raw.needs_maintenance,
    })
}

/// Missing or null amounts are zero; anything unparsable drops the record.
fn parse_amount<T>(value: Option<&Value>, context: &str, diagnostics: &mut Diagnostics) -> Option<T>
where
    T: FromStr<Err = ParseError> + Default,
{
    parse_amount_or(value, T::default(), context, diagnostics)
}

fn parse_amount_or<T>(value: Option<&Value>, fallback: T, context: &str, diagnostics: &mut Diagnostics) -> Option<T>
where
    T: FromStr<Err = ParseError>,
{
    let value = match value {
        None | Some(Value::Null) => return Some(fallback),
        Some(value) => value,
    };

    match amount_text(value).map(|text| text.parse::<T>()) {
        Some(Ok(amount)) => Some(amount),
        _ => {
            diagnostics.record(Anomaly::InvalidAmount {
                context: context.to_string(),
                value: value.to_string(),
            });
            None
        }
    }
}

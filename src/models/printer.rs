use crate::core::error::ParseError;
use crate::models::job::MaterialType;
use crate::models::quantity::Money;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PrinterStatus {
    Online,
    Busy,
    Maintenance,
    Offline,
    Error,
}

impl PrinterStatus {
    pub const ALL: [PrinterStatus; 5] = [
        PrinterStatus::Online,
        PrinterStatus::Busy,
        PrinterStatus::Maintenance,
        PrinterStatus::Offline,
        PrinterStatus::Error,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PrinterStatus::Online => "ONLINE",
            PrinterStatus::Busy => "BUSY",
            PrinterStatus::Maintenance => "MAINTENANCE",
            PrinterStatus::Offline => "OFFLINE",
            PrinterStatus::Error => "ERROR",
        }
    }

    /// Long name plus the backend code (`AVA`, `PRI`, `MAI`, `OUT`).
    fn aliases(&self) -> &'static [&'static str] {
        match self {
            PrinterStatus::Online => &["ONLINE", "AVA", "AVAILABLE"],
            PrinterStatus::Busy => &["BUSY", "PRI", "PRINTING"],
            PrinterStatus::Maintenance => &["MAINTENANCE", "MAI"],
            PrinterStatus::Offline => &["OFFLINE", "OUT", "OUT_OF_SERVICE"],
            PrinterStatus::Error => &["ERROR"],
        }
    }
}

impl fmt::Display for PrinterStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PrinterStatus {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        PrinterStatus::ALL
            .into_iter()
            .find(|status| status.aliases().contains(&upper.as_str()))
            .ok_or_else(|| ParseError::UnknownPrinterStatus(s.to_string()))
    }
}

impl TryFrom<String> for PrinterStatus {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, ParseError> {
        value.parse()
    }
}

impl From<PrinterStatus> for String {
    fn from(status: PrinterStatus) -> Self {
        status.as_str().to_string()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Printer {
    pub id: u32,
    pub name: String,
    pub location: String,
    pub status: PrinterStatus,
    /// Retired printers stay in the feed with `is_active = false`
    pub is_active: bool,
    pub supported_materials: Vec<MaterialType>,
    pub cost_per_hour: Money,
    pub cost_per_gram: Money,
    pub total_print_hours: f64,
    pub maintenance_interval_hours: u32,
    /// Maintenance flag as decided by the backend, when it sent one
    pub maintenance_flag: Option<bool>,
}

impl Printer {
    pub fn new(id: u32, name: impl Into<String>, status: PrinterStatus) -> Self {
        Self {
            id,
            name: name.into(),
            location: String::new(),
            status,
            is_active: true,
            supported_materials: Vec::new(),
            cost_per_hour: Money::ZERO,
            cost_per_gram: Money::ZERO,
            total_print_hours: 0.0,
            maintenance_interval_hours: 0,
            maintenance_flag: None,
        }
    }

    /// The backend's flag wins; otherwise compare accumulated hours with
    /// the maintenance interval.
    pub fn needs_maintenance(&self) -> bool {
        match self.maintenance_flag {
            Some(flag) => flag,
            None => {
                self.maintenance_interval_hours > 0
                    && self.total_print_hours >= f64::from(self.maintenance_interval_hours)
            }
        }
    }

    pub fn supports(&self, material: MaterialType) -> bool {
        self.supported_materials.contains(&material)
    }

    /// Active, online and able to take `material`.
    pub fn can_accept(&self, material: MaterialType) -> bool {
        self.is_active && self.status == PrinterStatus::Online && self.supports(material)
    }
}

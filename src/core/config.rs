use crate::models::pricing::PricingConfig;
use crate::models::quantity::{Factor, Money};
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub console: ConsoleConfig,
    #[serde(default)]
    pub maintenance: MaintenanceConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Without it the console can show jobs but not quote them
    #[serde(default)]
    pub pricing: Option<PricingConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConsoleConfig {
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// JSON snapshot of accounts, jobs and printers
    pub snapshot_path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MaintenanceConfig {
    /// Applied to printers that arrive without an interval of their own
    #[serde(default = "default_interval_hours")]
    pub default_interval_hours: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default = "default_console")]
    pub console: bool,
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            default_interval_hours: default_interval_hours(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            console: default_console(),
        }
    }
}

// Default value functions
fn default_page_size() -> usize {
    10
}

fn default_interval_hours() -> u32 {
    500
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "console".to_string()
}

fn default_console() -> bool {
    false
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .context("Failed to parse config file")?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.console.page_size == 0 {
            bail!("page_size must be greater than 0");
        }

        if self.console.snapshot_path.as_os_str().is_empty() {
            bail!("snapshot_path must not be empty");
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            bail!(
                "Invalid log level '{}'. Must be one of: trace, debug, info, warn, error",
                self.logging.level
            );
        }

        let valid_formats = ["json", "console"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            bail!(
                "Invalid log format '{}'. Must be one of: json, console",
                self.logging.format
            );
        }

        if let Some(pricing) = &self.pricing {
            if pricing.cost_per_hour < Money::ZERO || pricing.cost_per_gram < Money::ZERO {
                bail!("pricing rates must not be negative");
            }
            if pricing.min_billing_hours < Factor::ZERO {
                bail!("min_billing_hours must not be negative");
            }
            let multipliers = &pricing.multipliers;
            if [multipliers.pla, multipliers.abs, multipliers.petg, multipliers.resin]
                .iter()
                .any(|m| *m <= Factor::ZERO)
            {
                bail!("material multipliers must be greater than 0");
            }
            let discounts = &pricing.discounts;
            if [discounts.student, discounts.teacher]
                .iter()
                .any(|d| *d < Factor::ZERO || *d > Factor::ONE)
            {
                bail!("role discounts must be between 0 and 1");
            }
        }

        Ok(())
    }

    /// Snapshot path, resolved against the config file's directory when relative.
    pub fn snapshot_path(&self, config_path: &Path) -> PathBuf {
        if self.console.snapshot_path.is_absolute() {
            return self.console.snapshot_path.clone();
        }
        match config_path.parent() {
            Some(dir) => dir.join(&self.console.snapshot_path),
            None => self.console.snapshot_path.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let file = write_config("[console]\nsnapshot_path = \"snapshot.json\"\n");
        let config = Config::from_file(file.path()).expect("Failed to load config");

        assert_eq!(config.console.page_size, 10);
        assert_eq!(config.maintenance.default_interval_hours, 500);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, "console");
        assert!(!config.logging.console);
        assert!(config.pricing.is_none());
    }

    #[test]
    fn test_full_config() {
        let file = write_config(
            r#"
[console]
page_size = 25
snapshot_path = "/var/lib/printlab/snapshot.json"

[maintenance]
default_interval_hours = 300

[logging]
level = "debug"
format = "json"
console = true
"#,
        );
        let config = Config::from_file(file.path()).expect("Failed to load config");
        assert_eq!(config.console.page_size, 25);
        assert_eq!(config.maintenance.default_interval_hours, 300);
        assert_eq!(config.logging.format, "json");
        assert_eq!(
            config.snapshot_path(file.path()),
            PathBuf::from("/var/lib/printlab/snapshot.json")
        );
    }

    #[test]
    fn test_relative_snapshot_path() {
        let file = write_config("[console]\nsnapshot_path = \"data/snapshot.json\"\n");
        let config = Config::from_file(file.path()).unwrap();
        let resolved = config.snapshot_path(file.path());
        assert!(resolved.ends_with("data/snapshot.json"));
        assert_eq!(resolved.parent().and_then(|p| p.parent()), file.path().parent());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let zero_page = write_config("[console]\npage_size = 0\nsnapshot_path = \"s.json\"\n");
        assert!(Config::from_file(zero_page.path()).is_err());

        let bad_level = write_config("[console]\nsnapshot_path = \"s.json\"\n[logging]\nlevel = \"loud\"\n");
        assert!(Config::from_file(bad_level.path()).is_err());

        let bad_format = write_config("[console]\nsnapshot_path = \"s.json\"\n[logging]\nformat = \"xml\"\n");
        assert!(Config::from_file(bad_format.path()).is_err());

        let missing_path = write_config("[console]\npage_size = 5\n");
        assert!(Config::from_file(missing_path.path()).is_err());
    }

    #[test]
    fn test_pricing_section() {
        let file = write_config(
            r#"
[console]
snapshot_path = "s.json"

[pricing]
cost_per_hour = "12.00"
cost_per_gram = 0.05
min_billing_hours = 1

[pricing.multipliers]
resin = 2.5

[pricing.discounts]
student = 0.3
"#,
        );
        let config = Config::from_file(file.path()).unwrap();
        let pricing = config.pricing.expect("pricing section");
        assert_eq!(pricing.cost_per_hour, Money::from_cents(1200));
        assert_eq!(pricing.cost_per_gram, Money::from_cents(5));
        assert_eq!(pricing.min_billing_hours, Factor::ONE);
        assert_eq!(pricing.multipliers.resin, Factor::from_hundredths(250));
        assert_eq!(pricing.multipliers.abs, Factor::from_hundredths(120));
        assert_eq!(pricing.discounts.student, Factor::from_hundredths(30));
        assert_eq!(pricing.discounts.teacher, Factor::from_hundredths(10));
    }

    #[test]
    fn test_invalid_pricing_rejected() {
        let negative = write_config(
            "[console]\nsnapshot_path = \"s.json\"\n[pricing]\ncost_per_hour = -1\ncost_per_gram = 0\n",
        );
        assert!(Config::from_file(negative.path()).is_err());

        let big_discount = write_config(
            "[console]\nsnapshot_path = \"s.json\"\n[pricing]\ncost_per_hour = 1\ncost_per_gram = 0\n[pricing.discounts]\nteacher = 1.5\n",
        );
        assert!(Config::from_file(big_discount.path()).is_err());

        let missing_rate = write_config("[console]\nsnapshot_path = \"s.json\"\n[pricing]\ncost_per_hour = 1\n");
        assert!(Config::from_file(missing_rate.path()).is_err());
    }

    #[test]
    fn test_missing_file() {
        assert!(Config::from_file(Path::new("/nonexistent/printlab.toml")).is_err());
    }
}

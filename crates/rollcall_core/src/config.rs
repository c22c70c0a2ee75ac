//! Runtime configuration loaded from TOML.
//!
//! # Invariants
//! - Every field has a default; an empty file is a valid configuration.
//! - A loaded configuration has passed `validate`.

use crate::model::participant::StatusPolicy;
use crate::service::report_service::ReportSettings;
use log::{error, info};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Outreach settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactSettings {
    /// Prepended to phone numbers that lack it.
    pub default_country_code: String,
}

impl Default for ContactSettings {
    fn default() -> Self {
        Self {
            default_country_code: "55".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RollcallConfig {
    /// Falls back to `logging::default_log_level()`.
    pub log_level: Option<String>,
    pub log_dir: Option<PathBuf>,
    pub database_path: Option<PathBuf>,
    pub status: StatusPolicy,
    pub reports: ReportSettings,
    pub contact: ContactSettings,
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "failed to read config: {err}"),
            Self::Parse(err) => write!(f, "failed to parse config: {err}"),
            Self::Invalid(details) => write!(f, "invalid config: {details}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(value: toml::de::Error) -> Self {
        Self::Parse(value)
    }
}

impl RollcallConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates the file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let result = std::fs::read_to_string(path)
            .map_err(ConfigError::from)
            .and_then(|text| Self::from_toml_str(&text));
        match &result {
            Ok(_) => info!(
                "event=config_load module=config status=ok path={}",
                path.display()
            ),
            Err(err) => error!(
                "event=config_load module=config status=error path={} error={err}",
                path.display()
            ),
        }
        result
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let status = &self.status;
        if status.window_sessions == 0 {
            return Err(ConfigError::Invalid(
                "status.window_sessions must be at least 1".to_string(),
            ));
        }
        if status.active_min_percent > 100 || status.at_risk_min_percent > 100 {
            return Err(ConfigError::Invalid(
                "status percentages must be within 0..=100".to_string(),
            ));
        }
        if status.at_risk_min_percent > status.active_min_percent {
            return Err(ConfigError::Invalid(format!(
                "status.at_risk_min_percent ({}) exceeds status.active_min_percent ({})",
                status.at_risk_min_percent, status.active_min_percent
            )));
        }
        if self.reports.low_attendance_percent > 100 {
            return Err(ConfigError::Invalid(
                "reports.low_attendance_percent must be within 0..=100".to_string(),
            ));
        }
        if self
            .contact
            .default_country_code
            .chars()
            .any(|c| !c.is_ascii_digit())
        {
            return Err(ConfigError::Invalid(format!(
                "contact.default_country_code must be digits only, got `{}`",
                self.contact.default_country_code
            )));
        }
        Ok(())
    }

    /// Configured level, or the build-mode default.
    pub fn effective_log_level(&self) -> &str {
        self.log_level
            .as_deref()
            .unwrap_or(crate::logging::default_log_level())
    }
}

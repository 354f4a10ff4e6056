//! Logger settings as read from configuration

use super::error::{LoggerError, Result};
use super::log_level::LogLevel;
use super::output_format::{FormatterRegistry, FORMAT_CONSOLE};
use super::timestamp::{TimestampFormat, DEFAULT_TIMESTAMP_FORMAT};
use super::value::Fields;
use serde::{Deserialize, Serialize};

/// Settings for a logger family.
///
/// Deserializes from any serde source with `level`, `format`,
/// `timestamp_format` and `tags` keys; missing keys take their defaults.
///
/// ```
/// use chain_logger::LoggerSettings;
///
/// let settings: LoggerSettings = serde_json::from_str(r#"{"format": "json"}"#).unwrap();
/// assert_eq!(settings.level, "info");
/// assert_eq!(settings.format, "json");
/// assert_eq!(settings.timestamp_format, "15:04:05.000");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerSettings {
    pub level: String,
    pub format: String,
    pub timestamp_format: String,
    pub tags: Fields,
}

impl Default for LoggerSettings {
    fn default() -> Self {
        Self {
            level: LogLevel::Info.to_str().to_string(),
            format: FORMAT_CONSOLE.to_string(),
            timestamp_format: DEFAULT_TIMESTAMP_FORMAT.to_string(),
            tags: Fields::new(),
        }
    }
}

/// Settings after validation, as used by the logger.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedSettings {
    pub level: LogLevel,
    pub format: String,
    pub timestamp_format: TimestampFormat,
    pub tags: Fields,
}

fn required<'a>(component: &str, value: &'a str) -> Result<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        return Err(LoggerError::config(component, "setting is required"));
    }
    Ok(value)
}

impl LoggerSettings {
    pub fn level(&self) -> Result<LogLevel> {
        required("level", &self.level)?
            .parse()
            .map_err(|message: String| LoggerError::config("level", message))
    }

    pub fn timestamp_format(&self) -> Result<TimestampFormat> {
        required("timestamp_format", &self.timestamp_format)?.parse()
    }

    /// Check every setting; unknown levels, formats and timestamp layouts
    /// are rejected here rather than at the first log call.
    pub fn validate(&self, registry: &FormatterRegistry) -> Result<ValidatedSettings> {
        let level = self.level()?;
        let format = required("format", &self.format)?;
        if !registry.contains(format) {
            return Err(LoggerError::UnknownFormat(format.to_string()));
        }
        let timestamp_format = self.timestamp_format()?;

        Ok(ValidatedSettings {
            level,
            format: format.to_string(),
            timestamp_format,
            tags: self.tags.clone(),
        })
    }
}

//! Output formats for log records
//!
//! A format is a pure function from a [`Record`] to the bytes written to the
//! sink. Formats are looked up by name in a [`FormatterRegistry`] once, when
//! the logger is built. Built-in formats:
//! - `console`: human-readable single line, `key=value` fields
//! - `json`: one JSON object per line
//! - `gelf`: GELF 1.1 envelope with nested additional fields
//! - `gelf_fields`: GELF 1.1 envelope with flattened additional fields

use super::error::{LoggerError, Result};
use super::log_level::LogLevel;
use super::metadata::Metadata;
use super::value::{Fields, Value};
use chrono::{DateTime, Utc};
use serde_json::Map;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

pub const FORMAT_CONSOLE: &str = "console";
pub const FORMAT_JSON: &str = "json";
pub const FORMAT_GELF: &str = "gelf";
pub const FORMAT_GELF_FIELDS: &str = "gelf_fields";

const GELF_VERSION: &str = "1.1";

/// Everything a formatter needs to render one log line.
#[derive(Clone, Copy)]
pub struct Record<'a> {
    pub time: DateTime<Utc>,
    /// `time` rendered with the configured timestamp format.
    pub timestamp: &'a str,
    pub level: LogLevel,
    pub message: &'a str,
    pub error: Option<&'a (dyn std::error::Error + 'static)>,
    pub metadata: &'a Metadata,
    pub host: &'a str,
}

impl fmt::Debug for Record<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("timestamp", &self.timestamp)
            .field("level", &self.level)
            .field("message", &self.message)
            .field("error", &self.error.map(ToString::to_string))
            .field("channel", &self.metadata.channel())
            .finish()
    }
}

/// Renders a record to bytes.
pub type Formatter = Arc<dyn Fn(&Record<'_>) -> Result<Vec<u8>> + Send + Sync>;

/// Named formatters available to logger construction.
///
/// # Example
///
/// ```
/// use chain_logger::FormatterRegistry;
///
/// let registry = FormatterRegistry::new()
///     .with_formatter("plain", |record| Ok(format!("{}\n", record.message).into_bytes()));
///
/// assert!(registry.contains("json"));
/// assert!(registry.contains("plain"));
/// assert!(registry.get("xml").is_err());
/// ```
#[derive(Clone)]
pub struct FormatterRegistry {
    formatters: HashMap<String, Formatter>,
}

impl FormatterRegistry {
    /// Registry holding the built-in formats.
    pub fn new() -> Self {
        Self::empty()
            .with_formatter(FORMAT_CONSOLE, format_console)
            .with_formatter(FORMAT_JSON, format_json)
            .with_formatter(FORMAT_GELF, format_gelf)
            .with_formatter(FORMAT_GELF_FIELDS, format_gelf_fields)
    }

    pub fn empty() -> Self {
        Self {
            formatters: HashMap::new(),
        }
    }

    pub fn register<F>(&mut self, name: impl Into<String>, formatter: F)
    where
        F: Fn(&Record<'_>) -> Result<Vec<u8>> + Send + Sync + 'static,
    {
        self.formatters.insert(name.into(), Arc::new(formatter));
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_formatter<F>(mut self, name: impl Into<String>, formatter: F) -> Self
    where
        F: Fn(&Record<'_>) -> Result<Vec<u8>> + Send + Sync + 'static,
    {
        self.register(name, formatter);
        self
    }

    pub fn get(&self, name: &str) -> Result<Formatter> {
        self.formatters
            .get(name)
            .cloned()
            .ok_or_else(|| LoggerError::UnknownFormat(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.formatters.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.formatters.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for FormatterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FormatterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormatterRegistry")
            .field("formatters", &self.names())
            .finish()
    }
}

/// Escape line breaks so a record never spans several lines.
fn escape_line(value: &str) -> String {
    value
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t")
}

fn console_value(value: &Value) -> String {
    let rendered = escape_line(&value.to_string());
    if rendered.contains(' ') || rendered.contains('"') || rendered.contains('=') {
        format!("\"{}\"", rendered.replace('"', "\\\""))
    } else {
        rendered
    }
}

/// `15:04:05.000 default  info    message err=... key=value`
pub fn format_console(record: &Record<'_>) -> Result<Vec<u8>> {
    let data = record.metadata;
    let mut line = format!(
        "{} {:<10} {:<7} {}",
        record.timestamp,
        data.channel(),
        record.level.to_str(),
        escape_line(record.message)
    );

    if let Some(err) = record.error {
        line.push_str(" err=");
        line.push_str(&console_value(&Value::String(err.to_string())));
    }

    for fields in [data.tags(), data.context_fields(), data.fields()] {
        for (key, value) in fields {
            line.push(' ');
            line.push_str(key);
            line.push('=');
            line.push_str(&console_value(value));
        }
    }

    line.push('\n');
    Ok(line.into_bytes())
}

fn to_json_object(fields: &Fields) -> serde_json::Value {
    serde_json::Value::Object(
        fields
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json_value()))
            .collect(),
    )
}

fn finish_line(object: Map<String, serde_json::Value>, format_type: &str) -> Result<Vec<u8>> {
    let mut buffer = serde_json::to_vec(&serde_json::Value::Object(object))
        .map_err(|e| LoggerError::formatter(format_type, e.to_string()))?;
    buffer.push(b'\n');
    Ok(buffer)
}

/// One JSON object per line with nested `fields`, `context` and `tags`.
pub fn format_json(record: &Record<'_>) -> Result<Vec<u8>> {
    let data = record.metadata;
    let mut object = Map::new();

    object.insert("timestamp".into(), record.timestamp.into());
    object.insert("level".into(), record.level.to_str().into());
    object.insert("channel".into(), data.channel().into());
    object.insert("message".into(), record.message.into());
    if let Some(err) = record.error {
        object.insert("err".into(), err.to_string().into());
    }
    object.insert("fields".into(), to_json_object(data.fields()));
    object.insert("context".into(), to_json_object(data.context_fields()));
    object.insert("tags".into(), to_json_object(data.tags()));

    finish_line(object, FORMAT_JSON)
}

fn gelf_envelope(record: &Record<'_>) -> Map<String, serde_json::Value> {
    let mut object = Map::new();

    object.insert("version".into(), GELF_VERSION.into());
    object.insert("host".into(), record.host.into());
    object.insert("short_message".into(), record.message.into());
    object.insert(
        "timestamp".into(),
        (record.time.timestamp_millis() as f64 / 1000.0).into(),
    );
    object.insert("level".into(), record.level.syslog_severity().into());
    object.insert("_channel".into(), record.metadata.channel().into());
    object.insert("_level_name".into(), record.level.to_str().into());
    if let Some(err) = record.error {
        object.insert("_err".into(), err.to_string().into());
    }

    object
}

// Additional field names that belong to the envelope. GELF itself reserves
// `_id`; the others are written by `gelf_envelope`.
const GELF_RESERVED_FIELDS: &[&str] = &["_id", "_channel", "_level_name", "_err"];

/// Replace characters GELF does not allow in field names (`[\w.\-]`).
fn gelf_key(key: &str) -> String {
    key.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// `_key`, renamed with a trailing `_` when it would clash with the envelope.
fn additional_field_name(key: &str) -> String {
    let name = format!("_{}", gelf_key(key));
    if GELF_RESERVED_FIELDS.contains(&name.as_str()) {
        name + "_"
    } else {
        name
    }
}

/// GELF envelope with `_fields`, `_context` and `_tags` as nested objects.
pub fn format_gelf(record: &Record<'_>) -> Result<Vec<u8>> {
    let data = record.metadata;
    let mut object = gelf_envelope(record);

    for (name, fields) in [
        ("_fields", data.fields()),
        ("_context", data.context_fields()),
        ("_tags", data.tags()),
    ] {
        if !fields.is_empty() {
            object.insert(name.into(), to_json_object(fields));
        }
    }

    finish_line(object, FORMAT_GELF)
}

fn flatten_into(prefix: &str, value: &Value, out: &mut Map<String, serde_json::Value>) {
    match value {
        Value::Null => {}
        Value::Map(fields) => {
            for (key, nested) in fields {
                flatten_into(&format!("{}.{}", prefix, gelf_key(key)), nested, out);
            }
        }
        // Additional fields must be strings or numbers.
        Value::Bool(b) => {
            out.insert(prefix.to_string(), b.to_string().into());
        }
        Value::List(_) => {
            out.insert(prefix.to_string(), value.to_string().into());
        }
        scalar => {
            out.insert(prefix.to_string(), scalar.to_json_value());
        }
    }
}

/// GELF envelope with every field flattened into a top-level `_key.sub` field.
pub fn format_gelf_fields(record: &Record<'_>) -> Result<Vec<u8>> {
    let data = record.metadata;
    let mut object = gelf_envelope(record);

    for fields in [data.tags(), data.context_fields(), data.fields()] {
        for (key, value) in fields {
            flatten_into(&additional_field_name(key), value, &mut object);
        }
    }

    finish_line(object, FORMAT_GELF_FIELDS)
}

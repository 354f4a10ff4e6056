//! Timestamp formatting utilities
//!
//! Provides the timestamp formats accepted in `LoggerSettings::timestamp_format`
//! and the clock abstraction the logger reads the current time from.
//!
//! A format string is one of:
//! - a named format: `iso8601`, `iso8601_micros`, `rfc3339`, `unix`,
//!   `unix_millis`, `unix_micros`
//! - a strftime string, recognised by containing `%`
//! - a reference-time layout written against `2006-01-02 15:04:05.000`,
//!   e.g. the default `15:04:05.000`

use super::error::{LoggerError, Result};
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;

/// Default `timestamp_format` setting.
pub const DEFAULT_TIMESTAMP_FORMAT: &str = "15:04:05.000";

/// Standardized timestamp format options
///
/// # Examples
///
/// ```
/// use chain_logger::TimestampFormat;
///
/// let format: TimestampFormat = "15:04:05.000".parse().unwrap();
/// assert_eq!(format, TimestampFormat::Custom("%H:%M:%S%.3f".to_string()));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimestampFormat {
    /// ISO 8601 with milliseconds: `2025-01-08T10:30:45.123Z`
    #[default]
    Iso8601,

    /// ISO 8601 with microseconds: `2025-01-08T10:30:45.123456Z`
    Iso8601Micros,

    /// RFC 3339 format: `2025-01-08T10:30:45+00:00`
    Rfc3339,

    /// Unix timestamp in seconds: `1736332245`
    Unix,

    /// Unix timestamp in milliseconds: `1736332245123`
    UnixMillis,

    /// Unix timestamp in microseconds: `1736332245123456`
    UnixMicros,

    /// Custom strftime format
    Custom(String),
}

impl TimestampFormat {
    #[must_use]
    pub fn format(&self, datetime: &DateTime<Utc>) -> String {
        match self {
            TimestampFormat::Iso8601 => datetime.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string(),
            TimestampFormat::Iso8601Micros => datetime.format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string(),
            TimestampFormat::Rfc3339 => datetime.to_rfc3339(),
            TimestampFormat::Unix => datetime.timestamp().to_string(),
            TimestampFormat::UnixMillis => datetime.timestamp_millis().to_string(),
            TimestampFormat::UnixMicros => datetime.timestamp_micros().to_string(),
            TimestampFormat::Custom(format_str) => datetime.format(format_str).to_string(),
        }
    }

    /// Parse a strftime string, rejecting unknown specifiers.
    pub fn strftime(format_str: &str) -> Result<Self> {
        if StrftimeItems::new(format_str).any(|item| matches!(item, Item::Error)) {
            return Err(LoggerError::config(
                "timestamp_format",
                format!("invalid strftime format '{}'", format_str),
            ));
        }

        Ok(TimestampFormat::Custom(format_str.to_string()))
    }

    /// Translate a reference-time layout (`2006-01-02T15:04:05.000Z07:00`).
    pub fn layout(layout: &str) -> Result<Self> {
        Self::strftime(&layout_to_strftime(layout))
    }
}

impl FromStr for TimestampFormat {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "" => Err(LoggerError::config(
                "timestamp_format",
                "timestamp format must not be empty",
            )),
            "iso8601" => Ok(TimestampFormat::Iso8601),
            "iso8601_micros" => Ok(TimestampFormat::Iso8601Micros),
            "rfc3339" => Ok(TimestampFormat::Rfc3339),
            "unix" => Ok(TimestampFormat::Unix),
            "unix_millis" => Ok(TimestampFormat::UnixMillis),
            "unix_micros" => Ok(TimestampFormat::UnixMicros),
            custom if custom.contains('%') => Self::strftime(custom),
            layout => Self::layout(layout),
        }
    }
}

// Longest tokens first so `2006` wins over `2` and `15` over `1`.
const LAYOUT_TOKENS: &[(&str, &str)] = &[
    ("January", "%B"),
    ("Monday", "%A"),
    ("Z07:00", "Z"),
    ("-07:00", "%:z"),
    ("Z0700", "Z"),
    ("-0700", "%z"),
    ("2006", "%Y"),
    ("Jan", "%b"),
    ("Mon", "%a"),
    ("MST", "%Z"),
    ("002", "%j"),
    ("01", "%m"),
    ("02", "%d"),
    ("_2", "%e"),
    ("15", "%H"),
    ("03", "%I"),
    ("04", "%M"),
    ("05", "%S"),
    ("06", "%y"),
    ("PM", "%p"),
    ("pm", "%P"),
    ("1", "%-m"),
    ("2", "%-d"),
    ("3", "%-I"),
    ("4", "%-M"),
    ("5", "%-S"),
];

/// Length of the leading run of `digit`, or 0 if another digit follows it.
fn fraction_run(digits: &str, digit: char) -> usize {
    let run = digits.chars().take_while(|d| *d == digit).count();
    match digits[run..].chars().next() {
        Some(next) if next.is_ascii_digit() => 0,
        _ => run,
    }
}

/// Convert a reference-time layout into a strftime string.
///
/// Times are always rendered in UTC, so zone tokens of the `Z07:00` family
/// become a literal `Z`. Fractional seconds written with zeros keep their
/// width; written with nines they use chrono's variable precision.
pub fn layout_to_strftime(layout: &str) -> String {
    let mut out = String::with_capacity(layout.len() * 2);
    let mut rest = layout;

    'outer: while let Some(c) = rest.chars().next() {
        // A run of 0s or 9s is fractional seconds only when no digit
        // follows it, so `02.01.2006` stays a date.
        if c == '.' || c == ',' {
            let digits = &rest[1..];
            let zeros = fraction_run(digits, '0');
            let nines = fraction_run(digits, '9');
            if zeros > 0 {
                out.push_str(&format!("%.{}f", zeros.min(9)));
                rest = &digits[zeros..];
                continue;
            }
            if nines > 0 {
                out.push_str("%.f");
                rest = &digits[nines..];
                continue;
            }
        }

        for (token, strftime) in LAYOUT_TOKENS {
            if let Some(stripped) = rest.strip_prefix(token) {
                out.push_str(strftime);
                rest = stripped;
                continue 'outer;
            }
        }

        if c == '%' {
            out.push_str("%%");
        } else {
            out.push(c);
        }
        rest = &rest[c.len_utf8()..];
    }

    out
}

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually driven clock for tests.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock() = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        *now += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_datetime() -> DateTime<Utc> {
        // 2025-01-08 10:30:45.123456 UTC
        Utc.with_ymd_and_hms(2025, 1, 8, 10, 30, 45)
            .single()
            .expect("valid datetime")
            + Duration::microseconds(123456)
    }

    #[test]
    fn test_default_layout() {
        let format: TimestampFormat = DEFAULT_TIMESTAMP_FORMAT.parse().expect("valid layout");
        assert_eq!(format.format(&fixed_datetime()), "10:30:45.123");
    }

    #[test]
    fn test_full_layout_with_zone() {
        let format: TimestampFormat = "2006-01-02T15:04:05.000Z07:00".parse().expect("valid layout");
        assert_eq!(format.format(&fixed_datetime()), "2025-01-08T10:30:45.123Z");
    }

    #[test]
    fn test_layout_with_month_names() {
        let format: TimestampFormat = "Mon, 02 Jan 2006 15:04:05".parse().expect("valid layout");
        assert_eq!(format.format(&fixed_datetime()), "Wed, 08 Jan 2025 10:30:45");
    }

    #[test]
    fn test_layout_translation() {
        assert_eq!(layout_to_strftime("15:04:05.000"), "%H:%M:%S%.3f");
        assert_eq!(layout_to_strftime("2006/01/02"), "%Y/%m/%d");
        assert_eq!(layout_to_strftime("05.999999"), "%S%.f");
        assert_eq!(layout_to_strftime("100%"), "%-m00%%");
    }

    #[test]
    fn test_named_formats() {
        assert_eq!("iso8601".parse::<TimestampFormat>().unwrap(), TimestampFormat::Iso8601);
        assert_eq!("unix_millis".parse::<TimestampFormat>().unwrap(), TimestampFormat::UnixMillis);
        assert_eq!(
            TimestampFormat::Iso8601.format(&fixed_datetime()),
            "2025-01-08T10:30:45.123Z"
        );
        assert_eq!(TimestampFormat::Unix.format(&fixed_datetime()), "1736332245");
    }

    #[test]
    fn test_strftime_format() {
        let format: TimestampFormat = "%Y/%m/%d %H:%M".parse().expect("valid strftime");
        assert_eq!(format.format(&fixed_datetime()), "2025/01/08 10:30");
    }

    #[test]
    fn test_invalid_formats_rejected() {
        assert!("".parse::<TimestampFormat>().is_err());
        assert!("%Q".parse::<TimestampFormat>().is_err());
    }

    #[test]
    fn test_dotted_date_layout() {
        assert_eq!(layout_to_strftime("02.01.2006"), "%d.%m.%Y");
        let format: TimestampFormat = "02.01.2006 15:04:05".parse().expect("valid layout");
        assert_eq!(format.format(&fixed_datetime()), "08.01.2025 10:30:45");

        let format: TimestampFormat = "02.01.2006".parse().expect("valid layout");
        assert_eq!(format.format(&fixed_datetime()), "08.01.2025");

        // A trailing fraction is still fractional seconds.
        assert_eq!(layout_to_strftime("02.01.2006 15:04:05.000"), "%d.%m.%Y %H:%M:%S%.3f");
        assert_eq!(layout_to_strftime("15:04:05,999"), "%H:%M:%S%.f");
    }

    #[test]
    fn test_fixed_clock() {
        let clock = FixedClock::new(fixed_datetime());
        assert_eq!(clock.now(), fixed_datetime());

        clock.advance(Duration::seconds(1));
        assert_eq!(clock.now(), fixed_datetime() + Duration::seconds(1));
    }
}

//! Logging macros for ergonomic log message formatting.
//!
//! These macros forward to the `*f` logger methods with `format_args!`, so a
//! message below the configured level is never formatted.
//!
//! # Examples
//!
//! ```
//! use chain_logger::prelude::*;
//! use chain_logger::{info, warn};
//!
//! let buffer = BufferSink::new();
//! let logger = Logger::builder().writer(buffer.clone()).build().unwrap();
//!
//! info!(logger, "Server started");
//!
//! let port = 8080;
//! info!(logger, "Server listening on port {}", port);
//! warn!(logger, "Retry attempt {} of {}", 3, 5);
//!
//! assert_eq!(buffer.lines().len(), 3);
//! ```

/// Log a trace-level message.
#[macro_export]
macro_rules! trace {
    ($logger:expr, $($arg:tt)+) => {
        $logger.tracef(format_args!($($arg)+))
    };
}

/// Log a debug-level message.
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $logger.debugf(format_args!($($arg)+))
    };
}

/// Log an info-level message.
#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $logger.infof(format_args!($($arg)+))
    };
}

/// Log a warning-level message.
#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)+) => {
        $logger.warnf(format_args!($($arg)+))
    };
}

/// Log positional arguments joined by single spaces, like `print!` with no
/// format string. `$method` is one of `trace`, `debug`, `info` or `warn`.
///
/// # Examples
///
/// ```
/// # use chain_logger::prelude::*;
/// # let buffer = BufferSink::new();
/// # let logger = Logger::builder().format("json").writer(buffer.clone()).build().unwrap();
/// use chain_logger::log_args;
///
/// log_args!(logger, info, "user", 42, "signed in");
/// assert!(buffer.contents().contains("\"message\":\"user 42 signed in\""));
/// ```
#[macro_export]
macro_rules! log_args {
    ($logger:expr, $method:ident, $($arg:expr),+ $(,)?) => {
        $logger.$method($crate::join_args(&[$(&$arg as &dyn ::std::fmt::Display),+]))
    };
}

/// Log an error-level message with the error that caused it.
///
/// # Examples
///
/// ```
/// # use chain_logger::prelude::*;
/// # let logger = Logger::builder().writer(BufferSink::new()).build().unwrap();
/// use chain_logger::error;
///
/// let err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
/// error!(logger, &err, "Failed to open {}", "config.toml");
/// ```
#[macro_export]
macro_rules! error {
    ($logger:expr, $err:expr, $($arg:tt)+) => {
        $logger.errorf($err, format_args!($($arg)+))
    };
}

/// Log a fatal-level message, then exit the process.
#[macro_export]
macro_rules! fatal {
    ($logger:expr, $err:expr, $($arg:tt)+) => {
        $logger.fatalf($err, format_args!($($arg)+))
    };
}

/// Log a panic-level message, then unwind with the error.
///
/// Named `panic_log!` so it does not shadow `std::panic!`.
#[macro_export]
macro_rules! panic_log {
    ($logger:expr, $err:expr, $($arg:tt)+) => {
        $logger.panicf($err, format_args!($($arg)+))
    };
}

/// Build sanitized [`Fields`](crate::Fields) from `key => value` pairs.
///
/// # Examples
///
/// ```
/// use chain_logger::{fields, Value};
///
/// let fields = fields! { "user" => "ada", "attempts" => 3 };
/// assert_eq!(fields["user"], Value::String("ada".into()));
/// assert_eq!(fields["attempts"], Value::Int(3));
/// ```
#[macro_export]
macro_rules! fields {
    () => {
        $crate::Fields::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut fields = $crate::Fields::new();
        $(
            fields.insert(::std::string::String::from($key), $crate::sanitize(&$value));
        )+
        fields
    }};
}

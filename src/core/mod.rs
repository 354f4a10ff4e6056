//! Core logger types and traits

pub mod error;
pub mod hook;
pub mod log_level;
pub mod logger;
pub mod metadata;
pub mod output_format;
pub mod settings;
pub mod sink;
pub mod stacktrace;
pub mod terminator;
pub mod timestamp;
pub mod value;

pub use error::{BoxError, LoggerError, Result};
pub use hook::Hook;
pub use log_level::{should_log, LogLevel};
pub use logger::{join_args, Logger, LoggerBuilder, FATAL_EXIT_CODE, FIELD_STACKTRACE};
pub use metadata::{Context, ContextFieldsResolver, Metadata, Span, CHANNEL_DEFAULT};
pub use output_format::{
    Formatter, FormatterRegistry, Record, FORMAT_CONSOLE, FORMAT_GELF, FORMAT_GELF_FIELDS,
    FORMAT_JSON,
};
pub use settings::{LoggerSettings, ValidatedSettings};
pub use sink::{BufferSink, Diagnostics, Sink};
pub use terminator::{LoggedPanic, ProcessTerminator, Terminator};
pub use timestamp::{Clock, FixedClock, SystemClock, TimestampFormat, DEFAULT_TIMESTAMP_FORMAT};
pub use value::{merge, sanitize, sanitize_error, sanitize_serialize, Fields, Loggable, Structured, Value};

//! # Chain Logger
//!
//! A structured, leveled logger whose loggers are immutable values.
//!
//! ## Features
//!
//! - **Chainable**: `with_channel`, `with_context` and `with_fields` return
//!   new loggers and never change the one they are called on
//! - **Sanitized fields**: attached values are deep-copied into an owned
//!   [`Value`] tree when attached
//! - **Pluggable output**: console, JSON and GELF formats built in, more can
//!   be registered in a [`FormatterRegistry`]
//! - **Hooks**: synchronous side effects per record, such as alerting
//! - **Thread Safe**: one mutex-guarded sink per logger family, one write per
//!   record
//!
//! ## Example
//!
//! ```
//! use chain_logger::prelude::*;
//!
//! let buffer = BufferSink::new();
//! let logger = Logger::builder()
//!     .level(LogLevel::Debug)
//!     .writer(buffer.clone())
//!     .build()
//!     .unwrap();
//!
//! let orders = logger.with_channel("orders").with_fields([("order_id", 42)]);
//! orders.debugf(format_args!("reserved {} items", 3));
//!
//! let line = buffer.contents();
//! assert!(line.contains("orders"));
//! assert!(line.contains("reserved 3 items"));
//! assert!(line.contains("order_id=42"));
//! ```

pub mod core;
pub mod handler;
pub mod hooks;
pub mod macros;

pub mod prelude {
    pub use crate::core::{
        BufferSink, Context, Fields, FixedClock, FormatterRegistry, Hook, LogLevel, Logger,
        LoggerBuilder, LoggerError, LoggerSettings, Metadata, Result, Sink, Span, Structured,
        Terminator, TimestampFormat, Value,
    };
    pub use crate::hooks::{AlertHook, AlertPacket, Alerter};
}

pub use core::{
    join_args, merge, sanitize, sanitize_error, sanitize_serialize, should_log, BoxError,
    BufferSink, Clock, Context, ContextFieldsResolver, Diagnostics, Fields, FixedClock, Formatter,
    FormatterRegistry, Hook, LogLevel, Loggable, LoggedPanic, Logger, LoggerBuilder, LoggerError,
    LoggerSettings, Metadata, ProcessTerminator, Record, Result, Sink, Span, Structured,
    SystemClock, Terminator, TimestampFormat, Value,
};
pub use handler::{default_error_handler, handle_error, set_error_handler, ErrorHandler};
pub use hooks::{AlertHook, AlertPacket, Alerter};

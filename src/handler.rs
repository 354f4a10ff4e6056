//! Fail-fast error handling for command line programs
//!
//! [`handle_error`] logs an error as a single JSON record and ends the
//! process. The handler can be replaced with [`set_error_handler`], e.g. to
//! route start-up failures through an application logger.

use crate::core::{
    logger::{Logger, FATAL_EXIT_CODE},
    output_format::FORMAT_JSON,
    sink::{Diagnostics, Sink},
    terminator::{ProcessTerminator, Terminator},
};
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

/// Timestamp layout of records written by the default handler.
pub const HANDLER_TIMESTAMP_FORMAT: &str = "2006-01-02T15:04:05.999Z07:00";

pub type ErrorHandler =
    Arc<dyn Fn(&(dyn std::error::Error + 'static), fmt::Arguments<'_>) + Send + Sync>;

static ERROR_HANDLER: RwLock<Option<ErrorHandler>> = parking_lot::const_rwlock(None);

/// Replace the handler used by [`handle_error`].
pub fn set_error_handler<F>(handler: F)
where
    F: Fn(&(dyn std::error::Error + 'static), fmt::Arguments<'_>) + Send + Sync + 'static,
{
    *ERROR_HANDLER.write() = Some(Arc::new(handler));
}

/// Run the current error handler, [`default_error_handler`] unless replaced.
pub fn handle_error(err: &(dyn std::error::Error + 'static), args: fmt::Arguments<'_>) {
    let handler = ERROR_HANDLER.read().clone();
    match handler {
        Some(handler) => handler(err, args),
        None => default_error_handler(err, args),
    }
}

/// Log `err` to stdout as JSON at error level, then exit with status 1.
pub fn default_error_handler(err: &(dyn std::error::Error + 'static), args: fmt::Arguments<'_>) {
    log_and_terminate(
        err,
        args,
        Sink::stdout(),
        Diagnostics::stderr(),
        ProcessTerminator,
    )
}

fn log_and_terminate<T: Terminator + 'static>(
    err: &(dyn std::error::Error + 'static),
    args: fmt::Arguments<'_>,
    sink: Sink,
    diagnostics: Diagnostics,
    terminator: T,
) -> ! {
    let logger = Logger::builder()
        .format(FORMAT_JSON)
        .timestamp_format(HANDLER_TIMESTAMP_FORMAT)
        .sink(sink)
        .diagnostics(diagnostics.clone())
        .build();

    match logger {
        Ok(logger) => logger.errorf(err, args),
        Err(e) => {
            diagnostics.report("Can not create logger for default error handler", &e);
            diagnostics.report("Unhandled error", &format!("{}: {}", args, err));
        }
    }

    terminator.terminate(FATAL_EXIT_CODE)
}

//! Control flow after fatal and panic records

use super::error::BoxError;
use std::fmt;

/// What happens after a fatal or panic record has been written.
///
/// The logger never exits or unwinds on its own; it hands control to this
/// capability so tests can observe the signal without a real process exit.
pub trait Terminator: Send + Sync {
    /// End the process with `code`.
    fn terminate(&self, code: i32) -> !;

    /// Unwind the caller's stack carrying the original error.
    fn raise(&self, error: BoxError) -> !;
}

/// Panic payload raised after a panic record.
///
/// Recovery boundaries can downcast the payload of `catch_unwind` to this
/// type to get the original error back.
#[derive(Debug)]
pub struct LoggedPanic {
    pub error: BoxError,
}

impl fmt::Display for LoggedPanic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)
    }
}

/// `std::process::exit` and `std::panic::panic_any`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessTerminator;

impl Terminator for ProcessTerminator {
    fn terminate(&self, code: i32) -> ! {
        std::process::exit(code)
    }

    fn raise(&self, error: BoxError) -> ! {
        std::panic::panic_any(LoggedPanic { error })
    }
}

//! Hook trait for side effects run on every accepted record

use super::{error::Result, log_level::LogLevel, metadata::Metadata};

/// Side effect invoked synchronously, in registration order, for every
/// record that passes the level filter.
///
/// A failing hook is reported on the diagnostic stream. It never stops the
/// remaining hooks or the record itself from being written. A panicking hook
/// is caught and reported the same way, but the process panic hook runs
/// first, so the usual panic message is printed on stderr as well.
pub trait Hook: Send + Sync {
    fn fire(
        &self,
        level: LogLevel,
        message: &str,
        error: Option<&(dyn std::error::Error + 'static)>,
        data: &Metadata,
    ) -> Result<()>;

    fn name(&self) -> &str {
        "hook"
    }
}

impl<F> Hook for F
where
    F: Fn(LogLevel, &str, Option<&(dyn std::error::Error + 'static)>, &Metadata) -> Result<()>
        + Send
        + Sync,
{
    fn fire(
        &self,
        level: LogLevel,
        message: &str,
        error: Option<&(dyn std::error::Error + 'static)>,
        data: &Metadata,
    ) -> Result<()> {
        self(level, message, error, data)
    }
}

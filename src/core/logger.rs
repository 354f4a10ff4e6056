//! Main logger implementation
//!
//! A [`Logger`] is an immutable value. `with_channel`, `with_context` and
//! `with_fields` return a new logger carrying a new [`Metadata`] snapshot;
//! settings, hooks, resolvers, the formatter and the sink are shared by
//! reference across every logger derived from one root.

use super::{
    error::{BoxError, LoggerError, Result},
    hook::Hook,
    log_level::{should_log, LogLevel},
    metadata::{Context, ContextFieldsResolver, Metadata},
    output_format::{Formatter, FormatterRegistry, Record},
    settings::LoggerSettings,
    sink::{Diagnostics, Sink},
    stacktrace,
    terminator::{ProcessTerminator, Terminator},
    timestamp::{Clock, SystemClock, TimestampFormat},
    value::{merge, Fields, Loggable, Value},
};
use std::borrow::Cow;
use std::fmt;
use std::io::Write;
use std::sync::Arc;

/// Name of the field carrying the call stack of error-class records.
pub const FIELD_STACKTRACE: &str = "stacktrace";

/// Exit status used after a fatal record.
pub const FATAL_EXIT_CODE: i32 = 1;

/// Read-only state shared by a logger family.
struct Shared {
    clock: Arc<dyn Clock>,
    sink: Sink,
    diagnostics: Diagnostics,
    resolvers: Vec<ContextFieldsResolver>,
    hooks: Vec<Arc<dyn Hook>>,
    level: LogLevel,
    format: String,
    formatter: Formatter,
    timestamp_format: TimestampFormat,
    terminator: Arc<dyn Terminator>,
    host: String,
}

#[derive(Clone)]
pub struct Logger {
    shared: Arc<Shared>,
    data: Arc<Metadata>,
}

/// Join positional arguments with single spaces.
pub fn join_args(args: &[&dyn fmt::Display]) -> String {
    args.iter()
        .map(|arg| arg.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

fn local_hostname() -> String {
    hostname::get()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|_| "unknown".to_string())
}

impl Logger {
    /// Build a root logger from settings, a sink, a clock, context field
    /// resolvers and hooks, with the built-in formats.
    ///
    /// Invalid settings fail here, never at the first log call.
    pub fn new(
        settings: &LoggerSettings,
        sink: Sink,
        clock: Arc<dyn Clock>,
        resolvers: Vec<ContextFieldsResolver>,
        hooks: Vec<Arc<dyn Hook>>,
    ) -> Result<Self> {
        let mut builder = LoggerBuilder::new()
            .settings(settings.clone())
            .sink(sink)
            .shared_clock(clock);
        builder.resolvers = resolvers;
        builder.hooks = hooks;
        builder.build()
    }

    /// Create a builder for Logger
    ///
    /// # Example
    /// ```
    /// use chain_logger::prelude::*;
    ///
    /// let buffer = BufferSink::new();
    /// let logger = Logger::builder()
    ///     .level(LogLevel::Debug)
    ///     .format("json")
    ///     .writer(buffer.clone())
    ///     .build()
    ///     .unwrap();
    ///
    /// logger.with_channel("billing").info("invoice sent");
    /// assert!(buffer.contents().contains("\"channel\":\"billing\""));
    /// ```
    #[must_use]
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::new()
    }

    pub fn level(&self) -> LogLevel {
        self.shared.level
    }

    pub fn format(&self) -> &str {
        &self.shared.format
    }

    pub fn channel(&self) -> &str {
        self.data.channel()
    }

    pub fn metadata(&self) -> &Metadata {
        &self.data
    }

    /// Whether a call at `level` would be written.
    #[inline]
    pub fn enabled(&self, level: LogLevel) -> bool {
        should_log(self.shared.level, level)
    }

    fn derive(&self, data: Metadata) -> Logger {
        Logger {
            shared: Arc::clone(&self.shared),
            data: Arc::new(data),
        }
    }

    /// Same logger, different channel.
    #[must_use]
    pub fn with_channel(&self, channel: impl Into<String>) -> Logger {
        let mut data = Metadata::clone(&self.data);
        data.channel = channel.into();
        self.derive(data)
    }

    /// Attach a request context and recompute the context fields from it.
    ///
    /// `None` returns the receiver unchanged.
    #[must_use]
    pub fn with_context(&self, ctx: impl Into<Option<Context>>) -> Logger {
        let Some(ctx) = ctx.into() else {
            return self.clone();
        };

        let mut data = Metadata::clone(&self.data);
        for resolver in &self.shared.resolvers {
            data.context_fields = merge(&data.context_fields, resolver(&ctx));
        }
        data.context = Some(ctx);

        self.derive(data)
    }

    /// Merge `fields` on top of the current fields.
    #[must_use]
    pub fn with_fields<I, K, V>(&self, fields: I) -> Logger
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Loggable,
    {
        let mut data = Metadata::clone(&self.data);
        data.fields = merge(&self.data.fields, fields);
        self.derive(data)
    }

    pub fn trace(&self, message: impl fmt::Display) {
        self.log(LogLevel::Trace, || message.to_string());
    }

    pub fn tracef(&self, args: fmt::Arguments<'_>) {
        self.log(LogLevel::Trace, || fmt::format(args));
    }

    pub fn debug(&self, message: impl fmt::Display) {
        self.log(LogLevel::Debug, || message.to_string());
    }

    pub fn debugf(&self, args: fmt::Arguments<'_>) {
        self.log(LogLevel::Debug, || fmt::format(args));
    }

    pub fn info(&self, message: impl fmt::Display) {
        self.log(LogLevel::Info, || message.to_string());
    }

    pub fn infof(&self, args: fmt::Arguments<'_>) {
        self.log(LogLevel::Info, || fmt::format(args));
    }

    pub fn warn(&self, message: impl fmt::Display) {
        self.log(LogLevel::Warn, || message.to_string());
    }

    pub fn warnf(&self, args: fmt::Arguments<'_>) {
        self.log(LogLevel::Warn, || fmt::format(args));
    }

    pub fn error(&self, err: &(dyn std::error::Error + 'static), message: impl fmt::Display) {
        self.log_error(LogLevel::Error, err, || message.to_string());
    }

    pub fn errorf(&self, err: &(dyn std::error::Error + 'static), args: fmt::Arguments<'_>) {
        self.log_error(LogLevel::Error, err, || fmt::format(args));
    }

    /// Log at fatal level, then end the process.
    pub fn fatal(&self, err: &(dyn std::error::Error + 'static), message: impl fmt::Display) -> ! {
        self.log_error(LogLevel::Fatal, err, || message.to_string());
        self.shared.terminator.terminate(FATAL_EXIT_CODE)
    }

    pub fn fatalf(&self, err: &(dyn std::error::Error + 'static), args: fmt::Arguments<'_>) -> ! {
        self.log_error(LogLevel::Fatal, err, || fmt::format(args));
        self.shared.terminator.terminate(FATAL_EXIT_CODE)
    }

    /// Log at panic level, then unwind with the original error.
    ///
    /// The payload is a [`LoggedPanic`](super::terminator::LoggedPanic) when
    /// the default terminator is used.
    pub fn panic<E: Into<BoxError>>(&self, err: E, message: impl fmt::Display) -> ! {
        let err = err.into();
        self.log_error(LogLevel::Panic, &*err, || message.to_string());
        self.shared.terminator.raise(err)
    }

    pub fn panicf<E: Into<BoxError>>(&self, err: E, args: fmt::Arguments<'_>) -> ! {
        let err = err.into();
        self.log_error(LogLevel::Panic, &*err, || fmt::format(args));
        self.shared.terminator.raise(err)
    }

    fn log(&self, level: LogLevel, message: impl FnOnce() -> String) {
        if !self.enabled(level) {
            return;
        }

        self.write_record(level, &message(), None, Fields::new());
    }

    fn log_error(
        &self,
        level: LogLevel,
        err: &(dyn std::error::Error + 'static),
        message: impl FnOnce() -> String,
    ) {
        if let Some(span) = self.data.context().and_then(Context::span) {
            span.add_error(err);
        }

        if !self.enabled(level) {
            return;
        }

        let mut fields = Fields::new();
        fields.insert(
            FIELD_STACKTRACE.to_string(),
            Value::String(stacktrace::capture(0)),
        );
        self.write_record(level, &message(), Some(err), fields);
    }

    fn write_record(
        &self,
        level: LogLevel,
        message: &str,
        error: Option<&(dyn std::error::Error + 'static)>,
        fields: Fields,
    ) {
        let shared = &self.shared;

        let data: Cow<'_, Metadata> = if fields.is_empty() {
            Cow::Borrowed(&self.data)
        } else {
            let mut snapshot = Metadata::clone(&self.data);
            snapshot.fields = merge(&self.data.fields, fields);
            Cow::Owned(snapshot)
        };

        self.fire_hooks(level, message, error, &data);

        let time = shared.clock.now();
        let timestamp = shared.timestamp_format.format(&time);
        let record = Record {
            time,
            timestamp: &timestamp,
            level,
            message,
            error,
            metadata: &data,
            host: &shared.host,
        };

        match (shared.formatter)(&record) {
            Ok(buffer) => {
                if let Err(e) = shared.sink.write(&buffer) {
                    shared.diagnostics.report("Failed to write to log", &e);
                }
            }
            Err(e) => shared.diagnostics.report("Failed to format log record", &e),
        }
    }

    /// Run every hook, isolating failures and panics of each one.
    ///
    /// A panicking hook still goes through the process panic hook before it
    /// is caught, so its `thread '..' panicked at` message also reaches
    /// stderr next to the diagnostic line.
    fn fire_hooks(
        &self,
        level: LogLevel,
        message: &str,
        error: Option<&(dyn std::error::Error + 'static)>,
        data: &Metadata,
    ) {
        for hook in &self.shared.hooks {
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                hook.fire(level, message, error, data)
            }));

            let failure = match result {
                Ok(Ok(())) => continue,
                Ok(Err(e @ LoggerError::HookError { .. })) => e,
                Ok(Err(e)) => LoggerError::hook(hook.name(), e.to_string()),
                Err(panic_info) => {
                    let panic_msg = if let Some(s) = panic_info.downcast_ref::<&str>() {
                        s.to_string()
                    } else if let Some(s) = panic_info.downcast_ref::<String>() {
                        s.clone()
                    } else {
                        "Unknown panic".to_string()
                    };
                    LoggerError::hook(hook.name(), format!("panicked: {}", panic_msg))
                }
            };
            self.shared.diagnostics.report("Hook error", &failure);
        }
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("level", &self.shared.level)
            .field("format", &self.shared.format)
            .field("hooks", &self.shared.hooks.len())
            .field("resolvers", &self.shared.resolvers.len())
            .field("metadata", &self.data)
            .finish()
    }
}

/// Builder for a root [`Logger`].
///
/// Defaults: settings defaults, stdout sink, system clock, built-in formats,
/// stderr diagnostics and a terminator that really exits and panics.
pub struct LoggerBuilder {
    settings: LoggerSettings,
    sink: Option<Sink>,
    clock: Arc<dyn Clock>,
    resolvers: Vec<ContextFieldsResolver>,
    hooks: Vec<Arc<dyn Hook>>,
    registry: FormatterRegistry,
    terminator: Arc<dyn Terminator>,
    diagnostics: Diagnostics,
    host: Option<String>,
}

impl LoggerBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self {
            settings: LoggerSettings::default(),
            sink: None,
            clock: Arc::new(SystemClock),
            resolvers: Vec::new(),
            hooks: Vec::new(),
            registry: FormatterRegistry::new(),
            terminator: Arc::new(ProcessTerminator),
            diagnostics: Diagnostics::stderr(),
            host: None,
        }
    }

    /// Replace all settings at once
    #[must_use = "builder methods return a new value"]
    pub fn settings(mut self, settings: LoggerSettings) -> Self {
        self.settings = settings;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn level(mut self, level: LogLevel) -> Self {
        self.settings.level = level.to_str().to_string();
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.settings.format = format.into();
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn timestamp_format(mut self, timestamp_format: impl Into<String>) -> Self {
        self.settings.timestamp_format = timestamp_format.into();
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn tag<V: Loggable>(mut self, key: impl Into<String>, value: V) -> Self {
        self.settings.tags.insert(key.into(), value.to_log_value());
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn sink(mut self, sink: Sink) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Write records to `writer`
    #[must_use = "builder methods return a new value"]
    pub fn writer<W: Write + Send + 'static>(self, writer: W) -> Self {
        self.sink(Sink::new(writer))
    }

    #[must_use = "builder methods return a new value"]
    pub fn clock<C: Clock + 'static>(self, clock: C) -> Self {
        self.shared_clock(Arc::new(clock))
    }

    #[must_use = "builder methods return a new value"]
    pub fn shared_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Add a context field resolver; resolvers run in the order added
    #[must_use = "builder methods return a new value"]
    pub fn resolver<F>(mut self, resolver: F) -> Self
    where
        F: Fn(&Context) -> Fields + Send + Sync + 'static,
    {
        self.resolvers.push(Arc::new(resolver));
        self
    }

    /// Add a hook; hooks run in the order added
    #[must_use = "builder methods return a new value"]
    pub fn hook<H: Hook + 'static>(mut self, hook: H) -> Self {
        self.hooks.push(Arc::new(hook));
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn registry(mut self, registry: FormatterRegistry) -> Self {
        self.registry = registry;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn terminator<T: Terminator + 'static>(mut self, terminator: T) -> Self {
        self.terminator = Arc::new(terminator);
        self
    }

    /// Where failures of the logger itself are reported
    #[must_use = "builder methods return a new value"]
    pub fn diagnostics(mut self, diagnostics: Diagnostics) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Host reported in GELF records, defaults to the machine hostname
    #[must_use = "builder methods return a new value"]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Validate the settings and build the root Logger
    pub fn build(self) -> Result<Logger> {
        let validated = self.settings.validate(&self.registry)?;
        let formatter = self.registry.get(&validated.format)?;

        let shared = Shared {
            clock: self.clock,
            sink: self.sink.unwrap_or_else(Sink::stdout),
            diagnostics: self.diagnostics,
            resolvers: self.resolvers,
            hooks: self.hooks,
            level: validated.level,
            format: validated.format,
            formatter,
            timestamp_format: validated.timestamp_format,
            terminator: self.terminator,
            host: self.host.unwrap_or_else(local_hostname),
        };

        Ok(Logger {
            shared: Arc::new(shared),
            data: Arc::new(Metadata::new(merge(
                &Fields::new(),
                &validated.tags,
            ))),
        })
    }
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::metadata::Span;
    use crate::core::sink::BufferSink;
    use crate::core::terminator::LoggedPanic;
    use parking_lot::Mutex;
    use std::panic::{catch_unwind, AssertUnwindSafe};

    #[derive(Debug, PartialEq)]
    struct Terminated(i32);

    struct RecordingTerminator;

    impl Terminator for RecordingTerminator {
        fn terminate(&self, code: i32) -> ! {
            std::panic::panic_any(Terminated(code))
        }

        fn raise(&self, error: BoxError) -> ! {
            std::panic::panic_any(LoggedPanic { error })
        }
    }

    #[derive(Default)]
    struct RecordingSpan {
        errors: Mutex<Vec<String>>,
    }

    impl Span for RecordingSpan {
        fn add_error(&self, err: &(dyn std::error::Error + 'static)) {
            self.errors.lock().push(err.to_string());
        }
    }

    fn json_logger(buffer: &BufferSink) -> LoggerBuilder {
        Logger::builder()
            .format("json")
            .writer(buffer.clone())
            .terminator(RecordingTerminator)
    }

    fn parse_lines(buffer: &BufferSink) -> Vec<serde_json::Value> {
        buffer
            .lines()
            .iter()
            .map(|line| serde_json::from_str(line).expect("valid json line"))
            .collect()
    }

    fn boom() -> std::io::Error {
        std::io::Error::new(std::io::ErrorKind::Other, "boom")
    }

    #[test]
    fn test_builder_rejects_invalid_settings() {
        let err = Logger::builder().format("xml").build().unwrap_err();
        assert!(matches!(err, LoggerError::UnknownFormat(_)));

        let settings = LoggerSettings {
            level: "loud".to_string(),
            ..Default::default()
        };
        let err = Logger::builder().settings(settings).build().unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_new_mirrors_builder() {
        let buffer = BufferSink::new();
        let settings = LoggerSettings {
            format: "json".to_string(),
            ..Default::default()
        };
        let logger = Logger::new(
            &settings,
            Sink::new(buffer.clone()),
            Arc::new(SystemClock),
            vec![],
            vec![],
        )
        .unwrap();

        assert_eq!(logger.level(), LogLevel::Info);
        assert_eq!(logger.format(), "json");
        assert_eq!(logger.channel(), "default");

        logger.info("ready");
        assert_eq!(parse_lines(&buffer)[0]["message"], "ready");
    }

    #[test]
    fn test_level_filter() {
        let buffer = BufferSink::new();
        let logger = json_logger(&buffer).build().unwrap();

        logger.trace("hidden");
        logger.debug("hidden");
        logger.debugf(format_args!("hidden {}", 1));
        assert_eq!(buffer.write_count(), 0);

        logger.info("shown");
        logger.warnf(format_args!("shown {}", 2));
        logger.error(&boom(), "shown");
        assert_eq!(buffer.write_count(), 3);
    }

    #[test]
    fn test_filtered_call_does_not_format_message() {
        struct Loud;
        impl fmt::Display for Loud {
            fn fmt(&self, _f: &mut fmt::Formatter<'_>) -> fmt::Result {
                panic!("formatted a filtered message")
            }
        }

        let buffer = BufferSink::new();
        let logger = json_logger(&buffer).level(LogLevel::Warn).build().unwrap();
        logger.info(Loud);
        logger.debugf(format_args!("{}", Loud));
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_chaining_does_not_mutate_receiver() {
        let buffer = BufferSink::new();
        let root = json_logger(&buffer).build().unwrap();

        let child = root
            .with_channel("orders")
            .with_fields([("order_id", 42)]);
        let grandchild = child.with_fields([("order_id", 43), ("line", 1)]);

        assert_eq!(root.channel(), "default");
        assert!(root.metadata().fields().is_empty());
        assert_eq!(child.metadata().fields()["order_id"], Value::Int(42));
        assert_eq!(child.metadata().fields().len(), 1);
        assert_eq!(grandchild.metadata().fields()["order_id"], Value::Int(43));
        assert_eq!(grandchild.channel(), "orders");

        root.info("root");
        grandchild.info("grandchild");
        let lines = parse_lines(&buffer);
        assert_eq!(lines[0]["channel"], "default");
        assert_eq!(lines[0]["fields"], serde_json::json!({}));
        assert_eq!(lines[1]["channel"], "orders");
        assert_eq!(lines[1]["fields"]["line"], 1);
    }

    #[test]
    fn test_with_context_runs_resolvers_in_order() {
        #[derive(Debug)]
        struct RequestId(&'static str);

        let buffer = BufferSink::new();
        let logger = json_logger(&buffer)
            .resolver(|ctx: &Context| {
                let mut fields = Fields::new();
                if let Some(id) = ctx.get::<RequestId>() {
                    fields.insert("request_id".into(), Value::String(id.0.to_string()));
                }
                fields.insert("source".into(), Value::String("first".into()));
                fields
            })
            .resolver(|_: &Context| {
                let mut fields = Fields::new();
                fields.insert("source".into(), Value::String("second".into()));
                fields
            })
            .build()
            .unwrap();

        let unchanged = logger.with_context(None);
        assert!(unchanged.metadata().context().is_none());
        assert!(unchanged.metadata().context_fields().is_empty());

        let ctx = Context::new().with_value(RequestId("req-9"));
        let scoped = logger.with_fields([("a", 1)]).with_context(ctx);
        let data = scoped.metadata();

        assert!(data.context().is_some());
        assert_eq!(data.context_fields()["request_id"], Value::String("req-9".into()));
        assert_eq!(data.context_fields()["source"], Value::String("second".into()));
        assert_eq!(data.fields()["a"], Value::Int(1));
        assert!(!data.context_fields().contains_key("a"));
    }

    #[test]
    fn test_error_records_on_span_and_adds_stacktrace() {
        let buffer = BufferSink::new();
        let span = Arc::new(RecordingSpan::default());
        let logger = json_logger(&buffer).build().unwrap();

        let ctx = Context::new().with_span(span.clone());
        logger.with_context(ctx).errorf(&boom(), format_args!("failed {}", "save"));

        assert_eq!(span.errors.lock().as_slice(), ["boom".to_string()]);

        let record = &parse_lines(&buffer)[0];
        assert_eq!(record["level"], "error");
        assert_eq!(record["message"], "failed save");
        assert_eq!(record["err"], "boom");
        let trace = record["fields"]["stacktrace"].as_str().unwrap();
        assert!(trace.starts_with('\n'));
        assert!(trace.trim_end().lines().last().unwrap().contains("test_error_records_on_span"));
        assert!(!trace.contains("Logger::log_error"));
    }

    #[test]
    fn test_warn_has_no_stacktrace() {
        let buffer = BufferSink::new();
        let logger = json_logger(&buffer).build().unwrap();
        logger.warn("careful");

        let record = &parse_lines(&buffer)[0];
        assert!(record["fields"].get("stacktrace").is_none());
        assert!(record.get("err").is_none());
    }

    #[test]
    fn test_fatal_logs_then_terminates() {
        let buffer = BufferSink::new();
        let logger = json_logger(&buffer).build().unwrap();

        let result = catch_unwind(AssertUnwindSafe(|| {
            logger.fatal(&boom(), "giving up");
        }));

        let payload = result.expect_err("fatal never returns");
        assert_eq!(payload.downcast_ref::<Terminated>(), Some(&Terminated(1)));
        let record = &parse_lines(&buffer)[0];
        assert_eq!(record["level"], "fatal");
        assert_eq!(record["message"], "giving up");
    }

    #[test]
    fn test_panic_logs_then_raises_original_error() {
        let buffer = BufferSink::new();
        let logger = json_logger(&buffer).build().unwrap();

        let result = catch_unwind(AssertUnwindSafe(|| {
            logger.panicf(boom(), format_args!("request {} aborted", 7));
        }));

        let payload = result.expect_err("panic never returns");
        let panic = payload.downcast_ref::<LoggedPanic>().expect("LoggedPanic payload");
        let original = panic
            .error
            .downcast_ref::<std::io::Error>()
            .expect("original error type kept");
        assert_eq!(original.to_string(), "boom");

        let record = &parse_lines(&buffer)[0];
        assert_eq!(record["level"], "panic");
        assert_eq!(record["message"], "request 7 aborted");
    }

    #[test]
    fn test_hooks_run_in_order_and_failures_are_contained() {
        let buffer = BufferSink::new();
        let diagnostics = BufferSink::new();
        let calls = Arc::new(Mutex::new(Vec::new()));

        let first = Arc::clone(&calls);
        let last = Arc::clone(&calls);
        let logger = json_logger(&buffer)
            .diagnostics(Diagnostics::new(diagnostics.clone()))
            .hook(
                move |level: LogLevel,
                      msg: &str,
                      _: Option<&(dyn std::error::Error + 'static)>,
                      data: &Metadata|
                      -> Result<()> {
                    first
                        .lock()
                        .push(format!("first {} {} {}", level, msg, data.channel()));
                    Err(LoggerError::other("unreachable alert backend"))
                },
            )
            .hook(
                |_: LogLevel,
                 _: &str,
                 _: Option<&(dyn std::error::Error + 'static)>,
                 _: &Metadata|
                 -> Result<()> { panic!("hook exploded") },
            )
            .hook(
                move |level: LogLevel,
                      _: &str,
                      err: Option<&(dyn std::error::Error + 'static)>,
                      data: &Metadata|
                      -> Result<()> {
                    last.lock().push(format!(
                        "last {} {} {}",
                        level,
                        err.map(|e| e.to_string()).unwrap_or_default(),
                        data.fields().contains_key(FIELD_STACKTRACE)
                    ));
                    Ok(())
                },
            )
            .build()
            .unwrap();

        logger.with_channel("jobs").error(&boom(), "job failed");

        assert_eq!(
            calls.lock().as_slice(),
            ["first error job failed jobs".to_string(), "last error boom true".to_string()]
        );
        assert_eq!(buffer.write_count(), 1);
        let report = diagnostics.contents();
        assert!(report.contains("[LOGGER ERROR] Hook error: Hook 'hook' failed: unreachable alert backend"));
        assert!(report.contains("Hook 'hook' failed: panicked: hook exploded"));
    }

    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_sink_failure_only_reaches_diagnostics() {
        let diagnostics = BufferSink::new();
        let logger = Logger::builder()
            .format("json")
            .writer(ClosedPipe)
            .diagnostics(Diagnostics::new(diagnostics.clone()))
            .terminator(RecordingTerminator)
            .build()
            .unwrap();

        logger.info("lost");
        logger.error(&boom(), "lost too");

        let lines = diagnostics.lines();
        assert_eq!(lines.len(), 2);
        for line in &lines {
            assert!(
                line.starts_with("[LOGGER ERROR] Failed to write to log: ")
                    && line.contains("pipe closed"),
                "unexpected diagnostic {:?}",
                line
            );
        }
    }

    #[test]
    fn test_formatter_failure_only_reaches_diagnostics() {
        let buffer = BufferSink::new();
        let diagnostics = BufferSink::new();
        let registry = FormatterRegistry::new().with_formatter("broken", |_: &Record<'_>| {
            Err(LoggerError::formatter("broken", "cannot render"))
        });

        let logger = Logger::builder()
            .registry(registry)
            .format("broken")
            .writer(buffer.clone())
            .diagnostics(Diagnostics::new(diagnostics.clone()))
            .build()
            .unwrap();

        logger.warn("dropped");

        assert!(buffer.is_empty());
        assert_eq!(
            diagnostics.contents(),
            "[LOGGER ERROR] Failed to format log record: Formatter error (broken): cannot render\n"
        );
    }

    #[test]
    fn test_join_args() {
        assert_eq!(join_args(&[&"user", &42, &true]), "user 42 true");
        assert_eq!(join_args(&[]), "");
    }

    #[test]
    fn test_tags_from_settings() {
        let buffer = BufferSink::new();
        let logger = json_logger(&buffer).tag("service", "orders").build().unwrap();
        logger.info("up");

        assert_eq!(parse_lines(&buffer)[0]["tags"]["service"], "orders");
        assert_eq!(logger.metadata().tags()["service"], Value::String("orders".into()));
    }
}

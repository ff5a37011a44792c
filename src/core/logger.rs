//! Layered logger implementation
//!
//! A [`Logger`] is a cheap handle to one node of a logger tree. Children are
//! derived with [`Logger::with`], [`Logger::with_skip`], [`Logger::with_core`]
//! and [`Logger::with_fields`]; they never mutate their parent. Every node of
//! a tree shares the same [`LevelGate`], so [`Logger::set_level`] on any
//! handle applies to the whole hierarchy.

use super::{
    destination::Destination,
    encoder::{Encoder, EncoderFormat},
    error::{LoggerError, Result},
    field::Field,
    level_gate::LevelGate,
    log_entry::{self, LogEntry},
    log_level::LogLevel,
    metrics::LoggerMetrics,
    timestamp::TimestampFormat,
};
use crate::destinations::StreamSink;
use serde::Serialize;
use std::any::Any;
use std::backtrace::Backtrace;
use std::io::Write;
use std::panic::{self, AssertUnwindSafe, Location};
use std::sync::Arc;
use std::thread;

/// Called after a `Fatal` entry has been written and flushed
pub type FatalHook = Arc<dyn Fn() + Send + Sync>;

/// Compensation run in the background after a recovered panic
pub type Cleanup = Box<dyn FnOnce() + Send + 'static>;

/// Default caller skip: attribute entries to the caller of the severity method
pub const DEFAULT_CALLER_SKIP: usize = 1;

static NOP_METRICS: LoggerMetrics = LoggerMetrics::new();

/// State shared by every node of one logger tree
struct Shared {
    metrics: LoggerMetrics,
    stacktrace_level: LogLevel,
    on_fatal: FatalHook,
}

struct Node {
    names: Vec<String>,
    /// `[a][b]`, prepended to every message
    prefix: String,
    /// `a.b`, written under the `name` key
    name: String,
    skip: usize,
    /// Fields bound with `with_fields`, already attached to every destination
    context: Vec<Field>,
    gate: LevelGate,
    tee: Vec<Arc<dyn Destination>>,
    shared: Arc<Shared>,
}

impl Node {
    fn child(
        &self,
        name: &str,
        skip: usize,
        context: Vec<Field>,
        tee: Vec<Arc<dyn Destination>>,
    ) -> Node {
        let mut names = self.names.clone();
        let mut prefix = self.prefix.clone();
        if !name.is_empty() {
            names.push(name.to_string());
            prefix.push('[');
            prefix.push_str(name);
            prefix.push(']');
        }

        Node {
            name: names.join("."),
            names,
            prefix,
            skip,
            context,
            gate: self.gate.clone(),
            tee,
            shared: Arc::clone(&self.shared),
        }
    }

    fn compose(&self, message: &str) -> String {
        if self.prefix.is_empty() {
            return message.to_string();
        }
        let mut out = String::with_capacity(self.prefix.len() + 1 + message.len());
        out.push_str(&self.prefix);
        out.push(' ');
        out.push_str(message);
        out
    }

    fn accepts(&self, level: LogLevel) -> bool {
        // Terminal levels skip the gate so they always attempt delivery.
        if !level.is_terminal() && !self.gate.enabled(level) {
            return false;
        }
        self.tee.iter().any(|d| d.enabled(level))
    }

    fn write(
        &self,
        level: LogLevel,
        message: &str,
        fields: &[Field],
        caller: &Location<'_>,
        force_stack: bool,
    ) -> Result<()> {
        if !self.accepts(level) {
            return Ok(());
        }

        let mut entry = LogEntry::new(level, self.compose(message)).with_fields(fields);
        if !self.name.is_empty() {
            entry = entry.with_name(self.name.as_str());
        }
        if self.skip > 0 {
            entry = entry.with_caller(caller.file(), caller.line());
        }
        if force_stack || level >= self.shared.stacktrace_level {
            entry = entry.with_stack(Backtrace::force_capture().to_string());
        }

        let encodable =
            log_entry::ensure_encodable(&self.context).and_then(|()| entry.ensure_encodable());
        if let Err(e) = encodable {
            self.shared.metrics.record_failed();
            return Err(e);
        }

        let mut errors = Vec::new();
        for destination in self.tee.iter().filter(|d| d.enabled(level)) {
            if let Err(e) = destination.write(&entry) {
                errors.push(e);
            }
        }

        if errors.is_empty() {
            self.shared.metrics.record_written();
        } else {
            self.shared.metrics.record_failed();
        }
        LoggerError::collect(errors)
    }

    fn sync(&self) -> Result<()> {
        let mut first = None;
        for destination in &self.tee {
            if let Err(e) = destination.flush() {
                first.get_or_insert(e);
            }
        }
        first.map_or(Ok(()), Err)
    }
}

/// Handle to one scope of a layered logger.
///
/// Cloning is cheap and clones share everything. [`Logger::default`] is the
/// absent logger: every method is a no-op, including `panic` and `fatal`.
///
/// # Example
///
/// ```
/// use layerlog::{Field, LogLevel, Logger};
///
/// let root = Logger::builder().level(LogLevel::Info).json().output(std::io::sink()).build();
/// let db = root.with("api").with("db");
/// assert_eq!(db.prefix(), "[api][db]");
///
/// db.info("connected", &[Field::int("pool", 4)]);
///
/// root.set_level(LogLevel::Warn);
/// assert!(!db.enabled(LogLevel::Info));
/// ```
#[derive(Clone, Default)]
pub struct Logger {
    node: Option<Arc<Node>>,
}

impl Logger {
    /// Logger writing console entries at Info and above to stdout
    #[must_use]
    pub fn new() -> Self {
        LoggerBuilder::new().build()
    }

    #[must_use]
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::new()
    }

    /// The absent logger
    #[must_use]
    pub fn nop() -> Self {
        Self { node: None }
    }

    pub fn is_nop(&self) -> bool {
        self.node.is_none()
    }

    fn derive(&self, f: impl FnOnce(&Node) -> Node) -> Logger {
        Logger {
            node: self.node.as_deref().map(|node| Arc::new(f(node))),
        }
    }

    /// Child scope named `name`, keeping this logger's caller skip.
    ///
    /// An empty name adds no prefix segment.
    #[must_use]
    pub fn with(&self, name: &str) -> Logger {
        self.derive(|node| node.child(name, node.skip, node.context.clone(), node.tee.clone()))
    }

    /// Child scope named `name` with its own caller skip
    #[must_use]
    pub fn with_skip(&self, name: &str, skip: usize) -> Logger {
        self.derive(|node| node.child(name, skip, node.context.clone(), node.tee.clone()))
    }

    /// Child that also writes to `destination`, after all of this logger's
    /// destinations. Fields bound on this logger are bound on `destination`
    /// as well.
    #[must_use]
    pub fn with_core(&self, destination: Arc<dyn Destination>) -> Logger {
        self.derive(|node| {
            let mut tee = node.tee.clone();
            if node.context.is_empty() {
                tee.push(destination);
            } else {
                tee.push(destination.with_fields(&node.context));
            }
            node.child("", node.skip, node.context.clone(), tee)
        })
    }

    /// Child whose destinations attach `fields` to every entry
    #[must_use]
    pub fn with_fields(&self, fields: &[Field]) -> Logger {
        self.derive(|node| {
            let tee = node.tee.iter().map(|d| d.with_fields(fields)).collect();
            let mut context = node.context.clone();
            context.extend_from_slice(fields);
            node.child("", node.skip, context, tee)
        })
    }

    /// Change the minimum level of the whole tree this logger belongs to
    pub fn set_level(&self, level: LogLevel) {
        if let Some(node) = &self.node {
            node.gate.set_level(level);
        }
    }

    /// Current minimum level. The absent logger reports `Fatal`.
    pub fn level(&self) -> LogLevel {
        self.node
            .as_ref()
            .map_or(LogLevel::Fatal, |node| node.gate.level())
    }

    /// Whether an entry at `level` would reach at least one destination
    pub fn enabled(&self, level: LogLevel) -> bool {
        self.node.as_ref().is_some_and(|node| node.accepts(level))
    }

    /// Dot-joined scope names, empty for a root logger
    pub fn name(&self) -> &str {
        self.node.as_ref().map_or("", |node| node.name.as_str())
    }

    pub fn prefix(&self) -> &str {
        self.node.as_ref().map_or("", |node| node.prefix.as_str())
    }

    pub fn caller_skip(&self) -> usize {
        self.node.as_ref().map_or(0, |node| node.skip)
    }

    pub fn destinations(&self) -> &[Arc<dyn Destination>] {
        match &self.node {
            Some(node) => &node.tee,
            None => &[],
        }
    }

    pub fn gate(&self) -> Option<&LevelGate> {
        self.node.as_ref().map(|node| &node.gate)
    }

    /// Counters shared by the whole tree
    pub fn metrics(&self) -> &LoggerMetrics {
        self.node
            .as_ref()
            .map_or(&NOP_METRICS, |node| &node.shared.metrics)
    }

    /// Write one entry to every enabled destination and return the outcome.
    ///
    /// This is the fallible core of the severity methods; it never panics
    /// or exits, whatever the level.
    #[track_caller]
    pub fn write(&self, level: LogLevel, message: impl AsRef<str>, fields: &[Field]) -> Result<()> {
        match &self.node {
            Some(node) => node.write(level, message.as_ref(), fields, Location::caller(), false),
            None => Ok(()),
        }
    }

    /// Log at `level`, applying the level's terminal behavior
    #[track_caller]
    pub fn log(&self, level: LogLevel, message: impl AsRef<str>, fields: &[Field]) {
        let Some(node) = &self.node else {
            return;
        };
        let message = message.as_ref();

        if let Err(e) = node.write(level, message, fields, Location::caller(), false) {
            eprintln!("[LOGGER ERROR] Failed to write {} entry: {}", level, e);
        }

        match level {
            LogLevel::DPanic if cfg!(debug_assertions) => panic!("{}", node.compose(message)),
            LogLevel::Panic => panic!("{}", node.compose(message)),
            LogLevel::Fatal => {
                if let Err(e) = node.sync() {
                    eprintln!("[LOGGER ERROR] Failed to flush before exit: {}", e);
                }
                (node.shared.on_fatal)();
            }
            _ => {}
        }
    }

    #[track_caller]
    pub fn debug(&self, message: impl AsRef<str>, fields: &[Field]) {
        self.log(LogLevel::Debug, message, fields);
    }

    #[track_caller]
    pub fn info(&self, message: impl AsRef<str>, fields: &[Field]) {
        self.log(LogLevel::Info, message, fields);
    }

    #[track_caller]
    pub fn warn(&self, message: impl AsRef<str>, fields: &[Field]) {
        self.log(LogLevel::Warn, message, fields);
    }

    #[track_caller]
    pub fn error(&self, message: impl AsRef<str>, fields: &[Field]) {
        self.log(LogLevel::Error, message, fields);
    }

    /// Logs, then panics in debug builds
    #[track_caller]
    pub fn dpanic(&self, message: impl AsRef<str>, fields: &[Field]) {
        self.log(LogLevel::DPanic, message, fields);
    }

    /// Logs, then panics with the prefixed message
    #[track_caller]
    pub fn panic(&self, message: impl AsRef<str>, fields: &[Field]) {
        self.log(LogLevel::Panic, message, fields);
    }

    /// Logs regardless of the level, flushes every destination and calls the
    /// fatal hook, which exits the process with status 1 unless replaced.
    #[track_caller]
    pub fn fatal(&self, message: impl AsRef<str>, fields: &[Field]) {
        self.log(LogLevel::Fatal, message, fields);
    }

    /// Warn with an `error` field when `result` is an error
    #[track_caller]
    pub fn warn_on_err<T, E>(&self, guide: &str, result: &std::result::Result<T, E>, fields: &[Field])
    where
        E: std::error::Error,
    {
        if let Err(e) = result {
            self.log(LogLevel::Warn, guide, &with_error(fields, e));
        }
    }

    /// Log an error with an `error` field when `result` is an error
    #[track_caller]
    pub fn error_on_err<T, E>(&self, guide: &str, result: &std::result::Result<T, E>, fields: &[Field])
    where
        E: std::error::Error,
    {
        if let Err(e) = result {
            self.log(LogLevel::Error, guide, &with_error(fields, e));
        }
    }

    /// Flush every destination, returning the first error
    pub fn sync(&self) -> Result<()> {
        self.node.as_ref().map_or(Ok(()), |node| node.sync())
    }

    /// Run `f`, turning a panic into an Error entry.
    ///
    /// The entry carries `Func`, `Info`, `Recover` (the panic payload) and a
    /// stack trace of the recovery site. When `cleanup` is given it is started
    /// on a detached thread; nothing orders it against later log calls. The
    /// panic is never propagated: `None` is returned instead.
    ///
    /// # Example
    ///
    /// ```
    /// use layerlog::Logger;
    ///
    /// let logger = Logger::builder().output(std::io::sink()).build();
    /// let out = logger.recover_panic("parse", &"job 7", None, || -> u32 {
    ///     panic!("bad input")
    /// });
    /// assert_eq!(out, None);
    /// assert_eq!(logger.metrics().panics_recovered(), 1);
    /// ```
    #[track_caller]
    pub fn recover_panic<F, R, I>(
        &self,
        func_name: &str,
        info: &I,
        cleanup: Option<Cleanup>,
        f: F,
    ) -> Option<R>
    where
        F: FnOnce() -> R,
        I: Serialize + ?Sized,
    {
        let caller = Location::caller();
        let payload = match panic::catch_unwind(AssertUnwindSafe(f)) {
            Ok(value) => return Some(value),
            Err(payload) => payload,
        };

        if let Some(node) = &self.node {
            node.shared.metrics.record_panic_recovered();
            let fields = [
                Field::string("Func", func_name),
                Field::any("Info", info),
                Field::string("Recover", panic_message(payload.as_ref())),
            ];
            if let Err(e) = node.write(LogLevel::Error, "Panic Recovered", &fields, caller, true) {
                eprintln!("[LOGGER ERROR] Failed to write recovered panic: {}", e);
            }
        }

        if let Some(cleanup) = cleanup {
            let spawned = thread::Builder::new()
                .name("layerlog-cleanup".to_string())
                .spawn(cleanup);
            if let Err(e) = spawned {
                eprintln!("[LOGGER ERROR] Failed to start panic cleanup: {}", e);
            }
        }
        None
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.node {
            Some(node) => f
                .debug_struct("Logger")
                .field("name", &node.name)
                .field("level", &node.gate.level())
                .field("caller_skip", &node.skip)
                .field("destinations", &node.tee.len())
                .finish(),
            None => f.write_str("Logger(nop)"),
        }
    }
}

fn with_error(fields: &[Field], err: &dyn std::error::Error) -> Vec<Field> {
    let mut fields = fields.to_vec();
    fields.push(Field::error(err));
    fields
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

/// Builder for constructing a root [`Logger`] with a fluent API
///
/// # Example
/// ```
/// use layerlog::prelude::*;
///
/// let logger = Logger::builder()
///     .level(LogLevel::Debug)
///     .json()
///     .caller_skip(1)
///     .output(std::io::sink())
///     .build();
/// assert!(logger.enabled(LogLevel::Debug));
/// ```
pub struct LoggerBuilder {
    level: LogLevel,
    format: EncoderFormat,
    timestamp_format: TimestampFormat,
    colors: bool,
    caller_skip: usize,
    stacktrace_level: LogLevel,
    output: Option<Box<dyn Write + Send>>,
    destinations: Vec<Arc<dyn Destination>>,
    on_fatal: Option<FatalHook>,
}

impl LoggerBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self {
            level: LogLevel::Info,
            format: EncoderFormat::Console,
            timestamp_format: TimestampFormat::default(),
            colors: false,
            caller_skip: DEFAULT_CALLER_SKIP,
            stacktrace_level: LogLevel::Error,
            output: None,
            destinations: Vec::new(),
            on_fatal: None,
        }
    }

    /// Set minimum log level
    #[must_use = "builder methods return a new value"]
    pub fn level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn encoder_format(mut self, format: EncoderFormat) -> Self {
        self.format = format;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn json(self) -> Self {
        self.encoder_format(EncoderFormat::Json)
    }

    #[must_use = "builder methods return a new value"]
    pub fn console(self) -> Self {
        self.encoder_format(EncoderFormat::Console)
    }

    #[must_use = "builder methods return a new value"]
    pub fn timestamp_format(mut self, format: TimestampFormat) -> Self {
        self.timestamp_format = format;
        self
    }

    /// Colorize console levels (needs the `console` feature)
    #[must_use = "builder methods return a new value"]
    pub fn colors(mut self, enabled: bool) -> Self {
        self.colors = enabled;
        self
    }

    /// 0 omits the caller from entries
    #[must_use = "builder methods return a new value"]
    pub fn caller_skip(mut self, skip: usize) -> Self {
        self.caller_skip = skip;
        self
    }

    /// Entries at or above `level` carry a stack trace
    #[must_use = "builder methods return a new value"]
    pub fn stacktrace_level(mut self, level: LogLevel) -> Self {
        self.stacktrace_level = level;
        self
    }

    /// Replace stdout as the local stream
    #[must_use = "builder methods return a new value"]
    pub fn output<W: Write + Send + 'static>(mut self, writer: W) -> Self {
        self.output = Some(Box::new(writer));
        self
    }

    /// Add a destination after the local stream
    #[must_use = "builder methods return a new value"]
    pub fn destination(mut self, destination: Arc<dyn Destination>) -> Self {
        self.destinations.push(destination);
        self
    }

    /// Replace the process exit performed by `fatal`
    #[must_use = "builder methods return a new value"]
    pub fn on_fatal(mut self, hook: FatalHook) -> Self {
        self.on_fatal = Some(hook);
        self
    }

    /// Build the root Logger, rejecting an invalid custom timestamp pattern
    pub fn try_build(self) -> Result<Logger> {
        self.timestamp_format.validate()?;
        Ok(self.build())
    }

    /// Build the root Logger.
    ///
    /// An invalid custom timestamp pattern is reported on stderr and replaced
    /// by the default format.
    pub fn build(mut self) -> Logger {
        if let Err(e) = self.timestamp_format.validate() {
            eprintln!("[LOGGER ERROR] Using default timestamp format: {}", e);
            self.timestamp_format = TimestampFormat::default();
        }

        let gate = LevelGate::new(self.level);
        let encoder = Encoder::new(self.format)
            .with_timestamp_format(self.timestamp_format)
            .with_colors(self.colors);

        let local = match self.output {
            Some(writer) => StreamSink::named("stream", writer, encoder.clone(), gate.clone()),
            None => StreamSink::stdout(encoder.clone(), gate.clone()),
        };
        let mut tee: Vec<Arc<dyn Destination>> = Vec::with_capacity(1 + self.destinations.len());
        tee.push(Arc::new(local));
        tee.extend(self.destinations);

        let shared = Shared {
            metrics: LoggerMetrics::new(),
            stacktrace_level: self.stacktrace_level,
            on_fatal: self
                .on_fatal
                .unwrap_or_else(|| Arc::new(|| std::process::exit(1))),
        };

        Logger {
            node: Some(Arc::new(Node {
                names: Vec::new(),
                prefix: String::new(),
                name: String::new(),
                skip: self.caller_skip,
                context: Vec::new(),
                gate,
                tee,
                shared: Arc::new(shared),
            })),
        }
    }
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

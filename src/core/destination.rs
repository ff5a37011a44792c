//! Destination trait for log output

use super::{error::Result, field::Field, log_entry::LogEntry, log_level::LogLevel};
use std::sync::Arc;

/// A sink that accepts log entries.
///
/// Destinations are shared between a logger and all of its children, so every
/// method takes `&self`; implementations synchronize internally.
pub trait Destination: Send + Sync {
    /// Whether an entry at `level` would be accepted
    fn enabled(&self, level: LogLevel) -> bool;

    /// Serialize `entry` once and hand it to this destination's transport
    fn write(&self, entry: &LogEntry) -> Result<()>;

    fn flush(&self) -> Result<()>;

    /// A destination that also encodes `fields` with every entry
    fn with_fields(&self, fields: &[Field]) -> Arc<dyn Destination>;

    fn name(&self) -> &str;
}

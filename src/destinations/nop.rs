//! Destination that discards everything

use crate::core::{Destination, Field, LogEntry, LogLevel, Result};
use std::sync::Arc;

/// Stand-in for a remote destination whose credential or address is missing.
/// Accepts every call, performs no I/O and never fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct NopDestination;

impl NopDestination {
    pub fn shared() -> Arc<dyn Destination> {
        Arc::new(NopDestination)
    }
}

impl Destination for NopDestination {
    fn enabled(&self, _level: LogLevel) -> bool {
        false
    }

    fn write(&self, _entry: &LogEntry) -> Result<()> {
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        Ok(())
    }

    fn with_fields(&self, _fields: &[Field]) -> Arc<dyn Destination> {
        Self::shared()
    }

    fn name(&self) -> &str {
        "nop"
    }
}

//! Log entry structure

use super::error::{LoggerError, Result};
use super::field::Field;
use super::log_level::LogLevel;
use chrono::{DateTime, Utc};

/// One log call after it passed the level gate
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub level: LogLevel,
    pub timestamp: DateTime<Utc>,
    /// Dot-joined scope names of the emitting logger
    pub name: Option<String>,
    /// `file:line` of the call site
    pub caller: Option<String>,
    pub message: String,
    pub fields: Vec<Field>,
    pub stack: Option<String>,
}

impl LogEntry {
    /// Sanitize log message to prevent log injection attacks
    ///
    /// Replaces newlines, carriage returns, and tabs with escape sequences
    /// to prevent attackers from injecting fake log entries.
    fn sanitize_message(message: &str) -> String {
        message
            .replace('\n', "\\n")
            .replace('\r', "\\r")
            .replace('\t', "\\t")
    }

    pub fn new(level: LogLevel, message: impl AsRef<str>) -> Self {
        Self {
            level,
            timestamp: Utc::now(),
            name: None,
            caller: None,
            message: Self::sanitize_message(message.as_ref()),
            fields: Vec::new(),
            stack: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_caller(mut self, file: &str, line: u32) -> Self {
        self.caller = Some(format!("{}:{}", short_path(file), line));
        self
    }

    pub fn with_fields(mut self, fields: &[Field]) -> Self {
        self.fields.extend_from_slice(fields);
        self
    }

    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    /// Fail if any field cannot be encoded, before anything is written.
    pub fn ensure_encodable(&self) -> Result<()> {
        ensure_encodable(&self.fields)
    }
}

pub(crate) fn ensure_encodable(fields: &[Field]) -> Result<()> {
    match fields.iter().find(|f| !f.is_encodable()) {
        Some(field) => Err(LoggerError::formatter(
            "field",
            format!("field '{}' is not encodable: {}", field.key, field.value),
        )),
        None => Ok(()),
    }
}

/// Keep the last directory and file name, e.g. `core/logger.rs`
fn short_path(file: &str) -> &str {
    let mut separators = file.rmatch_indices(['/', '\\']);
    separators.next();
    match separators.next() {
        Some((idx, _)) => &file[idx + 1..],
        None => file,
    }
}

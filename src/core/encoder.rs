//! Entry encoders
//!
//! Two formats share one logical key set, always written in the order
//! `ts`, `level`, `name`, `caller`, `msg`, then the structured fields:
//! - Console: tab-separated, human-oriented, fields as a trailing JSON object
//! - Json: one JSON object per line

use super::error::{LoggerError, Result};
use super::field::Field;
use super::log_entry::LogEntry;
use super::timestamp::TimestampFormat;
use serde::{Deserialize, Serialize};
use std::io::Write;

pub const TIME_KEY: &str = "ts";
pub const LEVEL_KEY: &str = "level";
pub const NAME_KEY: &str = "name";
pub const CALLER_KEY: &str = "caller";
pub const MESSAGE_KEY: &str = "msg";
pub const STACKTRACE_KEY: &str = "stacktrace";

/// Output format of an [`Encoder`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncoderFormat {
    /// Example: `2025-01-08T10:30:45.123Z\tINFO\tapi.db\tdb/pool.rs:42\t[api][db] connected\t{"pool":4}`
    #[default]
    Console,

    /// Example: `{"ts":"2025-01-08T10:30:45.123Z","level":"INFO","msg":"connected","pool":4}`
    Json,
}

/// Serializes log entries.
///
/// An encoder holds configuration only; every call builds a fresh buffer, so
/// clones can be used independently from different destinations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Encoder {
    format: EncoderFormat,
    timestamp_format: TimestampFormat,
    colored: bool,
}

impl Encoder {
    pub fn new(format: EncoderFormat) -> Self {
        Self {
            format,
            ..Self::default()
        }
    }

    pub fn console() -> Self {
        Self::new(EncoderFormat::Console)
    }

    pub fn json() -> Self {
        Self::new(EncoderFormat::Json)
    }

    #[must_use]
    pub fn with_timestamp_format(mut self, format: TimestampFormat) -> Self {
        self.timestamp_format = format;
        self
    }

    /// Color the level name in console output. Ignored for JSON.
    #[must_use]
    pub fn with_colors(mut self, colored: bool) -> Self {
        self.colored = colored;
        self
    }

    pub fn format(&self) -> EncoderFormat {
        self.format
    }

    /// Encode one entry, with `context` fields (bound to the destination)
    /// written before the entry's own fields.
    ///
    /// The returned buffer ends with a newline. Fails without producing
    /// output if any field cannot be encoded.
    pub fn encode(&self, entry: &LogEntry, context: &[Field]) -> Result<Vec<u8>> {
        match self.format {
            EncoderFormat::Console => self.encode_console(entry, context),
            EncoderFormat::Json => self.encode_json(entry, context),
        }
    }

    fn encode_console(&self, entry: &LogEntry, context: &[Field]) -> Result<Vec<u8>> {
        let fields = fields_object(context, &entry.fields, "console")?;

        let mut buf = Vec::with_capacity(128 + entry.message.len());
        write!(buf, "{}\t{}", self.timestamp_format.format(&entry.timestamp), self.level_text(entry))?;
        if let Some(ref name) = entry.name {
            write!(buf, "\t{}", name)?;
        }
        if let Some(ref caller) = entry.caller {
            write!(buf, "\t{}", caller)?;
        }
        write!(buf, "\t{}", entry.message)?;
        if !fields.is_empty() {
            buf.extend_from_slice(b"\t{");
            for (idx, (key, value)) in fields.iter().enumerate() {
                write_pair(&mut buf, key, value, idx == 0)?;
            }
            buf.push(b'}');
        }
        if let Some(ref stack) = entry.stack {
            write!(buf, "\n{}", stack.trim_end())?;
        }
        buf.push(b'\n');
        Ok(buf)
    }

    fn encode_json(&self, entry: &LogEntry, context: &[Field]) -> Result<Vec<u8>> {
        let fields = fields_object(context, &entry.fields, "json")?;

        // Written pair by pair so the reserved keys keep their order.
        let mut buf = Vec::with_capacity(160 + entry.message.len());
        buf.push(b'{');
        write_pair(&mut buf, TIME_KEY, &self.timestamp_format.to_json_value(&entry.timestamp), true)?;
        write_pair(&mut buf, LEVEL_KEY, &entry.level.to_str(), false)?;
        if let Some(ref name) = entry.name {
            write_pair(&mut buf, NAME_KEY, name, false)?;
        }
        if let Some(ref caller) = entry.caller {
            write_pair(&mut buf, CALLER_KEY, caller, false)?;
        }
        write_pair(&mut buf, MESSAGE_KEY, &entry.message, false)?;
        for (key, value) in &fields {
            write_pair(&mut buf, key, value, false)?;
        }
        if let Some(ref stack) = entry.stack {
            write_pair(&mut buf, STACKTRACE_KEY, stack, false)?;
        }
        buf.extend_from_slice(b"}\n");
        Ok(buf)
    }

    #[cfg(feature = "console")]
    fn level_text(&self, entry: &LogEntry) -> String {
        use colored::Colorize;
        if self.colored {
            entry
                .level
                .to_str()
                .color(entry.level.color_code())
                .to_string()
        } else {
            entry.level.to_str().to_string()
        }
    }

    #[cfg(not(feature = "console"))]
    fn level_text(&self, entry: &LogEntry) -> String {
        entry.level.to_str().to_string()
    }
}

/// Convert every field up front, in call order, so a bad field aborts the
/// entry before any byte is produced.
fn fields_object<'a>(
    context: &'a [Field],
    own: &'a [Field],
    format_type: &str,
) -> Result<Vec<(&'a str, serde_json::Value)>> {
    context
        .iter()
        .chain(own)
        .map(|field| {
            field
                .value
                .to_json_value()
                .map(|value| (field.key.as_str(), value))
                .map_err(|reason| {
                    LoggerError::formatter(
                        format_type,
                        format!("field '{}': {}", field.key, reason),
                    )
                })
        })
        .collect()
}

fn write_pair<V: Serialize + ?Sized>(
    buf: &mut Vec<u8>,
    key: &str,
    value: &V,
    first: bool,
) -> Result<()> {
    if !first {
        buf.push(b',');
    }
    serde_json::to_writer(&mut *buf, key)?;
    buf.push(b':');
    serde_json::to_writer(&mut *buf, value)?;
    Ok(())
}

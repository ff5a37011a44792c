//! Local stream destination (stdout by default)

use crate::core::{Destination, Encoder, Field, LevelGate, LogEntry, LogLevel, Result};
use parking_lot::Mutex;
use std::io::{self, Write};
use std::sync::Arc;

type SharedWriter = Arc<Mutex<Box<dyn Write + Send>>>;

/// Writes encoded entries to a fixed stream.
///
/// Writes are serialized under a lock so concurrent callers never interleave
/// partial lines. Level checks go through the [`LevelGate`] the sink was
/// created with, normally the gate of the owning logger; DPanic and above are
/// always accepted.
///
/// # Example
///
/// ```
/// use layerlog::destinations::StreamSink;
/// use layerlog::{Destination, Encoder, LevelGate, LogLevel};
///
/// let gate = LevelGate::new(LogLevel::Info);
/// let sink = StreamSink::stdout(Encoder::json(), gate.clone());
/// assert!(!sink.enabled(LogLevel::Debug));
/// ```
pub struct StreamSink {
    name: String,
    writer: SharedWriter,
    encoder: Encoder,
    gate: LevelGate,
    context: Vec<Field>,
}

impl StreamSink {
    pub fn new<W: Write + Send + 'static>(writer: W, encoder: Encoder, gate: LevelGate) -> Self {
        Self::named("stream", Box::new(writer), encoder, gate)
    }

    pub fn stdout(encoder: Encoder, gate: LevelGate) -> Self {
        Self::named("stdout", Box::new(io::stdout()), encoder, gate)
    }

    pub(crate) fn named(
        name: &str,
        writer: Box<dyn Write + Send>,
        encoder: Encoder,
        gate: LevelGate,
    ) -> Self {
        Self {
            name: name.to_string(),
            writer: Arc::new(Mutex::new(writer)),
            encoder,
            gate,
            context: Vec::new(),
        }
    }
}

impl Destination for StreamSink {
    fn enabled(&self, level: LogLevel) -> bool {
        level.is_terminal() || self.gate.enabled(level)
    }

    fn write(&self, entry: &LogEntry) -> Result<()> {
        let encoded = self.encoder.encode(entry, &self.context)?;
        self.writer.lock().write_all(&encoded)?;
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        self.writer.lock().flush()?;
        Ok(())
    }

    fn with_fields(&self, fields: &[Field]) -> Arc<dyn Destination> {
        let mut context = self.context.clone();
        context.extend_from_slice(fields);
        Arc::new(Self {
            name: self.name.clone(),
            writer: Arc::clone(&self.writer),
            encoder: self.encoder.clone(),
            gate: self.gate.clone(),
            context,
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

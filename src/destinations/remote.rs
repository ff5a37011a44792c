//! Adapter between the destination contract and one-shot remote shippers

use crate::core::{Destination, Encoder, Field, LogEntry, LogLevel, Result};
use std::sync::Arc;

/// Delivers one already-encoded entry.
///
/// Each call makes exactly one delivery attempt and reports its outcome;
/// nothing is buffered or retried.
pub trait Shipper: Send + Sync {
    fn ship(&self, level: LogLevel, encoded: &[u8]) -> Result<()>;
}

/// A destination that encodes each entry with its own encoder and passes the
/// bytes to a [`Shipper`], gated by its own minimum level.
pub struct RemoteDestination<S> {
    name: String,
    level: LogLevel,
    encoder: Encoder,
    context: Vec<Field>,
    shipper: Arc<S>,
}

impl<S: Shipper> RemoteDestination<S> {
    pub fn new(name: impl Into<String>, level: LogLevel, encoder: Encoder, shipper: S) -> Self {
        Self {
            name: name.into(),
            level,
            encoder,
            context: Vec::new(),
            shipper: Arc::new(shipper),
        }
    }

    pub fn shipper(&self) -> &S {
        &self.shipper
    }
}

impl<S: Shipper + 'static> Destination for RemoteDestination<S> {
    fn enabled(&self, level: LogLevel) -> bool {
        level >= self.level
    }

    fn write(&self, entry: &LogEntry) -> Result<()> {
        let encoded = self.encoder.encode(entry, &self.context)?;
        self.shipper.ship(entry.level, &encoded)
    }

    fn flush(&self) -> Result<()> {
        Ok(())
    }

    fn with_fields(&self, fields: &[Field]) -> Arc<dyn Destination> {
        let mut context = self.context.clone();
        context.extend_from_slice(fields);
        Arc::new(Self {
            name: self.name.clone(),
            level: self.level,
            encoder: self.encoder.clone(),
            context,
            shipper: Arc::clone(&self.shipper),
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

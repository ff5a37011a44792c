//! Core logger types and traits

pub mod config;
pub mod destination;
pub mod encoder;
pub mod env;
pub mod error;
pub mod field;
pub mod level_gate;
pub mod log_entry;
pub mod log_level;
pub mod logger;
pub mod metrics;
pub mod timestamp;

pub use config::LoggerConfig;
pub use destination::Destination;
pub use encoder::{Encoder, EncoderFormat};
pub use env::{EnvProvider, MemoryEnv, ProcessEnv};
pub use error::{LoggerError, Result};
pub use field::{Field, FieldValue};
pub use level_gate::LevelGate;
pub use log_entry::LogEntry;
pub use log_level::LogLevel;
pub use logger::{Cleanup, FatalHook, Logger, LoggerBuilder, DEFAULT_CALLER_SKIP};
pub use metrics::LoggerMetrics;
pub use timestamp::TimestampFormat;

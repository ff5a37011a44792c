//! # layerlog
//!
//! A layered structured-logging facade with local and remote destinations.
//!
//! ## Features
//!
//! - **Layered scopes**: `with("db")` children prefix messages with `[api][db]`
//!   and share one atomically updated level gate with their whole tree
//! - **Tee fan-out**: every entry goes to the local stream and to any extra
//!   destination added with `with_core`
//! - **Datadog shipping**: direct submission to the logs intake API or relay
//!   through an agent, one attempt per entry
//! - **Panic recovery**: `recover_panic` turns a panic into an Error entry with
//!   a stack trace and starts an optional cleanup in the background
//!
//! ## Example
//!
//! ```
//! use layerlog::prelude::*;
//!
//! let logger = Logger::builder().level(LogLevel::Debug).output(std::io::sink()).build();
//! let db = logger.with("db");
//! db.info("connected", &[Field::string("host", "localhost"), Field::int("pool", 8)]);
//! layerlog::warn!(db, "slow query took {}ms", 340);
//! ```

pub mod core;
pub mod destinations;
pub mod macros;

pub mod prelude {
    pub use crate::core::{
        Cleanup, Destination, Encoder, EncoderFormat, FatalHook, Field, FieldValue, LevelGate,
        LogEntry, LogLevel, Logger, LoggerBuilder, LoggerConfig, LoggerError, LoggerMetrics,
        Result, TimestampFormat,
    };
    pub use crate::destinations::{datadog, NopDestination, StreamSink};
}

pub use crate::core::{
    Cleanup, Destination, Encoder, EncoderFormat, EnvProvider, FatalHook, Field, FieldValue,
    LevelGate, LogEntry, LogLevel, Logger, LoggerBuilder, LoggerConfig, LoggerError,
    LoggerMetrics, MemoryEnv, ProcessEnv, Result, TimestampFormat,
};
pub use destinations::{NopDestination, RemoteDestination, Shipper, StreamSink};

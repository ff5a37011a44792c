//! Logging macros for printf-style messages.
//!
//! These macros format their arguments like `format!` and log the result
//! without structured fields. The entry is attributed to the macro call site.
//!
//! # Examples
//!
//! ```
//! use layerlog::prelude::*;
//! use layerlog::info;
//!
//! let logger = Logger::builder().output(std::io::sink()).build();
//!
//! info!(logger, "Server started");
//!
//! let port = 8080;
//! info!(logger.with("http"), "listening on port {}", port);
//! ```

/// Log a formatted message at `level`.
///
/// The arguments are only formatted when the level is enabled. DPanic and
/// above always reach the logger so their terminal behavior still runs.
///
/// # Examples
///
/// ```
/// # use layerlog::prelude::*;
/// # let logger = Logger::builder().output(std::io::sink()).build();
/// use layerlog::log;
/// log!(logger, LogLevel::Info, "Simple message");
/// log!(logger, LogLevel::Error, "Error code: {}", 500);
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $($arg:tt)+) => {{
        let logger = &$logger;
        let level: $crate::LogLevel = $level;
        if level.is_terminal() || logger.enabled(level) {
            logger.log(level, format!($($arg)+), &[]);
        }
    }};
}

/// Log a debug-level message.
///
/// # Examples
///
/// ```
/// # use layerlog::prelude::*;
/// # let logger = Logger::builder().level(LogLevel::Debug).output(std::io::sink()).build();
/// use layerlog::debug;
/// debug!(logger, "Counter value: {}", 10);
/// ```
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Debug, $($arg)+)
    };
}

/// Log an info-level message.
#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Info, $($arg)+)
    };
}

/// Log a warning-level message.
///
/// # Examples
///
/// ```
/// # use layerlog::prelude::*;
/// # let logger = Logger::builder().output(std::io::sink()).build();
/// use layerlog::warn;
/// warn!(logger, "Retry attempt {} of {}", 3, 5);
/// ```
#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Warn, $($arg)+)
    };
}

/// Log an error-level message.
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Error, $($arg)+)
    };
}

/// Log a fatal-level message, then run the logger's fatal hook.
///
/// # Examples
///
/// ```no_run
/// # use layerlog::prelude::*;
/// # let logger = Logger::new();
/// use layerlog::fatal;
/// fatal!(logger, "Unable to recover from error: {}", "disk full");
/// ```
#[macro_export]
macro_rules! fatal {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Fatal, $($arg)+)
    };
}

//! Error types for the logger system

use std::time::Duration;

pub type Result<T> = std::result::Result<T, LoggerError>;

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// IO error with context
    #[error("IO error while {operation}: {message}")]
    IoOperation {
        operation: String,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Generic IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// HTTP transport error from the direct-submit shipper
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Invalid configuration with details
    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },

    /// Formatter error with format type
    #[error("Formatter error ({format_type}): {message}")]
    FormatterError {
        format_type: String,
        message: String,
    },

    /// Remote submission did not finish within its budget
    #[error("Deadline exceeded after {timeout:?}")]
    DeadlineExceeded { timeout: Duration },

    /// Remote endpoint answered with a non-success status
    #[error("Log submission rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },

    /// Could not reach a log collector
    #[error("Connection to '{address}' failed: {source}")]
    Connection {
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// Writer error (generic)
    #[error("Writer error: {0}")]
    WriterError(String),

    /// More than one destination failed during the same write
    #[error("{} destinations failed: {}", .0.len(), join_errors(.0))]
    Multiple(Vec<LoggerError>),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

fn join_errors(errors: &[LoggerError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl LoggerError {
    /// Create an IO operation error with context
    pub fn io_operation(
        operation: impl Into<String>,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        LoggerError::IoOperation {
            operation: operation.into(),
            message: message.into(),
            source,
        }
    }

    /// Create an invalid configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Create a formatter error
    pub fn formatter(format_type: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::FormatterError {
            format_type: format_type.into(),
            message: message.into(),
        }
    }

    /// Create a deadline exceeded error
    pub fn deadline(timeout: Duration) -> Self {
        LoggerError::DeadlineExceeded { timeout }
    }

    /// Create a connection error
    pub fn connection(address: impl Into<String>, source: std::io::Error) -> Self {
        LoggerError::Connection {
            address: address.into(),
            source,
        }
    }

    /// Create a writer error (generic)
    pub fn writer<S: Into<String>>(msg: S) -> Self {
        LoggerError::WriterError(msg.into())
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        LoggerError::Other(msg.into())
    }

    /// Fold the failures of one fan-out into a single result.
    ///
    /// A single failure is returned unchanged, several are wrapped in
    /// [`LoggerError::Multiple`] in the order they occurred.
    pub fn collect(mut errors: Vec<LoggerError>) -> Result<()> {
        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(LoggerError::Multiple(errors)),
        }
    }

    /// Whether this error (or any aggregated error) is a deadline overrun
    pub fn is_deadline_exceeded(&self) -> bool {
        match self {
            LoggerError::DeadlineExceeded { .. } => true,
            LoggerError::HttpError(e) => e.is_timeout(),
            LoggerError::Multiple(errors) => errors.iter().any(LoggerError::is_deadline_exceeded),
            _ => false,
        }
    }
}

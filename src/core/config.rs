//! Declarative logger configuration

use super::encoder::EncoderFormat;
use super::log_level::LogLevel;
use super::logger::{LoggerBuilder, DEFAULT_CALLER_SKIP};
use super::timestamp::TimestampFormat;
use serde::{Deserialize, Serialize};

/// Logger settings as loaded from a configuration file.
///
/// Missing keys take the builder defaults.
///
/// # Example
///
/// ```
/// use layerlog::{LogLevel, LoggerConfig};
///
/// let config: LoggerConfig = serde_json::from_str(r#"{"level": "debug", "format": "json"}"#).unwrap();
/// assert_eq!(config.level, LogLevel::Debug);
///
/// let logger = config.into_builder().output(std::io::sink()).build();
/// assert!(logger.enabled(LogLevel::Debug));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    pub level: LogLevel,
    pub format: EncoderFormat,
    pub caller_skip: usize,
    pub timestamp_format: TimestampFormat,
    pub colors: bool,
    pub stacktrace_level: LogLevel,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: EncoderFormat::Console,
            caller_skip: DEFAULT_CALLER_SKIP,
            timestamp_format: TimestampFormat::default(),
            colors: false,
            stacktrace_level: LogLevel::Error,
        }
    }
}

impl LoggerConfig {
    pub fn into_builder(self) -> LoggerBuilder {
        LoggerBuilder::new()
            .level(self.level)
            .encoder_format(self.format)
            .caller_skip(self.caller_skip)
            .timestamp_format(self.timestamp_format)
            .colors(self.colors)
            .stacktrace_level(self.stacktrace_level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: LoggerConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, LoggerConfig::default());
        assert_eq!(config.caller_skip, 1);
    }

    #[test]
    fn test_full_config() {
        let config: LoggerConfig = serde_json::from_str(
            r#"{
                "level": "warn",
                "format": "json",
                "caller_skip": 0,
                "timestamp_format": "UnixMillis",
                "colors": true,
                "stacktrace_level": "fatal"
            }"#,
        )
        .unwrap();

        assert_eq!(config.level, LogLevel::Warn);
        assert_eq!(config.format, EncoderFormat::Json);
        assert_eq!(config.timestamp_format, TimestampFormat::UnixMillis);
        assert_eq!(config.stacktrace_level, LogLevel::Fatal);

        let logger = config.into_builder().output(std::io::sink()).build();
        assert_eq!(logger.level(), LogLevel::Warn);
        assert_eq!(logger.caller_skip(), 0);
    }

    #[test]
    fn test_invalid_timestamp_pattern_is_rejected() {
        let config: LoggerConfig =
            serde_json::from_str(r#"{"timestamp_format": {"Custom": "%Q"}}"#).unwrap();
        let result = config.into_builder().output(std::io::sink()).try_build();
        assert!(matches!(
            result,
            Err(crate::core::LoggerError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn test_unknown_level_is_rejected() {
        assert!(serde_json::from_str::<LoggerConfig>(r#"{"level": "verbose"}"#).is_err());
    }
}

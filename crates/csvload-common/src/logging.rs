//! Logging Configuration and Initialization
//!
//! Centralised tracing setup for the loader. Lambda forwards stdout to
//! CloudWatch, so all output goes to stdout in either human-readable text
//! or JSON (one object per line, which CloudWatch Logs Insights can query).
//!
//! Use the structured logging macros with fields rather than `println!`:
//!
//! ```rust,ignore
//! use tracing::{error, info};
//!
//! info!(bucket = %bucket, key = %key, "Loading object");
//! error!(error = %err, table = %table, "Batch write failed");
//! ```
//!
//! # Example
//!
//! ```no_run
//! use csvload_common::logging::{init_logging, LogConfig};
//! use tracing::info;
//!
//! let config = LogConfig::from_env().unwrap_or_default();
//! init_logging(&config).ok();
//!
//! info!("Function started");
//! ```

use crate::error::{CommonError, Result};
use tracing::Level;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Minimum level passed to the subscriber, read from `LOG_LEVEL`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Convert to tracing Level
    pub fn to_tracing_level(self) -> Level {
        match self {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = CommonError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(CommonError::Config(format!("Invalid log level: {}", s))),
        }
    }
}

/// Output encoding, read from `LOG_FORMAT`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    /// One JSON object per line, queryable from CloudWatch Logs Insights
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = CommonError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => Err(CommonError::Config(format!("Invalid log format: {}", s))),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Minimum log level to display
    pub level: LogLevel,

    /// Log format (text or JSON)
    pub format: LogFormat,

    /// Additional filter directives (e.g., "aws_smithy_runtime=warn,hyper=warn")
    pub filter_directives: Option<String>,

    /// Whether to include file and line number in logs
    pub include_location: bool,

    /// Whether to include target module names in logs
    pub include_targets: bool,

    /// Whether to emit timestamps (CloudWatch stamps every line already)
    pub include_timestamps: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Text,
            filter_directives: None,
            include_location: false,
            include_targets: true,
            include_timestamps: true,
        }
    }
}

impl LogConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `LOG_LEVEL`: Log level (trace, debug, info, warn, error)
    /// - `LOG_FORMAT`: Log format (text, json)
    /// - `LOG_FILTER`: Additional filter directives
    /// - `LOG_INCLUDE_LOCATION`: Include file/line in logs (true/false)
    /// - `LOG_INCLUDE_TARGETS`: Include module targets (true/false)
    /// - `LOG_INCLUDE_TIMESTAMPS`: Include timestamps (true/false)
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(level) = std::env::var("LOG_LEVEL") {
            config.level = level.parse()?;
        }

        if let Ok(format) = std::env::var("LOG_FORMAT") {
            config.format = format.parse()?;
        }

        if let Ok(filter) = std::env::var("LOG_FILTER") {
            config.filter_directives = Some(filter);
        }

        if let Ok(val) = std::env::var("LOG_INCLUDE_LOCATION") {
            config.include_location = val.parse().unwrap_or(false);
        }

        if let Ok(val) = std::env::var("LOG_INCLUDE_TARGETS") {
            config.include_targets = val.parse().unwrap_or(true);
        }

        if let Ok(val) = std::env::var("LOG_INCLUDE_TIMESTAMPS") {
            config.include_timestamps = val.parse().unwrap_or(true);
        }

        Ok(config)
    }
}

/// Build the level filter, honouring `RUST_LOG` plus any configured directives
fn build_filter(config: &LogConfig) -> Result<EnvFilter> {
    let mut filter =
        EnvFilter::from_default_env().add_directive(config.level.to_tracing_level().into());

    if let Some(ref directives) = config.filter_directives {
        for directive in directives.split(',').map(str::trim).filter(|d| !d.is_empty()) {
            let parsed = directive.parse().map_err(|e| {
                CommonError::Config(format!("Failed to parse filter directive '{}': {}", directive, e))
            })?;
            filter = filter.add_directive(parsed);
        }
    }

    Ok(filter)
}

/// Initialize logging with the given configuration
///
/// Sets up the global tracing subscriber. Call once, before the runtime
/// starts polling for events.
pub fn init_logging(config: &LogConfig) -> Result<()> {
    let filter = build_filter(config)?;

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(config.include_targets)
        .with_file(config.include_location)
        .with_line_number(config.include_location)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(false);

    let result = match (config.format, config.include_timestamps) {
        (LogFormat::Text, true) => tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .try_init(),
        (LogFormat::Text, false) => tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer.without_time())
            .try_init(),
        (LogFormat::Json, true) => tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer.json())
            .try_init(),
        (LogFormat::Json, false) => tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer.json().without_time())
            .try_init(),
    };

    result.map_err(|e| CommonError::Logging(e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_log_level_from_str() {
        assert_eq!("trace".parse::<LogLevel>().unwrap(), LogLevel::Trace);
        assert_eq!("DEBUG".parse::<LogLevel>().unwrap(), LogLevel::Debug);
        assert_eq!("Info".parse::<LogLevel>().unwrap(), LogLevel::Info);
        assert_eq!("warn".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert!("warning".parse::<LogLevel>().is_err());
        assert_eq!("ERROR".parse::<LogLevel>().unwrap(), LogLevel::Error);
        assert!("invalid".parse::<LogLevel>().is_err());
    }

    #[test]
    fn test_log_format_from_str() {
        assert_eq!("text".parse::<LogFormat>().unwrap(), LogFormat::Text);
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert!("yaml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_default_config() {
        let config = LogConfig::default();

        assert_eq!(config.level, LogLevel::Info);
        assert_eq!(config.format, LogFormat::Text);
        assert!(config.include_targets);
        assert!(config.include_timestamps);
    }

    #[test]
    fn test_invalid_filter_directive_is_rejected() {
        let config = LogConfig {
            filter_directives: Some("csvload=loudest".to_string()),
            ..LogConfig::default()
        };
        assert!(matches!(build_filter(&config), Err(CommonError::Config(_))));
    }

    #[test]
    #[serial]
    fn test_from_env() {
        std::env::set_var("LOG_LEVEL", "warn");
        std::env::set_var("LOG_FORMAT", "json");
        std::env::set_var("LOG_INCLUDE_TIMESTAMPS", "false");

        let config = LogConfig::from_env().unwrap();

        std::env::remove_var("LOG_LEVEL");
        std::env::remove_var("LOG_FORMAT");
        std::env::remove_var("LOG_INCLUDE_TIMESTAMPS");

        assert_eq!(config.level, LogLevel::Warn);
        assert_eq!(config.format, LogFormat::Json);
        assert!(!config.include_timestamps);
    }

    #[test]
    #[serial]
    fn test_from_env_rejects_unknown_level() {
        std::env::set_var("LOG_LEVEL", "loud");
        let result = LogConfig::from_env();
        std::env::remove_var("LOG_LEVEL");

        assert!(result.is_err());
    }
}

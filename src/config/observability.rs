use serde::{Deserialize, Serialize};

/// Observability configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ObservabilityConfig {
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

// ─────────────────────────────────────────────────────────────────────────────
// Logging
// ─────────────────────────────────────────────────────────────────────────────

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level.
    #[serde(default = "default_log_level")]
    pub level: LogLevel,

    /// Log format.
    #[serde(default)]
    pub format: LogFormat,

    /// Include timestamps.
    #[serde(default = "default_true")]
    pub timestamps: bool,

    /// Include file/line information.
    #[serde(default)]
    pub file_line: bool,

    /// Filter directives (e.g., "tower_http=debug,sqlx=warn").
    #[serde(default)]
    pub filter: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
            timestamps: true,
            file_line: false,
            filter: None,
        }
    }
}

fn default_log_level() -> LogLevel {
    LogLevel::Info
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// The level as an `EnvFilter` directive.
    pub fn as_directive(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable multi-line format.
    Pretty,
    /// Compact single-line format.
    #[default]
    Compact,
    /// JSON format (for log aggregation).
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_defaults() {
        let config: ObservabilityConfig = toml::from_str("").unwrap();
        assert_eq!(config.logging.level, LogLevel::Info);
        assert_eq!(config.logging.format, LogFormat::Compact);
        assert!(config.logging.timestamps);
        assert!(config.logging.filter.is_none());
    }

    #[test]
    fn test_parse_logging() {
        let config: ObservabilityConfig = toml::from_str(
            r#"
            [logging]
            level = "debug"
            format = "json"
            filter = "pathgate::audit=info"
        "#,
        )
        .unwrap();
        assert_eq!(config.logging.level.as_directive(), "debug");
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.logging.filter.as_deref(), Some("pathgate::audit=info"));
    }

    #[test]
    fn test_unknown_format_rejected() {
        let result: Result<ObservabilityConfig, _> = toml::from_str(
            r#"
            [logging]
            format = "cef"
        "#,
        );
        assert!(result.is_err());
    }
}

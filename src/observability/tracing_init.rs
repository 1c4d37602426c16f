//! Tracing initialization with configurable logging formats.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{LogFormat, LoggingConfig, ObservabilityConfig};

/// Initialize the tracing subscriber with the given configuration.
///
/// This sets up:
/// - Console logging with configurable format (pretty, compact, JSON)
/// - Environment-based log filtering (`RUST_LOG` wins over the config)
pub fn init_tracing(config: &ObservabilityConfig) -> Result<TracingGuard, TracingError> {
    let logging = &config.logging;
    let filter = build_env_filter(logging);
    let registry = tracing_subscriber::registry().with(filter);

    let result = match (&logging.format, logging.timestamps) {
        (LogFormat::Pretty, true) => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .pretty()
                    .with_target(true)
                    .with_file(logging.file_line)
                    .with_line_number(logging.file_line),
            )
            .try_init(),
        (LogFormat::Pretty, false) => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .pretty()
                    .with_target(true)
                    .with_file(logging.file_line)
                    .with_line_number(logging.file_line)
                    .without_time(),
            )
            .try_init(),
        (LogFormat::Compact, true) => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_target(true)
                    .with_file(logging.file_line)
                    .with_line_number(logging.file_line),
            )
            .try_init(),
        (LogFormat::Compact, false) => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_target(true)
                    .with_file(logging.file_line)
                    .with_line_number(logging.file_line)
                    .without_time(),
            )
            .try_init(),
        (LogFormat::Json, true) => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_current_span(true)
                    .with_file(logging.file_line)
                    .with_line_number(logging.file_line),
            )
            .try_init(),
        (LogFormat::Json, false) => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_current_span(true)
                    .with_file(logging.file_line)
                    .with_line_number(logging.file_line)
                    .without_time(),
            )
            .try_init(),
    };

    result.map_err(|e| TracingError::Init(e.to_string()))?;
    Ok(TracingGuard { _private: () })
}

/// Build the environment filter from logging config.
fn build_env_filter(config: &LoggingConfig) -> EnvFilter {
    if let Ok(env_filter) = std::env::var("RUST_LOG") {
        return EnvFilter::try_new(env_filter)
            .unwrap_or_else(|_| EnvFilter::new(config.level.as_directive()));
    }
    EnvFilter::new(filter_directives(config))
}

/// Directives derived from config alone, ignoring `RUST_LOG`.
fn filter_directives(config: &LoggingConfig) -> String {
    let base = config.level.as_directive();
    match &config.filter {
        Some(filter) if EnvFilter::try_new(format!("{base},{filter}")).is_ok() => {
            format!("{base},{filter}")
        }
        Some(filter) => {
            eprintln!("Ignoring invalid log filter '{filter}'");
            base.to_string()
        }
        // Default filter that quiets noisy crates
        None => format!("{base},hyper=warn,h2=warn,tower=info,sqlx=warn"),
    }
}

/// Held for the lifetime of the process once logging is initialized.
pub struct TracingGuard {
    _private: (),
}

/// Tracing initialization errors.
#[derive(Debug, thiserror::Error)]
pub enum TracingError {
    #[error("Failed to initialize tracing: {0}")]
    Init(String),
}

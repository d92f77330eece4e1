//! Tracing initialization with configurable logging formats.

use tracing_subscriber::{
    EnvFilter, Layer, Registry, layer::SubscriberExt, util::SubscriberInitExt,
};

use crate::config::{LogFormat, LogLevel, LoggingConfig, ObservabilityConfig};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Initialize the global tracing subscriber.
///
/// Sets up console logging in the configured format with environment-based
/// filtering. `RUST_LOG`, when set, replaces the configured level and filter.
pub fn init_tracing(config: &ObservabilityConfig) -> Result<(), TracingError> {
    let logging = &config.logging;
    let filter = build_env_filter(logging);

    tracing_subscriber::registry()
        .with(build_fmt_layer(logging))
        .with(filter)
        .try_init()
        .map_err(|e| TracingError::Init(e.to_string()))
}

fn build_fmt_layer(logging: &LoggingConfig) -> BoxedLayer {
    let base = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_file(logging.file_line)
        .with_line_number(logging.file_line);

    match (logging.format, logging.timestamps) {
        (LogFormat::Pretty, true) => base.pretty().boxed(),
        (LogFormat::Pretty, false) => base.pretty().without_time().boxed(),
        (LogFormat::Compact, true) => base.compact().boxed(),
        (LogFormat::Compact, false) => base.compact().without_time().boxed(),
        (LogFormat::Json, true) => base
            .json()
            .with_current_span(logging.include_spans)
            .with_span_list(logging.include_spans)
            .boxed(),
        (LogFormat::Json, false) => base
            .json()
            .with_current_span(logging.include_spans)
            .with_span_list(logging.include_spans)
            .without_time()
            .boxed(),
    }
}

fn level_directive(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Trace => "trace",
        LogLevel::Debug => "debug",
        LogLevel::Info => "info",
        LogLevel::Warn => "warn",
        LogLevel::Error => "error",
    }
}

/// Build the environment filter from logging config.
fn build_env_filter(config: &LoggingConfig) -> EnvFilter {
    let base_level = level_directive(config.level);

    if let Ok(env_filter) = std::env::var("RUST_LOG") {
        EnvFilter::try_new(env_filter).unwrap_or_else(|_| EnvFilter::new(base_level))
    } else if let Some(filter) = &config.filter {
        let combined = format!("{},{}", base_level, filter);
        EnvFilter::try_new(combined).unwrap_or_else(|_| EnvFilter::new(base_level))
    } else {
        // Quiet the noisy dependencies by default
        EnvFilter::new(format!(
            "{},hyper=warn,h2=warn,tower=info,sqlx=warn",
            base_level
        ))
    }
}

/// Tracing initialization errors.
#[derive(Debug, thiserror::Error)]
pub enum TracingError {
    #[error("Failed to initialize tracing: {0}")]
    Init(String),
}

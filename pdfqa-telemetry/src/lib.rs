//! Tracing setup for pdfqa binaries.
//!
//! Installs a global `tracing-subscriber` registry with an [`EnvFilter`] read
//! from `RUST_LOG` (falling back to [`DEFAULT_FILTER`]) and a text or JSON
//! formatter on stderr. [`init_with_storage`] additionally installs a
//! [`StageTraceLayer`] so a front end can show per-stage timings of a question.

pub mod memory;

use std::sync::Arc;

use thiserror::Error;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

pub use memory::{SharedTraceStorage, SpanData, StageTraceLayer};

/// Filter used when `RUST_LOG` is unset or invalid.
pub const DEFAULT_FILTER: &str = "warn,pdfqa_rag=info,pdfqa_cli=info";

/// Errors from installing the global subscriber.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// A global subscriber was already installed.
    #[error("failed to install tracing subscriber: {0}")]
    Init(String),
}

/// Output format of the stderr log layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

fn install(format: LogFormat, storage: Option<Arc<SharedTraceStorage>>) -> Result<(), TelemetryError> {
    // The filter applies to log output only; stage timings are always recorded.
    let text = (format == LogFormat::Text)
        .then(|| fmt::layer().with_writer(std::io::stderr).with_filter(env_filter()));
    let json = (format == LogFormat::Json).then(|| {
        fmt::layer()
            .json()
            .with_current_span(true)
            .with_writer(std::io::stderr)
            .with_filter(env_filter())
    });
    let stages = storage.map(StageTraceLayer::new);

    tracing_subscriber::registry()
        .with(text)
        .with(json)
        .with(stages)
        .try_init()
        .map_err(|e| TelemetryError::Init(e.to_string()))
}

/// Install text logging on stderr.
///
/// # Errors
///
/// Returns [`TelemetryError::Init`] if a global subscriber is already set.
pub fn init_telemetry() -> Result<(), TelemetryError> {
    install(LogFormat::Text, None)
}

/// Install JSON logging on stderr.
///
/// # Errors
///
/// Returns [`TelemetryError::Init`] if a global subscriber is already set.
pub fn init_json_telemetry() -> Result<(), TelemetryError> {
    install(LogFormat::Json, None)
}

/// Install logging in `format` plus a [`StageTraceLayer`] writing into `storage`.
///
/// # Errors
///
/// Returns [`TelemetryError::Init`] if a global subscriber is already set.
pub fn init_with_storage(
    format: LogFormat,
    storage: Arc<SharedTraceStorage>,
) -> Result<(), TelemetryError> {
    install(format, Some(storage))
}

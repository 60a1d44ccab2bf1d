//! Observability infrastructure for chronicle.
//!
//! Structured logging with consistent spans. This module provides
//! initialization helpers and span constructors for consistent
//! observability across all chronicle components.

use std::sync::Once;
use tracing::Span;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

static INIT: Once = Once::new();

/// Log output format.
#[derive(Debug, Clone, Copy, Default)]
pub enum LogFormat {
    /// JSON structured logs (for production).
    Json,
    /// Pretty-printed logs (for development).
    #[default]
    Pretty,
}

/// Initializes the logging subsystem.
///
/// Call once at application startup. Safe to call multiple times;
/// subsequent calls are no-ops.
///
/// # Environment Variables
///
/// - `RUST_LOG`: Controls log levels (e.g., `info`, `chronicle_archive=debug`)
///
/// # Example
///
/// ```rust
/// use chronicle_core::observability::{init_logging, LogFormat};
///
/// init_logging(LogFormat::Pretty);
/// ```
pub fn init_logging(format: LogFormat) {
    INIT.call_once(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        match format {
            LogFormat::Json => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt::layer().json())
                    .init();
            }
            LogFormat::Pretty => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt::layer().pretty())
                    .init();
            }
        }
    });
}

/// Creates a span for archive operations with standard fields.
///
/// # Example
///
/// ```rust
/// use chronicle_core::observability::archive_span;
///
/// let span = archive_span("archive", "thingy-42");
/// let _guard = span.enter();
/// // ... do archive operation
/// ```
#[must_use]
pub fn archive_span(operation: &str, aggregate_id: &str) -> Span {
    tracing::info_span!(
        "archive",
        op = operation,
        aggregate_id = aggregate_id,
    )
}

//! Tracing and logging configuration for the application
//!
//! Development gets pretty, human-readable output; production gets JSON
//! lines for log aggregation. When a log directory is configured, the same
//! events are also written to a daily rolling file.

use tracing_appender::{non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Environment;

const LOG_FILE_PREFIX: &str = "storyquest.log";

/// Initialize tracing/logging based on the environment
///
/// `RUST_LOG` overrides the default filter (e.g. `RUST_LOG=debug,tower_http=trace`).
///
/// The returned guard flushes the file writer on drop and must be held for
/// the lifetime of the process.
pub fn init_tracing(env: &Environment, log_dir: Option<&str>) -> Option<WorkerGuard> {
    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let (writer, guard) =
                tracing_appender::non_blocking(rolling::daily(dir, LOG_FILE_PREFIX));
            let layer = tracing_subscriber::fmt::layer()
                .json()
                .with_writer(writer)
                .with_filter(default_filter(env));
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    if env.is_development() {
        tracing_subscriber::registry()
            .with(file_layer)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_line_number(true)
                    .with_file(true)
                    .pretty()
                    .with_filter(default_filter(env)),
            )
            .init();
        tracing::info!("Tracing initialized in development mode");
    } else {
        tracing_subscriber::registry()
            .with(file_layer)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true)
                    .flatten_event(true)
                    .with_target(true)
                    .with_filter(default_filter(env)),
            )
            .init();
        tracing::info!("Tracing initialized in production mode");
    }

    guard
}

fn default_filter(env: &Environment) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if env.is_development() {
            EnvFilter::new("debug,tower_http=debug,sqlx=warn")
        } else {
            EnvFilter::new("info,tower_http=info,sqlx=warn")
        }
    })
}

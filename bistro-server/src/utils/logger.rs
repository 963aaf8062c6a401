//! Logging Infrastructure
//!
//! Structured logging setup with support for both development and production environments.
//!
//! `RUST_LOG` takes precedence over the configured level when set.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Initialize the logger (stdout only, `info`)
pub fn init_logger() -> Option<WorkerGuard> {
    init_logger_with_file(None, None, None)
}

/// Initialize the logger with optional JSON format and daily rolling file output
///
/// The returned guard flushes the file writer on drop; keep it alive for the
/// lifetime of the process.
pub fn init_logger_with_file(
    log_level: Option<&str>,
    json: Option<bool>,
    log_dir: Option<&str>,
) -> Option<WorkerGuard> {
    let level = log_level.unwrap_or("info");
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let stdout_layer: BoxedLayer = if json.unwrap_or(false) {
        fmt::layer().json().with_target(true).boxed()
    } else {
        fmt::layer()
            .with_file(false)
            .with_line_number(false)
            .with_thread_ids(false)
            .with_target(false)
            .boxed()
    };
    let mut layers = vec![stdout_layer];

    // Add file output if log_dir is provided
    let mut guard = None;
    if let Some(dir) = log_dir {
        let log_path = Path::new(dir);
        if std::fs::create_dir_all(log_path).is_ok() {
            let file_appender = tracing_appender::rolling::daily(log_path, "bistro-server");
            let (writer, file_guard) = tracing_appender::non_blocking(file_appender);
            layers.push(
                fmt::layer()
                    .with_ansi(false)
                    .with_target(true)
                    .with_writer(writer)
                    .boxed(),
            );
            guard = Some(file_guard);
        }
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(env_filter)
        .init();

    guard
}

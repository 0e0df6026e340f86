//! Tracing initialization and subscriber setup.
//!
//! Sets up the `tracing` subscriber pipeline for the crate: an `EnvFilter`
//! resolved from the environment or configuration, and an fmt layer writing
//! either to stderr or to a log file under the data directory.

use std::path::Path;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::Config;

/// Initializes the tracing subscriber.
///
/// # Trace Level Resolution
///
/// 1. `RUST_LOG` environment variable (highest priority)
/// 2. `config.trace_level` if set
/// 3. Default: `"info"`
///
/// # Output
///
/// Events go to stderr by default. If `config.log_file` is set, they are
/// appended to that file instead; a file that cannot be opened falls back to
/// stderr with a warning.
///
/// # Initialization Behavior
///
/// Idempotent: safe to call multiple times, only the first call takes effect.
/// Observability is optional — nothing here can fail the session.
pub fn init_tracing(config: &Config) {
    let level = config
        .trace_level
        .clone()
        .unwrap_or_else(|| "info".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let registry = tracing_subscriber::registry().with(filter);

    match config.log_file.as_deref().map(open_log_file) {
        Some(Ok(file)) => {
            let writer = Arc::new(file);
            let _ = registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(writer)
                        .with_ansi(false),
                )
                .try_init();
        }
        Some(Err(e)) => {
            let _ = registry
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .try_init();
            tracing::warn!(error = %e, "failed to open log file, logging to stderr");
        }
        None => {
            let _ = registry
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .try_init();
        }
    }
}

fn open_log_file(path: &Path) -> std::io::Result<std::fs::File> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::OpenOptions::new().create(true).append(true).open(path)
}

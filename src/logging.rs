//! Logging configuration for pg-ai-query.
//!
//! Subscriber initialization for the binary, plus [`Logger`], the handle the
//! generation pipeline logs through. The pipeline never consults global
//! state to decide whether to log; the flag travels with the `Logger`.

use std::fs::{self, File};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Gate for pipeline log messages.
///
/// Messages are forwarded to `tracing` only when `enabled` is set. Logging is
/// purely observational and never influences control flow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Logger {
    enabled: bool,
}

impl Logger {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// A logger that drops every message.
    pub fn disabled() -> Self {
        Self::new(false)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn debug(&self, message: impl AsRef<str>) {
        if self.enabled {
            tracing::debug!(target: "pg_ai_query", "{}", message.as_ref());
        }
    }

    pub fn info(&self, message: impl AsRef<str>) {
        if self.enabled {
            tracing::info!(target: "pg_ai_query", "{}", message.as_ref());
        }
    }

    pub fn warning(&self, message: impl AsRef<str>) {
        if self.enabled {
            tracing::warn!(target: "pg_ai_query", "{}", message.as_ref());
        }
    }

    pub fn error(&self, message: impl AsRef<str>) {
        if self.enabled {
            tracing::error!(target: "pg_ai_query", "{}", message.as_ref());
        }
    }
}

fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Initializes logging to stderr.
///
/// `RUST_LOG` takes precedence over `default_level`.
pub fn init_stderr_logging(default_level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(default_level))
        .with_writer(std::io::stderr)
        .init();
}

/// Initializes logging to the log file returned by [`get_log_path`].
///
/// Falls back to stderr logging if the file cannot be created.
pub fn init_file_logging(default_level: &str) {
    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            eprintln!("Warning: Could not create log directory: {e}");
            init_stderr_logging(default_level);
            return;
        }
    }

    // Truncate on each run to avoid unbounded growth
    let log_file = match File::create(&log_path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Warning: Could not create log file: {e}");
            init_stderr_logging(default_level);
            return;
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter(default_level))
        .with_writer(log_file)
        .with_ansi(false)
        .init();
}

/// Returns the path for the log file.
///
/// Uses the XDG state directory on Linux (`~/.local/state/pg-ai-query/pg-ai-query.log`),
/// or falls back to the config directory on other platforms.
pub fn get_log_path() -> PathBuf {
    if let Some(state_dir) = dirs::state_dir() {
        return state_dir.join("pg-ai-query").join("pg-ai-query.log");
    }

    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("pg-ai-query").join("pg-ai-query.log");
    }

    std::env::temp_dir().join("pg-ai-query.log")
}

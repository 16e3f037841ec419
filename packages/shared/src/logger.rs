//! Logging setup utilities for the Agora binaries.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber with the specified default log level.
///
/// Sets up logging for the server library crate and the binary that calls it.
/// The log level can be overridden using the `RUST_LOG` environment variable.
///
/// # Arguments
///
/// * `binary_name` - The name of the binary (e.g., "agora-server")
/// * `default_log_level` - The default log level (e.g., "debug", "info", "warn", "error")
///
/// # Examples
///
/// ```no_run
/// use agora_shared::logger::setup_logger;
///
/// setup_logger("agora-server", "info");
/// ```
pub fn setup_logger(binary_name: &str, default_log_level: &str) {
    tracing_subscriber::registry()
        .with(env_filter(binary_name, default_log_level))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Same as [`setup_logger`], but writes to stderr.
///
/// For binaries whose stdout carries data (e.g. a protocol stream piped
/// into another process).
pub fn setup_stderr_logger(binary_name: &str, default_log_level: &str) {
    tracing_subscriber::registry()
        .with(env_filter(binary_name, default_log_level))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn env_filter(binary_name: &str, default_log_level: &str) -> tracing_subscriber::EnvFilter {
    tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "agora_server={},agora_shared={},{}={},tower_http={}",
            default_log_level,
            default_log_level,
            binary_name.replace('-', "_"),
            default_log_level,
            default_log_level
        )
        .into()
    })
}

//! `tracing` subscriber setup for the command-line tool.

use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Installs a stderr subscriber.
///
/// `RUST_LOG` takes precedence; otherwise events of this crate at `level`
/// and above are shown.
///
/// # Errors
///
/// Returns a `TryInitError` if a global subscriber is already installed.
pub fn init_logging(level: &str) -> Result<(), TryInitError> {
    let default_filter = format!("pv_sweep={level}");
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&default_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init()
}

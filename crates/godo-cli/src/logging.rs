//! Tracing subscriber setup.

use godo_core::storage::LoggingConfig;
use tracing_subscriber::{fmt, EnvFilter};

/// Install the global subscriber. Logs go to stderr so stdout stays
/// parseable. `GODO_LOG`, then `RUST_LOG`, override the configured level.
pub fn init_logging(config: &LoggingConfig) {
    let env_filter = EnvFilter::try_from_env("GODO_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(&config.level));

    if config.json {
        let subscriber = fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .json()
            .finish();
        tracing::subscriber::set_global_default(subscriber).ok();
    } else {
        let subscriber = fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .finish();
        tracing::subscriber::set_global_default(subscriber).ok();
    }
}

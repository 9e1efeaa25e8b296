//! Logging setup for hosts embedding Cadence

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str = "info,cadence_platform=info,cadence_animation=info,cadence_app=info";

/// Install a global `fmt` subscriber filtered by `RUST_LOG`
///
/// Safe to call more than once; later calls leave the first subscriber in
/// place and return false.
pub fn init_logging() -> bool {
    init_logging_with(DEFAULT_FILTER)
}

/// Like [`init_logging`], with an explicit fallback filter
pub fn init_logging_with(fallback: &str) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true));
    tracing::subscriber::set_global_default(subscriber).is_ok()
}

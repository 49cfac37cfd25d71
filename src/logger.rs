use tracing_subscriber::{EnvFilter, fmt};

/// Initializes the global tracing subscriber.
///
/// This should be called once at the very beginning of the process, before
/// any storage or service call, so that `#[tracing::instrument]` spans on
/// the hot path are captured from the first request.
///
/// Log level is controlled by the `RUST_LOG` environment variable, e.g.
/// `RUST_LOG=slot_reservation_core=debug,sqlx=warn`. If unset, defaults to
/// `info`.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .unwrap_or_else(|e| eprintln!("failed to install tracing subscriber: {e}"));

    tracing::info!("logger initialized");
}

//! Thin process entry point: loads configuration, connects the pool, runs
//! migrations, and keeps the background expiry sweep (spec §4.2) running.
//!
//! This is not an RPC server — the reservation operations themselves are
//! called in-process via [`slot_reservation_core::SlotReservationService`]
//! by whatever outer layer embeds this crate. `sweepd` exists so the
//! advisory background sweep (spec §4.2: "tens of seconds" cadence) has
//! somewhere to run even when nothing else in the process would otherwise
//! drive it.

use std::sync::Arc;

use slot_reservation_core::clock::{self, SystemClock};
use slot_reservation_core::config::ReservationConfig;
use slot_reservation_core::{logger, storage};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logger::init();

    let config = ReservationConfig::from_env()?;
    tracing::info!(
        sweep_interval_secs = config.sweep_interval.as_secs(),
        "starting slot reservation sweep daemon"
    );

    let pool = storage::connect(&config).await?;
    storage::run_migrations(&pool).await?;

    let clock: Arc<dyn clock::Clock> = Arc::new(SystemClock);
    let sweep = clock::spawn_background_sweep(pool, clock, config.sweep_interval);

    sweep.await?;
    Ok(())
}

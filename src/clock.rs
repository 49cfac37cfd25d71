//! The Clock & Expiry Service (C2, spec §4.2).
//!
//! Supplies a single server-side "now" to every component — spec §5's "no
//! client-side authority" principle requires exactly this: any countdown a
//! caller displays is a hint, never an authority. A `Clock` trait rather
//! than a bare `Utc::now()` call lets tests simulate expiry without
//! sleeping, the same role `ProgramTime` plays in the course-project
//! reservation systems this crate's domain is adjacent to.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Utc};

use crate::storage::{self, Pool};

/// A source of the current time.
pub trait Clock: Send + Sync {
    /// Returns the current time.
    fn now(&self) -> DateTime<Utc>;
}

/// The production clock: wall time via `chrono::Utc::now()`.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Runs [`storage::holds::release_expired`] with no slot scope on a loose
/// cadence (spec §4.2: "tens of seconds"). Advisory only — every query in
/// this crate filters `active AND expires_at > now()` directly, so a
/// missed or delayed sweep cycle never causes an invariant violation.
pub fn spawn_background_sweep(
    pool: Pool,
    clock: Arc<dyn Clock>,
    interval: StdDuration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            let now = clock.now();
            match storage::holds::release_expired(&pool, now, None).await {
                Ok(count) if count > 0 => {
                    tracing::debug!(released = count, "background sweep reaped expired holds");
                }
                Ok(_) => {}
                Err(e) => tracing::warn!(error = %e, "background sweep failed"),
            }
        }
    })
}

/// A fixed clock test helpers can advance without sleeping, gated behind
/// the `test-support` feature (on by default, following the corpus's
/// `default = ["test-utils"]` convention) so both unit tests in this crate
/// and the integration tests under `tests/` can simulate expiry (spec §8's
/// "duration = 1 minute ... then waited out" boundary behaviour) without a
/// real 60-second sleep.
#[cfg(feature = "test-support")]
pub mod test_support {
    use std::sync::Mutex;

    use super::Clock;
    use chrono::{DateTime, Utc};

    /// A clock whose value is set by the test and advanced explicitly,
    /// rather than tied to wall time — needed to exercise hold expiry
    /// deterministically in under a second.
    pub struct FixedClock(Mutex<DateTime<Utc>>);

    impl FixedClock {
        pub fn new(start: DateTime<Utc>) -> Self {
            Self(Mutex::new(start))
        }

        pub fn advance(&self, delta: chrono::Duration) {
            let mut guard = self.0.lock().expect("clock mutex poisoned");
            *guard += delta;
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            *self.0.lock().expect("clock mutex poisoned")
        }
    }
}

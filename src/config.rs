//! Environment contract (spec §6): the core needs a database connection
//! string and a default hold duration; it reads nothing else.

use std::env;
use std::time::Duration;

use crate::error::SrcError;

/// Bounds on `create_hold`'s caller-supplied `duration_min` (spec §4.4.1).
pub const MIN_HOLD_DURATION_MINUTES: i64 = 1;
pub const MAX_HOLD_DURATION_MINUTES: i64 = 60;

/// Runtime configuration, loaded once at process startup.
#[derive(Clone, Debug)]
pub struct ReservationConfig {
    /// Postgres connection string.
    pub database_url: String,
    /// Default `create_hold` duration when the caller omits one.
    pub default_hold_duration_minutes: i64,
    /// Cadence of the background expiry sweep (spec §4.2).
    pub sweep_interval: Duration,
    /// Connection pool size.
    pub database_max_connections: u32,
}

impl ReservationConfig {
    /// Loads configuration from the process environment, failing fast if
    /// `DATABASE_URL` is missing rather than surfacing it lazily on the
    /// first query.
    ///
    /// # Errors
    ///
    /// Returns [`SrcError::Internal`] if `DATABASE_URL` is unset, or if a
    /// numeric override is present but unparsable.
    pub fn from_env() -> Result<Self, SrcError> {
        let _ = dotenvy::dotenv();

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| SrcError::Internal("DATABASE_URL is not set".into()))?;

        let default_hold_duration_minutes = parse_env_or("DEFAULT_HOLD_DURATION_MINUTES", 10)?;
        let sweep_interval_seconds: u64 = parse_env_or("SWEEP_INTERVAL_SECONDS", 30)?;
        let database_max_connections = parse_env_or("DATABASE_MAX_CONNECTIONS", 10)?;

        Ok(Self {
            database_url,
            default_hold_duration_minutes,
            sweep_interval: Duration::from_secs(sweep_interval_seconds),
            database_max_connections,
        })
    }
}

fn parse_env_or<T>(key: &str, default: T) -> Result<T, SrcError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| SrcError::Internal(format!("{key} is set but not a valid number: {e}"))),
        Err(_) => Ok(default),
    }
}

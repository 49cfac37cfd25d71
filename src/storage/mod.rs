//! The Storage Engine (C1, spec §4.1).
//!
//! Durable, transactional state for events, slots, holds, bookings, and the
//! attempt log. Serialisable critical sections are implemented as
//! `SELECT ... FOR UPDATE` on the slot row inside a `sqlx::Transaction`,
//! rather than relying on the database's `SERIALIZABLE` isolation level —
//! this is the pattern the corpus's sqlx-backed booking services use (see
//! `DESIGN.md`), and it composes predictably with connection pooling.

pub mod attempt_log;
pub mod bookings;
pub mod events;
pub mod holds;
pub mod slots;

use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use crate::config::ReservationConfig;

/// Connection pool type alias used throughout the crate.
pub type Pool = sqlx::PgPool;

/// Errors surfaced by the storage layer (spec §4.1): `NotFound`,
/// `Conflict` (a uniqueness violation), `Transient` (to be retried by the
/// caller once), and `PermissionDenied`.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("row not found")]
    NotFound,
    #[error("uniqueness conflict: {0}")]
    Conflict(String),
    #[error("transient storage failure: {0}")]
    Transient(String),
    #[error("permission denied")]
    PermissionDenied,
    #[error(transparent)]
    Sqlx(sqlx::Error),
}

/// Classifies a raw `sqlx::Error` into the taxonomy above by inspecting the
/// underlying Postgres SQLSTATE where one is present.
pub fn classify(err: sqlx::Error) -> StorageError {
    match &err {
        sqlx::Error::RowNotFound => StorageError::NotFound,
        sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) => {
            StorageError::Transient(err.to_string())
        }
        sqlx::Error::Database(db_err) => match db_err.code().as_deref() {
            Some("23505") => StorageError::Conflict(db_err.to_string()),
            Some("40001" | "40P01") => StorageError::Transient(db_err.to_string()),
            _ => StorageError::Sqlx(err),
        },
        _ => StorageError::Sqlx(err),
    }
}

/// Builds the connection pool from configuration (spec §6's environment
/// contract).
///
/// # Errors
///
/// Returns [`StorageError::Transient`] if the pool cannot be established.
pub async fn connect(config: &ReservationConfig) -> Result<Pool, StorageError> {
    PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await
        .map_err(classify)
}

/// Runs the crate's bundled migrations against `pool`.
///
/// # Errors
///
/// Returns [`StorageError::Transient`] if a migration fails to apply.
pub async fn run_migrations(pool: &Pool) -> Result<(), StorageError> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| StorageError::Transient(e.to_string()))
}

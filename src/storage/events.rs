//! Row-level access to the `events` table.
//!
//! Creation is a thin passthrough used by the out-of-scope admin
//! slot-generation tooling (spec §1) and by this crate's own test seeding;
//! no business rule in this core depends on how an event comes to exist.

use chrono::{DateTime, Utc};
use sqlx::PgExecutor;

use super::{StorageError, classify};
use crate::domain::event::{Event, EventStatus, EventVisibility};
use crate::domain::ids::EventId;

/// Loads an event by id.
///
/// # Errors
///
/// Returns [`StorageError::NotFound`] if absent, or a classified storage
/// error on query failure.
pub async fn find<'e, E>(executor: E, event_id: EventId) -> Result<Event, StorageError>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, Event>(
        "SELECT event_id, status, visibility, created_at FROM events WHERE event_id = $1",
    )
    .bind(event_id)
    .fetch_optional(executor)
    .await
    .map_err(classify)?
    .ok_or(StorageError::NotFound)
}

/// Inserts a new event row.
///
/// # Errors
///
/// Returns a classified storage error on query failure.
pub async fn insert<'e, E>(
    executor: E,
    event_id: EventId,
    status: EventStatus,
    visibility: EventVisibility,
    created_at: DateTime<Utc>,
) -> Result<Event, StorageError>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, Event>(
        "INSERT INTO events (event_id, status, visibility, created_at)
         VALUES ($1, $2, $3, $4)
         RETURNING event_id, status, visibility, created_at",
    )
    .bind(event_id)
    .bind(status)
    .bind(visibility)
    .bind(created_at)
    .fetch_one(executor)
    .await
    .map_err(classify)
}

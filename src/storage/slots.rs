//! Row-level access to the `time_slots` table.

use chrono::{DateTime, Utc};
use sqlx::{PgExecutor, Postgres, Transaction};

use super::{StorageError, classify};
use crate::domain::ids::{EventId, SlotId};
use crate::domain::slot::{SlotStatus, TimeSlot};

const SLOT_COLUMNS: &str = "slot_id, event_id, start_time, end_time, total_capacity, \
     booked_count, status, price_cents";

/// Inserts a new time slot row. Used by the out-of-scope admin
/// slot-generation tooling (spec §1) and by this crate's own test seeding.
///
/// # Errors
///
/// Returns a classified storage error on query failure.
#[allow(clippy::too_many_arguments)]
pub async fn insert<'e, E>(
    executor: E,
    slot_id: SlotId,
    event_id: EventId,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    total_capacity: i32,
    price_cents: i64,
    status: SlotStatus,
) -> Result<TimeSlot, StorageError>
where
    E: PgExecutor<'e>,
{
    let query = format!(
        "INSERT INTO time_slots (slot_id, event_id, start_time, end_time, total_capacity, \
         booked_count, status, price_cents)
         VALUES ($1, $2, $3, $4, $5, 0, $6, $7)
         RETURNING {SLOT_COLUMNS}"
    );
    sqlx::query_as::<_, TimeSlot>(&query)
        .bind(slot_id)
        .bind(event_id)
        .bind(start_time)
        .bind(end_time)
        .bind(total_capacity)
        .bind(status)
        .bind(price_cents)
        .fetch_one(executor)
        .await
        .map_err(classify)
}

/// Loads a slot with a row lock, for use inside the caller's transaction
/// (spec §4.1's serialisable critical section; spec §4.4.1 step 2, §4.5
/// step 2).
///
/// # Errors
///
/// Returns [`StorageError::NotFound`] if absent.
pub async fn find_for_update(
    tx: &mut Transaction<'_, Postgres>,
    slot_id: SlotId,
) -> Result<TimeSlot, StorageError> {
    let query = format!("SELECT {SLOT_COLUMNS} FROM time_slots WHERE slot_id = $1 FOR UPDATE");
    sqlx::query_as::<_, TimeSlot>(&query)
        .bind(slot_id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(classify)?
        .ok_or(StorageError::NotFound)
}

/// Loads a slot without a row lock, for read-only call sites that are not
/// part of a larger transaction (e.g. attribution for the attempt log on a
/// failed `confirm_booking`).
///
/// # Errors
///
/// Returns [`StorageError::NotFound`] if absent.
pub async fn find_readonly<'e, E>(executor: E, slot_id: SlotId) -> Result<TimeSlot, StorageError>
where
    E: PgExecutor<'e>,
{
    let query = format!("SELECT {SLOT_COLUMNS} FROM time_slots WHERE slot_id = $1");
    sqlx::query_as::<_, TimeSlot>(&query)
        .bind(slot_id)
        .fetch_optional(executor)
        .await
        .map_err(classify)?
        .ok_or(StorageError::NotFound)
}

/// Lists slots of `event_id` that satisfy the availability predicate from
/// spec §4.3: `status = 'available' ∧ start_time > now ∧ available_count > 0`,
/// ordered by `start_time` ascending.
///
/// # Errors
///
/// Returns a classified storage error on query failure.
pub async fn list_available_for_event<'e, E>(
    executor: E,
    event_id: EventId,
    now: DateTime<Utc>,
) -> Result<Vec<TimeSlot>, StorageError>
where
    E: PgExecutor<'e>,
{
    let query = format!(
        "SELECT {SLOT_COLUMNS} FROM time_slots
         WHERE event_id = $1 AND status = 'available' AND start_time > $2
           AND booked_count < total_capacity
         ORDER BY start_time ASC"
    );
    sqlx::query_as::<_, TimeSlot>(&query)
        .bind(event_id)
        .bind(now)
        .fetch_all(executor)
        .await
        .map_err(classify)
}

/// Applies a confirmed booking's effect on the slot row (spec §4.5 step 6):
/// increments `booked_count` and flips `status` to `full` when the new
/// `available_count` reaches zero. Must run inside the same transaction
/// that locked the row via [`find_for_update`].
///
/// # Errors
///
/// Returns a classified storage error on query failure.
pub async fn apply_booking(
    tx: &mut Transaction<'_, Postgres>,
    slot_id: SlotId,
    quantity: i32,
) -> Result<(), StorageError> {
    sqlx::query(
        "UPDATE time_slots
         SET booked_count = booked_count + $2,
             status = CASE WHEN booked_count + $2 >= total_capacity THEN 'full'::slot_status ELSE status END
         WHERE slot_id = $1",
    )
    .bind(slot_id)
    .bind(quantity)
    .execute(&mut **tx)
    .await
    .map_err(classify)?;
    Ok(())
}

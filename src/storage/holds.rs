//! Row-level access to the `holds` table.

use chrono::{DateTime, Duration, Utc};
use sqlx::{Executor, PgExecutor, Postgres, Transaction};

use super::{StorageError, classify};
use crate::domain::hold::Hold;
use crate::domain::ids::{HoldId, SlotId, UserId};

const HOLD_COLUMNS: &str = "hold_id, slot_id, session_id, user_id, quantity, \
     created_at, expires_at, is_active, released_at";

/// Deactivates every hold where `is_active ∧ expires_at ≤ now` (spec §4.2).
/// Idempotent and safe under concurrent callers. When `slot_id` is given,
/// scopes the sweep to a single slot's holds (the opportunistic call from
/// `create_hold`/`confirm_booking`); otherwise sweeps every slot (the
/// background cadence).
///
/// # Errors
///
/// Returns a classified storage error on query failure.
pub async fn release_expired<'e, E>(
    executor: E,
    now: DateTime<Utc>,
    slot_id: Option<SlotId>,
) -> Result<u64, StorageError>
where
    E: Executor<'e, Database = Postgres>,
{
    let result = match slot_id {
        Some(slot_id) => {
            sqlx::query(
                "UPDATE holds SET is_active = false, released_at = $1
                 WHERE is_active = true AND expires_at <= $1 AND slot_id = $2",
            )
            .bind(now)
            .bind(slot_id)
            .execute(executor)
            .await
        }
        None => {
            sqlx::query(
                "UPDATE holds SET is_active = false, released_at = $1
                 WHERE is_active = true AND expires_at <= $1",
            )
            .bind(now)
            .execute(executor)
            .await
        }
    }
    .map_err(classify)?;

    Ok(result.rows_affected())
}

/// Sums the quantity of holds on `slot_id` that are active, unexpired, and
/// whose `session_id` differs from the caller's (spec §4.3's
/// `effective_available` formula, and spec §4.4.1 step 3's capacity guard).
///
/// # Errors
///
/// Returns a classified storage error on query failure.
pub async fn sum_active_excluding_session(
    tx: &mut Transaction<'_, Postgres>,
    slot_id: SlotId,
    now: DateTime<Utc>,
    exclude_session_id: &str,
) -> Result<i64, StorageError> {
    let (sum,): (Option<i64>,) = sqlx::query_as(
        "SELECT SUM(quantity)::bigint FROM holds
         WHERE slot_id = $1 AND is_active = true AND expires_at > $2 AND session_id <> $3",
    )
    .bind(slot_id)
    .bind(now)
    .bind(exclude_session_id)
    .fetch_one(&mut **tx)
    .await
    .map_err(classify)?;

    Ok(sum.unwrap_or(0))
}

/// Same as [`sum_active_excluding_session`] but run over a read-only
/// executor for `list_availability`/`can_book`, which do not need a row
/// lock on the slot.
///
/// # Errors
///
/// Returns a classified storage error on query failure.
pub async fn sum_active_excluding_session_readonly<'e, E>(
    executor: E,
    slot_id: SlotId,
    now: DateTime<Utc>,
    exclude_session_id: Option<&str>,
) -> Result<i64, StorageError>
where
    E: PgExecutor<'e>,
{
    let (sum,): (Option<i64>,) = sqlx::query_as(
        "SELECT SUM(quantity)::bigint FROM holds
         WHERE slot_id = $1 AND is_active = true AND expires_at > $2
           AND ($3::text IS NULL OR session_id <> $3)",
    )
    .bind(slot_id)
    .bind(now)
    .bind(exclude_session_id)
    .fetch_one(executor)
    .await
    .map_err(classify)?;

    Ok(sum.unwrap_or(0))
}

/// Sums the quantity of every active, unexpired hold on `slot_id` except
/// `exclude_hold_id` (spec §4.5 step 3's residual capacity guard, which
/// excludes the hold about to be consumed rather than the caller's
/// session).
///
/// # Errors
///
/// Returns a classified storage error on query failure.
pub async fn sum_active_excluding_hold(
    tx: &mut Transaction<'_, Postgres>,
    slot_id: SlotId,
    now: DateTime<Utc>,
    exclude_hold_id: HoldId,
) -> Result<i64, StorageError> {
    let (sum,): (Option<i64>,) = sqlx::query_as(
        "SELECT SUM(quantity)::bigint FROM holds
         WHERE slot_id = $1 AND is_active = true AND expires_at > $2 AND hold_id <> $3",
    )
    .bind(slot_id)
    .bind(now)
    .bind(exclude_hold_id)
    .fetch_one(&mut **tx)
    .await
    .map_err(classify)?;

    Ok(sum.unwrap_or(0))
}

/// Finds the caller's own active hold on `slot_id`, if any (spec §4.4.1
/// step 5's uniqueness rule).
///
/// # Errors
///
/// Returns a classified storage error on query failure.
pub async fn find_active_for_session(
    tx: &mut Transaction<'_, Postgres>,
    slot_id: SlotId,
    session_id: &str,
) -> Result<Option<Hold>, StorageError> {
    let query = format!(
        "SELECT {HOLD_COLUMNS} FROM holds
         WHERE slot_id = $1 AND session_id = $2 AND is_active = true"
    );
    sqlx::query_as::<_, Hold>(&query)
        .bind(slot_id)
        .bind(session_id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(classify)
}

/// Deactivates a single hold unconditionally (used to supersede a prior
/// hold for the same `(slot_id, session_id)` — spec §4.4.1 step 5).
///
/// # Errors
///
/// Returns a classified storage error on query failure.
pub async fn deactivate(
    tx: &mut Transaction<'_, Postgres>,
    hold_id: HoldId,
    now: DateTime<Utc>,
) -> Result<(), StorageError> {
    sqlx::query("UPDATE holds SET is_active = false, released_at = $2 WHERE hold_id = $1")
        .bind(hold_id)
        .bind(now)
        .execute(&mut **tx)
        .await
        .map_err(classify)?;
    Ok(())
}

/// Deactivates a single hold iff it is currently active, returning whether
/// the transition was applied (spec §4.4.3's `release_hold`, which must be
/// idempotent: a second call returns `false`).
///
/// # Errors
///
/// Returns a classified storage error on query failure.
pub async fn release_if_active(
    pool: &super::Pool,
    hold_id: HoldId,
    now: DateTime<Utc>,
) -> Result<bool, StorageError> {
    let result =
        sqlx::query("UPDATE holds SET is_active = false, released_at = $2 WHERE hold_id = $1 AND is_active = true")
            .bind(hold_id)
            .bind(now)
            .execute(pool)
            .await
            .map_err(classify)?;
    Ok(result.rows_affected() > 0)
}

/// Inserts a new hold row with `expires_at = now + duration`
/// (spec §4.4.1 step 6).
///
/// # Errors
///
/// Returns a classified storage error on query failure.
#[allow(clippy::too_many_arguments)]
pub async fn insert(
    tx: &mut Transaction<'_, Postgres>,
    slot_id: SlotId,
    session_id: &str,
    user_id: Option<UserId>,
    quantity: i32,
    now: DateTime<Utc>,
    duration: Duration,
) -> Result<Hold, StorageError> {
    let hold_id = HoldId::new();
    let expires_at = now + duration;

    let query = format!(
        "INSERT INTO holds (hold_id, slot_id, session_id, user_id, quantity, created_at, \
         expires_at, is_active, released_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, true, NULL)
         RETURNING {HOLD_COLUMNS}"
    );
    sqlx::query_as::<_, Hold>(&query)
        .bind(hold_id)
        .bind(slot_id)
        .bind(session_id)
        .bind(user_id)
        .bind(quantity)
        .bind(now)
        .bind(expires_at)
        .fetch_one(&mut **tx)
        .await
        .map_err(classify)
}

/// Loads a hold with a row lock, for use inside `confirm_booking`'s
/// transaction (spec §4.5 step 1).
///
/// # Errors
///
/// Returns [`StorageError::NotFound`] if absent.
pub async fn find_for_update(
    tx: &mut Transaction<'_, Postgres>,
    hold_id: HoldId,
) -> Result<Hold, StorageError> {
    let query = format!("SELECT {HOLD_COLUMNS} FROM holds WHERE hold_id = $1 FOR UPDATE");
    sqlx::query_as::<_, Hold>(&query)
        .bind(hold_id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(classify)?
        .ok_or(StorageError::NotFound)
}

/// Loads a hold without a lock, for `verify_hold` (spec §4.4.2), which
/// only conditionally mutates (the self-healing expiry transition) and
/// does not participate in a larger transaction.
///
/// # Errors
///
/// Returns [`StorageError::NotFound`] if absent.
pub async fn find(pool: &super::Pool, hold_id: HoldId) -> Result<Hold, StorageError> {
    let query = format!("SELECT {HOLD_COLUMNS} FROM holds WHERE hold_id = $1");
    sqlx::query_as::<_, Hold>(&query)
        .bind(hold_id)
        .fetch_optional(pool)
        .await
        .map_err(classify)?
        .ok_or(StorageError::NotFound)
}

//! Append-only writes to the `attempt_log` table (spec §3, §9).
//!
//! The source only logged on success; spec §9 mandates logging failures
//! too, written in its own short-lived transaction so it survives the
//! rollback of the attempt that failed.

use chrono::{DateTime, Utc};
use sqlx::PgExecutor;

use super::{StorageError, classify};
use crate::domain::attempt_log::AttemptStatus;
use crate::domain::ids::{EventId, SlotId, UserId};

/// Appends one attempt-log row. Generic over [`PgExecutor`] so a success
/// row can be written inside the caller's own committing transaction
/// (spec §4.5 step 8, which runs before the step-9 commit) while a failure
/// row — logged and suppressed by the caller per spec §7's propagation
/// policy — can still be written against the bare pool in its own
/// short-lived transaction that survives the failed attempt's rollback.
///
/// # Errors
///
/// Returns a classified storage error on query failure.
#[allow(clippy::too_many_arguments)]
pub async fn append<'e, E>(
    executor: E,
    event_id: EventId,
    slot_id: SlotId,
    user_id: Option<UserId>,
    email: Option<&str>,
    status: AttemptStatus,
    attempted_at: DateTime<Utc>,
    failure_reason: Option<&str>,
) -> Result<(), StorageError>
where
    E: PgExecutor<'e>,
{
    sqlx::query(
        "INSERT INTO attempt_log (event_id, slot_id, user_id, email, status, attempted_at, \
         failure_reason) VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(event_id)
    .bind(slot_id)
    .bind(user_id)
    .bind(email)
    .bind(status)
    .bind(attempted_at)
    .bind(failure_reason)
    .execute(executor)
    .await
    .map_err(classify)?;

    Ok(())
}

//! The Hold Manager (C4, spec §4.4): the two-phase reservation state
//! machine — create, verify, release.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::config::{MAX_HOLD_DURATION_MINUTES, MIN_HOLD_DURATION_MINUTES, ReservationConfig};
use crate::domain::effective_available;
use crate::domain::ids::{HoldId, SlotId, UserId};
use crate::domain::slot::SlotStatus;
use crate::error::{Result, SrcError};
use crate::retry::with_one_retry;
use crate::storage::{self, Pool, StorageError};

/// Result of a successful `create_hold` (spec §4.4.1, §6).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateHoldResult {
    pub hold_id: HoldId,
    pub expires_at: DateTime<Utc>,
}

/// Result of `verify_hold` (spec §4.4.2, §6): always returned, never an
/// error for a merely-invalid hold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyHoldResult {
    pub is_valid: bool,
    pub reason: Option<VerifyHoldReason>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Why `verify_hold` considers a hold invalid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerifyHoldReason {
    NotFound,
    Released,
    Expired,
}

/// Creates a hold on `slot_id` for `session_id` (spec §4.4.1).
///
/// # Errors
///
/// Returns [`SrcError::InvalidQuantity`] if `quantity` is not positive,
/// [`SrcError::InvalidArgument`] if `session_id` is empty,
/// [`SrcError::SlotNotFound`] if the slot does not exist,
/// [`SrcError::SlotUnavailable`] if it is not currently bookable, or
/// [`SrcError::CapacityExceeded`] if there is not enough effective
/// availability left for `session_id`.
pub async fn create_hold(
    pool: &Pool,
    clock: &dyn Clock,
    config: &ReservationConfig,
    slot_id: SlotId,
    session_id: &str,
    quantity: u32,
    user_id: Option<UserId>,
    duration_min: Option<i64>,
) -> Result<CreateHoldResult> {
    if quantity == 0 {
        return Err(SrcError::InvalidQuantity("quantity must be positive".into()));
    }
    if session_id.trim().is_empty() {
        return Err(SrcError::InvalidArgument("session_id must be non-empty".into()));
    }

    let duration_min = duration_min
        .unwrap_or(config.default_hold_duration_minutes)
        .clamp(MIN_HOLD_DURATION_MINUTES, MAX_HOLD_DURATION_MINUTES);
    let duration = Duration::minutes(duration_min);
    let quantity_i32 = i32::try_from(quantity)
        .map_err(|_| SrcError::InvalidQuantity("quantity overflows i32".into()))?;

    with_one_retry(|| {
        create_hold_once(pool, clock, slot_id, session_id, quantity_i32, quantity, user_id, duration)
    })
    .await
}

/// One attempt of the `create_hold` transaction (spec §4.4.1 steps 1–7).
///
/// Returns `SrcError` directly rather than `StorageError` so that
/// [`with_one_retry`] only ever retries a genuine
/// [`SrcError::TransientStorage`] — `SlotUnavailable` and
/// `CapacityExceeded` are domain outcomes, not storage failures, and must
/// never be silently retried into a different transaction.
#[allow(clippy::too_many_arguments)]
async fn create_hold_once(
    pool: &Pool,
    clock: &dyn Clock,
    slot_id: SlotId,
    session_id: &str,
    quantity_i32: i32,
    quantity: u32,
    user_id: Option<UserId>,
    duration: Duration,
) -> Result<CreateHoldResult> {
    let now = clock.now();
    let mut tx = pool.begin().await.map_err(storage::classify).map_err(SrcError::from)?;

    // Step 1: opportunistic, scoped sweep.
    storage::holds::release_expired(&mut *tx, now, Some(slot_id))
        .await
        .map_err(SrcError::from)?;

    // Step 2: load + validate the slot.
    let slot = match storage::slots::find_for_update(&mut tx, slot_id).await {
        Ok(slot) => slot,
        Err(StorageError::NotFound) => {
            tx.rollback().await.ok();
            return Err(SrcError::SlotNotFound(slot_id));
        }
        Err(e) => return Err(SrcError::from(e)),
    };
    if !slot.is_bookable_at(now) {
        let reason = if !matches!(slot.status, SlotStatus::Available) {
            "slot is not available"
        } else {
            "slot start time has passed"
        };
        tx.rollback().await.ok();
        return Err(SrcError::SlotUnavailable(reason.into()));
    }

    // Step 3: compute effective_available excluding the caller's own holds.
    let held_by_others = storage::holds::sum_active_excluding_session(&mut tx, slot_id, now, session_id)
        .await
        .map_err(SrcError::from)?;
    let effective = effective_available(
        slot.total_capacity as i64,
        slot.booked_count as i64,
        held_by_others,
    );

    // Step 4: capacity guard.
    if effective < i64::from(quantity) {
        tx.rollback().await.ok();
        return Err(SrcError::CapacityExceeded {
            requested: quantity,
            available: u32::try_from(effective.max(0)).unwrap_or(0),
        });
    }

    // Step 5: supersede any existing active hold for this session.
    if let Some(existing) = storage::holds::find_active_for_session(&mut tx, slot_id, session_id)
        .await
        .map_err(SrcError::from)?
    {
        storage::holds::deactivate(&mut tx, existing.hold_id, now)
            .await
            .map_err(SrcError::from)?;
    }

    // Step 6: insert the new hold.
    let hold = storage::holds::insert(&mut tx, slot_id, session_id, user_id, quantity_i32, now, duration)
        .await
        .map_err(SrcError::from)?;

    // Step 7: commit.
    tx.commit().await.map_err(storage::classify).map_err(SrcError::from)?;

    Ok(CreateHoldResult { hold_id: hold.hold_id, expires_at: hold.expires_at })
}

/// Reads a hold's validity, self-healing an already-expired hold in place
/// (spec §4.4.2).
///
/// # Errors
///
/// Only for transient storage failures; a missing/released/expired hold
/// is a normal `Ok` reply, per spec §6 ("—" failure kinds).
pub async fn verify_hold(pool: &Pool, clock: &dyn Clock, hold_id: HoldId) -> Result<VerifyHoldResult> {
    let now = clock.now();

    let hold = match storage::holds::find(pool, hold_id).await {
        Ok(hold) => hold,
        Err(StorageError::NotFound) => {
            return Ok(VerifyHoldResult { is_valid: false, reason: Some(VerifyHoldReason::NotFound), expires_at: None });
        }
        Err(e) => return Err(SrcError::from(e)),
    };

    if !hold.is_active {
        return Ok(VerifyHoldResult {
            is_valid: false,
            reason: Some(VerifyHoldReason::Released),
            expires_at: Some(hold.expires_at),
        });
    }

    if hold.expires_at <= now {
        // Self-healing transition; idempotent under concurrent callers
        // because the UPDATE is a no-op once `is_active` is already false.
        storage::holds::release_if_active(pool, hold_id, now)
            .await
            .map_err(SrcError::from)?;
        return Ok(VerifyHoldResult {
            is_valid: false,
            reason: Some(VerifyHoldReason::Expired),
            expires_at: Some(hold.expires_at),
        });
    }

    Ok(VerifyHoldResult { is_valid: true, reason: None, expires_at: Some(hold.expires_at) })
}

/// Best-effort, idempotent release (spec §4.4.3).
///
/// # Errors
///
/// Only for transient storage failures; callers MUST NOT treat `Ok(false)`
/// as fatal — the expiry sweep will eventually reap the hold regardless.
pub async fn release_hold(pool: &Pool, clock: &dyn Clock, hold_id: HoldId) -> Result<bool> {
    storage::holds::release_if_active(pool, hold_id, clock.now())
        .await
        .map_err(SrcError::from)
}

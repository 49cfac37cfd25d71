//! The Booking Finaliser (C5, spec §4.5): converts a valid hold into a
//! confirmed booking atomically, inside a single serialisable transaction
//! over the hold's slot row.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::domain::attempt_log::AttemptStatus;
use crate::domain::booking::AttendeeInput;
use crate::domain::effective_available;
use crate::domain::ids::{BookingId, HoldId};
use crate::error::{Result, SrcError};
use crate::retry::with_one_retry;
use crate::storage::{self, Pool, StorageError};

/// Result of a successful `confirm_booking` (spec §6).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmBookingResult {
    pub booking_id: BookingId,
}

/// A conservative email shape: `local@domain.tld`. Not RFC 5322-complete —
/// spec §4.5 calls for "a conservative email pattern", not full validation.
static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is a valid regex")
});

/// Attendee fields after trimming and validation (spec §4.5: "Whitespace is
/// trimmed; first/last name must be non-empty after trimming").
struct ValidatedAttendee {
    first_name: String,
    last_name: String,
    email: String,
    phone: Option<String>,
    notes: Option<String>,
}

fn validate_attendee(input: &AttendeeInput) -> Result<ValidatedAttendee> {
    let first_name = input.first_name.trim().to_string();
    let last_name = input.last_name.trim().to_string();
    let email = input.email.trim().to_string();

    if first_name.is_empty() {
        return Err(SrcError::InvalidAttendee("first_name must be non-empty".into()));
    }
    if last_name.is_empty() {
        return Err(SrcError::InvalidAttendee("last_name must be non-empty".into()));
    }
    if email.is_empty() || !EMAIL_PATTERN.is_match(&email) {
        return Err(SrcError::InvalidAttendee(format!("'{email}' is not a valid email")));
    }

    let phone = input.phone.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(str::to_string);
    let notes = input.notes.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(str::to_string);

    Ok(ValidatedAttendee { first_name, last_name, email, phone, notes })
}

/// Converts `hold_id` into a confirmed booking (spec §4.5).
///
/// Any failed attempt also produces an `attempt_log` row with
/// `status = 'failed'`, written in its own short transaction so it survives
/// the rollback of the attempt that failed (spec §4.5, §9). That write is
/// best-effort: its own failure is logged and suppressed, never allowed to
/// mask the caller's real error (spec §7's propagation policy).
///
/// # Errors
///
/// Returns [`SrcError::InvalidAttendee`] if the attendee payload fails
/// validation (checked before any transaction is opened — spec §4.5's
/// attendee rules are request-shape validation, not a capacity outcome),
/// [`SrcError::HoldInvalid`] if the hold is missing, inactive, or expired,
/// [`SrcError::CapacityExceeded`] if the residual capacity guard fails, or
/// [`SrcError::TransientStorage`] on a serialisation failure or exhausted
/// booking-reference retry budget.
pub async fn confirm_booking(
    pool: &Pool,
    clock: &dyn Clock,
    hold_id: HoldId,
    attendee: AttendeeInput,
) -> Result<ConfirmBookingResult> {
    let validated = validate_attendee(&attendee)?;

    let result = with_one_retry(|| confirm_booking_once(pool, clock, hold_id, &validated)).await;

    if let Err(ref e) = result {
        log_failed_attempt(pool, clock, hold_id, &validated.email, e).await;
    }

    result
}

async fn confirm_booking_once(
    pool: &Pool,
    clock: &dyn Clock,
    hold_id: HoldId,
    attendee: &ValidatedAttendee,
) -> Result<ConfirmBookingResult> {
    let now = clock.now();
    let mut tx = pool.begin().await.map_err(storage::classify).map_err(SrcError::from)?;

    // Step 1: load the hold FOR UPDATE; fail if absent, inactive, or expired.
    let hold = match storage::holds::find_for_update(&mut tx, hold_id).await {
        Ok(hold) => hold,
        Err(StorageError::NotFound) => {
            tx.rollback().await.ok();
            return Err(SrcError::hold_invalid(hold_id, "not found"));
        }
        Err(e) => return Err(SrcError::from(e)),
    };
    if !hold.is_active {
        tx.rollback().await.ok();
        return Err(SrcError::hold_invalid(hold_id, "released"));
    }
    if hold.expires_at <= now {
        tx.rollback().await.ok();
        return Err(SrcError::hold_invalid(hold_id, "expired"));
    }

    // Step 2: load the slot.
    let slot = match storage::slots::find_for_update(&mut tx, hold.slot_id).await {
        Ok(slot) => slot,
        Err(StorageError::NotFound) => {
            tx.rollback().await.ok();
            return Err(SrcError::SlotNotFound(hold.slot_id));
        }
        Err(e) => return Err(SrcError::from(e)),
    };

    // Step 3: residual capacity guard, excluding the hold being consumed.
    let held_by_others = storage::holds::sum_active_excluding_hold(&mut tx, hold.slot_id, now, hold_id)
        .await
        .map_err(SrcError::from)?;
    let residual = effective_available(
        slot.total_capacity as i64,
        slot.booked_count as i64,
        held_by_others,
    );
    if residual < i64::from(hold.quantity) {
        tx.rollback().await.ok();
        return Err(SrcError::CapacityExceeded {
            requested: u32::try_from(hold.quantity).unwrap_or(0),
            available: u32::try_from(residual.max(0)).unwrap_or(0),
        });
    }

    // Step 4–5: generate a unique reference and insert the booking.
    let attendee_input = AttendeeInput {
        first_name: attendee.first_name.clone(),
        last_name: attendee.last_name.clone(),
        email: attendee.email.clone(),
        phone: attendee.phone.clone(),
        notes: attendee.notes.clone(),
    };
    let booking = storage::bookings::insert_with_unique_reference(
        &mut tx,
        slot.event_id,
        hold.slot_id,
        hold.user_id,
        &attendee_input,
        now,
    )
    .await
    .map_err(SrcError::from)?;

    // Step 6: update the slot's counters.
    storage::slots::apply_booking(&mut tx, hold.slot_id, hold.quantity)
        .await
        .map_err(SrcError::from)?;

    // Step 7: deactivate the consumed hold.
    storage::holds::deactivate(&mut tx, hold_id, now).await.map_err(SrcError::from)?;

    // Step 8: attempt-log success row, written against the same
    // transaction as everything above — it is only durable if the step-9
    // commit below succeeds, and rolls back together with the rest of the
    // attempt if it doesn't.
    storage::attempt_log::append(
        &mut *tx,
        slot.event_id,
        hold.slot_id,
        hold.user_id,
        Some(attendee.email.as_str()),
        AttemptStatus::Success,
        now,
        None,
    )
    .await
    .map_err(SrcError::from)?;

    // Step 9: commit.
    tx.commit().await.map_err(storage::classify).map_err(SrcError::from)?;

    Ok(ConfirmBookingResult { booking_id: booking.booking_id })
}

/// Best-effort failure logging (spec §4.5, §7): written in its own
/// transaction-less call so it survives the rollback of the attempt that
/// failed, and its own failure is swallowed rather than shadowing the
/// caller's real error.
async fn log_failed_attempt(pool: &Pool, clock: &dyn Clock, hold_id: HoldId, email: &str, error: &SrcError) {
    let Ok(hold) = storage::holds::find(pool, hold_id).await else {
        // Nothing we can attribute the attempt to; the hold itself never
        // existed, so there is no (event_id, slot_id) to log against.
        return;
    };
    let Ok(slot) = storage::slots::find_readonly(pool, hold.slot_id).await else {
        return;
    };

    if let Err(e) = storage::attempt_log::append(
        pool,
        slot.event_id,
        hold.slot_id,
        hold.user_id,
        Some(email),
        AttemptStatus::Failed,
        clock.now(),
        Some(&error.to_string()),
    )
    .await
    {
        tracing::warn!(error = %e, "failed to append failed attempt-log row");
    }
}

#[cfg(test)]
mod attendee_validation_test {
    use super::*;

    fn attendee(first: &str, last: &str, email: &str) -> AttendeeInput {
        AttendeeInput {
            first_name: first.into(),
            last_name: last.into(),
            email: email.into(),
            phone: None,
            notes: None,
        }
    }

    #[test]
    fn trims_and_accepts_a_valid_attendee() {
        let validated = validate_attendee(&attendee("  Ada  ", " Lovelace ", "ada@example.org")).unwrap();
        assert_eq!(validated.first_name, "Ada");
        assert_eq!(validated.last_name, "Lovelace");
        assert_eq!(validated.email, "ada@example.org");
    }

    #[test]
    fn rejects_blank_first_name_after_trim() {
        let err = validate_attendee(&attendee("   ", "Lovelace", "ada@example.org")).unwrap_err();
        assert!(matches!(err, SrcError::InvalidAttendee(_)));
    }

    #[test]
    fn rejects_malformed_email() {
        let err = validate_attendee(&attendee("Ada", "Lovelace", "not-an-email")).unwrap_err();
        assert!(matches!(err, SrcError::InvalidAttendee(_)));
    }

    #[test]
    fn blank_optional_fields_become_none() {
        let mut input = attendee("Ada", "Lovelace", "ada@example.org");
        input.phone = Some("   ".into());
        let validated = validate_attendee(&input).unwrap();
        assert_eq!(validated.phone, None);
    }
}

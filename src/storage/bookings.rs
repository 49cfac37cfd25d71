//! Row-level access to the `bookings` table, including the
//! booking-reference uniqueness retry loop (spec §4.1, §4.5 step 4, §9).

use chrono::{DateTime, Utc};
use rand::Rng;
use rand::distr::Alphanumeric;
use sqlx::{Postgres, Transaction};

use super::{StorageError, classify};
use crate::domain::booking::{AttendeeInput, Booking};
use crate::domain::ids::{BookingId, EventId, SlotId, UserId};

/// Maximum insert attempts before giving up and surfacing
/// [`StorageError::Conflict`] (spec §4.5 step 4: "SHOULD cap the loop
/// (e.g., 5 attempts)").
const MAX_REFERENCE_ATTEMPTS: u32 = 5;

/// Generates an 8-character uppercase alphanumeric booking reference.
/// Ambiguous characters (`0`/`O`, `1`/`I`/`L`) are not excluded, matching
/// the source behaviour spec §6 calls out.
fn generate_reference() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(|b| (b as char).to_ascii_uppercase())
        .collect()
}

/// Inserts a confirmed booking, retrying on a booking-reference collision
/// up to [`MAX_REFERENCE_ATTEMPTS`] times (spec §4.1, §4.5 step 4).
///
/// # Errors
///
/// Returns [`StorageError::Conflict`] if the retry budget is exhausted, or
/// a classified storage error on any other query failure.
#[allow(clippy::too_many_arguments)]
pub async fn insert_with_unique_reference(
    tx: &mut Transaction<'_, Postgres>,
    event_id: EventId,
    slot_id: SlotId,
    user_id: Option<UserId>,
    attendee: &AttendeeInput,
    now: DateTime<Utc>,
) -> Result<Booking, StorageError> {
    for attempt in 1..=MAX_REFERENCE_ATTEMPTS {
        let booking_id = BookingId::new();
        let reference = generate_reference();

        let result = sqlx::query_as::<_, Booking>(
            "INSERT INTO bookings (booking_id, event_id, slot_id, user_id, first_name, \
             last_name, email, phone, notes, booking_reference, status, confirmed_at, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, 'confirmed', $11, $11)
             RETURNING booking_id, event_id, slot_id, user_id, first_name, last_name, email, \
                       phone, notes, booking_reference, status, confirmed_at, created_at",
        )
        .bind(booking_id)
        .bind(event_id)
        .bind(slot_id)
        .bind(user_id)
        .bind(&attendee.first_name)
        .bind(&attendee.last_name)
        .bind(&attendee.email)
        .bind(&attendee.phone)
        .bind(&attendee.notes)
        .bind(&reference)
        .bind(now)
        .fetch_one(&mut **tx)
        .await;

        match result {
            Ok(booking) => return Ok(booking),
            Err(e) => match classify(e) {
                StorageError::Conflict(_) if attempt < MAX_REFERENCE_ATTEMPTS => continue,
                other => return Err(other),
            },
        }
    }

    Err(StorageError::Conflict(
        "exhausted booking_reference retry budget".into(),
    ))
}

#[cfg(test)]
mod reference_format_test {
    use super::generate_reference;

    #[test]
    fn reference_is_eight_uppercase_alphanumerics() {
        let reference = generate_reference();
        assert_eq!(reference.len(), 8);
        assert!(reference.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }
}

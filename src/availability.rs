//! The Availability Calculator (C3, spec §4.3).

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::domain::effective_available;
use crate::domain::event::Event;
use crate::domain::ids::{EventId, SlotId};
use crate::error::{Result, SrcError};
use crate::storage::{self, Pool};

/// One row of `list_availability`'s result (spec §4.3 and §6).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AvailabilityRow {
    pub slot_id: SlotId,
    pub start_time: chrono::DateTime<Utc>,
    pub end_time: chrono::DateTime<Utc>,
    pub total_capacity: i32,
    /// `available_count` minus every non-caller active, unexpired hold.
    pub effective_available: i64,
    pub price_cents: i64,
}

/// Result of `can_book` (spec §4.3, §6): always returned, never an error.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CanBook {
    pub can_book: bool,
    pub reason: Option<String>,
    pub available_slot_count: i64,
}

/// Lists every bookable slot of `event_id`, with `effective_available`
/// computed excluding `session_id`'s own holds (spec §4.3).
///
/// Opportunistically sweeps expired holds (spec §4.2(a): "at the start of
/// each `list_availability` and `create_hold`") before computing
/// availability, though correctness never depends on the sweep having run
/// — every sum below filters `expires_at > now` itself.
///
/// # Errors
///
/// Returns [`SrcError::EventNotFound`] if the event does not exist.
pub async fn list_availability(
    pool: &Pool,
    clock: &dyn Clock,
    event_id: EventId,
    session_id: Option<&str>,
) -> Result<Vec<AvailabilityRow>> {
    let now = clock.now();

    storage::holds::release_expired(pool, now, None)
        .await
        .map_err(SrcError::from)?;

    let _ = storage::events::find(pool, event_id)
        .await
        .map_err(|_| SrcError::EventNotFound(event_id))?;

    let slots = storage::slots::list_available_for_event(pool, event_id, now)
        .await
        .map_err(SrcError::from)?;

    let mut rows = Vec::with_capacity(slots.len());
    for slot in slots {
        let held_by_others = storage::holds::sum_active_excluding_session_readonly(
            pool,
            slot.slot_id,
            now,
            session_id,
        )
        .await
        .map_err(SrcError::from)?;

        let effective = effective_available(
            slot.total_capacity as i64,
            slot.booked_count as i64,
            held_by_others,
        );

        rows.push(AvailabilityRow {
            slot_id: slot.slot_id,
            start_time: slot.start_time,
            end_time: slot.end_time,
            total_capacity: slot.total_capacity,
            effective_available: effective,
            price_cents: slot.price_cents,
        });
    }

    Ok(rows)
}

/// Pre-flight check of whether `event_id` could be booked at all (spec
/// §1's "one pre-flight (event bookability)" and §3's bookability
/// invariant): active status, anonymously-bookable visibility.
///
/// Returns `Ok(None)` when the event does not exist, rather than an
/// error — `can_book` turns a missing event into its own
/// `(false, "event not found", 0)` reply instead of propagating
/// `EventNotFound` (spec §4.3: `can_book` "always returns a tuple").
pub(crate) async fn event_bookability(pool: &Pool, event_id: EventId) -> Result<Option<Event>> {
    match storage::events::find(pool, event_id).await {
        Ok(event) => Ok(Some(event)),
        Err(storage::StorageError::NotFound) => Ok(None),
        Err(e) => Err(SrcError::from(e)),
    }
}

/// Counts slots of `event_id` whose `effective_available ≥ quantity`,
/// using the session-agnostic formula (spec §4.3).
///
/// # Errors
///
/// Never returns an error for a missing or unbookable event — spec §4.3
/// defines that case as `(false, "<reason>", 0)`. Propagates only
/// transient storage failures.
pub async fn can_book(pool: &Pool, clock: &dyn Clock, event_id: EventId, quantity: u32) -> Result<CanBook> {
    let Some(event) = event_bookability(pool, event_id).await? else {
        return Ok(CanBook {
            can_book: false,
            reason: Some("event not found".into()),
            available_slot_count: 0,
        });
    };

    if !event.is_bookable() {
        return Ok(CanBook {
            can_book: false,
            reason: Some("event is not active and publicly bookable".into()),
            available_slot_count: 0,
        });
    }

    let now = clock.now();
    let slots = storage::slots::list_available_for_event(pool, event_id, now)
        .await
        .map_err(SrcError::from)?;

    let mut count: i64 = 0;
    for slot in slots {
        let held = storage::holds::sum_active_excluding_session_readonly(pool, slot.slot_id, now, None)
            .await
            .map_err(SrcError::from)?;
        let effective =
            effective_available(slot.total_capacity as i64, slot.booked_count as i64, held);
        if effective >= i64::from(quantity) {
            count += 1;
        }
    }

    Ok(CanBook {
        can_book: count > 0,
        reason: None,
        available_slot_count: count,
    })
}

#[cfg(test)]
mod can_book_shape_test {
    use super::CanBook;

    #[test]
    fn always_a_tuple_even_when_not_bookable() {
        let reply = CanBook { can_book: false, reason: Some("x".into()), available_slot_count: 0 };
        assert!(!reply.can_book);
    }
}

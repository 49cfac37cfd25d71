//! The `TimeSlot` entity (spec §3).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{EventId, SlotId};

/// Bookability state of a slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "slot_status", rename_all = "lowercase")]
pub enum SlotStatus {
    /// Bookable, subject to `start_time` and remaining capacity.
    Available,
    /// `available_count = 0`; kept distinct from `Available` so a direct
    /// query can find full slots without recomputing the count.
    Full,
    /// Withdrawn; never bookable regardless of capacity.
    Cancelled,
}

/// A concrete, dated instance of an event with finite capacity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TimeSlot {
    /// Opaque unique identifier.
    pub slot_id: SlotId,
    /// Owning event.
    pub event_id: EventId,
    /// Slot start; must be in the future to be bookable.
    pub start_time: DateTime<Utc>,
    /// Slot end.
    pub end_time: DateTime<Utc>,
    /// Immutable once issued.
    pub total_capacity: i32,
    /// Monotonically non-decreasing via the booking finaliser.
    pub booked_count: i32,
    pub status: SlotStatus,
    /// Non-negative, minor units (cents).
    pub price_cents: i64,
}

impl TimeSlot {
    /// `total_capacity − booked_count`, ignoring any holds (spec §3).
    #[must_use]
    pub const fn available_count(&self) -> i64 {
        self.total_capacity as i64 - self.booked_count as i64
    }

    /// Whether this slot could be bookable at all, independent of
    /// remaining capacity or active holds (spec §4.4 step 2).
    #[must_use]
    pub fn is_bookable_at(&self, now: DateTime<Utc>) -> bool {
        matches!(self.status, SlotStatus::Available) && self.start_time > now
    }
}

//! The `Booking` entity (spec §3).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{BookingId, EventId, SlotId, UserId};

/// Terminal status of a booking.
///
/// Cancellation is out of scope for this core (spec §1's non-goals list
/// "rescheduling/modification of confirmed bookings"); the variant exists
/// because it is part of the stored shape bookings inherit from the wider
/// platform, but no operation in this crate writes it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "booking_status", rename_all = "lowercase")]
pub enum BookingStatus {
    Confirmed,
    Cancelled,
}

/// The durable record produced by consuming a valid hold.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Booking {
    pub booking_id: BookingId,
    pub event_id: EventId,
    pub slot_id: SlotId,
    pub user_id: Option<UserId>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub notes: Option<String>,
    /// 8-char uppercase alphanumeric, unique across all bookings.
    pub booking_reference: String,
    pub status: BookingStatus,
    pub confirmed_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Caller-supplied attendee fields for `confirm_booking` (spec §4.5).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendeeInput {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub notes: Option<String>,
}

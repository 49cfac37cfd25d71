//! The `Hold` entity (spec §3) — called "slot lock" in the source system.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{HoldId, SlotId, UserId};

/// A short-lived, server-side reservation that deducts from capacity for
/// non-owners and is exchangeable for a booking.
///
/// `is_active` transitions exactly once, to `false`, at release, expiry, or
/// consumption (spec §4.5's state-machine summary) — the row is retained
/// afterward for audit, never reactivated.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Hold {
    /// Opaque unique identifier.
    pub hold_id: HoldId,
    /// The slot this hold deducts from.
    pub slot_id: SlotId,
    /// Opaque caller session identifier; basis of the uniqueness rule.
    pub session_id: String,
    /// Present when the caller is authenticated.
    pub user_id: Option<UserId>,
    /// Seats requested; positive.
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub is_active: bool,
    pub released_at: Option<DateTime<Utc>>,
}

impl Hold {
    /// A hold counts against capacity only while active and not yet past
    /// its own expiry (spec §4.3's `effective_available` formula).
    #[must_use]
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.expires_at > now
    }
}

//! The `Event` entity (spec §3).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::EventId;

/// Lifecycle state of an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "event_status", rename_all = "lowercase")]
pub enum EventStatus {
    /// Being authored; not bookable.
    Draft,
    /// Live and bookable (subject to visibility).
    Active,
    /// Temporarily taken off sale; not bookable.
    Paused,
    /// All slots have passed; not bookable.
    Completed,
    /// Withdrawn; not bookable.
    Cancelled,
}

/// Who can discover and book an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "event_visibility", rename_all = "lowercase")]
pub enum EventVisibility {
    /// Listed and bookable by anonymous callers.
    Public,
    /// Bookable by anonymous callers who have the direct link, but not listed.
    Unlisted,
    /// Not bookable by anonymous callers.
    ///
    /// The source also has a `protected` call site whose intent is not
    /// defined; we do not invent semantics for it (spec §9), so it is
    /// deliberately absent from this enum — only the two canonical
    /// bookable-adjacent variants are modeled.
    Private,
}

impl EventVisibility {
    /// `true` for the visibilities an anonymous caller may book (spec §3, §9).
    #[must_use]
    pub const fn is_anonymously_bookable(self) -> bool {
        matches!(self, Self::Public | Self::Unlisted)
    }
}

/// A bookable entity owning one or more time slots.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Event {
    /// Opaque unique identifier.
    pub event_id: EventId,
    /// Lifecycle state.
    pub status: EventStatus,
    /// Discoverability/bookability class.
    pub visibility: EventVisibility,
    /// Row creation time; not otherwise load-bearing for reservation logic.
    pub created_at: DateTime<Utc>,
}

impl Event {
    /// Whether an anonymous caller may book slots of this event
    /// (spec §3: `status = active` AND `visibility ∈ {public, unlisted}`).
    #[must_use]
    pub const fn is_bookable(&self) -> bool {
        matches!(self.status, EventStatus::Active) && self.visibility.is_anonymously_bookable()
    }
}

//! The append-only `AttemptLog` (spec §3) — observability only, never
//! consulted by the reservation logic itself.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{EventId, SlotId, UserId};

/// Outcome of a single `confirm_booking` attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "attempt_status", rename_all = "lowercase")]
pub enum AttemptStatus {
    Success,
    Failed,
    Abandoned,
}

/// A single append-only record of a confirm call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct AttemptLogEntry {
    pub event_id: EventId,
    pub slot_id: SlotId,
    pub user_id: Option<UserId>,
    pub email: Option<String>,
    pub status: AttemptStatus,
    pub attempted_at: DateTime<Utc>,
    pub failure_reason: Option<String>,
}

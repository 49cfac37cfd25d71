//! `SlotReservationService`: the callable surface spec §6 describes —
//! "each is a remote procedure with the listed arguments". An outer
//! RPC/HTTP layer (out of scope per spec §1) hangs its handlers off these
//! methods; this crate never opens a socket itself.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::availability::{self, AvailabilityRow, CanBook};
use crate::booking_finaliser::{self, ConfirmBookingResult};
use crate::clock::Clock;
use crate::config::ReservationConfig;
use crate::domain::booking::AttendeeInput;
use crate::domain::ids::{EventId, HoldId, SlotId, UserId};
use crate::error::{Result, SrcError};
use crate::hold_manager::{self, CreateHoldResult, VerifyHoldResult};
use crate::storage::Pool;

/// Deadline spec §5 assigns to a read operation absent an explicit override.
pub const DEFAULT_READ_DEADLINE: Duration = Duration::from_secs(5);
/// Deadline spec §5 assigns to a transactional write absent an explicit override.
pub const DEFAULT_WRITE_DEADLINE: Duration = Duration::from_secs(10);

/// The five core operations plus the `can_book` pre-flight, bound to a
/// connection pool, a clock, and the environment contract's config.
///
/// Cheap to clone — `Pool` and `Arc<dyn Clock>` are both reference-counted
/// handles, matching the corpus's convention of a cloneable service struct
/// handed to each request-scoped caller.
#[derive(Clone)]
pub struct SlotReservationService {
    pool: Pool,
    clock: Arc<dyn Clock>,
    config: ReservationConfig,
}

impl SlotReservationService {
    /// Builds a service over an already-connected pool.
    #[must_use]
    pub fn new(pool: Pool, clock: Arc<dyn Clock>, config: ReservationConfig) -> Self {
        Self { pool, clock, config }
    }

    /// `list_availability` (spec §4.3, §6). Unauthenticated callers may omit
    /// `session_id`; when present, that session's own holds are excluded
    /// from the deducted count.
    ///
    /// # Errors
    ///
    /// Returns [`SrcError::EventNotFound`] if the event does not exist, or
    /// [`SrcError::TransientStorage`] if the read deadline elapses.
    #[tracing::instrument(skip(self))]
    pub async fn list_availability(
        &self,
        event_id: EventId,
        session_id: Option<&str>,
    ) -> Result<Vec<AvailabilityRow>> {
        with_deadline(DEFAULT_READ_DEADLINE, "list_availability", async {
            availability::list_availability(&self.pool, self.clock.as_ref(), event_id, session_id).await
        })
        .await
    }

    /// `can_book` (spec §4.3, §6): always returns a tuple, never an error
    /// for a missing or unbookable event.
    ///
    /// # Errors
    ///
    /// Returns [`SrcError::TransientStorage`] if the read deadline elapses.
    #[tracing::instrument(skip(self))]
    pub async fn can_book(&self, event_id: EventId, quantity: u32) -> Result<CanBook> {
        with_deadline(DEFAULT_READ_DEADLINE, "can_book", async {
            availability::can_book(&self.pool, self.clock.as_ref(), event_id, quantity).await
        })
        .await
    }

    /// `create_hold` (spec §4.4.1, §6). Requires a non-empty `session_id`
    /// (spec §6's authorisation rule).
    ///
    /// # Errors
    ///
    /// See [`hold_manager::create_hold`].
    #[tracing::instrument(skip(self, session_id))]
    pub async fn create_hold(
        &self,
        slot_id: SlotId,
        session_id: &str,
        quantity: u32,
        user_id: Option<UserId>,
        duration_min: Option<i64>,
    ) -> Result<CreateHoldResult> {
        require_session(session_id)?;
        with_deadline(DEFAULT_WRITE_DEADLINE, "create_hold", async {
            hold_manager::create_hold(
                &self.pool,
                self.clock.as_ref(),
                &self.config,
                slot_id,
                session_id,
                quantity,
                user_id,
                duration_min,
            )
            .await
        })
        .await
    }

    /// `verify_hold` (spec §4.4.2, §6).
    ///
    /// # Errors
    ///
    /// Returns [`SrcError::TransientStorage`] if the read deadline elapses.
    #[tracing::instrument(skip(self))]
    pub async fn verify_hold(&self, hold_id: HoldId) -> Result<VerifyHoldResult> {
        with_deadline(DEFAULT_READ_DEADLINE, "verify_hold", async {
            hold_manager::verify_hold(&self.pool, self.clock.as_ref(), hold_id).await
        })
        .await
    }

    /// `release_hold` (spec §4.4.3, §6). Best-effort and idempotent;
    /// `Ok(false)` is a normal reply, not a failure, for an already-inactive
    /// or absent hold.
    ///
    /// # Errors
    ///
    /// Returns [`SrcError::TransientStorage`] if the write deadline elapses.
    #[tracing::instrument(skip(self))]
    pub async fn release_hold(&self, hold_id: HoldId) -> Result<bool> {
        with_deadline(DEFAULT_WRITE_DEADLINE, "release_hold", async {
            hold_manager::release_hold(&self.pool, self.clock.as_ref(), hold_id).await
        })
        .await
    }

    /// `confirm_booking` (spec §4.5, §6). Requires a non-empty `session_id`
    /// per spec §6's authorisation rule, even though the hold row itself
    /// carries no session — the caller's own session must already have
    /// established the hold to reach this call in practice, and an empty
    /// `session_id` is rejected the same way `create_hold` rejects one.
    ///
    /// # Errors
    ///
    /// See [`booking_finaliser::confirm_booking`].
    #[tracing::instrument(skip(self, session_id, attendee))]
    pub async fn confirm_booking(
        &self,
        hold_id: HoldId,
        session_id: &str,
        attendee: AttendeeInput,
    ) -> Result<ConfirmBookingResult> {
        require_session(session_id)?;
        with_deadline(DEFAULT_WRITE_DEADLINE, "confirm_booking", async {
            booking_finaliser::confirm_booking(&self.pool, self.clock.as_ref(), hold_id, attendee).await
        })
        .await
    }

    /// Current server time, exposed so callers needing a consistent
    /// reference for display never reach for their own clock (spec §5's
    /// "lock authority" principle).
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }
}

fn require_session(session_id: &str) -> Result<()> {
    if session_id.trim().is_empty() {
        return Err(SrcError::InvalidArgument("session_id must be non-empty".into()));
    }
    Ok(())
}

/// Wraps `op` in `tokio::time::timeout`, surfacing an elapsed deadline as
/// `TransientStorage` (spec §5: "Deadline exceeded on a read returns
/// `TransientStorage`"; the same mapping is used for the write deadline —
/// a commit that completed after the deadline but before the response was
/// observed still took effect, spec §5 notes, the caller just has to poll
/// via `verify_hold`/`confirm_booking`'s own idempotent failure instead of
/// trusting this call's outcome).
async fn with_deadline<T, F>(deadline: Duration, op: &str, fut: F) -> Result<T>
where
    F: std::future::Future<Output = Result<T>>,
{
    match tokio::time::timeout(deadline, fut).await {
        Ok(result) => result,
        Err(_) => Err(SrcError::TransientStorage(format!("{op} exceeded its {deadline:?} deadline"))),
    }
}

//! The error taxonomy callers of [`crate::service::SlotReservationService`] branch on.
//!
//! Every variant is a stable "kind" a caller can match on; the payload is a
//! human-readable message only. See spec §7 for the recovery semantics of
//! each kind.

use thiserror::Error;

use crate::domain::ids::{EventId, HoldId, SlotId};
use crate::storage::StorageError;

/// Top-level error returned by every service operation.
#[derive(Debug, Error)]
pub enum SrcError {
    /// The request itself is malformed in a way unrelated to quantity or
    /// attendee fields (e.g. an empty `session_id`). Never retry unchanged.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// `quantity` was zero, negative, or otherwise not a positive integer.
    #[error("invalid quantity: {0}")]
    InvalidQuantity(String),

    /// The attendee payload failed validation (empty name, malformed email).
    #[error("invalid attendee: {0}")]
    InvalidAttendee(String),

    /// No event exists with the given id.
    #[error("event not found: {0}")]
    EventNotFound(EventId),

    /// No slot exists with the given id.
    #[error("slot not found: {0}")]
    SlotNotFound(SlotId),

    /// The slot exists but is not currently bookable (cancelled, in the
    /// past, or its owning event is not active/bookable).
    #[error("slot unavailable: {0}")]
    SlotUnavailable(String),

    /// The hold referenced by `verify_hold`/`confirm_booking` is missing,
    /// released, expired, or already consumed. The caller must obtain a
    /// new hold.
    #[error("hold invalid: {0}")]
    HoldInvalid(String),

    /// The capacity guard refused the operation. The caller should
    /// re-list availability; their slot may now be full.
    #[error("capacity exceeded: requested {requested}, available {available}")]
    CapacityExceeded {
        /// Quantity the caller asked to reserve or confirm.
        requested: u32,
        /// Effective availability observed at the moment of the guard.
        available: u32,
    },

    /// A serialisation failure, connection timeout, pool exhaustion, or
    /// uniqueness-retry exhaustion. The caller MAY retry the same request
    /// once; further retries should back off.
    #[error("transient storage error: {0}")]
    TransientStorage(String),

    /// Unexpected failure with no defined recovery.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SrcError>;

impl SrcError {
    /// Attaches the hold id context missing from a bare `HoldInvalid` string.
    pub(crate) fn hold_invalid(hold_id: HoldId, reason: &str) -> Self {
        Self::HoldInvalid(format!("hold {hold_id} is {reason}"))
    }
}

impl From<StorageError> for SrcError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound => SrcError::Internal("storage row unexpectedly missing".into()),
            StorageError::Conflict(msg) => SrcError::TransientStorage(format!("conflict: {msg}")),
            StorageError::Transient(msg) => SrcError::TransientStorage(msg),
            StorageError::PermissionDenied => SrcError::Internal("permission denied at storage layer".into()),
            StorageError::Sqlx(e) => SrcError::Internal(format!("unclassified storage error: {e}")),
        }
    }
}

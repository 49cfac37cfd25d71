//! Opaque identifier newtypes.
//!
//! Every entity is keyed by a wrapped [`uuid::Uuid`] so the compiler
//! rejects passing, say, a `SlotId` where an `EventId` is expected. Each
//! derives `sqlx::Type` transparently so it binds/reads like a bare `Uuid`
//! at the storage boundary.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! uuid_id {
    ($name:ident, $gen:expr) => {
        #[derive(
            Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type,
        )]
        #[sqlx(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generates a new identifier.
            #[must_use]
            pub fn new() -> Self {
                Self($gen())
            }

            /// Wraps an existing `Uuid`, e.g. one read back from storage.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the inner `Uuid`.
            #[must_use]
            pub const fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// `EventId`/`SlotId`/`UserId` carry no ordering requirement of their own
// (events and slots are addressed by admin tooling outside this core;
// `user_id` is supplied by the caller), so they use plain random v4 ids.
uuid_id!(EventId, Uuid::new_v4);
uuid_id!(SlotId, Uuid::new_v4);
uuid_id!(UserId, Uuid::new_v4);

// `HoldId`/`BookingId` are created at a high rate inside this core and
// their creation order is meaningful for audit trails (the attempt log
// and the booking reference retry loop both benefit from a roughly
// time-sortable key), so these use v7.
uuid_id!(HoldId, Uuid::now_v7);
uuid_id!(BookingId, Uuid::now_v7);

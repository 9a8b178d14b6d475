//! Value objects for the trip domain.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a reservation within a trip.
///
/// Only required to be unique among the trip's currently active
/// reservations; an id freed by cancellation may be generated again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReservationId(Uuid);

impl ReservationId {
    /// Creates a new random reservation ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a reservation ID from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ReservationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ReservationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for ReservationId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// A reservation holding part of a trip's capacity.
///
/// Owned exclusively by its trip; a reservation whose capacity reaches 0
/// is removed rather than kept around empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    /// Passenger name the reservation is held under.
    pub name: String,

    /// Number of spots held; always greater than zero.
    pub capacity: i32,
}

impl Reservation {
    /// Creates a new reservation.
    pub fn new(name: impl Into<String>, capacity: i32) -> Self {
        Self {
            name: name.into(),
            capacity,
        }
    }
}

/// Current-state summary of a trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripSummary {
    /// Trip name.
    pub name: String,

    /// Total bookable capacity.
    pub total_capacity: i32,

    /// Capacity not yet held by any reservation.
    pub remaining_capacity: i32,
}

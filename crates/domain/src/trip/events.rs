//! Trip domain events.
//!
//! The only way trip state changes. Each event carries the owning trip id
//! and is appended to that trip's log, never mutated or deleted.

use common::TripId;
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;

use super::ReservationId;

/// Events that can occur on a trip aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum TripEvent {
    /// The trip was created with an initial name and capacity.
    TripCreated(TripCreatedData),

    /// The trip was renamed.
    NameChanged(NameChangedData),

    /// The trip's total capacity was changed.
    CapacityChanged(CapacityChangedData),

    /// A reservation was created.
    ReservationCreated(ReservationCreatedData),

    /// A reservation's passenger name was changed.
    PassengerNameChanged(PassengerNameChangedData),

    /// A reservation's held capacity was changed; a new capacity of 0
    /// encodes cancellation.
    ReservedCapacityChanged(ReservedCapacityChangedData),
}

impl DomainEvent for TripEvent {
    fn event_type(&self) -> &'static str {
        match self {
            TripEvent::TripCreated(_) => "TripCreated",
            TripEvent::NameChanged(_) => "NameChanged",
            TripEvent::CapacityChanged(_) => "CapacityChanged",
            TripEvent::ReservationCreated(_) => "ReservationCreated",
            TripEvent::PassengerNameChanged(_) => "PassengerNameChanged",
            TripEvent::ReservedCapacityChanged(_) => "ReservedCapacityChanged",
        }
    }
}

/// Data for the TripCreated event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripCreatedData {
    pub trip_id: TripId,
    pub name: String,
    pub capacity: i32,
}

/// Data for the NameChanged event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameChangedData {
    pub trip_id: TripId,
    pub old_name: String,
    pub new_name: String,
}

/// Data for the CapacityChanged event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityChangedData {
    pub trip_id: TripId,
    pub old_capacity: i32,
    pub new_capacity: i32,
}

/// Data for the ReservationCreated event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationCreatedData {
    pub trip_id: TripId,
    pub reservation_id: ReservationId,
    pub name: String,
    pub capacity: i32,
}

/// Data for the PassengerNameChanged event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassengerNameChangedData {
    pub trip_id: TripId,
    pub reservation_id: ReservationId,
    pub old_name: String,
    pub new_name: String,
}

/// Data for the ReservedCapacityChanged event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservedCapacityChangedData {
    pub trip_id: TripId,
    pub reservation_id: ReservationId,
    pub old_capacity: i32,
    pub new_capacity: i32,
}

// Convenience constructors
impl TripEvent {
    /// Creates a TripCreated event.
    pub fn trip_created(trip_id: TripId, name: impl Into<String>, capacity: i32) -> Self {
        TripEvent::TripCreated(TripCreatedData {
            trip_id,
            name: name.into(),
            capacity,
        })
    }

    /// Creates a NameChanged event.
    pub fn name_changed(
        trip_id: TripId,
        old_name: impl Into<String>,
        new_name: impl Into<String>,
    ) -> Self {
        TripEvent::NameChanged(NameChangedData {
            trip_id,
            old_name: old_name.into(),
            new_name: new_name.into(),
        })
    }

    /// Creates a CapacityChanged event.
    pub fn capacity_changed(trip_id: TripId, old_capacity: i32, new_capacity: i32) -> Self {
        TripEvent::CapacityChanged(CapacityChangedData {
            trip_id,
            old_capacity,
            new_capacity,
        })
    }

    /// Creates a ReservationCreated event.
    pub fn reservation_created(
        trip_id: TripId,
        reservation_id: ReservationId,
        name: impl Into<String>,
        capacity: i32,
    ) -> Self {
        TripEvent::ReservationCreated(ReservationCreatedData {
            trip_id,
            reservation_id,
            name: name.into(),
            capacity,
        })
    }

    /// Creates a PassengerNameChanged event.
    pub fn passenger_name_changed(
        trip_id: TripId,
        reservation_id: ReservationId,
        old_name: impl Into<String>,
        new_name: impl Into<String>,
    ) -> Self {
        TripEvent::PassengerNameChanged(PassengerNameChangedData {
            trip_id,
            reservation_id,
            old_name: old_name.into(),
            new_name: new_name.into(),
        })
    }

    /// Creates a ReservedCapacityChanged event.
    pub fn reserved_capacity_changed(
        trip_id: TripId,
        reservation_id: ReservationId,
        old_capacity: i32,
        new_capacity: i32,
    ) -> Self {
        TripEvent::ReservedCapacityChanged(ReservedCapacityChangedData {
            trip_id,
            reservation_id,
            old_capacity,
            new_capacity,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_type_tags() {
        let trip_id = TripId::new();
        let reservation_id = ReservationId::new();

        let event = TripEvent::trip_created(trip_id, "Boat trip", 10);
        assert_eq!(event.event_type(), "TripCreated");

        let event = TripEvent::name_changed(trip_id, "A", "B");
        assert_eq!(event.event_type(), "NameChanged");

        let event = TripEvent::capacity_changed(trip_id, 10, 20);
        assert_eq!(event.event_type(), "CapacityChanged");

        let event = TripEvent::reservation_created(trip_id, reservation_id, "John", 2);
        assert_eq!(event.event_type(), "ReservationCreated");

        let event = TripEvent::passenger_name_changed(trip_id, reservation_id, "John", "Jane");
        assert_eq!(event.event_type(), "PassengerNameChanged");

        let event = TripEvent::reserved_capacity_changed(trip_id, reservation_id, 2, 0);
        assert_eq!(event.event_type(), "ReservedCapacityChanged");
    }

    #[test]
    fn event_serialization_roundtrip() {
        let trip_id = TripId::new();
        let event = TripEvent::trip_created(trip_id, "Boat trip", 10);

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("TripCreated"));

        let deserialized: TripEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, event);
    }

    #[test]
    fn cancellation_encodes_as_zero_capacity() {
        let event = TripEvent::reserved_capacity_changed(TripId::new(), ReservationId::new(), 5, 0);

        if let TripEvent::ReservedCapacityChanged(data) = &event {
            assert_eq!(data.new_capacity, 0);
        } else {
            panic!("expected ReservedCapacityChanged");
        }
    }
}

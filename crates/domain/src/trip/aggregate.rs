//! Trip aggregate implementation.

use std::collections::HashMap;

use common::TripId;
use event_store::Version;
use serde::{Deserialize, Serialize};

use crate::aggregate::{Aggregate, SnapshotCapable};

use super::{
    Reservation, ReservationId, TripError, TripEvent, TripSummary,
    events::{
        CapacityChangedData, NameChangedData, PassengerNameChangedData, ReservationCreatedData,
        ReservedCapacityChangedData, TripCreatedData,
    },
};

/// Trip aggregate root.
///
/// A trip holds a total capacity and a set of named reservations, each
/// holding part of that capacity. A capacity of 0 means the trip has not
/// been created yet; that is how "trip does not exist" is represented
/// without a separate existence flag.
///
/// Command methods validate against current state and return the single
/// event to persist (or `None` for an accepted no-op); they never mutate.
/// State changes only through [`Aggregate::apply`], which also runs during
/// log replay and therefore never validates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trip {
    /// The trip identifier. Known from the moment the instance is
    /// addressed, before any event exists.
    id: TripId,

    /// Log position of the last applied event.
    #[serde(default)]
    version: Version,

    /// Trip name.
    name: String,

    /// Total bookable capacity; 0 until the trip is created.
    capacity: i32,

    /// Active reservations, keyed by reservation id.
    reservations: HashMap<ReservationId, Reservation>,
}

impl Trip {
    /// Creates the empty (not-yet-created) state for a trip id.
    pub fn new(id: TripId) -> Self {
        Self {
            id,
            version: Version::initial(),
            name: String::new(),
            capacity: 0,
            reservations: HashMap::new(),
        }
    }

    /// Returns the trip id.
    pub fn id(&self) -> TripId {
        self.id
    }

    /// Returns true once the trip has been created.
    pub fn is_active(&self) -> bool {
        self.capacity != 0
    }

    /// Returns the trip name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the total capacity.
    pub fn capacity(&self) -> i32 {
        self.capacity
    }

    /// Returns the sum of all active reservations' capacities.
    pub fn reserved_capacity(&self) -> i32 {
        self.reservations.values().map(|r| r.capacity).sum()
    }

    /// Returns the current-state summary.
    pub fn summary(&self) -> TripSummary {
        TripSummary {
            name: self.name.clone(),
            total_capacity: self.capacity,
            remaining_capacity: self.capacity - self.reserved_capacity(),
        }
    }

    /// Returns a reservation by id.
    pub fn reservation(&self, reservation_id: &ReservationId) -> Option<&Reservation> {
        self.reservations.get(reservation_id)
    }

    /// Returns an independent snapshot copy of the current reservations,
    /// safe to hand to callers without aliasing the aggregate.
    pub fn list_reservations(&self) -> Vec<Reservation> {
        self.reservations.values().cloned().collect()
    }

    /// Generates a reservation id not currently in use on this trip.
    ///
    /// Collisions in the uniform random id space are negligible but are
    /// structurally re-checked rather than assumed away.
    pub fn new_reservation_id(&self) -> ReservationId {
        loop {
            let id = ReservationId::new();
            if !self.reservations.contains_key(&id) {
                return id;
            }
        }
    }
}

// Command methods: validate, return at most one event, never mutate.
impl Trip {
    /// Creates the trip. Only dispatched in the not-yet-created state.
    pub fn create(&self, name: impl Into<String>, capacity: i32) -> TripEvent {
        TripEvent::trip_created(self.id, name, capacity)
    }

    /// Renames the trip. Renaming to the current name is an accepted
    /// no-op.
    pub fn change_name(&self, name: impl Into<String>) -> Option<TripEvent> {
        let name = name.into();
        if name == self.name {
            return None;
        }
        Some(TripEvent::name_changed(self.id, self.name.clone(), name))
    }

    /// Changes the trip's total capacity.
    ///
    /// The new capacity must be positive and cannot undercut what is
    /// already reserved. Setting the current value is an accepted no-op.
    pub fn change_capacity(&self, capacity: i32) -> Result<Option<TripEvent>, TripError> {
        if capacity <= 0 {
            return Err(TripError::BadRequest(
                "Capacity must be greater than zero".to_string(),
            ));
        }
        if self.reserved_capacity() > capacity {
            return Err(TripError::Conflict(
                "Can not reduce total trip capacity beyond already reserved capacity. \
                 You need to cancel some reservations first."
                    .to_string(),
            ));
        }
        if capacity == self.capacity {
            return Ok(None);
        }
        Ok(Some(TripEvent::capacity_changed(
            self.id,
            self.capacity,
            capacity,
        )))
    }

    /// Creates a reservation holding `capacity` spots.
    ///
    /// Returns the freshly generated reservation id along with the event
    /// that records it.
    pub fn create_reservation(
        &self,
        name: impl Into<String>,
        capacity: i32,
    ) -> Result<(ReservationId, TripEvent), TripError> {
        let reserved_capacity = self.reserved_capacity();

        if capacity <= 0 {
            return Err(TripError::BadRequest(
                "Capacity must be greater than zero".to_string(),
            ));
        }
        if reserved_capacity >= self.capacity {
            return Err(TripError::SoldOut);
        }
        if reserved_capacity + capacity > self.capacity {
            return Err(TripError::NotEnoughCapacity);
        }

        let reservation_id = self.new_reservation_id();
        Ok((
            reservation_id,
            TripEvent::reservation_created(self.id, reservation_id, name, capacity),
        ))
    }

    /// Changes the passenger name on a reservation. Renaming to the
    /// current name is an accepted no-op.
    pub fn change_passenger_name(
        &self,
        reservation_id: ReservationId,
        name: impl Into<String>,
    ) -> Result<Option<TripEvent>, TripError> {
        let existing = self
            .reservations
            .get(&reservation_id)
            .ok_or_else(TripError::reservation_not_found)?;

        let name = name.into();
        if existing.name == name {
            return Ok(None);
        }
        Ok(Some(TripEvent::passenger_name_changed(
            self.id,
            reservation_id,
            existing.name.clone(),
            name,
        )))
    }

    /// Changes the capacity held by a reservation.
    ///
    /// An increase is bounded by the trip's remaining capacity; setting
    /// the current value is an accepted no-op.
    pub fn change_reserved_capacity(
        &self,
        reservation_id: ReservationId,
        capacity: i32,
    ) -> Result<Option<TripEvent>, TripError> {
        let reserved_capacity = self.reserved_capacity();
        let existing = self
            .reservations
            .get(&reservation_id)
            .ok_or_else(TripError::reservation_not_found)?;

        if capacity <= 0 {
            return Err(TripError::BadRequest(
                "Number of reserved spots should be greater than zero".to_string(),
            ));
        }
        if capacity > existing.capacity && reserved_capacity >= self.capacity {
            return Err(TripError::SoldOut);
        }
        if reserved_capacity - existing.capacity + capacity > self.capacity {
            return Err(TripError::NotEnoughCapacity);
        }
        if existing.capacity == capacity {
            return Ok(None);
        }

        Ok(Some(TripEvent::reserved_capacity_changed(
            self.id,
            reservation_id,
            existing.capacity,
            capacity,
        )))
    }

    /// Cancels a reservation, encoded as a capacity change to zero.
    ///
    /// NOTE: existence is checked through the trip's total reserved
    /// capacity, and the event's `old_capacity` records that total, not
    /// the reservation's own capacity. This mirrors the behavior the
    /// service has always had: a cancel for an id that never existed is
    /// accepted while any other reservation still holds capacity (the
    /// resulting event removes nothing when applied).
    pub fn cancel_reservation(
        &self,
        reservation_id: ReservationId,
    ) -> Result<TripEvent, TripError> {
        match self.reserved_capacity() {
            0 => Err(TripError::reservation_not_found()),
            reserved_capacity => Ok(TripEvent::reserved_capacity_changed(
                self.id,
                reservation_id,
                reserved_capacity,
                0,
            )),
        }
    }
}

impl Aggregate for Trip {
    type Event = TripEvent;

    fn aggregate_type() -> &'static str {
        "Trip"
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    fn apply(&mut self, event: Self::Event) {
        match event {
            TripEvent::TripCreated(data) => self.apply_trip_created(data),
            TripEvent::NameChanged(data) => self.apply_name_changed(data),
            TripEvent::CapacityChanged(data) => self.apply_capacity_changed(data),
            TripEvent::ReservationCreated(data) => self.apply_reservation_created(data),
            TripEvent::PassengerNameChanged(data) => self.apply_passenger_name_changed(data),
            TripEvent::ReservedCapacityChanged(data) => self.apply_reserved_capacity_changed(data),
        }
    }
}

impl SnapshotCapable for Trip {
    fn snapshot_interval() -> usize {
        5
    }
}

// Apply event helpers
impl Trip {
    fn apply_trip_created(&mut self, data: TripCreatedData) {
        self.name = data.name;
        self.capacity = data.capacity;
    }

    fn apply_name_changed(&mut self, data: NameChangedData) {
        self.name = data.new_name;
    }

    fn apply_capacity_changed(&mut self, data: CapacityChangedData) {
        self.capacity = data.new_capacity;
    }

    fn apply_reservation_created(&mut self, data: ReservationCreatedData) {
        self.reservations.insert(
            data.reservation_id,
            Reservation::new(data.name, data.capacity),
        );
    }

    fn apply_passenger_name_changed(&mut self, data: PassengerNameChangedData) {
        if let Some(reservation) = self.reservations.get_mut(&data.reservation_id) {
            reservation.name = data.new_name;
        }
    }

    fn apply_reserved_capacity_changed(&mut self, data: ReservedCapacityChangedData) {
        if data.new_capacity == 0 {
            self.reservations.remove(&data.reservation_id);
        } else if let Some(reservation) = self.reservations.get_mut(&data.reservation_id) {
            reservation.capacity = data.new_capacity;
        }
    }
}

//! Trip aggregate and related types.

mod aggregate;
mod commands;
mod error;
mod events;
mod types;

pub use aggregate::Trip;
pub use commands::{ReplyTo, TripCommand};
pub use error::TripError;
pub use events::{
    CapacityChangedData, NameChangedData, PassengerNameChangedData, ReservationCreatedData,
    ReservedCapacityChangedData, TripCreatedData, TripEvent,
};
pub use types::{Reservation, ReservationId, TripSummary};

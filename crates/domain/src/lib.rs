//! Domain layer for the trip booking service.
//!
//! This crate provides the event-sourced Trip aggregate:
//! - `Aggregate` / `DomainEvent` traits for event-sourced entities
//! - the `Trip` state with its invariant-checking command methods
//! - the closed `TripEvent` and `TripCommand` unions
//! - the `TripError` domain taxonomy

pub mod aggregate;
pub mod trip;

pub use aggregate::{Aggregate, DomainEvent, SnapshotCapable};
pub use trip::{
    Reservation, ReservationId, ReplyTo, Trip, TripCommand, TripError, TripEvent, TripSummary,
};

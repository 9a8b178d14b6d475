//! Trip commands.
//!
//! A command is a request to act on one trip. Every variant carries a
//! single-use reply channel typed to that command's reply value; exactly
//! one reply is sent per command, ever: either a success value or a
//! [`TripError`].

use tokio::sync::oneshot;

use super::{Reservation, ReservationId, TripError, TripSummary};

/// Single-use reply destination for a command.
pub type ReplyTo<T> = oneshot::Sender<Result<T, TripError>>;

/// Commands that can be addressed to a trip.
#[derive(Debug)]
pub enum TripCommand {
    /// Create the trip with an initial name and capacity.
    CreateTrip {
        name: String,
        capacity: i32,
        reply: ReplyTo<TripSummary>,
    },

    /// Change the trip's name.
    ChangeName {
        name: String,
        reply: ReplyTo<TripSummary>,
    },

    /// Change the trip's total capacity.
    ChangeCapacity {
        capacity: i32,
        reply: ReplyTo<TripSummary>,
    },

    /// Read the trip's current summary.
    GetTrip { reply: ReplyTo<TripSummary> },

    /// Create a reservation; replies with the generated reservation id.
    CreateReservation {
        name: String,
        capacity: i32,
        reply: ReplyTo<ReservationId>,
    },

    /// Change the passenger name on a reservation.
    ChangePassengerName {
        reservation_id: ReservationId,
        name: String,
        reply: ReplyTo<Reservation>,
    },

    /// Change the capacity held by a reservation.
    ChangeReservedCapacity {
        reservation_id: ReservationId,
        capacity: i32,
        reply: ReplyTo<Reservation>,
    },

    /// Cancel a reservation, releasing its capacity.
    CancelReservation {
        reservation_id: ReservationId,
        reply: ReplyTo<()>,
    },

    /// Read a snapshot of the trip's current reservations.
    ListReservations { reply: ReplyTo<Vec<Reservation>> },
}

impl TripCommand {
    /// Returns the command kind name, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            TripCommand::CreateTrip { .. } => "CreateTrip",
            TripCommand::ChangeName { .. } => "ChangeName",
            TripCommand::ChangeCapacity { .. } => "ChangeCapacity",
            TripCommand::GetTrip { .. } => "GetTrip",
            TripCommand::CreateReservation { .. } => "CreateReservation",
            TripCommand::ChangePassengerName { .. } => "ChangePassengerName",
            TripCommand::ChangeReservedCapacity { .. } => "ChangeReservedCapacity",
            TripCommand::CancelReservation { .. } => "CancelReservation",
            TripCommand::ListReservations { .. } => "ListReservations",
        }
    }

    /// Consumes the command, rejecting it with the given error.
    ///
    /// A dropped receiver is fine: the caller gave up on the reply.
    pub fn reject(self, error: TripError) {
        match self {
            TripCommand::CreateTrip { reply, .. } => {
                let _ = reply.send(Err(error));
            }
            TripCommand::ChangeName { reply, .. } => {
                let _ = reply.send(Err(error));
            }
            TripCommand::ChangeCapacity { reply, .. } => {
                let _ = reply.send(Err(error));
            }
            TripCommand::GetTrip { reply } => {
                let _ = reply.send(Err(error));
            }
            TripCommand::CreateReservation { reply, .. } => {
                let _ = reply.send(Err(error));
            }
            TripCommand::ChangePassengerName { reply, .. } => {
                let _ = reply.send(Err(error));
            }
            TripCommand::ChangeReservedCapacity { reply, .. } => {
                let _ = reply.send(Err(error));
            }
            TripCommand::CancelReservation { reply, .. } => {
                let _ = reply.send(Err(error));
            }
            TripCommand::ListReservations { reply } => {
                let _ = reply.send(Err(error));
            }
        }
    }
}

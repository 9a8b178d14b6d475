//! Domain error taxonomy for trip commands.

use thiserror::Error;

/// Errors a trip command can be rejected with.
///
/// All variants are domain-level: computed synchronously while handling a
/// command, never persisted, and always delivered to the caller as a typed
/// reply. Infrastructure failures are not represented here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TripError {
    /// Malformed or invalid input value (e.g. non-positive capacity).
    #[error("{0}")]
    BadRequest(String),

    /// Unknown trip or reservation id, or a command sent to a trip that
    /// has not been created yet.
    #[error("{0}")]
    NotFound(String),

    /// Capacity reduction below the already-reserved amount.
    #[error("{0}")]
    Conflict(String),

    /// The trip is fully booked; no remaining capacity at all.
    #[error("trip is sold out")]
    SoldOut,

    /// The requested amount exceeds what remains.
    #[error("not enough capacity available")]
    NotEnoughCapacity,
}

impl TripError {
    /// Stable machine-readable error code, used by the gateway to map to
    /// an HTTP status.
    pub fn code(&self) -> &'static str {
        match self {
            TripError::BadRequest(_) => "bad_request",
            TripError::NotFound(_) => "not_found",
            TripError::Conflict(_) => "conflict",
            TripError::SoldOut => "sold_out",
            TripError::NotEnoughCapacity => "not_enough_capacity",
        }
    }

    /// The canonical "unknown trip" rejection, also used for every
    /// command other than creation on a not-yet-created trip.
    pub fn trip_not_found() -> Self {
        TripError::NotFound("Trip not found".to_string())
    }

    /// The canonical "unknown reservation" rejection.
    pub fn reservation_not_found() -> Self {
        TripError::NotFound("Reservation not found".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes_are_stable() {
        assert_eq!(TripError::BadRequest(String::new()).code(), "bad_request");
        assert_eq!(TripError::NotFound(String::new()).code(), "not_found");
        assert_eq!(TripError::Conflict(String::new()).code(), "conflict");
        assert_eq!(TripError::SoldOut.code(), "sold_out");
        assert_eq!(TripError::NotEnoughCapacity.code(), "not_enough_capacity");
    }
}

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a trip.
///
/// Wraps a UUID to provide type safety and prevent mixing up trip IDs
/// with other UUID-based identifiers. The event log, the placement layer,
/// and the gateway all address a trip by this id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TripId(Uuid);

impl TripId {
    /// Creates a new random trip ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a trip ID from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for TripId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TripId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for TripId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<TripId> for Uuid {
    fn from(id: TripId) -> Self {
        id.0
    }
}

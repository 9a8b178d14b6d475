use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{SCHEMA_VERSION, TripId, Version};

/// Number of snapshots retained per trip.
///
/// Saving a snapshot beyond this window discards the oldest retained
/// snapshot and the events it superseded.
pub const RETAINED_SNAPSHOTS: usize = 2;

/// A snapshot of a trip's state at a specific log position.
///
/// Snapshots bound replay cost: recovery loads the most recent snapshot
/// and replays only the events persisted after it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// The trip this snapshot belongs to.
    pub trip_id: TripId,

    /// The log position the trip was at when the snapshot was taken.
    pub version: Version,

    /// When the snapshot was created.
    pub timestamp: DateTime<Utc>,

    /// Schema version of the state payload.
    pub schema_version: u16,

    /// The serialized trip state.
    pub state: serde_json::Value,
}

impl Snapshot {
    /// Creates a new snapshot from a raw JSON state.
    pub fn new(trip_id: TripId, version: Version, state: serde_json::Value) -> Self {
        Self {
            trip_id,
            version,
            timestamp: Utc::now(),
            schema_version: SCHEMA_VERSION,
            state,
        }
    }

    /// Creates a snapshot from a serializable state.
    pub fn from_state<T: Serialize>(
        trip_id: TripId,
        version: Version,
        state: &T,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self::new(trip_id, version, serde_json::to_value(state)?))
    }

    /// Deserializes the snapshot state into a concrete type.
    pub fn into_state<T: for<'de> Deserialize<'de>>(self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.state)
    }
}

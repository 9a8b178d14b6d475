use async_trait::async_trait;

use crate::{EventEnvelope, EventStoreError, Result, Snapshot, TripId, Version};

/// Options for appending events to the store.
#[derive(Debug, Clone, Default)]
pub struct AppendOptions {
    /// Expected current version of the trip's log. If set, the append
    /// fails with `ConcurrencyConflict` when the log has moved past it.
    /// This is the fence that keeps a superseded writer from corrupting
    /// the log after a failover.
    pub expected_version: Option<Version>,
}

impl AppendOptions {
    /// Creates options with no version check.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates options expecting the log to be at a specific version.
    pub fn expect_version(version: Version) -> Self {
        Self {
            expected_version: Some(version),
        }
    }

    /// Creates options expecting the trip to have no events yet.
    pub fn expect_new() -> Self {
        Self {
            expected_version: Some(Version::initial()),
        }
    }
}

/// Core trait for event store implementations.
///
/// Per trip id, the store is a strictly ordered, append-only event
/// sequence plus a small retention window of snapshots. All
/// implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Appends events to a trip's log.
    ///
    /// Events are appended atomically. If `options.expected_version` is
    /// set, the operation fails with `ConcurrencyConflict` when the
    /// current version doesn't match.
    ///
    /// Returns the new version of the log after appending.
    async fn append(&self, events: Vec<EventEnvelope>, options: AppendOptions) -> Result<Version>;

    /// Retrieves all retained events for a trip, in version order
    /// (oldest first).
    async fn events_for_trip(&self, trip_id: TripId) -> Result<Vec<EventEnvelope>>;

    /// Retrieves a trip's events starting from a specific version
    /// (inclusive), in version order. Used to replay the tail after a
    /// snapshot.
    async fn events_for_trip_from(
        &self,
        trip_id: TripId,
        from_version: Version,
    ) -> Result<Vec<EventEnvelope>>;

    /// Gets the current log version of a trip, accounting for events
    /// pruned by snapshot compaction.
    ///
    /// Returns None if the trip has never persisted anything.
    async fn trip_version(&self, trip_id: TripId) -> Result<Option<Version>>;

    /// Saves a snapshot of a trip's state and applies the retention
    /// policy: at most [`crate::RETAINED_SNAPSHOTS`] snapshots are kept,
    /// and events at or below the oldest retained snapshot's version are
    /// pruned.
    async fn save_snapshot(&self, snapshot: Snapshot) -> Result<()>;

    /// Retrieves the most recent snapshot for a trip.
    ///
    /// Returns None if no snapshot exists.
    async fn latest_snapshot(&self, trip_id: TripId) -> Result<Option<Snapshot>>;
}

/// Extension trait providing convenience methods for event stores.
#[async_trait]
pub trait EventStoreExt: EventStore {
    /// Loads everything needed to rebuild a trip: the latest snapshot
    /// (if any) and the events persisted after it, in log order.
    async fn load_trip(&self, trip_id: TripId) -> Result<(Option<Snapshot>, Vec<EventEnvelope>)> {
        if let Some(snapshot) = self.latest_snapshot(trip_id).await? {
            let events = self
                .events_for_trip_from(trip_id, snapshot.version.next())
                .await?;
            Ok((Some(snapshot), events))
        } else {
            let events = self.events_for_trip(trip_id).await?;
            Ok((None, events))
        }
    }
}

// Blanket implementation for all EventStore implementations
impl<T: EventStore + ?Sized> EventStoreExt for T {}

/// Validates events before appending: non-empty, single trip, sequential
/// versions.
pub fn validate_events_for_append(events: &[EventEnvelope]) -> Result<()> {
    let first = events
        .first()
        .ok_or_else(|| EventStoreError::InvalidAppend("empty event list".to_string()))?;

    for event in events.iter().skip(1) {
        if event.trip_id != first.trip_id {
            return Err(EventStoreError::InvalidAppend(
                "all events must belong to the same trip".to_string(),
            ));
        }
    }

    let mut expected_version = first.version;
    for event in events.iter().skip(1) {
        expected_version = expected_version.next();
        if event.version != expected_version {
            return Err(EventStoreError::InvalidAppend(format!(
                "event versions must be sequential: expected {expected_version}, got {}",
                event.version
            )));
        }
    }

    Ok(())
}

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    EventEnvelope, EventStoreError, RETAINED_SNAPSHOTS, Result, Snapshot, TripId, Version,
    store::{AppendOptions, EventStore, validate_events_for_append},
};

/// In-memory event store implementation.
///
/// Used by tests and local runs; provides the same ordering, fencing and
/// retention semantics as the PostgreSQL implementation.
#[derive(Clone, Default)]
pub struct InMemoryEventStore {
    events: Arc<RwLock<Vec<EventEnvelope>>>,
    snapshots: Arc<RwLock<HashMap<TripId, Vec<Snapshot>>>>,
}

impl InMemoryEventStore {
    /// Creates a new empty in-memory event store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of retained events across all trips.
    pub async fn event_count(&self) -> usize {
        self.events.read().await.len()
    }

    /// Returns the number of retained events for one trip.
    pub async fn event_count_for(&self, trip_id: TripId) -> usize {
        self.events
            .read()
            .await
            .iter()
            .filter(|e| e.trip_id == trip_id)
            .count()
    }

    /// Returns the number of retained snapshots for one trip.
    pub async fn snapshot_count_for(&self, trip_id: TripId) -> usize {
        self.snapshots
            .read()
            .await
            .get(&trip_id)
            .map_or(0, Vec::len)
    }

    /// Clears all events and snapshots.
    pub async fn clear(&self) {
        self.events.write().await.clear();
        self.snapshots.write().await.clear();
    }

    fn version_of(events: &[EventEnvelope], snapshots: &[Snapshot], trip_id: TripId) -> Version {
        let event_max = events
            .iter()
            .filter(|e| e.trip_id == trip_id)
            .map(|e| e.version)
            .max();
        let snapshot_max = snapshots.iter().map(|s| s.version).max();
        event_max
            .into_iter()
            .chain(snapshot_max)
            .max()
            .unwrap_or_else(Version::initial)
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn append(&self, events: Vec<EventEnvelope>, options: AppendOptions) -> Result<Version> {
        validate_events_for_append(&events)?;

        let trip_id = events[0].trip_id;
        let first_new_version = events[0].version;

        let mut store = self.events.write().await;
        let snapshots = self.snapshots.read().await;

        let current_version = Self::version_of(
            &store,
            snapshots.get(&trip_id).map_or(&[][..], Vec::as_slice),
            trip_id,
        );

        if let Some(expected) = options.expected_version
            && current_version != expected
        {
            return Err(EventStoreError::ConcurrencyConflict {
                trip_id,
                expected,
                actual: current_version,
            });
        }

        // Unique (trip, version) constraint simulation
        if first_new_version <= current_version && current_version != Version::initial() {
            return Err(EventStoreError::ConcurrencyConflict {
                trip_id,
                expected: options.expected_version.unwrap_or(current_version),
                actual: current_version,
            });
        }

        let last_version = events
            .last()
            .map(|e| e.version)
            .unwrap_or_else(Version::initial);
        store.extend(events);

        Ok(last_version)
    }

    async fn events_for_trip(&self, trip_id: TripId) -> Result<Vec<EventEnvelope>> {
        self.events_for_trip_from(trip_id, Version::first()).await
    }

    async fn events_for_trip_from(
        &self,
        trip_id: TripId,
        from_version: Version,
    ) -> Result<Vec<EventEnvelope>> {
        let store = self.events.read().await;
        let mut events: Vec<_> = store
            .iter()
            .filter(|e| e.trip_id == trip_id && e.version >= from_version)
            .cloned()
            .collect();
        events.sort_by_key(|e| e.version);
        Ok(events)
    }

    async fn trip_version(&self, trip_id: TripId) -> Result<Option<Version>> {
        let events = self.events.read().await;
        let snapshots = self.snapshots.read().await;
        let version = Self::version_of(
            &events,
            snapshots.get(&trip_id).map_or(&[][..], Vec::as_slice),
            trip_id,
        );
        Ok((version != Version::initial()).then_some(version))
    }

    async fn save_snapshot(&self, snapshot: Snapshot) -> Result<()> {
        let trip_id = snapshot.trip_id;

        let mut events = self.events.write().await;
        let mut snapshots = self.snapshots.write().await;

        let retained = snapshots.entry(trip_id).or_default();
        retained.push(snapshot);
        retained.sort_by_key(|s| s.version);
        while retained.len() > RETAINED_SNAPSHOTS {
            retained.remove(0);
        }

        // Events covered by the oldest retained snapshot are compacted away.
        if let Some(oldest) = retained.first().map(|s| s.version) {
            events.retain(|e| e.trip_id != trip_id || e.version > oldest);
        }

        Ok(())
    }

    async fn latest_snapshot(&self, trip_id: TripId) -> Result<Option<Snapshot>> {
        let snapshots = self.snapshots.read().await;
        Ok(snapshots
            .get(&trip_id)
            .and_then(|retained| retained.last().cloned()))
    }
}

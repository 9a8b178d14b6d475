//! Core aggregate and domain event traits.

use event_store::Version;
use serde::{Serialize, de::DeserializeOwned};

/// Trait for domain events.
///
/// Domain events represent facts that have happened in the domain.
/// They are immutable and named in past tense.
pub trait DomainEvent: Serialize + DeserializeOwned + Send + Sync + Clone {
    /// Returns the event kind tag, used for persistence.
    fn event_type(&self) -> &'static str;
}

/// Trait for aggregates in an event-sourced system.
///
/// An aggregate is the consistency boundary whose invariants are enforced
/// atomically. In event sourcing, aggregates:
/// - are rebuilt by replaying events
/// - generate events from commands
/// - apply events to update state (pure, deterministic)
pub trait Aggregate: Send + Sync + Sized {
    /// The type of events this aggregate produces and consumes.
    type Event: DomainEvent;

    /// Returns the aggregate type name, used for log organization.
    fn aggregate_type() -> &'static str;

    /// Returns the current log position of the aggregate.
    ///
    /// Starts at 0 for a fresh aggregate and tracks the version of the
    /// last applied event.
    fn version(&self) -> Version;

    /// Sets the aggregate version. Called after loading or appending
    /// events.
    fn set_version(&mut self, version: Version);

    /// Applies an event to the aggregate, updating its state.
    ///
    /// Must be pure and deterministic: given the same state and event it
    /// always produces the same new state, has no side effects, and never
    /// fails (an event, once persisted, is applied unconditionally). The
    /// same function runs during live command handling and log replay.
    fn apply(&mut self, event: Self::Event);

    /// Applies multiple events in sequence.
    fn apply_events(&mut self, events: impl IntoIterator<Item = Self::Event>) {
        for event in events {
            self.apply(event);
        }
    }
}

/// Trait for aggregates that support snapshotting.
///
/// The aggregate state is periodically serialized and stored so that
/// recovery replays only a bounded tail of events.
pub trait SnapshotCapable: Aggregate + Serialize + DeserializeOwned {
    /// Returns the snapshot interval (number of events between snapshots).
    fn snapshot_interval() -> usize {
        100
    }

    /// Returns whether a snapshot should be taken at the current version.
    fn should_snapshot(&self) -> bool {
        let version = self.version().as_i64();
        version > 0 && (version as usize).is_multiple_of(Self::snapshot_interval())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, Serialize, Deserialize)]
    enum TestEvent {
        Created,
        Bumped { by: i32 },
    }

    impl DomainEvent for TestEvent {
        fn event_type(&self) -> &'static str {
            match self {
                TestEvent::Created => "Created",
                TestEvent::Bumped { .. } => "Bumped",
            }
        }
    }

    #[derive(Debug, Default, Clone, Serialize, Deserialize)]
    struct TestAggregate {
        value: i32,
        version: Version,
    }

    impl Aggregate for TestAggregate {
        type Event = TestEvent;

        fn aggregate_type() -> &'static str {
            "TestAggregate"
        }

        fn version(&self) -> Version {
            self.version
        }

        fn set_version(&mut self, version: Version) {
            self.version = version;
        }

        fn apply(&mut self, event: Self::Event) {
            match event {
                TestEvent::Created => self.value = 1,
                TestEvent::Bumped { by } => self.value += by,
            }
        }
    }

    impl SnapshotCapable for TestAggregate {
        fn snapshot_interval() -> usize {
            5
        }
    }

    #[test]
    fn apply_events_in_sequence() {
        let mut aggregate = TestAggregate::default();
        aggregate.apply_events(vec![TestEvent::Created, TestEvent::Bumped { by: 41 }]);
        assert_eq!(aggregate.value, 42);
    }

    #[test]
    fn snapshot_cadence() {
        let mut aggregate = TestAggregate::default();
        assert!(!aggregate.should_snapshot());

        aggregate.set_version(Version::new(5));
        assert!(aggregate.should_snapshot());

        aggregate.set_version(Version::new(6));
        assert!(!aggregate.should_snapshot());

        aggregate.set_version(Version::new(10));
        assert!(aggregate.should_snapshot());
    }
}

//! Durable, ordered, append-only per-trip event log with snapshot compaction.
//!
//! Events for a trip form a strictly ordered sequence (monotonic [`Version`],
//! starting at 1). Appends can be fenced with an expected version so that a
//! superseded writer cannot corrupt the log after a failover. A snapshot is
//! taken every few events and at most the two most recent snapshots are
//! retained per trip; events superseded by the oldest retained snapshot are
//! pruned, bounding replay cost regardless of trip age.

pub mod error;
pub mod event;
pub mod memory;
pub mod postgres;
pub mod snapshot;
pub mod store;

pub use common::TripId;
pub use error::{EventStoreError, Result};
pub use event::{EventEnvelope, EventEnvelopeBuilder, EventId, SCHEMA_VERSION, Version};
pub use memory::InMemoryEventStore;
pub use postgres::PostgresEventStore;
pub use snapshot::{RETAINED_SNAPSHOTS, Snapshot};
pub use store::{AppendOptions, EventStore, EventStoreExt};

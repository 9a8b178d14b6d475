//! PostgreSQL integration tests
//!
//! These tests use a shared PostgreSQL container for efficiency.
//! Run with:
//!
//! ```bash
//! cargo test -p event-store --test postgres_integration
//! ```

use std::sync::Arc;

use event_store::{
    AppendOptions, EventEnvelope, EventStore, EventStoreError, EventStoreExt, PostgresEventStore,
    Snapshot, TripId, Version,
};
use serial_test::serial;
use sqlx::PgPool;
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

/// Global shared container
static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            // Create a temporary pool just for schema setup
            let temp_pool = PgPool::connect(&connection_string).await.unwrap();

            sqlx::raw_sql(include_str!("../../../migrations/001_create_event_store.sql"))
                .execute(&temp_pool)
                .await
                .unwrap();

            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Get a fresh store with its own pool and cleared tables
async fn get_test_store() -> PostgresEventStore {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    sqlx::query("TRUNCATE TABLE events, snapshots")
        .execute(&pool)
        .await
        .unwrap();

    PostgresEventStore::new(pool)
}

fn create_test_event(trip_id: TripId, version: Version, event_type: &str) -> EventEnvelope {
    EventEnvelope::builder()
        .trip_id(trip_id)
        .event_type(event_type)
        .version(version)
        .payload_raw(serde_json::json!({"test": true}))
        .build()
}

#[tokio::test]
#[serial]
async fn append_and_read_back_in_order() {
    let store = get_test_store().await;
    let trip_id = TripId::new();

    let events = vec![
        create_test_event(trip_id, Version::new(1), "TripCreated"),
        create_test_event(trip_id, Version::new(2), "NameChanged"),
        create_test_event(trip_id, Version::new(3), "CapacityChanged"),
    ];
    let version = store
        .append(events, AppendOptions::expect_new())
        .await
        .unwrap();
    assert_eq!(version, Version::new(3));

    let stored = store.events_for_trip(trip_id).await.unwrap();
    assert_eq!(stored.len(), 3);
    assert_eq!(stored[0].event_type, "TripCreated");
    assert_eq!(stored[2].version, Version::new(3));
}

#[tokio::test]
#[serial]
async fn expected_version_mismatch_is_a_conflict() {
    let store = get_test_store().await;
    let trip_id = TripId::new();

    store
        .append(
            vec![create_test_event(trip_id, Version::first(), "TripCreated")],
            AppendOptions::expect_new(),
        )
        .await
        .unwrap();

    let result = store
        .append(
            vec![create_test_event(trip_id, Version::new(2), "NameChanged")],
            AppendOptions::expect_version(Version::initial()),
        )
        .await;

    assert!(matches!(
        result,
        Err(EventStoreError::ConcurrencyConflict { .. })
    ));
}

#[tokio::test]
#[serial]
async fn duplicate_version_violates_unique_constraint() {
    let store = get_test_store().await;
    let trip_id = TripId::new();

    store
        .append(
            vec![create_test_event(trip_id, Version::first(), "TripCreated")],
            AppendOptions::new(),
        )
        .await
        .unwrap();

    // No expected-version fence, but the constraint still rejects it.
    let result = store
        .append(
            vec![create_test_event(trip_id, Version::first(), "NameChanged")],
            AppendOptions::new(),
        )
        .await;

    assert!(matches!(
        result,
        Err(EventStoreError::ConcurrencyConflict { .. })
    ));
}

#[tokio::test]
#[serial]
async fn snapshot_retention_and_event_compaction() {
    let store = get_test_store().await;
    let trip_id = TripId::new();

    let events: Vec<_> = (1..=10)
        .map(|v| create_test_event(trip_id, Version::new(v), "NameChanged"))
        .collect();
    store.append(events, AppendOptions::new()).await.unwrap();

    for v in [5, 10, 15] {
        store
            .save_snapshot(Snapshot::new(
                trip_id,
                Version::new(v),
                serde_json::json!({"v": v}),
            ))
            .await
            .unwrap();
    }

    // Two most recent snapshots retained; latest wins on load.
    let latest = store.latest_snapshot(trip_id).await.unwrap().unwrap();
    assert_eq!(latest.version, Version::new(15));

    // Events at or below the oldest retained snapshot (v10) are pruned.
    let remaining = store.events_for_trip(trip_id).await.unwrap();
    assert!(remaining.is_empty());

    // The log position survives compaction.
    assert_eq!(
        store.trip_version(trip_id).await.unwrap(),
        Some(Version::new(15))
    );
}

#[tokio::test]
#[serial]
async fn load_trip_returns_snapshot_and_tail() {
    let store = get_test_store().await;
    let trip_id = TripId::new();

    let events: Vec<_> = (1..=7)
        .map(|v| create_test_event(trip_id, Version::new(v), "NameChanged"))
        .collect();
    store.append(events, AppendOptions::new()).await.unwrap();
    store
        .save_snapshot(Snapshot::new(
            trip_id,
            Version::new(5),
            serde_json::json!({"state": "at-5"}),
        ))
        .await
        .unwrap();

    let (snapshot, tail) = store.load_trip(trip_id).await.unwrap();
    assert_eq!(snapshot.unwrap().version, Version::new(5));
    assert_eq!(tail.len(), 2);
    assert_eq!(tail[0].version, Version::new(6));
    assert_eq!(tail[1].version, Version::new(7));
}

#[tokio::test]
#[serial]
async fn fenced_append_works_after_full_compaction() {
    let store = get_test_store().await;
    let trip_id = TripId::new();

    let events: Vec<_> = (1..=5)
        .map(|v| create_test_event(trip_id, Version::new(v), "NameChanged"))
        .collect();
    store.append(events, AppendOptions::new()).await.unwrap();
    store
        .save_snapshot(Snapshot::new(
            trip_id,
            Version::new(5),
            serde_json::json!({}),
        ))
        .await
        .unwrap();

    assert!(store.events_for_trip(trip_id).await.unwrap().is_empty());

    let result = store
        .append(
            vec![create_test_event(trip_id, Version::new(6), "NameChanged")],
            AppendOptions::expect_version(Version::new(5)),
        )
        .await;
    assert_eq!(result.unwrap(), Version::new(6));
}

#[tokio::test]
#[serial]
async fn schema_version_round_trips() {
    let store = get_test_store().await;
    let trip_id = TripId::new();

    let event = EventEnvelope::builder()
        .trip_id(trip_id)
        .event_type("TripCreated")
        .version(Version::first())
        .schema_version(7)
        .payload_raw(serde_json::json!({}))
        .build();
    store
        .append(vec![event], AppendOptions::expect_new())
        .await
        .unwrap();

    let stored = store.events_for_trip(trip_id).await.unwrap();
    assert_eq!(stored[0].schema_version, 7);
}

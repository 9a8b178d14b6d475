use criterion::{Criterion, criterion_group, criterion_main};
use event_store::{
    AppendOptions, EventEnvelope, EventStore, EventStoreExt, InMemoryEventStore, Snapshot, TripId,
    Version,
};

fn make_event(trip_id: TripId, version: i64) -> EventEnvelope {
    EventEnvelope::builder()
        .trip_id(trip_id)
        .event_type("NameChanged")
        .version(Version::new(version))
        .payload_raw(serde_json::json!({"new_name": "bench"}))
        .build()
}

fn bench_append(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("event_store/append_10_events", |b| {
        b.iter(|| {
            rt.block_on(async {
                let store = InMemoryEventStore::new();
                let trip_id = TripId::new();
                for v in 1..=10 {
                    store
                        .append(
                            vec![make_event(trip_id, v)],
                            AppendOptions::expect_version(Version::new(v - 1)),
                        )
                        .await
                        .unwrap();
                }
            });
        });
    });
}

fn bench_load_with_snapshot(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = InMemoryEventStore::new();
    let trip_id = TripId::new();

    rt.block_on(async {
        for v in 1..=10 {
            store
                .append(vec![make_event(trip_id, v)], AppendOptions::new())
                .await
                .unwrap();
        }
        store
            .save_snapshot(Snapshot::new(
                trip_id,
                Version::new(5),
                serde_json::json!({"name": "bench"}),
            ))
            .await
            .unwrap();
    });

    c.bench_function("event_store/load_trip_snapshot_plus_tail", |b| {
        b.iter(|| {
            rt.block_on(async { store.load_trip(trip_id).await.unwrap() });
        });
    });
}

criterion_group!(benches, bench_append, bench_load_with_snapshot);
criterion_main!(benches);

//! Replay tests for the Trip aggregate.
//!
//! Event application must be deterministic: rebuilding a trip from its
//! event log through the pure apply function yields exactly the state the
//! live command sequence produced.

use common::TripId;
use domain::{Aggregate, Trip, TripEvent};

/// Runs a command script against a live trip, collecting the emitted
/// events, then replays those events onto a fresh instance.
fn live_and_replayed(
    trip_id: TripId,
    script: impl Fn(&mut Trip, &mut Vec<TripEvent>),
) -> (Trip, Trip) {
    let mut live = Trip::new(trip_id);
    let mut log = Vec::new();
    script(&mut live, &mut log);

    let mut replayed = Trip::new(trip_id);
    replayed.apply_events(log);

    (live, replayed)
}

fn emit(trip: &mut Trip, log: &mut Vec<TripEvent>, event: TripEvent) {
    log.push(event.clone());
    trip.apply(event);
}

#[test]
fn replaying_full_log_matches_live_state() {
    let (live, replayed) = live_and_replayed(TripId::new(), |trip, log| {
        let event = trip.create("Boat trip", 10);
        emit(trip, log, event);

        let (_, event) = trip.create_reservation("John", 4).unwrap();
        emit(trip, log, event);

        let event = trip.change_name("Train trip").unwrap();
        emit(trip, log, event);

        let event = trip.change_capacity(20).unwrap().unwrap();
        emit(trip, log, event);

        let (_, event) = trip.create_reservation("Jane", 6).unwrap();
        emit(trip, log, event);
    });

    assert_eq!(live, replayed);
    assert_eq!(replayed.summary().remaining_capacity, 10);
}

#[test]
fn replay_reproduces_cancellations() {
    let (live, replayed) = live_and_replayed(TripId::new(), |trip, log| {
        let event = trip.create("Boat trip", 10);
        emit(trip, log, event);

        let (reservation_id, created) = trip.create_reservation("John", 8).unwrap();
        emit(trip, log, created);

        let event = trip
            .change_reserved_capacity(reservation_id, 2)
            .unwrap()
            .unwrap();
        emit(trip, log, event);

        let event = trip.cancel_reservation(reservation_id).unwrap();
        emit(trip, log, event);
    });

    assert_eq!(live, replayed);
    assert!(replayed.list_reservations().is_empty());
    assert_eq!(replayed.summary().remaining_capacity, 10);
}

#[test]
fn capacity_invariant_holds_along_every_prefix() {
    let mut trip = Trip::new(TripId::new());
    let mut log = Vec::new();

    let event = trip.create("Boat trip", 12);
    emit(&mut trip, &mut log, event);
    for (name, capacity) in [("John", 5), ("Jane", 4), ("Ron", 3)] {
        let (_, event) = trip.create_reservation(name, capacity).unwrap();
        emit(&mut trip, &mut log, event);
    }

    // Every prefix of the log is a reachable state; the invariant must
    // hold at each of them.
    for prefix_len in 0..=log.len() {
        let mut state = Trip::new(trip.id());
        state.apply_events(log[..prefix_len].iter().cloned());
        assert!(
            state.reserved_capacity() <= state.capacity() || !state.is_active(),
            "invariant violated after {prefix_len} events"
        );
    }
}

#[test]
fn rejected_commands_leave_no_trace_in_the_log() {
    let mut trip = Trip::new(TripId::new());
    let mut log = Vec::new();

    let event = trip.create("Boat trip", 10);
    emit(&mut trip, &mut log, event);
    let (_, event) = trip.create_reservation("John", 10).unwrap();
    emit(&mut trip, &mut log, event);

    assert!(trip.create_reservation("Ron", 1).is_err());
    assert!(trip.change_capacity(5).is_err());

    let mut replayed = Trip::new(trip.id());
    replayed.apply_events(log);
    assert_eq!(trip, replayed);
}

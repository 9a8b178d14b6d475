//! The per-trip Command Processor instance.
//!
//! Exactly one instance per trip id is live at a time (enforced by the
//! [`crate::TripRegistry`]); it owns the trip's in-memory state and
//! processes its mailbox strictly sequentially, so no locking is needed
//! around the aggregate. Every accepted mutating command persists exactly
//! one event before any reply is sent, and replies are computed from the
//! post-application state.

use std::collections::HashMap;
use std::sync::Arc;

use common::TripId;
use domain::{
    Aggregate, DomainEvent, SnapshotCapable, Trip, TripCommand, TripError, TripEvent,
};
use event_store::{
    AppendOptions, EventEnvelope, EventStore, EventStoreError, EventStoreExt, Snapshot, Version,
};
use tokio::sync::{Mutex, mpsc};

use crate::config::RuntimeConfig;

/// Owner table shared between the registry and its entity tasks.
pub(crate) type OwnerTable = Arc<Mutex<HashMap<TripId, mpsc::Sender<TripCommand>>>>;

pub(crate) struct TripEntity<S> {
    id: TripId,
    store: S,
    state: Trip,
}

impl<S: EventStore> TripEntity<S> {
    pub(crate) fn new(id: TripId, store: S) -> Self {
        Self {
            id,
            store,
            state: Trip::new(id),
        }
    }

    pub(crate) fn id(&self) -> TripId {
        self.id
    }

    /// Rebuilds state from the latest snapshot plus the event tail.
    async fn recover(&mut self) -> Result<(), EventStoreError> {
        let (snapshot, events) = self.store.load_trip(self.id).await?;

        let mut state = match snapshot {
            Some(snapshot) => {
                let version = snapshot.version;
                let mut state: Trip = snapshot.into_state()?;
                state.set_version(version);
                state
            }
            None => Trip::new(self.id),
        };

        for envelope in events {
            let event: TripEvent = serde_json::from_value(envelope.payload)?;
            state.apply(event);
            state.set_version(envelope.version);
        }

        self.state = state;
        Ok(())
    }

    /// Appends the event (fenced by the current version), applies it, and
    /// takes a snapshot when the cadence says so.
    ///
    /// Called only after validation accepted the command; an error here
    /// is infrastructure trouble and terminates the instance.
    async fn persist(&mut self, event: TripEvent) -> Result<(), EventStoreError> {
        let current_version = self.state.version();

        let envelope = EventEnvelope::builder()
            .trip_id(self.id)
            .event_type(event.event_type())
            .version(current_version.next())
            .payload(&event)?
            .build();

        let options = if current_version == Version::initial() {
            AppendOptions::expect_new()
        } else {
            AppendOptions::expect_version(current_version)
        };

        let new_version = self.store.append(vec![envelope], options).await?;

        self.state.apply(event);
        self.state.set_version(new_version);

        if self.state.should_snapshot() {
            // Snapshots are an optimization; failing to take one must not
            // fail the already-persisted command.
            match Snapshot::from_state(self.id, new_version, &self.state) {
                Ok(snapshot) => {
                    if let Err(error) = self.store.save_snapshot(snapshot).await {
                        tracing::warn!(trip_id = %self.id, %error, "snapshot save failed");
                    }
                }
                Err(error) => {
                    tracing::warn!(trip_id = %self.id, %error, "snapshot serialization failed");
                }
            }
        }

        Ok(())
    }

    /// Processes one command: dispatch on state, validate, persist at
    /// most one event, send exactly one reply.
    async fn handle(&mut self, command: TripCommand) -> Result<(), EventStoreError> {
        metrics::counter!("booking_commands_total").increment(1);
        tracing::debug!(trip_id = %self.id, kind = command.kind(), "handling command");

        // A trip that has not been created accepts only creation; every
        // other command kind is how "trip does not exist" surfaces.
        if !self.state.is_active() {
            return match command {
                TripCommand::CreateTrip {
                    name,
                    capacity,
                    reply,
                } => {
                    let event = self.state.create(name, capacity);
                    self.persist(event).await?;
                    let _ = reply.send(Ok(self.state.summary()));
                    Ok(())
                }
                other => {
                    other.reject(TripError::trip_not_found());
                    Ok(())
                }
            };
        }

        match command {
            // Creation of an already-created trip falls through to the
            // same rejection as any unroutable command.
            TripCommand::CreateTrip { reply, .. } => {
                let _ = reply.send(Err(TripError::trip_not_found()));
            }

            TripCommand::ChangeName { name, reply } => {
                if let Some(event) = self.state.change_name(name) {
                    self.persist(event).await?;
                }
                let _ = reply.send(Ok(self.state.summary()));
            }

            TripCommand::ChangeCapacity { capacity, reply } => {
                match self.state.change_capacity(capacity) {
                    Ok(Some(event)) => {
                        self.persist(event).await?;
                        let _ = reply.send(Ok(self.state.summary()));
                    }
                    Ok(None) => {
                        let _ = reply.send(Ok(self.state.summary()));
                    }
                    Err(error) => {
                        let _ = reply.send(Err(error));
                    }
                }
            }

            TripCommand::GetTrip { reply } => {
                let _ = reply.send(Ok(self.state.summary()));
            }

            TripCommand::CreateReservation {
                name,
                capacity,
                reply,
            } => match self.state.create_reservation(name, capacity) {
                Ok((reservation_id, event)) => {
                    self.persist(event).await?;
                    let _ = reply.send(Ok(reservation_id));
                }
                Err(error) => {
                    let _ = reply.send(Err(error));
                }
            },

            TripCommand::ChangePassengerName {
                reservation_id,
                name,
                reply,
            } => match self.state.change_passenger_name(reservation_id, name) {
                Ok(maybe_event) => {
                    if let Some(event) = maybe_event {
                        self.persist(event).await?;
                    }
                    let _ = reply.send(self.reservation_reply(reservation_id));
                }
                Err(error) => {
                    let _ = reply.send(Err(error));
                }
            },

            TripCommand::ChangeReservedCapacity {
                reservation_id,
                capacity,
                reply,
            } => match self.state.change_reserved_capacity(reservation_id, capacity) {
                Ok(maybe_event) => {
                    if let Some(event) = maybe_event {
                        self.persist(event).await?;
                    }
                    let _ = reply.send(self.reservation_reply(reservation_id));
                }
                Err(error) => {
                    let _ = reply.send(Err(error));
                }
            },

            TripCommand::CancelReservation {
                reservation_id,
                reply,
            } => match self.state.cancel_reservation(reservation_id) {
                Ok(event) => {
                    self.persist(event).await?;
                    let _ = reply.send(Ok(()));
                }
                Err(error) => {
                    let _ = reply.send(Err(error));
                }
            },

            TripCommand::ListReservations { reply } => {
                let _ = reply.send(Ok(self.state.list_reservations()));
            }
        }

        Ok(())
    }

    /// Reply value for reservation updates, read back from the
    /// post-application state.
    fn reservation_reply(
        &self,
        reservation_id: domain::ReservationId,
    ) -> Result<domain::Reservation, TripError> {
        self.state
            .reservation(&reservation_id)
            .cloned()
            .ok_or_else(TripError::reservation_not_found)
    }
}

/// Runs one trip instance to completion: recover (with backoff), serve
/// the mailbox until idle or failure, then deregister.
pub(crate) async fn run_entity<S: EventStore>(
    mut entity: TripEntity<S>,
    mut mailbox: mpsc::Receiver<TripCommand>,
    self_sender: mpsc::Sender<TripCommand>,
    owners: OwnerTable,
    config: RuntimeConfig,
) {
    metrics::counter!("booking_entities_activated").increment(1);

    // Activation: state must be rebuilt before the first command is
    // handled. Infrastructure faults self-heal behind backoff instead of
    // failing commands.
    let mut attempt: u32 = 0;
    loop {
        match entity.recover().await {
            Ok(()) => break,
            Err(error) => {
                attempt += 1;
                metrics::counter!("booking_recovery_retries_total").increment(1);
                let delay = config.retry_policy.delay(attempt);
                tracing::warn!(
                    trip_id = %entity.id(),
                    %error,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "recovery failed, retrying with backoff"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }

    tracing::debug!(
        trip_id = %entity.id(),
        version = entity.state.version().as_i64(),
        "trip instance activated"
    );

    let mut failed = false;
    loop {
        tokio::select! {
            received = mailbox.recv() => match received {
                Some(command) => {
                    if let Err(error) = entity.handle(command).await {
                        // The reply channel for the failed command was
                        // dropped unanswered: the caller sees a transport
                        // error, never a domain one. A fresh instance
                        // will recover from the durable log.
                        tracing::error!(trip_id = %entity.id(), %error, "persist failed, stopping instance");
                        failed = true;
                        break;
                    }
                }
                None => break,
            },
            () = tokio::time::sleep(config.passivate_after) => {
                tracing::debug!(trip_id = %entity.id(), "passivating idle trip instance");
                metrics::counter!("booking_entities_passivated").increment(1);
                break;
            }
        }
    }

    // Stop accepting new commands, then settle what was already buffered.
    // Appends stay fenced by expected version, so even if a successor
    // activates while we drain, the log cannot be corrupted.
    mailbox.close();
    while let Ok(command) = mailbox.try_recv() {
        if failed {
            // Unknown-outcome semantics: drop without a reply.
            drop(command);
        } else if entity.handle(command).await.is_err() {
            failed = true;
        }
    }

    let mut owners = owners.lock().await;
    if owners
        .get(&entity.id())
        .is_some_and(|sender| sender.same_channel(&self_sender))
    {
        owners.remove(&entity.id());
    }
}

//! The placement abstraction: trip id → owning instance.
//!
//! The registry holds the cluster's owner table. Looking up a trip either
//! finds its live instance's mailbox or activates a fresh instance; the
//! mailbox serializes commands, which is what makes the single-writer
//! guarantee hold. Passivated or failed instances deregister themselves
//! and the next command re-activates.

use std::collections::HashMap;
use std::sync::Arc;

use common::TripId;
use domain::{ReplyTo, Reservation, ReservationId, TripCommand, TripSummary};
use event_store::EventStore;
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio::time::timeout;

use crate::config::RuntimeConfig;
use crate::entity::{OwnerTable, TripEntity, run_entity};
use crate::error::AskError;

/// Routes commands to the single live instance per trip id, activating
/// instances on demand.
pub struct TripRegistry<S> {
    owners: OwnerTable,
    store: S,
    config: RuntimeConfig,
}

impl<S> TripRegistry<S>
where
    S: EventStore + Clone + 'static,
{
    /// Creates a registry over the given event store.
    pub fn new(store: S, config: RuntimeConfig) -> Self {
        Self {
            owners: Arc::new(Mutex::new(HashMap::new())),
            store,
            config,
        }
    }

    /// Number of currently active trip instances.
    pub async fn active_instances(&self) -> usize {
        self.owners.lock().await.len()
    }

    /// Sends one command to the trip's instance and awaits its single
    /// reply.
    ///
    /// `make` is called with a fresh reply channel; it may run twice when
    /// the first delivery races a passivating instance. A timeout or a
    /// terminated instance means the outcome is unknown, not that the
    /// command failed.
    pub async fn ask<T, F>(&self, trip_id: TripId, make: F) -> Result<T, AskError>
    where
        F: Fn(ReplyTo<T>) -> TripCommand,
    {
        const DELIVERY_ATTEMPTS: usize = 2;

        for _ in 0..DELIVERY_ATTEMPTS {
            let mailbox = self.mailbox(trip_id).await;
            let (reply_tx, reply_rx) = oneshot::channel();

            if mailbox.send(make(reply_tx)).await.is_err() {
                // The instance closed its mailbox (passivation race);
                // the next lookup activates a successor.
                continue;
            }

            return match timeout(self.config.ask_timeout, reply_rx).await {
                Ok(Ok(Ok(value))) => Ok(value),
                Ok(Ok(Err(domain_error))) => Err(AskError::Domain(domain_error)),
                Ok(Err(_dropped)) => Err(AskError::Terminated),
                Err(_elapsed) => Err(AskError::Timeout),
            };
        }

        Err(AskError::Terminated)
    }

    /// Returns the trip's mailbox, activating an instance if none is
    /// live.
    async fn mailbox(&self, trip_id: TripId) -> mpsc::Sender<TripCommand> {
        let mut owners = self.owners.lock().await;

        if let Some(sender) = owners.get(&trip_id)
            && !sender.is_closed()
        {
            return sender.clone();
        }

        let (sender, receiver) = mpsc::channel(self.config.mailbox_capacity);
        owners.insert(trip_id, sender.clone());

        let entity = TripEntity::new(trip_id, self.store.clone());
        tokio::spawn(run_entity(
            entity,
            receiver,
            sender.clone(),
            Arc::clone(&self.owners),
            self.config.clone(),
        ));

        sender
    }
}

// Command-shaped convenience surface, one method per command kind.
impl<S> TripRegistry<S>
where
    S: EventStore + Clone + 'static,
{
    /// Creates a trip and returns its initial summary.
    #[tracing::instrument(skip(self, name))]
    pub async fn create_trip(
        &self,
        trip_id: TripId,
        name: impl Into<String>,
        capacity: i32,
    ) -> Result<TripSummary, AskError> {
        let name = name.into();
        self.ask(trip_id, |reply| TripCommand::CreateTrip {
            name: name.clone(),
            capacity,
            reply,
        })
        .await
    }

    /// Reads the trip's current summary.
    #[tracing::instrument(skip(self))]
    pub async fn get_trip(&self, trip_id: TripId) -> Result<TripSummary, AskError> {
        self.ask(trip_id, |reply| TripCommand::GetTrip { reply })
            .await
    }

    /// Renames the trip.
    #[tracing::instrument(skip(self, name))]
    pub async fn change_name(
        &self,
        trip_id: TripId,
        name: impl Into<String>,
    ) -> Result<TripSummary, AskError> {
        let name = name.into();
        self.ask(trip_id, |reply| TripCommand::ChangeName {
            name: name.clone(),
            reply,
        })
        .await
    }

    /// Changes the trip's total capacity.
    #[tracing::instrument(skip(self))]
    pub async fn change_capacity(
        &self,
        trip_id: TripId,
        capacity: i32,
    ) -> Result<TripSummary, AskError> {
        self.ask(trip_id, |reply| TripCommand::ChangeCapacity {
            capacity,
            reply,
        })
        .await
    }

    /// Creates a reservation and returns its generated id.
    #[tracing::instrument(skip(self, name))]
    pub async fn create_reservation(
        &self,
        trip_id: TripId,
        name: impl Into<String>,
        capacity: i32,
    ) -> Result<ReservationId, AskError> {
        let name = name.into();
        self.ask(trip_id, |reply| TripCommand::CreateReservation {
            name: name.clone(),
            capacity,
            reply,
        })
        .await
    }

    /// Changes the passenger name on a reservation.
    #[tracing::instrument(skip(self, name))]
    pub async fn change_passenger_name(
        &self,
        trip_id: TripId,
        reservation_id: ReservationId,
        name: impl Into<String>,
    ) -> Result<Reservation, AskError> {
        let name = name.into();
        self.ask(trip_id, |reply| TripCommand::ChangePassengerName {
            reservation_id,
            name: name.clone(),
            reply,
        })
        .await
    }

    /// Changes the capacity held by a reservation.
    #[tracing::instrument(skip(self))]
    pub async fn change_reserved_capacity(
        &self,
        trip_id: TripId,
        reservation_id: ReservationId,
        capacity: i32,
    ) -> Result<Reservation, AskError> {
        self.ask(trip_id, |reply| TripCommand::ChangeReservedCapacity {
            reservation_id,
            capacity,
            reply,
        })
        .await
    }

    /// Cancels a reservation.
    #[tracing::instrument(skip(self))]
    pub async fn cancel_reservation(
        &self,
        trip_id: TripId,
        reservation_id: ReservationId,
    ) -> Result<(), AskError> {
        self.ask(trip_id, |reply| TripCommand::CancelReservation {
            reservation_id,
            reply,
        })
        .await
    }

    /// Lists the trip's current reservations.
    #[tracing::instrument(skip(self))]
    pub async fn list_reservations(&self, trip_id: TripId) -> Result<Vec<Reservation>, AskError> {
        self.ask(trip_id, |reply| TripCommand::ListReservations { reply })
            .await
    }
}

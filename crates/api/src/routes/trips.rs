//! Trip and reservation endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use common::TripId;
use domain::{Reservation, ReservationId, TripSummary};
use event_store::EventStore;
use runtime::TripRegistry;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<S> {
    pub registry: TripRegistry<S>,
}

// -- Request types --

#[derive(Deserialize)]
pub struct CreateTripRequest {
    pub name: String,
    pub capacity: i32,
}

#[derive(Deserialize)]
pub struct CreateReservationRequest {
    pub name: String,
    pub capacity: i32,
}

// -- Handlers --

/// POST / — create a new trip.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<CreateTripRequest>,
) -> Result<(StatusCode, [(header::HeaderName, String); 1], Json<TripSummary>), ApiError> {
    let trip_id = TripId::new();
    let summary = state
        .registry
        .create_trip(trip_id, req.name, req.capacity)
        .await?;

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, format!("/{trip_id}"))],
        Json(summary),
    ))
}

/// GET /:id — current trip summary.
#[tracing::instrument(skip(state))]
pub async fn get<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<Uuid>,
) -> Result<Json<TripSummary>, ApiError> {
    let summary = state.registry.get_trip(TripId::from_uuid(id)).await?;
    Ok(Json(summary))
}

/// PATCH /:id/name — rename the trip. Body is a JSON string.
#[tracing::instrument(skip(state, name))]
pub async fn change_name<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<Uuid>,
    Json(name): Json<String>,
) -> Result<Json<TripSummary>, ApiError> {
    let summary = state
        .registry
        .change_name(TripId::from_uuid(id), name)
        .await?;
    Ok(Json(summary))
}

/// PATCH /:id/capacity — change total capacity. Body is a JSON integer.
#[tracing::instrument(skip(state))]
pub async fn change_capacity<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<Uuid>,
    Json(capacity): Json<i32>,
) -> Result<Json<TripSummary>, ApiError> {
    let summary = state
        .registry
        .change_capacity(TripId::from_uuid(id), capacity)
        .await?;
    Ok(Json(summary))
}

/// POST /:id/reservations — create a reservation.
#[tracing::instrument(skip(state, req))]
pub async fn create_reservation<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<Uuid>,
    Json(req): Json<CreateReservationRequest>,
) -> Result<(StatusCode, [(header::HeaderName, String); 1], Json<Reservation>), ApiError> {
    let trip_id = TripId::from_uuid(id);
    let reservation_id = state
        .registry
        .create_reservation(trip_id, req.name.clone(), req.capacity)
        .await?;

    Ok((
        StatusCode::CREATED,
        [(
            header::LOCATION,
            format!("/{trip_id}/reservations/{reservation_id}"),
        )],
        Json(Reservation::new(req.name, req.capacity)),
    ))
}

/// GET /:id/reservations — snapshot of current reservations.
#[tracing::instrument(skip(state))]
pub async fn list_reservations<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Reservation>>, ApiError> {
    let reservations = state
        .registry
        .list_reservations(TripId::from_uuid(id))
        .await?;
    Ok(Json(reservations))
}

/// PATCH /:id/reservations/:rid/name — change the passenger name.
#[tracing::instrument(skip(state, name))]
pub async fn change_passenger_name<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path((id, rid)): Path<(Uuid, Uuid)>,
    Json(name): Json<String>,
) -> Result<Json<Reservation>, ApiError> {
    let reservation = state
        .registry
        .change_passenger_name(TripId::from_uuid(id), ReservationId::from_uuid(rid), name)
        .await?;
    Ok(Json(reservation))
}

/// PATCH /:id/reservations/:rid/capacity — change the reserved capacity.
#[tracing::instrument(skip(state))]
pub async fn change_reserved_capacity<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path((id, rid)): Path<(Uuid, Uuid)>,
    Json(capacity): Json<i32>,
) -> Result<Json<Reservation>, ApiError> {
    let reservation = state
        .registry
        .change_reserved_capacity(
            TripId::from_uuid(id),
            ReservationId::from_uuid(rid),
            capacity,
        )
        .await?;
    Ok(Json(reservation))
}

/// DELETE /:id/reservations/:rid — cancel a reservation.
#[tracing::instrument(skip(state))]
pub async fn cancel_reservation<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path((id, rid)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
    state
        .registry
        .cancel_reservation(TripId::from_uuid(id), ReservationId::from_uuid(rid))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

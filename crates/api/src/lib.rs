//! HTTP gateway for the trip booking service.
//!
//! A thin translation layer: each route parses its input, issues exactly
//! one typed command to the core through the placement layer, and renders
//! the single reply (or typed error) as JSON. Structured logging
//! (tracing) and Prometheus metrics ride along.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, patch, post};
use event_store::EventStore;
use metrics_exporter_prometheus::PrometheusHandle;
use runtime::{RuntimeConfig, TripRegistry};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::trips::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: EventStore + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/", post(routes::trips::create::<S>))
        .route("/{id}", get(routes::trips::get::<S>))
        .route("/{id}/name", patch(routes::trips::change_name::<S>))
        .route("/{id}/capacity", patch(routes::trips::change_capacity::<S>))
        .route(
            "/{id}/reservations",
            post(routes::trips::create_reservation::<S>)
                .get(routes::trips::list_reservations::<S>),
        )
        .route(
            "/{id}/reservations/{rid}/name",
            patch(routes::trips::change_passenger_name::<S>),
        )
        .route(
            "/{id}/reservations/{rid}/capacity",
            patch(routes::trips::change_reserved_capacity::<S>),
        )
        .route(
            "/{id}/reservations/{rid}",
            delete(routes::trips::cancel_reservation::<S>),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the shared application state over the given event store.
pub fn create_default_state<S: EventStore + Clone + 'static>(
    event_store: S,
    runtime_config: RuntimeConfig,
) -> Arc<AppState<S>> {
    Arc::new(AppState {
        registry: TripRegistry::new(event_store, runtime_config),
    })
}

//! HTTP API server with observability for the ticketing engine.
//!
//! Exposes the booking engine's operations (reserve, cancel, availability,
//! user tickets) over REST, with structured logging (tracing) and
//! Prometheus metrics. Authentication is handled upstream; the server reads
//! the forwarded `X-User-Id` header.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, post};
use booking::{AvailabilityService, BookingManager};
use ledger::TicketStore;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::tickets::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: TicketStore + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/posts/availability", get(routes::tickets::availability_batch::<S>))
        .route("/posts/{id}/availability", get(routes::tickets::availability::<S>))
        .route("/posts/{id}/book", post(routes::tickets::book::<S>))
        .route("/posts/{id}/book", delete(routes::tickets::cancel::<S>))
        .route("/tickets", get(routes::tickets::my_tickets::<S>))
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

/// Creates the application state over the given store.
pub fn create_state<S: TicketStore + Clone + 'static>(store: S) -> Arc<AppState<S>> {
    Arc::new(AppState {
        manager: BookingManager::new(store.clone()),
        availability: AvailabilityService::new(store),
    })
}

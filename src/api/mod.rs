//! REST API over a completed run.
//!
//! Read-only GET endpoints:
//! - `/statistics`: statistics for an optional date range
//! - `/ticks`: per-tick telemetry for an optional date range
//! - `/events`: charging events overlapping an optional date range
//! - `/series/power`: average site power per window
//! - `/series/events`: charging-event counts per window

mod handlers;
mod types;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use chrono::NaiveDateTime;
use tracing::info;

use crate::config::SimulationConfig;
use crate::error::Result;
use crate::sim::types::SimulationResult;

/// Immutable application state shared across all request handlers.
///
/// Constructed once after the run completes and wrapped in `Arc`; no locks
/// are needed since everything is read-only.
pub struct AppState {
    /// Configuration the run was produced with.
    pub config: SimulationConfig,
    /// Wall-clock time of tick 0.
    pub origin: NaiveDateTime,
    pub result: SimulationResult,
}

/// Builds the axum router with all API routes.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/statistics", get(handlers::get_statistics))
        .route("/ticks", get(handlers::get_ticks))
        .route("/events", get(handlers::get_events))
        .route("/series/power", get(handlers::get_power_series))
        .route("/series/events", get(handlers::get_event_series))
        .with_state(state)
}

/// Binds to the given address and serves the API until the server stops.
///
/// # Errors
///
/// Returns an error if the listener cannot bind or the server fails.
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) -> Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "API server listening");
    axum::serve(listener, app).await?;
    Ok(())
}

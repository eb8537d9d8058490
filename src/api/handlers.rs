//! Request handlers for the API endpoints.

use std::ops::ControlFlow;
use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use chrono::Duration;

use super::AppState;
use super::types::{ErrorResponse, RangeQuery, SeriesQuery, StatisticsResponse, TickRecord};
use crate::sim::stats::compute_statistics;
use crate::sim::types::ChargingEvent;
use crate::window::WindowSpec;
use crate::window::aggregate::{
    Aggregated, aggregate_charging_events, aggregate_tick_data, event_windows, reducers,
    tick_windows,
};
use crate::window::filter::{DateRange, filter_charging_events, filter_tick_data, tick_range};

type ApiError = (StatusCode, Json<ErrorResponse>);

fn bad_request(error: impl ToString) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
}

fn checked_range(query: &RangeQuery) -> Result<DateRange, ApiError> {
    let range = DateRange::from(query);
    if range.is_inverted() {
        return Err(bad_request("`from` must be <= `to`"));
    }
    Ok(range)
}

fn window_spec(query: &SeriesQuery) -> Result<WindowSpec, ApiError> {
    query
        .window
        .as_deref()
        .unwrap_or("daily")
        .parse()
        .map_err(bad_request)
}

/// Returns statistics for the requested range.
///
/// `GET /statistics?from&to` → 200 + `StatisticsResponse`
/// `GET /statistics?from=<later>&to=<earlier>` → 400 + `ErrorResponse`
pub async fn get_statistics(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RangeQuery>,
) -> Result<Json<StatisticsResponse>, ApiError> {
    let range = checked_range(&query)?;
    let ticks = filter_tick_data(&state.config, &state.result.per_tick, range);
    let events = filter_charging_events(&state.config, &state.result.events, range);
    Ok(Json(StatisticsResponse {
        config: state.config.clone(),
        statistics: compute_statistics(&state.config, ticks),
        events: events.len(),
    }))
}

/// Returns per-tick telemetry for the requested range.
///
/// `GET /ticks?from&to` → 200 + `Vec<TickRecord>`
pub async fn get_ticks(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RangeQuery>,
) -> Result<Json<Vec<TickRecord>>, ApiError> {
    let range = checked_range(&query)?;
    let ticks = &state.result.per_tick;
    let g = state.config.simulation.granularity_ms as i64;
    let records = tick_range(&state.config, ticks.len(), range)
        .map(|r| {
            r.map(|tick| TickRecord {
                tick,
                time: state.origin + Duration::milliseconds(tick as i64 * g),
                total_kw: ticks[tick].total_kw(),
                power_kw: ticks[tick].power_kw.clone(),
            })
            .collect()
        })
        .unwrap_or_default();
    Ok(Json(records))
}

/// Returns charging events overlapping the requested range.
///
/// `GET /events?from&to` → 200 + `Vec<ChargingEvent>`
pub async fn get_events(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RangeQuery>,
) -> Result<Json<Vec<ChargingEvent>>, ApiError> {
    let range = checked_range(&query)?;
    Ok(Json(filter_charging_events(
        &state.config,
        &state.result.events,
        range,
    )))
}

/// Returns average site power (kW) per window.
///
/// `GET /series/power?window=daily` → 200 + `Vec<Aggregated<f64>>`
pub async fn get_power_series(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SeriesQuery>,
) -> Result<Json<Vec<Aggregated<f64>>>, ApiError> {
    let spec = window_spec(&query)?;
    let ticks = &state.result.per_tick;
    let windows = tick_windows(&state.config, ticks, state.origin, spec).map_err(bad_request)?;
    Ok(Json(aggregate_tick_data(
        &state.config,
        ticks,
        state.origin,
        windows,
        reducers::average_total_kw,
    )))
}

/// Returns the number of charging events per window.
///
/// `GET /series/events?window=weekly&strategy=start-point` → 200 + `Vec<Aggregated<usize>>`
pub async fn get_event_series(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SeriesQuery>,
) -> Result<Json<Vec<Aggregated<usize>>>, ApiError> {
    let spec = window_spec(&query)?;
    let events = &state.result.events;
    let windows = event_windows(&state.config, events, state.origin, spec).map_err(bad_request)?;
    Ok(Json(aggregate_charging_events(
        &state.config,
        events,
        state.origin,
        windows,
        query.strategy.unwrap_or_default(),
        |window: &[ChargingEvent]| ControlFlow::Continue(window.len()),
    )))
}

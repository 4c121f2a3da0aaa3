//! Memory series endpoints.

use axum::{
    extract::{Query, State},
    Json,
};
use herakles_load_monitor::{ProcessMeasurements, ProcessMinMaxMem, Uid, Window};
use tracing::{debug, instrument};

use crate::handlers::error::ApiError;
use crate::handlers::params::{time_bounds, QueryPairs, UidSelector};
use crate::state::SharedState;

/// Selected uids and resolved window of a series request.
pub(crate) fn series_request(
    state: &SharedState,
    pairs: &QueryPairs,
) -> Result<(Vec<Uid>, Window), ApiError> {
    let uids = UidSelector::from_pairs(pairs)?.resolve(&state.measurement);
    let (from, to) = time_bounds(pairs)?;
    let window = state.measurement.resolve_window(from, to)?;
    Ok((uids, window))
}

/// Handler for the /measurements endpoint.
#[instrument(skip(state))]
pub async fn measurements_handler(
    State(state): State<SharedState>,
    Query(pairs): Query<QueryPairs>,
) -> Result<Json<ProcessMeasurements>, ApiError> {
    let (uids, (from, to)) = series_request(&state, &pairs)?;
    let result = state.measurement.query_measurements(&uids, from, to);
    debug!(
        "Measurements: {} uids, {} rows",
        result.memory.len(),
        result.times.len()
    );
    Ok(Json(result))
}

/// Handler for the /minmaxmem endpoint.
#[instrument(skip(state))]
pub async fn min_max_mem_handler(
    State(state): State<SharedState>,
    Query(pairs): Query<QueryPairs>,
) -> Result<Json<Vec<ProcessMinMaxMem>>, ApiError> {
    let (uids, (from, to)) = series_request(&state, &pairs)?;
    Ok(Json(state.measurement.min_max_memory(&uids, from, to)))
}

//! Tag endpoints: name a point in time and use it as a query bound.

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tracing::{info, instrument};

use crate::handlers::error::ApiError;
use crate::state::SharedState;

/// Handler for POST /tag/{name}. Tags the current time.
#[instrument(skip(state))]
pub async fn set_tag_handler(
    State(state): State<SharedState>,
    Path(name): Path<String>,
) -> Json<DateTime<Utc>> {
    let time = state.measurement.set_tag(&name);
    info!("Tag {} set to {}", name, time);
    Json(time)
}

/// Handler for GET /tag/{name}.
#[instrument(skip(state))]
pub async fn get_tag_handler(
    State(state): State<SharedState>,
    Path(name): Path<String>,
) -> Result<Json<DateTime<Utc>>, ApiError> {
    state
        .measurement
        .get_tag(&name)
        .map(Json)
        .map_err(|e| ApiError::not_found(e.to_string()))
}

/// Handler for GET /tags.
#[instrument(skip(state))]
pub async fn tags_handler(State(state): State<SharedState>) -> Json<BTreeMap<String, DateTime<Utc>>> {
    Json(state.measurement.list_tags())
}

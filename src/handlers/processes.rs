//! Process metadata endpoints.
//!
//! - `/processes`: records selected by `uids` or `match`, keyed by uid
//! - `/processes/{uid}`: one record
//! - `/ram`: host memory statistics

use axum::{
    extract::{Path, Query, State},
    Json,
};
use herakles_load_monitor::{ProcessRecord, SystemMemory, Uid};
use std::collections::BTreeMap;
use tracing::{debug, instrument};

use crate::handlers::error::ApiError;
use crate::handlers::params::{QueryPairs, UidSelector};
use crate::state::SharedState;

/// Handler for the /processes endpoint.
#[instrument(skip(state))]
pub async fn processes_handler(
    State(state): State<SharedState>,
    Query(pairs): Query<QueryPairs>,
) -> Result<Json<BTreeMap<Uid, ProcessRecord>>, ApiError> {
    debug!("Processing /processes request");

    let processes = match UidSelector::from_pairs(&pairs)? {
        UidSelector::All => state.measurement.list_processes(None),
        selector => {
            let uids = selector.resolve(&state.measurement);
            state.measurement.list_processes(Some(&uids))
        }
    };

    Ok(Json(processes))
}

/// Handler for the /processes/{uid} endpoint.
#[instrument(skip(state))]
pub async fn process_handler(
    State(state): State<SharedState>,
    Path(uid): Path<Uid>,
) -> Result<Json<ProcessRecord>, ApiError> {
    Ok(Json(state.measurement.process(uid)?))
}

/// Handler for the /ram endpoint.
#[instrument(skip(state))]
pub async fn ram_handler(State(state): State<SharedState>) -> Json<SystemMemory> {
    Json(state.measurement.system_memory())
}

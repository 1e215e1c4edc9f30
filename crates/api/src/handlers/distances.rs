//! Handlers for the distance matrix and location sync.

use axum::extract::State;
use axum::Json;
use sprout_engine::{FloorBuild, FloorSummary, SyncReport};

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/distances/rebuild
///
/// Recompute every floor now. Floors whose write failed carry an `error`.
pub async fn rebuild(State(state): State<AppState>) -> AppResult<Json<DataResponse<Vec<FloorBuild>>>> {
    let data = state.engine.rebuild_distances().await?;
    Ok(Json(DataResponse { data }))
}

/// GET /api/v1/distances/summary
pub async fn summary(State(state): State<AppState>) -> AppResult<Json<DataResponse<Vec<FloorSummary>>>> {
    let data = state.engine.distance_summary().await?;
    Ok(Json(DataResponse { data }))
}

/// POST /api/v1/locations/sync
///
/// Pull floor resources from the booking service; rebuilds distances when
/// anything changed.
pub async fn sync_locations(State(state): State<AppState>) -> AppResult<Json<DataResponse<SyncReport>>> {
    let data = state.engine.sync_locations().await?;
    Ok(Json(DataResponse { data }))
}

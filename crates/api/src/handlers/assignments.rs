use axum::extract::State;
use axum::Json;
use chrono::Utc;
use sprout_engine::AssignmentReport;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/assignments/run
///
/// Run one assignment cycle now, outside the background schedule.
pub async fn run(State(state): State<AppState>) -> AppResult<Json<DataResponse<AssignmentReport>>> {
    let data = state.engine.run_assignment(Utc::now()).await?;
    Ok(Json(DataResponse { data }))
}

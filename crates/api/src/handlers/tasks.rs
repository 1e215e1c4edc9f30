//! Handlers for the `/tasks` resource.

use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use sprout_core::error::CoreError;
use sprout_core::types::DbId;
use sprout_core::watering::WateringTask;
use sprout_engine::{ConfirmRequest, ConfirmResult};

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

fn not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "WateringTask",
        id,
    })
}

async fn load(state: &AppState, id: DbId) -> AppResult<WateringTask> {
    state.engine.task(id).await?.ok_or_else(|| not_found(id))
}

/// GET /api/v1/tasks/{id}
pub async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<WateringTask>>> {
    let data = load(&state, id).await?;
    Ok(Json(DataResponse { data }))
}

/// POST /api/v1/tasks/{id}/confirm
///
/// Confirm on behalf of the current assignee. Returns 409 when the task is
/// no longer assigned.
pub async fn confirm(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<ConfirmResult>>> {
    match state.engine.confirm(ConfirmRequest::operator(id), Utc::now()).await? {
        ConfirmResult::NotFound => Err(not_found(id)),
        ConfirmResult::TooLate => Err(AppError::Core(CoreError::Conflict(format!(
            "Task {id} is no longer assigned"
        )))),
        data @ ConfirmResult::Confirmed { .. } => Ok(Json(DataResponse { data })),
    }
}

/// POST /api/v1/tasks/{id}/reset
///
/// Return an assigned task to pending so the next cycle ranks it again.
pub async fn reset(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<WateringTask>>> {
    load(&state, id).await?;
    state.engine.reset(id).await?;
    let data = load(&state, id).await?;
    Ok(Json(DataResponse { data }))
}

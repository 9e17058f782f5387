//! Admin handlers for the retention sweep.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use scout_core::retention::SweepReport;

use crate::background::{SchedulerError, RETENTION_JOB};
use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct CleanupAccepted {
    pub message: &'static str,
}

/// POST /admin/scout/cleanup
///
/// Start a sweep in the background and acknowledge immediately.
pub async fn trigger_cleanup(
    State(state): State<AppState>,
) -> AppResult<(StatusCode, Json<DataResponse<CleanupAccepted>>)> {
    state
        .scheduler
        .trigger(RETENTION_JOB)
        .map_err(|e: SchedulerError| AppError::InternalError(e.to_string()))?;

    Ok((
        StatusCode::ACCEPTED,
        Json(DataResponse {
            data: CleanupAccepted {
                message: "Retention sweep started",
            },
        }),
    ))
}

/// GET /admin/scout/cleanup/last
///
/// Report of the most recent sweep, `null` before the first one.
pub async fn last_cleanup(
    State(state): State<AppState>,
) -> Json<DataResponse<Option<SweepReport>>> {
    Json(DataResponse {
        data: state.last_sweep.read().await.clone(),
    })
}

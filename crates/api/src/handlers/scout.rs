//! Admin handlers for scraper dry runs, full runs, the run registry and
//! scrape targets.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use scout_core::error::CoreError;
use scout_core::scout::invocation::{validate_url, Invocation};
use scout_core::scout::run::{validate_run_id, RunReport};
use scout_core::types::DbId;
use scout_db::models::scout_run::ScoutRun;
use scout_db::models::scout_target::{CreateScoutTarget, ScoutTarget};
use scout_db::repositories::{ScoutRunRepo, ScoutTargetRepo};

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::scout::{LaunchError, LiveRun, ScoutSupervisor, TestOutcome};
use crate::state::AppState;

/// Default page size for run history.
const DEFAULT_RUN_LIMIT: i64 = 20;

/// Upper bound for run history.
const MAX_RUN_LIMIT: i64 = 50;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Body of `POST /admin/scout/test`. One of `url` or `target_id` is required.
#[derive(Debug, Default, Deserialize)]
pub struct TestScrapeRequest {
    pub url: Option<String>,
    pub target_id: Option<DbId>,
}

/// Body of `POST /admin/scout/run`. Both fields absent scrapes every target.
#[derive(Debug, Default, Deserialize)]
pub struct RunScrapeRequest {
    pub url: Option<String>,
    pub target_id: Option<DbId>,
    pub run_id: Option<String>,
}

/// Acknowledgment of a launched full run.
#[derive(Debug, Serialize)]
pub struct RunAccepted {
    pub message: String,
    pub run_id: String,
}

#[derive(Debug, Deserialize)]
pub struct RunListQuery {
    /// Maximum number of results (default: 20, max: 50).
    pub limit: Option<i64>,
}

/// A registry row plus whether its process is still being tracked.
#[derive(Debug, Serialize)]
pub struct RunDetail {
    #[serde(flatten)]
    pub run: ScoutRun,
    pub alive: bool,
}

// ---------------------------------------------------------------------------
// Scrape handlers
// ---------------------------------------------------------------------------

/// POST /admin/scout/test
///
/// Dry-run the scraper against one URL and wait for its preview.
pub async fn test_scrape(
    State(state): State<AppState>,
    Json(input): Json<TestScrapeRequest>,
) -> AppResult<Json<TestOutcome>> {
    let target = resolve_target(&state, input.target_id).await?;

    let url = match (input.url, &target) {
        (Some(url), _) => url,
        (None, Some(target)) => target.url.clone(),
        (None, None) => {
            return Err(AppError::BadRequest(
                "url or target_id is required".to_string(),
            ))
        }
    };
    validate_url(&url)?;

    let invocation = Invocation::dry_run(url).with_target_hints(
        target.as_ref().and_then(|t| t.city.clone()),
        target.as_ref().and_then(|t| t.selector.clone()),
    );

    let outcome = state.supervisor.test_run(&invocation).await?;
    Ok(Json(outcome))
}

/// POST /admin/scout/run
///
/// Launch a full run and acknowledge immediately. Spawn failures are
/// logged; the acknowledgment is still returned.
pub async fn run_scrape(
    State(state): State<AppState>,
    Json(input): Json<RunScrapeRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<RunAccepted>>)> {
    if let Some(url) = &input.url {
        validate_url(url)?;
    }
    let run_id = match input.run_id {
        Some(id) => {
            validate_run_id(&id)?;
            id
        }
        None => ScoutSupervisor::new_run_id(),
    };

    let target = resolve_target(&state, input.target_id).await?;
    let url = input.url.or_else(|| target.as_ref().map(|t| t.url.clone()));
    let scope = url.clone().unwrap_or_else(|| "all targets".to_string());

    let invocation = Invocation::full(url, run_id.clone()).with_target_hints(
        target.as_ref().and_then(|t| t.city.clone()),
        target.as_ref().and_then(|t| t.selector.clone()),
    );

    match state.supervisor.launch_run(invocation).await {
        Ok(_) => {}
        Err(LaunchError::AlreadyRunning(id)) => {
            return Err(AppError::Core(CoreError::Conflict(format!(
                "Run {id} is already in progress"
            ))));
        }
        Err(LaunchError::Spawn(e)) => {
            tracing::error!(run_id = %run_id, error = %e, "Scraper run failed to start");
        }
    }

    Ok((
        StatusCode::ACCEPTED,
        Json(DataResponse {
            data: RunAccepted {
                message: format!("Scrape started for {scope}"),
                run_id,
            },
        }),
    ))
}

// ---------------------------------------------------------------------------
// Run registry handlers
// ---------------------------------------------------------------------------

/// GET /admin/scout/runs
pub async fn list_runs(
    State(state): State<AppState>,
    Query(params): Query<RunListQuery>,
) -> AppResult<Json<DataResponse<Vec<ScoutRun>>>> {
    let limit = params
        .limit
        .unwrap_or(DEFAULT_RUN_LIMIT)
        .clamp(1, MAX_RUN_LIMIT);
    let runs = ScoutRunRepo::list_recent(&state.pool, limit).await?;
    Ok(Json(DataResponse { data: runs }))
}

/// GET /admin/scout/runs/active
pub async fn active_runs(State(state): State<AppState>) -> Json<DataResponse<Vec<LiveRun>>> {
    Json(DataResponse {
        data: state.supervisor.active_runs().await,
    })
}

/// GET /admin/scout/runs/{id}
pub async fn get_run(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<DataResponse<RunDetail>>> {
    let run = ScoutRunRepo::find_by_id(&state.pool, &id)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::NotFound {
                entity: "scout run",
                id: id.clone(),
            })
        })?;
    let alive = state.supervisor.is_alive(&id).await;

    Ok(Json(DataResponse {
        data: RunDetail { run, alive },
    }))
}

/// POST /admin/scout/runs/{id}/start
///
/// Called by the scraper when it begins. Idempotent.
pub async fn start_run(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<DataResponse<ScoutRun>>> {
    validate_run_id(&id)?;
    let run = ScoutRunRepo::upsert_start(&state.pool, &id).await?;
    Ok(Json(DataResponse { data: run }))
}

/// PUT /admin/scout/runs/{id}
///
/// Progress or completion report from the scraper. Reports that would
/// move the run backwards or revive a finished run are rejected with 409.
pub async fn report_run(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(report): Json<RunReport>,
) -> AppResult<Json<DataResponse<ScoutRun>>> {
    validate_run_id(&id)?;
    if report.events_found.is_some_and(|n| n < 0) {
        return Err(AppError::BadRequest(
            "events_found must not be negative".to_string(),
        ));
    }

    let run = ScoutRunRepo::report(&state.pool, &id, &report).await?;
    tracing::info!(run_id = %id, status = %report.status, "Run report applied");
    Ok(Json(DataResponse { data: run }))
}

// ---------------------------------------------------------------------------
// Target handlers
// ---------------------------------------------------------------------------

/// GET /admin/scout/targets
pub async fn list_targets(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<ScoutTarget>>>> {
    let targets = ScoutTargetRepo::list(&state.pool).await?;
    Ok(Json(DataResponse { data: targets }))
}

/// POST /admin/scout/targets
pub async fn create_target(
    State(state): State<AppState>,
    Json(input): Json<CreateScoutTarget>,
) -> AppResult<(StatusCode, Json<DataResponse<ScoutTarget>>)> {
    if input.name.trim().is_empty() {
        return Err(AppError::BadRequest("name is required".to_string()));
    }
    validate_url(&input.url)?;

    let target = ScoutTargetRepo::create(&state.pool, &input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: target })))
}

/// GET /admin/scout/targets/{id}
pub async fn get_target(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<ScoutTarget>>> {
    let target = find_target(&state, id).await?;
    Ok(Json(DataResponse { data: target }))
}

/// DELETE /admin/scout/targets/{id}
pub async fn delete_target(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if ScoutTargetRepo::delete(&state.pool, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(target_not_found(id))
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn resolve_target(
    state: &AppState,
    target_id: Option<DbId>,
) -> AppResult<Option<ScoutTarget>> {
    match target_id {
        Some(id) => Ok(Some(find_target(state, id).await?)),
        None => Ok(None),
    }
}

async fn find_target(state: &AppState, id: DbId) -> AppResult<ScoutTarget> {
    ScoutTargetRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| target_not_found(id))
}

fn target_not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "scout target",
        id: id.to_string(),
    })
}

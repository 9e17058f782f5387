//! Route definitions for scraper orchestration and retention endpoints.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{retention, scout};
use crate::state::AppState;

/// Admin routes mounted at `/admin/scout`.
///
/// ```text
/// POST   /test                 -> test_scrape
/// POST   /run                  -> run_scrape
/// GET    /runs                 -> list_runs
/// GET    /runs/active          -> active_runs
/// GET    /runs/{id}            -> get_run
/// PUT    /runs/{id}            -> report_run
/// POST   /runs/{id}/start      -> start_run
/// GET    /targets              -> list_targets
/// POST   /targets              -> create_target
/// GET    /targets/{id}         -> get_target
/// DELETE /targets/{id}         -> delete_target
/// POST   /cleanup              -> trigger_cleanup
/// GET    /cleanup/last         -> last_cleanup
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/test", post(scout::test_scrape))
        .route("/run", post(scout::run_scrape))
        .route("/runs", get(scout::list_runs))
        .route("/runs/active", get(scout::active_runs))
        .route("/runs/{id}", get(scout::get_run).put(scout::report_run))
        .route("/runs/{id}/start", post(scout::start_run))
        .route(
            "/targets",
            get(scout::list_targets).post(scout::create_target),
        )
        .route(
            "/targets/{id}",
            get(scout::get_target).delete(scout::delete_target),
        )
        .route("/cleanup", post(retention::trigger_cleanup))
        .route("/cleanup/last", get(retention::last_cleanup))
}

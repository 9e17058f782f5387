pub mod health;
pub mod scout;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /admin/scout/test                 dry run with preview (POST)
/// /admin/scout/run                  launch full run (POST)
/// /admin/scout/runs                 run history (GET)
/// /admin/scout/runs/active          live runs (GET)
/// /admin/scout/runs/{id}            run detail (GET), report (PUT)
/// /admin/scout/runs/{id}/start      run start (POST)
/// /admin/scout/targets              list, create
/// /admin/scout/targets/{id}         get, delete
/// /admin/scout/cleanup              trigger retention sweep (POST)
/// /admin/scout/cleanup/last         last sweep report (GET)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/admin/scout", scout::router())
}

//! Scout run registry models.
//!
//! Models for the `scout_runs` and `run_statuses` tables.

use serde::Serialize;
use sqlx::FromRow;
use scout_core::scout::run::RunState;
use scout_core::scout::status::RunStatus;
use scout_core::types::Timestamp;

/// A single scraper run as recorded in the registry.
///
/// Includes the joined `status_name` from the `run_statuses` lookup table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ScoutRun {
    pub id: String,
    pub status_id: i16,
    /// Joined from `run_statuses.name`.
    pub status_name: String,
    pub started_at: Timestamp,
    pub ended_at: Option<Timestamp>,
    pub events_found: Option<i32>,
    pub log_summary: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl ScoutRun {
    /// Typed status, or `None` for an id missing from the enum.
    pub fn status(&self) -> Option<RunStatus> {
        RunStatus::from_id(self.status_id)
    }

    /// Registry state used by the report planner.
    ///
    /// An unknown status id is treated as `Running` so the row can still be
    /// repaired by a later report.
    pub fn state(&self) -> RunState {
        RunState {
            status: self.status().unwrap_or(RunStatus::Running),
            started_at: self.started_at,
            ended_at: self.ended_at,
            events_found: self.events_found,
            log_summary: self.log_summary.clone(),
        }
    }
}

//! Run registry semantics.
//!
//! The `db` crate owns persistence; this module decides what a start or
//! progress report does to the stored row so the rules stay testable
//! without a database.

use serde::Deserialize;

use crate::error::CoreError;
use crate::types::Timestamp;

use super::status::RunStatus;

/// Maximum accepted length of a caller-supplied run id.
pub const MAX_RUN_ID_LEN: usize = 128;

/// Persisted state of one run, independent of the row representation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunState {
    pub status: RunStatus,
    pub started_at: Timestamp,
    pub ended_at: Option<Timestamp>,
    pub events_found: Option<i32>,
    pub log_summary: Option<String>,
}

impl RunState {
    /// Fresh state for a run that reported `upsertRunStart`.
    pub fn started(now: Timestamp) -> Self {
        Self {
            status: RunStatus::Running,
            started_at: now,
            ended_at: None,
            events_found: None,
            log_summary: None,
        }
    }
}

/// A progress or completion report sent by a scraper about its own run.
#[derive(Debug, Clone, Deserialize)]
pub struct RunReport {
    pub status: RunStatus,
    pub events_found: Option<i32>,
    pub log_summary: Option<String>,
    pub ended_at: Option<Timestamp>,
}

/// What applying a report should do to storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportPlan {
    /// No row exists yet; insert this one.
    Insert(RunState),
    /// Overwrite the existing row with this state.
    Update(RunState),
    /// Duplicate of an already-recorded terminal report.
    Unchanged(RunState),
}

impl ReportPlan {
    /// The state the row holds once the plan is applied.
    pub fn state(&self) -> &RunState {
        match self {
            ReportPlan::Insert(s) | ReportPlan::Update(s) | ReportPlan::Unchanged(s) => s,
        }
    }
}

/// A report that would move a run backwards or revive a finished one.
#[derive(Debug, thiserror::Error)]
#[error("Run {run_id} is {current}; refusing transition to {attempted}")]
pub struct RunTransitionError {
    pub run_id: String,
    pub current: RunStatus,
    pub attempted: RunStatus,
}

impl From<RunTransitionError> for CoreError {
    fn from(err: RunTransitionError) -> Self {
        CoreError::Conflict(err.to_string())
    }
}

/// Decide how `report` changes the run identified by `run_id`.
///
/// - No existing row: insert with a fresh start timestamp.
/// - Existing non-terminal row: overwrite status, keep fields the report
///   omits. Status never moves back (`running` to `starting` is rejected).
/// - Existing terminal row: the identical status is an idempotent no-op,
///   anything else is rejected.
///
/// A terminal status without an explicit end time is stamped with `now`.
pub fn plan_report(
    run_id: &str,
    existing: Option<&RunState>,
    report: &RunReport,
    now: Timestamp,
) -> Result<ReportPlan, RunTransitionError> {
    let default_end = |prior: Option<Timestamp>| {
        report
            .ended_at
            .or(prior)
            .or_else(|| report.status.is_terminal().then_some(now))
    };

    let rejected = |current: RunStatus| RunTransitionError {
        run_id: run_id.to_string(),
        current,
        attempted: report.status,
    };

    match existing {
        None => Ok(ReportPlan::Insert(RunState {
            status: report.status,
            started_at: now,
            ended_at: default_end(None),
            events_found: report.events_found,
            log_summary: report.log_summary.clone(),
        })),
        Some(current) if current.status.is_terminal() => {
            if current.status == report.status {
                Ok(ReportPlan::Unchanged(current.clone()))
            } else {
                Err(rejected(current.status))
            }
        }
        Some(current) if report.status.id() < current.status.id() => {
            Err(rejected(current.status))
        }
        Some(current) => Ok(ReportPlan::Update(RunState {
            status: report.status,
            started_at: current.started_at,
            ended_at: default_end(current.ended_at),
            events_found: report.events_found.or(current.events_found),
            log_summary: report
                .log_summary
                .clone()
                .or_else(|| current.log_summary.clone()),
        })),
    }
}

/// Validate a caller-supplied run id.
///
/// Ids travel to the scraper as a command-line argument, so they are kept
/// to a conservative character set.
pub fn validate_run_id(run_id: &str) -> Result<(), CoreError> {
    if run_id.is_empty() {
        return Err(CoreError::Validation("Run id must not be empty".into()));
    }
    if run_id.len() > MAX_RUN_ID_LEN {
        return Err(CoreError::Validation(format!(
            "Run id must be at most {MAX_RUN_ID_LEN} characters"
        )));
    }
    if run_id.starts_with('-') {
        return Err(CoreError::Validation(
            "Run id must not start with '-'".into(),
        ));
    }
    if !run_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':'))
    {
        return Err(CoreError::Validation(format!(
            "Run id '{run_id}' contains invalid characters"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

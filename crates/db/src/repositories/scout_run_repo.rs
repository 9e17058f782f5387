//! Repository for the `scout_runs` table (run registry).

use chrono::Utc;
use sqlx::{PgPool, Postgres, Transaction};
use scout_core::scout::run::{plan_report, ReportPlan, RunReport, RunState, RunTransitionError};
use scout_core::scout::status::RunStatus;

use crate::models::scout_run::ScoutRun;

/// Column list for `scout_runs` SELECT queries, including joined status name.
const COLUMNS: &str = "\
    r.id, r.status_id, s.name AS status_name, \
    r.started_at, r.ended_at, r.events_found, r.log_summary, \
    r.created_at, r.updated_at";

/// Join clause used in all read queries to include the status name.
const JOIN: &str = "\
    scout_runs r \
    JOIN run_statuses s ON r.status_id = s.id";

/// Errors from applying a run report.
#[derive(Debug, thiserror::Error)]
pub enum RunReportError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Transition(#[from] RunTransitionError),
}

/// Provides query operations for scout run records.
pub struct ScoutRunRepo;

impl ScoutRunRepo {
    /// Record that run `id` has started.
    ///
    /// Creates the row with status `running` and `started_at = now()` only
    /// if no row exists; an existing row is returned untouched.
    pub async fn upsert_start(pool: &PgPool, id: &str) -> Result<ScoutRun, sqlx::Error> {
        sqlx::query(
            "INSERT INTO scout_runs (id, status_id, started_at) \
             VALUES ($1, $2, now()) \
             ON CONFLICT (id) DO NOTHING",
        )
        .bind(id)
        .bind(RunStatus::Running.id())
        .execute(pool)
        .await?;

        Self::find_by_id(pool, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    /// Apply a progress or completion report for run `id`.
    ///
    /// The row is locked for the duration of the decision so concurrent
    /// reports serialize. Unknown ids are created (first-contact report);
    /// reports that would revive a finished run are rejected.
    pub async fn report(
        pool: &PgPool,
        id: &str,
        report: &RunReport,
    ) -> Result<ScoutRun, RunReportError> {
        let mut tx = pool.begin().await?;

        let query = format!("SELECT {COLUMNS} FROM {JOIN} WHERE r.id = $1 FOR UPDATE OF r");
        let existing = sqlx::query_as::<_, ScoutRun>(&query)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;

        let current = existing.as_ref().map(ScoutRun::state);
        let plan = plan_report(id, current.as_ref(), report, Utc::now())?;

        match &plan {
            ReportPlan::Insert(state) | ReportPlan::Update(state) => {
                Self::write_state(&mut tx, id, state).await?;
            }
            ReportPlan::Unchanged(_) => {
                tracing::debug!(run_id = id, status = %report.status, "Duplicate terminal report ignored");
            }
        }

        tx.commit().await?;

        Ok(Self::find_by_id(pool, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)?)
    }

    /// Find a run by its ID, including the joined status name.
    pub async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<ScoutRun>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM {JOIN} WHERE r.id = $1");
        sqlx::query_as::<_, ScoutRun>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List runs newest-first by start time, at most `limit` rows.
    pub async fn list_recent(pool: &PgPool, limit: i64) -> Result<Vec<ScoutRun>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM {JOIN} \
             ORDER BY r.started_at DESC, r.created_at DESC \
             LIMIT $1"
        );
        sqlx::query_as::<_, ScoutRun>(&query)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Insert or overwrite the full row for `id`.
    async fn write_state(
        tx: &mut Transaction<'_, Postgres>,
        id: &str,
        state: &RunState,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO scout_runs \
                (id, status_id, started_at, ended_at, events_found, log_summary) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (id) DO UPDATE SET \
                status_id = EXCLUDED.status_id, \
                started_at = EXCLUDED.started_at, \
                ended_at = EXCLUDED.ended_at, \
                events_found = EXCLUDED.events_found, \
                log_summary = EXCLUDED.log_summary, \
                updated_at = now()",
        )
        .bind(id)
        .bind(state.status.id())
        .bind(state.started_at)
        .bind(state.ended_at)
        .bind(state.events_found)
        .bind(&state.log_summary)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }
}

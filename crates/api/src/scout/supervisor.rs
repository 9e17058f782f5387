//! Launches the external scraper in dry-run (test) or full (run) mode.
//!
//! Held in [`AppState`](crate::state::AppState) as an `Arc<ScoutSupervisor>`.
//! Test runs are awaited and captured; full runs are acknowledged right
//! after spawn and tracked in a live-run table until the process exits.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use serde_json::{Map, Value};
use tokio::sync::RwLock;

use scout_core::scout::invocation::{Invocation, ScraperProgram};
use scout_core::scout::subprocess::{self, CapturedRun, OutputStream, StreamingChild, Termination};
use scout_core::scout::ScoutError;
use scout_core::types::Timestamp;

/// Errors from launching a full run.
#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    #[error("Run {0} is already in progress")]
    AlreadyRunning(String),

    #[error(transparent)]
    Spawn(#[from] ScoutError),
}

/// A full run whose process has not exited yet.
#[derive(Debug, Clone, Serialize)]
pub struct LiveRun {
    pub run_id: String,
    pub pid: Option<u32>,
    /// Single-URL override, `None` when scraping every target.
    pub url: Option<String>,
    pub started_at: Timestamp,
}

/// Result of a dry run: the preview on success, the raw log otherwise.
#[derive(Debug, Clone, Serialize)]
pub struct TestOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log: Option<String>,
}

impl From<CapturedRun> for TestOutcome {
    fn from(run: CapturedRun) -> Self {
        match (run.termination, run.preview) {
            (Termination::TimedOut, _) | (_, None) => Self {
                success: false,
                preview: None,
                log: Some(run.log),
            },
            (Termination::Exited(_), Some(preview)) => Self {
                success: true,
                preview: Some(preview),
                log: None,
            },
        }
    }
}

type LiveRuns = Arc<RwLock<HashMap<String, LiveRun>>>;

/// Spawns and observes scraper processes.
pub struct ScoutSupervisor {
    program: ScraperProgram,
    test_timeout: Duration,
    live: LiveRuns,
}

impl ScoutSupervisor {
    pub fn new(program: ScraperProgram, test_timeout: Duration) -> Self {
        Self {
            program,
            test_timeout,
            live: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Fresh id for a run the caller did not name.
    pub fn new_run_id() -> String {
        uuid::Uuid::now_v7().to_string()
    }

    /// Run a dry run to completion or timeout and report its preview.
    pub async fn test_run(&self, invocation: &Invocation) -> Result<TestOutcome, ScoutError> {
        let mut cmd = self.program.command(invocation);
        tracing::info!(command = %self.program.describe(invocation), "Starting scraper dry run");

        let captured = subprocess::capture(&mut cmd, self.test_timeout).await?;

        match captured.termination {
            Termination::TimedOut => tracing::warn!(
                timeout_secs = self.test_timeout.as_secs(),
                "Scraper dry run timed out and was killed"
            ),
            Termination::Exited(code) => tracing::info!(
                exit_code = ?code,
                duration_ms = captured.duration_ms,
                preview = captured.preview.is_some(),
                "Scraper dry run finished"
            ),
        }

        Ok(TestOutcome::from(captured))
    }

    /// Spawn a full run and return as soon as the process has started.
    ///
    /// The run id comes from `invocation.run_id`, generated if absent. The
    /// process's output is forwarded to the log until it exits, at which
    /// point the run leaves the live table.
    pub async fn launch_run(&self, mut invocation: Invocation) -> Result<LiveRun, LaunchError> {
        let run_id = invocation
            .run_id
            .get_or_insert_with(Self::new_run_id)
            .clone();

        // Held across spawn so the watcher's removal cannot precede insertion.
        let mut live = self.live.write().await;
        if live.contains_key(&run_id) {
            return Err(LaunchError::AlreadyRunning(run_id));
        }

        let mut cmd = self.program.command(&invocation);
        let child = subprocess::spawn_streaming(&mut cmd)?;

        let entry = LiveRun {
            run_id: run_id.clone(),
            pid: child.pid(),
            url: invocation.url.clone(),
            started_at: Utc::now(),
        };
        live.insert(run_id.clone(), entry.clone());
        drop(live);

        tracing::info!(
            run_id = %run_id,
            pid = ?entry.pid,
            command = %self.program.describe(&invocation),
            "Scraper run started"
        );

        tokio::spawn(watch_run(Arc::clone(&self.live), run_id, child));

        Ok(entry)
    }

    /// Whether the process for `run_id` is still running.
    pub async fn is_alive(&self, run_id: &str) -> bool {
        self.live.read().await.contains_key(run_id)
    }

    /// Live runs, oldest first.
    pub async fn active_runs(&self) -> Vec<LiveRun> {
        let mut runs: Vec<LiveRun> = self.live.read().await.values().cloned().collect();
        runs.sort_by(|a, b| a.started_at.cmp(&b.started_at));
        runs
    }
}

/// Forward a full run's output to the log and untrack it on exit.
async fn watch_run(live: LiveRuns, run_id: String, child: StreamingChild) {
    let result = child
        .drain(|line| match line.stream {
            OutputStream::Stdout => {
                tracing::info!(run_id = %run_id, stream = "stdout", "{}", line.text)
            }
            OutputStream::Stderr => {
                tracing::warn!(run_id = %run_id, stream = "stderr", "{}", line.text)
            }
        })
        .await;

    match result {
        Ok(status) if status.success() => {
            tracing::info!(run_id = %run_id, "Scraper run exited");
        }
        Ok(status) => {
            tracing::warn!(run_id = %run_id, exit_code = ?status.code(), "Scraper run exited with failure");
        }
        Err(e) => {
            tracing::error!(run_id = %run_id, error = %e, "Lost track of scraper run");
        }
    }

    live.write().await.remove(&run_id);
}

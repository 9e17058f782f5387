//! Jobs run by the scheduler.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use scout_core::retention::{RetentionSweeper, SweepReport};
use scout_core::scout::invocation::Invocation;

use super::scheduler::{JobError, ScheduledJob};
use crate::scout::ScoutSupervisor;

/// Name of the periodic full scrape.
pub const FULL_SCRAPE_JOB: &str = "full_scrape";

/// Name of the periodic retention sweep.
pub const RETENTION_JOB: &str = "retention";

/// Launches a full run over every configured target.
pub struct FullScrapeJob {
    supervisor: Arc<ScoutSupervisor>,
}

impl FullScrapeJob {
    pub fn new(supervisor: Arc<ScoutSupervisor>) -> Self {
        Self { supervisor }
    }
}

#[async_trait]
impl ScheduledJob for FullScrapeJob {
    fn name(&self) -> &'static str {
        FULL_SCRAPE_JOB
    }

    async fn run(&self) -> Result<(), JobError> {
        let invocation = Invocation::full(None, ScoutSupervisor::new_run_id());
        let live = self
            .supervisor
            .launch_run(invocation)
            .await
            .map_err(|e| JobError(e.to_string()))?;
        tracing::info!(run_id = %live.run_id, "Scheduled full scrape launched");
        Ok(())
    }
}

/// Most recent sweep outcome, shared with the HTTP surface.
pub type LastSweep = Arc<RwLock<Option<SweepReport>>>;

/// Runs one retention sweep and keeps its report.
pub struct RetentionJob {
    sweeper: Arc<RetentionSweeper>,
    last: LastSweep,
}

impl RetentionJob {
    pub fn new(sweeper: Arc<RetentionSweeper>, last: LastSweep) -> Self {
        Self { sweeper, last }
    }
}

#[async_trait]
impl ScheduledJob for RetentionJob {
    fn name(&self) -> &'static str {
        RETENTION_JOB
    }

    async fn run(&self) -> Result<(), JobError> {
        let report = self.sweeper.sweep().await;
        let failed_queries = report.failed_queries.len();
        *self.last.write().await = Some(report);

        // Per-item failures are already in the report; a failed query
        // means part of the sweep never ran.
        if failed_queries > 0 {
            return Err(JobError(format!(
                "{failed_queries} candidate queries failed"
            )));
        }
        Ok(())
    }
}

//! Fixed-cadence trigger set with an explicit start/stop lifecycle.
//!
//! Every tick spawns its job in a task of its own, so a slow run never
//! delays the next tick and runs of the same job may overlap. Job failures
//! are logged and never stop the trigger.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Failure reported by a scheduled job.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct JobError(pub String);

#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error("No scheduled job named '{0}'")]
    UnknownJob(String),

    #[error("Job '{name}' failed: {source}")]
    Job {
        name: &'static str,
        #[source]
        source: JobError,
    },
}

/// Work the scheduler can run.
#[async_trait]
pub trait ScheduledJob: Send + Sync + 'static {
    /// Stable name used for manual triggers and logs.
    fn name(&self) -> &'static str;

    async fn run(&self) -> Result<(), JobError>;
}

struct Trigger {
    job: Arc<dyn ScheduledJob>,
    period: Duration,
}

/// Tick loops of a started scheduler.
struct Running {
    cancel: CancellationToken,
    loops: Vec<JoinHandle<()>>,
}

/// Owns the periodic triggers.
pub struct Scheduler {
    triggers: Vec<Trigger>,
    running: Mutex<Option<Running>>,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            triggers: Vec::new(),
            running: Mutex::new(None),
        }
    }

    /// Run `job` every `period`, first tick one period after [`start`](Self::start).
    pub fn every(mut self, period: Duration, job: Arc<dyn ScheduledJob>) -> Self {
        self.triggers.push(Trigger { job, period });
        self
    }

    pub fn job_names(&self) -> Vec<&'static str> {
        self.triggers.iter().map(|t| t.job.name()).collect()
    }

    pub async fn is_running(&self) -> bool {
        self.running.lock().await.is_some()
    }

    /// Start one tick loop per trigger. Starting twice is a no-op.
    pub async fn start(&self) {
        let mut running = self.running.lock().await;
        if running.is_some() {
            return;
        }

        let cancel = CancellationToken::new();
        let loops = self
            .triggers
            .iter()
            .map(|t| {
                tracing::info!(
                    job = t.job.name(),
                    interval_secs = t.period.as_secs(),
                    "Scheduled trigger started"
                );
                tokio::spawn(tick_loop(Arc::clone(&t.job), t.period, cancel.clone()))
            })
            .collect();

        *running = Some(Running { cancel, loops });
    }

    /// Cancel all tick loops and wait up to `grace` for them to finish.
    ///
    /// Jobs already spawned by a tick are not interrupted. The scheduler
    /// can be started again afterwards.
    pub async fn stop(&self, grace: Duration) {
        let Some(running) = self.running.lock().await.take() else {
            return;
        };

        running.cancel.cancel();
        let joined = tokio::time::timeout(grace, async {
            for handle in running.loops {
                let _ = handle.await;
            }
        })
        .await;

        if joined.is_err() {
            tracing::warn!(grace_secs = grace.as_secs(), "Scheduler loops did not stop in time");
        } else {
            tracing::info!("Scheduler stopped");
        }
    }

    /// Run job `name` in the background and return without waiting.
    pub fn trigger(&self, name: &str) -> Result<JoinHandle<()>, SchedulerError> {
        let job = self.find(name)?;
        tracing::info!(job = job.name(), "Manual trigger");
        Ok(spawn_job(job))
    }

    /// Run job `name` to completion on the caller's task.
    pub async fn fire(&self, name: &str) -> Result<(), SchedulerError> {
        let job = self.find(name)?;
        job.run().await.map_err(|source| SchedulerError::Job {
            name: job.name(),
            source,
        })
    }

    fn find(&self, name: &str) -> Result<Arc<dyn ScheduledJob>, SchedulerError> {
        self.triggers
            .iter()
            .find(|t| t.job.name() == name)
            .map(|t| Arc::clone(&t.job))
            .ok_or_else(|| SchedulerError::UnknownJob(name.to_string()))
    }
}

async fn tick_loop(job: Arc<dyn ScheduledJob>, period: Duration, cancel: CancellationToken) {
    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!(job = job.name(), "Scheduled trigger stopping");
                break;
            }
            _ = interval.tick() => {
                spawn_job(Arc::clone(&job));
            }
        }
    }
}

fn spawn_job(job: Arc<dyn ScheduledJob>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let started = Instant::now();
        match job.run().await {
            Ok(()) => tracing::info!(
                job = job.name(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Scheduled job finished"
            ),
            Err(e) => tracing::error!(job = job.name(), error = %e, "Scheduled job failed"),
        }
    })
}

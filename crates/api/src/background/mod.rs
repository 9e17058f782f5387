//! Background tasks and scheduled jobs.
//!
//! [`scheduler::Scheduler`] owns the periodic triggers; each trigger runs
//! one [`scheduler::ScheduledJob`] from [`jobs`]. All loops stop through a
//! [`CancellationToken`](tokio_util::sync::CancellationToken) for graceful
//! shutdown.

pub mod jobs;
pub mod scheduler;

pub use jobs::{FullScrapeJob, RetentionJob, FULL_SCRAPE_JOB, RETENTION_JOB};
pub use scheduler::{JobError, ScheduledJob, Scheduler, SchedulerError};

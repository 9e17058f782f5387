use std::sync::Arc;

use scout_core::retention::{LocalAssetStore, RetentionSweeper};
use scout_db::retention::PgExpirableStore;

use crate::background::jobs::LastSweep;
use crate::background::{FullScrapeJob, RetentionJob, Scheduler};
use crate::config::ServerConfig;
use crate::scout::ScoutSupervisor;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: scout_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Launches dry runs and tracks live full runs.
    pub supervisor: Arc<ScoutSupervisor>,
    /// Periodic full-scrape and retention triggers.
    pub scheduler: Arc<Scheduler>,
    /// Report of the most recent retention sweep.
    pub last_sweep: LastSweep,
}

impl AppState {
    /// Wire the supervisor, sweeper and scheduler from `config`.
    ///
    /// The scheduler is built but not started.
    pub fn new(pool: scout_db::DbPool, config: ServerConfig) -> Self {
        let supervisor = Arc::new(ScoutSupervisor::new(
            config.scout.scraper_program(),
            config.scout.test_timeout(),
        ));

        let sweeper = Arc::new(RetentionSweeper::new(
            Arc::new(PgExpirableStore::with_defaults(pool.clone())),
            Arc::new(LocalAssetStore::new(config.retention.asset_root.clone())),
            config.retention.policy(),
        ));
        let last_sweep = LastSweep::default();

        let scheduler = Scheduler::new()
            .every(
                config.scout.scrape_interval(),
                Arc::new(FullScrapeJob::new(Arc::clone(&supervisor))),
            )
            .every(
                config.retention.interval(),
                Arc::new(RetentionJob::new(sweeper, last_sweep.clone())),
            );

        Self {
            pool,
            config: Arc::new(config),
            supervisor,
            scheduler: Arc::new(scheduler),
            last_sweep,
        }
    }
}

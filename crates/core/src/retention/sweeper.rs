//! The retention sweep.
//!
//! For every retained resource the sweep runs two batches, UTC-qualified
//! values first and local values second, each against its own cutoff. Every
//! candidate is handled independently: its asset is deleted best-effort,
//! then the record itself. Failures are collected in the [`SweepReport`]
//! and never abort the remaining items.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;

use super::assets::{AssetError, AssetStore};
use super::policy::{Cutoff, RetentionPolicy, TimestampPolicy};
use super::timestamp::EndOfLife;
use super::{ExpirableRow, ExpirableStore};
use crate::types::{DbId, Timestamp};

/// One record touched by a sweep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SweptItem {
    pub resource: String,
    pub id: DbId,
    pub policy: TimestampPolicy,
}

/// A record the sweep could not fully process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedItem {
    pub resource: String,
    pub id: DbId,
    pub error: String,
}

/// A candidate query that failed, skipping its whole batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedQuery {
    pub resource: String,
    pub policy: TimestampPolicy,
    pub error: String,
}

/// Outcome of one sweep.
#[derive(Debug, Clone, Serialize)]
pub struct SweepReport {
    pub started_at: Timestamp,
    pub finished_at: Timestamp,
    /// Records removed from storage.
    pub deleted: Vec<SweptItem>,
    /// Records whose deletion failed; they remain in storage.
    pub failed: Vec<FailedItem>,
    /// Records deleted although their asset could not be removed.
    pub asset_failures: Vec<FailedItem>,
    /// Candidates whose end-of-life text could not be parsed; left alone.
    pub unparseable: Vec<FailedItem>,
    pub failed_queries: Vec<FailedQuery>,
}

impl SweepReport {
    fn new(started_at: Timestamp) -> Self {
        Self {
            started_at,
            finished_at: started_at,
            deleted: Vec::new(),
            failed: Vec::new(),
            asset_failures: Vec::new(),
            unparseable: Vec::new(),
            failed_queries: Vec::new(),
        }
    }

    pub fn deleted_count(&self) -> usize {
        self.deleted.len()
    }

    /// Ids of records that could not be deleted.
    pub fn failed_ids(&self) -> Vec<DbId> {
        self.failed.iter().map(|f| f.id).collect()
    }

    /// Whether anything went wrong, asset failures included.
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
            || !self.asset_failures.is_empty()
            || !self.failed_queries.is_empty()
    }
}

/// Deletes expired records and their stored assets.
pub struct RetentionSweeper {
    store: Arc<dyn ExpirableStore>,
    assets: Arc<dyn AssetStore>,
    policy: RetentionPolicy,
}

impl RetentionSweeper {
    pub fn new(
        store: Arc<dyn ExpirableStore>,
        assets: Arc<dyn AssetStore>,
        policy: RetentionPolicy,
    ) -> Self {
        Self {
            store,
            assets,
            policy,
        }
    }

    /// Run one sweep against the current time.
    pub async fn sweep(&self) -> SweepReport {
        self.sweep_at(Utc::now()).await
    }

    /// Run one sweep as if the current time were `now`.
    pub async fn sweep_at(&self, now: Timestamp) -> SweepReport {
        let mut report = SweepReport::new(now);

        for resource in self.store.resources() {
            for cutoff in self.policy.cutoffs(now) {
                self.sweep_batch(&resource, cutoff, now, &mut report).await;
            }
        }

        report.finished_at = Utc::now();
        tracing::info!(
            deleted = report.deleted.len(),
            failed = report.failed.len(),
            asset_failures = report.asset_failures.len(),
            unparseable = report.unparseable.len(),
            failed_queries = report.failed_queries.len(),
            "Retention sweep finished"
        );
        report
    }

    async fn sweep_batch(
        &self,
        resource: &str,
        cutoff: Cutoff,
        now: Timestamp,
        report: &mut SweepReport,
    ) {
        let policy = cutoff.policy();
        let rows = match self.store.candidates(resource, cutoff).await {
            Ok(rows) => rows,
            Err(e) => {
                tracing::error!(resource, policy = policy.as_str(), error = %e, "Retention candidate query failed");
                report.failed_queries.push(FailedQuery {
                    resource: resource.to_string(),
                    policy,
                    error: e.to_string(),
                });
                return;
            }
        };

        for row in rows {
            let Some(eol) = EndOfLife::parse(&row.end_of_life) else {
                tracing::warn!(resource, id = row.id, end_of_life = %row.end_of_life, "Unparseable end-of-life, skipping");
                report.unparseable.push(FailedItem {
                    resource: row.resource.clone(),
                    id: row.id,
                    error: format!("unparseable end-of-life '{}'", row.end_of_life),
                });
                continue;
            };
            let expired = match cutoff.has_expired(&eol) {
                Some(expired) => expired,
                None => {
                    // The store put this row in the other batch; judge it by its own rule.
                    tracing::warn!(resource, id = row.id, end_of_life = %row.end_of_life, batch = policy.as_str(), "End-of-life selected under the other policy");
                    self.policy.is_expired(&eol, now)
                }
            };
            if !expired {
                continue;
            }
            let own_policy = if eol.is_utc() {
                TimestampPolicy::Utc
            } else {
                TimestampPolicy::Local
            };
            self.delete_item(&row, own_policy, report).await;
        }
    }

    async fn delete_item(&self, row: &ExpirableRow, policy: TimestampPolicy, report: &mut SweepReport) {
        if let Some(path) = row.asset_path.as_deref().filter(|p| !p.trim().is_empty()) {
            match self.assets.delete(path).await {
                Ok(()) => {
                    tracing::debug!(resource = %row.resource, id = row.id, path, "Deleted asset");
                }
                Err(AssetError::NotFound(_)) => {
                    tracing::debug!(resource = %row.resource, id = row.id, path, "Asset already absent");
                }
                Err(e) => {
                    tracing::warn!(resource = %row.resource, id = row.id, error = %e, "Asset delete failed, deleting record anyway");
                    report.asset_failures.push(FailedItem {
                        resource: row.resource.clone(),
                        id: row.id,
                        error: e.to_string(),
                    });
                }
            }
        }

        match self.store.delete(&row.resource, row.id).await {
            Ok(true) => report.deleted.push(SweptItem {
                resource: row.resource.clone(),
                id: row.id,
                policy,
            }),
            Ok(false) => {
                tracing::debug!(resource = %row.resource, id = row.id, "Record already gone");
            }
            Err(e) => {
                tracing::error!(resource = %row.resource, id = row.id, error = %e, "Failed to delete expired record");
                report.failed.push(FailedItem {
                    resource: row.resource.clone(),
                    id: row.id,
                    error: e.to_string(),
                });
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! PostgreSQL implementation of the sweeper's storage seam.

use async_trait::async_trait;
use chrono::Duration;
use scout_core::retention::{Cutoff, ExpirableRow, ExpirableStore, StorageError};
use scout_core::types::DbId;

use crate::repositories::{ExpirableRepo, RetainedResource};
use crate::DbPool;

/// Expirable tables reached through a shared pool.
#[derive(Clone)]
pub struct PgExpirableStore {
    pool: DbPool,
    resources: Vec<RetainedResource>,
}

impl PgExpirableStore {
    pub fn new(pool: DbPool, resources: Vec<RetainedResource>) -> Self {
        Self { pool, resources }
    }

    /// Store over [`RetainedResource::DEFAULTS`].
    pub fn with_defaults(pool: DbPool) -> Self {
        Self::new(pool, RetainedResource::DEFAULTS.to_vec())
    }

    fn resource(&self, name: &str) -> Result<&RetainedResource, StorageError> {
        self.resources
            .iter()
            .find(|r| r.table == name)
            .ok_or_else(|| StorageError::new(format!("Unknown retained resource '{name}'")))
    }
}

/// Latest ISO date prefix a candidate may carry for `cutoff`.
///
/// UTC-qualified rows store their date in their own offset, which may be
/// up to a day ahead of the UTC date, so that batch gets one day of slack.
fn max_date_prefix(cutoff: Cutoff) -> String {
    match cutoff {
        Cutoff::Utc(at) => (at + Duration::days(1)).format("%Y-%m-%d").to_string(),
        Cutoff::Local(at) => at.format("%Y-%m-%d").to_string(),
    }
}

#[async_trait]
impl ExpirableStore for PgExpirableStore {
    fn resources(&self) -> Vec<String> {
        self.resources.iter().map(|r| r.table.to_string()).collect()
    }

    async fn candidates(
        &self,
        resource: &str,
        cutoff: Cutoff,
    ) -> Result<Vec<ExpirableRow>, StorageError> {
        let table = self.resource(resource)?;
        let utc = matches!(cutoff, Cutoff::Utc(_));
        let records = ExpirableRepo::candidates(&self.pool, table, utc, &max_date_prefix(cutoff))
            .await
            .map_err(StorageError::from_source)?;

        Ok(records
            .into_iter()
            .map(|r| ExpirableRow {
                resource: table.table.to_string(),
                id: r.id,
                end_of_life: r.end_of_life,
                asset_path: r.asset_path,
            })
            .collect())
    }

    async fn delete(&self, resource: &str, id: DbId) -> Result<bool, StorageError> {
        let table = self.resource(resource)?;
        ExpirableRepo::delete(&self.pool, table, id)
            .await
            .map_err(StorageError::from_source)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone, Utc};

    use super::*;

    #[test]
    fn utc_prefix_has_a_day_of_slack() {
        let cutoff = Cutoff::Utc(Utc.with_ymd_and_hms(2026, 10, 12, 22, 0, 0).unwrap());
        assert_eq!(max_date_prefix(cutoff), "2026-10-13");
    }

    #[test]
    fn local_prefix_is_exact() {
        let at = NaiveDate::from_ymd_opt(2026, 10, 11)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();
        assert_eq!(max_date_prefix(Cutoff::Local(at)), "2026-10-11");
    }
}

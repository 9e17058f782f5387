//! Repository for the `scout_targets` table.

use sqlx::PgPool;
use scout_core::types::DbId;

use crate::models::scout_target::{CreateScoutTarget, ScoutTarget};

/// Column list for `scout_targets` SELECT queries.
const COLUMNS: &str = "\
    id, name, url, city, selector, \
    last_run_at, last_run_status_id, last_events_found, \
    created_at, updated_at";

/// Provides query operations for scrape targets.
pub struct ScoutTargetRepo;

impl ScoutTargetRepo {
    /// Register a new target.
    pub async fn create(
        pool: &PgPool,
        dto: &CreateScoutTarget,
    ) -> Result<ScoutTarget, sqlx::Error> {
        let query = format!(
            "INSERT INTO scout_targets (name, url, city, selector) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ScoutTarget>(&query)
            .bind(&dto.name)
            .bind(&dto.url)
            .bind(&dto.city)
            .bind(&dto.selector)
            .fetch_one(pool)
            .await
    }

    /// Find a target by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<ScoutTarget>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM scout_targets WHERE id = $1");
        sqlx::query_as::<_, ScoutTarget>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List all targets ordered by name.
    pub async fn list(pool: &PgPool) -> Result<Vec<ScoutTarget>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM scout_targets ORDER BY name, id");
        sqlx::query_as::<_, ScoutTarget>(&query)
            .fetch_all(pool)
            .await
    }

    /// Delete a target. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM scout_targets WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

//! Repository for retention candidates across expirable tables.

use sqlx::PgPool;
use scout_core::retention::timestamp::UTC_QUALIFIED_PATTERN;
use scout_core::types::DbId;

use crate::models::expirable::ExpirableRecord;

/// Table layout of one expirable resource type.
///
/// Names are compile-time constants and are interpolated into SQL; they
/// must never come from user input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetainedResource {
    pub table: &'static str,
    pub id_column: &'static str,
    pub end_column: &'static str,
    pub asset_column: Option<&'static str>,
}

impl RetainedResource {
    /// Scraped event listings with their uploaded poster image.
    pub const EVENTS: RetainedResource = RetainedResource {
        table: "events",
        id_column: "id",
        end_column: "end_time",
        asset_column: Some("image_path"),
    };

    /// All resources swept by default.
    pub const DEFAULTS: &'static [RetainedResource] = &[RetainedResource::EVENTS];
}

/// Provides retention queries over [`RetainedResource`] tables.
pub struct ExpirableRepo;

impl ExpirableRepo {
    /// Rows whose end-of-life is (or is not) UTC-qualified and whose ISO
    /// date prefix is on or before `max_date` (`YYYY-MM-DD`).
    ///
    /// Both tests run on the text with surrounding whitespace stripped, as
    /// the parser sees it. The date prefix is only a coarse pre-filter;
    /// exact comparison happens after parsing.
    pub async fn candidates(
        pool: &PgPool,
        resource: &RetainedResource,
        utc_qualified: bool,
        max_date: &str,
    ) -> Result<Vec<ExpirableRecord>, sqlx::Error> {
        let asset = resource.asset_column.unwrap_or("NULL");
        let query = format!(
            "SELECT {id} AS id, {end} AS end_of_life, {asset}::text AS asset_path \
             FROM {table} \
             WHERE (btrim({end}, E' \\t\\r\\n') ~ $1) = $2 \
               AND left(btrim({end}, E' \\t\\r\\n'), 10) <= $3 \
             ORDER BY {id}",
            id = resource.id_column,
            end = resource.end_column,
            table = resource.table,
        );
        sqlx::query_as::<_, ExpirableRecord>(&query)
            .bind(UTC_QUALIFIED_PATTERN)
            .bind(utc_qualified)
            .bind(max_date)
            .fetch_all(pool)
            .await
    }

    /// Delete one row. Returns `true` if a row was removed.
    pub async fn delete(
        pool: &PgPool,
        resource: &RetainedResource,
        id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let query = format!(
            "DELETE FROM {table} WHERE {id_column} = $1",
            table = resource.table,
            id_column = resource.id_column,
        );
        let result = sqlx::query(&query).bind(id).execute(pool).await?;
        Ok(result.rows_affected() > 0)
    }
}

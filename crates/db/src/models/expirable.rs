//! Rows read by the retention sweep.

use sqlx::FromRow;
use scout_core::types::DbId;

/// Id, end-of-life text and asset path of an expirable row.
///
/// Column names are aliased in the query so every retained table maps onto
/// this shape.
#[derive(Debug, Clone, FromRow)]
pub struct ExpirableRecord {
    pub id: DbId,
    pub end_of_life: String,
    pub asset_path: Option<String>,
}

//! Scrape target models (`scout_targets` table).

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use scout_core::types::{DbId, Timestamp};

/// A configured source the scraper can be pointed at.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ScoutTarget {
    pub id: DbId,
    pub name: String,
    pub url: String,
    pub city: Option<String>,
    pub selector: Option<String>,
    pub last_run_at: Option<Timestamp>,
    pub last_run_status_id: Option<i16>,
    pub last_events_found: Option<i32>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for registering a new target.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateScoutTarget {
    pub name: String,
    pub url: String,
    pub city: Option<String>,
    pub selector: Option<String>,
}

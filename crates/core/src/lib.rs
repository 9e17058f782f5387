//! Scout domain logic.
//!
//! Pure business logic for the scraper orchestration and retention engine.
//! No database access lives here; the `db` crate implements the storage
//! seams declared by [`retention`] and persists the state described by
//! [`scout`].

pub mod error;
pub mod retention;
pub mod scout;
pub mod types;

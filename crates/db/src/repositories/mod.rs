//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods
//! that accept `&PgPool` as the first argument.

pub mod expirable_repo;
pub mod scout_run_repo;
pub mod scout_target_repo;

pub use expirable_repo::{ExpirableRepo, RetainedResource};
pub use scout_run_repo::{RunReportError, ScoutRunRepo};
pub use scout_target_repo::ScoutTargetRepo;

//! Scraper process supervision for the HTTP surface and scheduler.

pub mod supervisor;

pub use supervisor::{LaunchError, LiveRun, ScoutSupervisor, TestOutcome};

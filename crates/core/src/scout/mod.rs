//! Scraper orchestration domain logic.
//!
//! Everything needed to launch and observe the external scraper without
//! touching the database: run status and registry rules, command-line
//! construction, subprocess streaming and preview extraction.

pub mod invocation;
pub mod preview;
pub mod run;
pub mod status;
pub mod subprocess;

/// Errors raised while launching or observing the scraper process.
#[derive(Debug, thiserror::Error)]
pub enum ScoutError {
    /// The scraper process could not be started.
    #[error("Failed to spawn scraper '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// I/O failure while waiting on a running scraper.
    #[error("I/O error while supervising scraper: {0}")]
    Io(#[source] std::io::Error),
}

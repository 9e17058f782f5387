//! Scraper command-line construction.
//!
//! The scraper is always spawned directly (never through a shell) and every
//! caller-controlled value becomes exactly one argv entry.

use std::path::PathBuf;

use tokio::process::Command;

use crate::error::CoreError;

/// Flag that switches the scraper into preview mode.
pub const DRY_RUN_FLAG: &str = "--dry-run";

/// Environment variable carrying the run id into the scraper.
pub const RUN_ID_ENV: &str = "SCOUT_RUN_ID";

/// Maximum accepted URL length.
const MAX_URL_LEN: usize = 2048;

/// Location and fixed arguments of the external scraper.
#[derive(Debug, Clone)]
pub struct ScraperProgram {
    /// Executable to spawn (e.g. `node`).
    pub program: String,
    /// Arguments always passed first (e.g. the entry script path).
    pub base_args: Vec<String>,
    /// Working directory for the child process (current dir if `None`).
    pub working_directory: Option<PathBuf>,
}

/// How the scraper should run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrapeMode {
    /// Extract one preview event and persist nothing.
    DryRun,
    /// Scrape and persist.
    Full,
}

/// One requested scraper invocation.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub mode: ScrapeMode,
    /// Single URL override; `None` scrapes every configured target.
    pub url: Option<String>,
    pub city: Option<String>,
    pub selector: Option<String>,
    pub run_id: Option<String>,
}

impl Invocation {
    /// Dry-run against a single URL.
    pub fn dry_run(url: impl Into<String>) -> Self {
        Self {
            mode: ScrapeMode::DryRun,
            url: Some(url.into()),
            city: None,
            selector: None,
            run_id: None,
        }
    }

    /// Full run, optionally restricted to one URL.
    pub fn full(url: Option<String>, run_id: impl Into<String>) -> Self {
        Self {
            mode: ScrapeMode::Full,
            url,
            city: None,
            selector: None,
            run_id: Some(run_id.into()),
        }
    }

    /// Attach target hints (city and selector).
    pub fn with_target_hints(mut self, city: Option<String>, selector: Option<String>) -> Self {
        self.city = city;
        self.selector = selector;
        self
    }

    /// Argument list appended after the program's base arguments.
    ///
    /// Layout: `[--dry-run] [--run-id ID] [--city C] [--selector S] [URL]`.
    pub fn args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if self.mode == ScrapeMode::DryRun {
            args.push(DRY_RUN_FLAG.to_string());
        }
        if let Some(run_id) = &self.run_id {
            args.push("--run-id".to_string());
            args.push(run_id.clone());
        }
        if let Some(city) = &self.city {
            args.push("--city".to_string());
            args.push(city.clone());
        }
        if let Some(selector) = &self.selector {
            args.push("--selector".to_string());
            args.push(selector.clone());
        }
        if let Some(url) = &self.url {
            args.push(url.clone());
        }
        args
    }
}

impl ScraperProgram {
    /// Build the command for `invocation`. Stdio is left to the caller.
    pub fn command(&self, invocation: &Invocation) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.base_args).args(invocation.args());
        if let Some(dir) = &self.working_directory {
            cmd.current_dir(dir);
        }
        if let Some(run_id) = &invocation.run_id {
            cmd.env(RUN_ID_ENV, run_id);
        }
        cmd
    }

    /// Human-readable command line for logs.
    pub fn describe(&self, invocation: &Invocation) -> String {
        std::iter::once(self.program.clone())
            .chain(self.base_args.iter().cloned())
            .chain(invocation.args())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Validate a scrape URL supplied by an operator.
///
/// Only absolute `http`/`https` URLs without whitespace or control
/// characters are accepted, which also rules out values the scraper could
/// mistake for a flag.
pub fn validate_url(url: &str) -> Result<(), CoreError> {
    if url.is_empty() {
        return Err(CoreError::Validation("URL must not be empty".into()));
    }
    if url.len() > MAX_URL_LEN {
        return Err(CoreError::Validation(format!(
            "URL must be at most {MAX_URL_LEN} characters"
        )));
    }
    let lower = url.to_ascii_lowercase();
    let rest = lower
        .strip_prefix("https://")
        .or_else(|| lower.strip_prefix("http://"))
        .ok_or_else(|| CoreError::Validation(format!("URL '{url}' must use http or https")))?;
    if rest.is_empty() || rest.starts_with('/') {
        return Err(CoreError::Validation(format!("URL '{url}' has no host")));
    }
    if url.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(CoreError::Validation(format!(
            "URL '{url}' contains whitespace or control characters"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dry_run_args() {
        let inv = Invocation::dry_run("https://example.com/events");
        assert_eq!(inv.args(), vec!["--dry-run", "https://example.com/events"]);
    }

    #[test]
    fn full_run_without_url_scrapes_everything() {
        let inv = Invocation::full(None, "run-42");
        assert_eq!(inv.args(), vec!["--run-id", "run-42"]);
    }

    #[test]
    fn target_hints_become_separate_arguments() {
        let inv = Invocation::full(Some("https://example.com/a b".into()), "r")
            .with_target_hints(Some("Berlin".into()), Some(".event-card; rm -rf".into()));
        assert_eq!(
            inv.args(),
            vec![
                "--run-id",
                "r",
                "--city",
                "Berlin",
                "--selector",
                ".event-card; rm -rf",
                "https://example.com/a b",
            ]
        );
    }

    #[test]
    fn describe_joins_program_and_args() {
        let program = ScraperProgram {
            program: "node".into(),
            base_args: vec!["scout/index.js".into()],
            working_directory: None,
        };
        let inv = Invocation::dry_run("https://example.com");
        assert_eq!(
            program.describe(&inv),
            "node scout/index.js --dry-run https://example.com"
        );
    }

    #[test]
    fn url_validation() {
        assert!(validate_url("https://example.com/events").is_ok());
        assert!(validate_url("HTTP://EXAMPLE.COM").is_ok());
        assert!(validate_url("").is_err());
        assert!(validate_url("--dry-run").is_err());
        assert!(validate_url("ftp://example.com").is_err());
        assert!(validate_url("https://").is_err());
        assert!(validate_url("https:///path").is_err());
        assert!(validate_url("https://example.com/a b").is_err());
        assert!(validate_url("https://example.com/\n--flag").is_err());
        assert!(validate_url(&format!("https://example.com/{}", "a".repeat(MAX_URL_LEN))).is_err());
    }
}

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use scout_core::retention::policy::{DEFAULT_LOCAL_RETENTION_DAYS, DEFAULT_UTC_RETENTION_DAYS};
use scout_core::retention::RetentionPolicy;
use scout_core::scout::invocation::ScraperProgram;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `60`, above the dry-run budget).
    pub request_timeout_secs: u64,
    /// Upper bound on waiting for background loops at shutdown (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// Whether the periodic triggers run at all (default: `true`).
    pub scheduler_enabled: bool,
    pub scout: ScoutConfig,
    pub retention: RetentionConfig,
}

/// How the external scraper is launched.
#[derive(Debug, Clone)]
pub struct ScoutConfig {
    /// Executable (default: `node`).
    pub program: String,
    /// Whitespace-separated fixed arguments (default: `scout/index.js`).
    pub args: Vec<String>,
    /// Working directory for every spawn (default: the server's own).
    pub working_directory: Option<PathBuf>,
    /// Dry-run wall-clock budget in seconds (default: `45`).
    pub test_timeout_secs: u64,
    /// Full-scrape trigger period in seconds (default: `21600`, 6 hours).
    pub scrape_interval_secs: u64,
}

/// Retention sweep settings.
#[derive(Debug, Clone)]
pub struct RetentionConfig {
    /// Sweep trigger period in seconds (default: `3600`).
    pub interval_secs: u64,
    /// Window for UTC-qualified end-of-life values (default: `7`).
    pub utc_days: i64,
    /// Window for naive local end-of-life values (default: `8`).
    pub local_days: i64,
    /// Directory stored asset paths resolve under (default: `./public`).
    pub asset_root: PathBuf,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `60`                       |
    /// | `SHUTDOWN_TIMEOUT_SECS`| `30`                       |
    /// | `SCHEDULER_ENABLED`    | `true`                     |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = parse_env("PORT", "3000");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = parse_env("REQUEST_TIMEOUT_SECS", "60");
        let shutdown_timeout_secs: u64 = parse_env("SHUTDOWN_TIMEOUT_SECS", "30");
        let scheduler_enabled: bool = parse_env("SCHEDULER_ENABLED", "true");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            scheduler_enabled,
            scout: ScoutConfig::from_env(),
            retention: RetentionConfig::from_env(),
        }
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

impl ScoutConfig {
    /// | Env Var                      | Default          |
    /// |------------------------------|------------------|
    /// | `SCOUT_PROGRAM`              | `node`           |
    /// | `SCOUT_ARGS`                 | `scout/index.js` |
    /// | `SCOUT_WORKDIR`              | current dir      |
    /// | `SCOUT_TEST_TIMEOUT_SECS`    | `45`             |
    /// | `SCOUT_SCRAPE_INTERVAL_SECS` | `21600`          |
    pub fn from_env() -> Self {
        let program = std::env::var("SCOUT_PROGRAM").unwrap_or_else(|_| "node".into());

        let args = std::env::var("SCOUT_ARGS")
            .unwrap_or_else(|_| "scout/index.js".into())
            .split_whitespace()
            .map(str::to_string)
            .collect();

        let working_directory = std::env::var("SCOUT_WORKDIR")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        Self {
            program,
            args,
            working_directory,
            test_timeout_secs: parse_env("SCOUT_TEST_TIMEOUT_SECS", "45"),
            scrape_interval_secs: parse_env("SCOUT_SCRAPE_INTERVAL_SECS", "21600"),
        }
    }

    pub fn scraper_program(&self) -> ScraperProgram {
        ScraperProgram {
            program: self.program.clone(),
            base_args: self.args.clone(),
            working_directory: self.working_directory.clone(),
        }
    }

    pub fn test_timeout(&self) -> Duration {
        Duration::from_secs(self.test_timeout_secs)
    }

    pub fn scrape_interval(&self) -> Duration {
        Duration::from_secs(self.scrape_interval_secs)
    }
}

impl RetentionConfig {
    /// | Env Var                   | Default    |
    /// |---------------------------|------------|
    /// | `RETENTION_INTERVAL_SECS` | `3600`     |
    /// | `RETENTION_UTC_DAYS`      | `7`        |
    /// | `RETENTION_LOCAL_DAYS`    | `8`        |
    /// | `ASSET_ROOT`              | `./public` |
    pub fn from_env() -> Self {
        Self {
            interval_secs: parse_env("RETENTION_INTERVAL_SECS", "3600"),
            utc_days: parse_env("RETENTION_UTC_DAYS", &DEFAULT_UTC_RETENTION_DAYS.to_string()),
            local_days: parse_env(
                "RETENTION_LOCAL_DAYS",
                &DEFAULT_LOCAL_RETENTION_DAYS.to_string(),
            ),
            asset_root: std::env::var("ASSET_ROOT")
                .unwrap_or_else(|_| "./public".into())
                .into(),
        }
    }

    pub fn policy(&self) -> RetentionPolicy {
        RetentionPolicy::from_days(self.utc_days, self.local_days)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

/// Read `name`, falling back to `default`, and panic on an unparseable value.
fn parse_env<T>(name: &str, default: &str) -> T
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = std::env::var(name).unwrap_or_else(|_| default.to_string());
    raw.trim()
        .parse()
        .unwrap_or_else(|e| panic!("{name} must be a valid {}: {e}", std::any::type_name::<T>()))
}

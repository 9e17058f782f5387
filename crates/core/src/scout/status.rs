//! Scout run lifecycle status.
//!
//! Discriminants must match the seed data in
//! `20261001000001_create_scout_runs_table.sql`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle status of a single scraper run.
///
/// `Starting` is instantaneous (process spawn), `Running` persists until the
/// process exits, and the remaining three variants are terminal.
#[repr(i16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Starting = 1,
    Running = 2,
    #[serde(alias = "completed", alias = "success")]
    Succeeded = 3,
    #[serde(alias = "error")]
    Failed = 4,
    #[serde(alias = "timeout")]
    TimedOut = 5,
}

impl RunStatus {
    /// All statuses in discriminant order.
    pub const ALL: [RunStatus; 5] = [
        RunStatus::Starting,
        RunStatus::Running,
        RunStatus::Succeeded,
        RunStatus::Failed,
        RunStatus::TimedOut,
    ];

    /// Return the database status ID.
    pub fn id(self) -> i16 {
        self as i16
    }

    /// Look up a status by its database ID.
    pub fn from_id(id: i16) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.id() == id)
    }

    /// Machine name, identical to `run_statuses.name`.
    pub fn name(self) -> &'static str {
        match self {
            RunStatus::Starting => "starting",
            RunStatus::Running => "running",
            RunStatus::Succeeded => "succeeded",
            RunStatus::Failed => "failed",
            RunStatus::TimedOut => "timed_out",
        }
    }

    /// Terminal statuses never transition again.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RunStatus::Succeeded | RunStatus::Failed | RunStatus::TimedOut
        )
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<RunStatus> for i16 {
    fn from(value: RunStatus) -> Self {
        value as i16
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_sequential_and_round_trip() {
        for (idx, status) in RunStatus::ALL.into_iter().enumerate() {
            assert_eq!(status.id(), idx as i16 + 1);
            assert_eq!(RunStatus::from_id(status.id()), Some(status));
        }
        assert_eq!(RunStatus::from_id(0), None);
        assert_eq!(RunStatus::from_id(6), None);
    }

    #[test]
    fn only_outcomes_are_terminal() {
        assert!(!RunStatus::Starting.is_terminal());
        assert!(!RunStatus::Running.is_terminal());
        assert!(RunStatus::Succeeded.is_terminal());
        assert!(RunStatus::Failed.is_terminal());
        assert!(RunStatus::TimedOut.is_terminal());
    }

    #[test]
    fn serde_uses_machine_names_and_accepts_aliases() {
        assert_eq!(
            serde_json::to_value(RunStatus::TimedOut).unwrap(),
            serde_json::json!("timed_out")
        );
        let parsed: RunStatus = serde_json::from_str("\"completed\"").unwrap();
        assert_eq!(parsed, RunStatus::Succeeded);
        let parsed: RunStatus = serde_json::from_str("\"running\"").unwrap();
        assert_eq!(parsed, RunStatus::Running);
        assert!(serde_json::from_str::<RunStatus>("\"revived\"").is_err());
    }

    #[test]
    fn display_matches_name() {
        for status in RunStatus::ALL {
            assert_eq!(status.to_string(), status.name());
        }
    }
}

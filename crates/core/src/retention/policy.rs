//! Retention windows for the two end-of-life interpretation rules.

use chrono::{DateTime, Duration, Local, NaiveDateTime, Utc};
use serde::Serialize;

use super::timestamp::EndOfLife;

/// Default window for UTC-qualified end-of-life values (days).
pub const DEFAULT_UTC_RETENTION_DAYS: i64 = 7;

/// Default window for local (unqualified) end-of-life values (days).
///
/// One day longer than the UTC window: an unknown local offset must never
/// cause premature deletion.
pub const DEFAULT_LOCAL_RETENTION_DAYS: i64 = 8;

/// Which interpretation rule a candidate batch was selected under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimestampPolicy {
    Utc,
    Local,
}

impl TimestampPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            TimestampPolicy::Utc => "utc",
            TimestampPolicy::Local => "local",
        }
    }
}

/// The deletion threshold for one batch, tagged by policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cutoff {
    Utc(DateTime<Utc>),
    Local(NaiveDateTime),
}

impl Cutoff {
    pub fn policy(&self) -> TimestampPolicy {
        match self {
            Cutoff::Utc(_) => TimestampPolicy::Utc,
            Cutoff::Local(_) => TimestampPolicy::Local,
        }
    }

    /// `Some(true)` when `eol` is strictly older than this cutoff, `None`
    /// when `eol` follows the other policy.
    pub fn has_expired(&self, eol: &EndOfLife) -> Option<bool> {
        match (self, eol) {
            (Cutoff::Utc(cutoff), EndOfLife::Utc(at)) => Some(at < cutoff),
            (Cutoff::Local(cutoff), EndOfLife::Local(at)) => Some(at < cutoff),
            _ => None,
        }
    }
}

/// Retention windows per interpretation rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    pub utc_window: Duration,
    pub local_window: Duration,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            utc_window: Duration::days(DEFAULT_UTC_RETENTION_DAYS),
            local_window: Duration::days(DEFAULT_LOCAL_RETENTION_DAYS),
        }
    }
}

impl RetentionPolicy {
    /// Build a policy from day counts.
    pub fn from_days(utc_days: i64, local_days: i64) -> Self {
        Self {
            utc_window: Duration::days(utc_days),
            local_window: Duration::days(local_days),
        }
    }

    /// Cutoff for UTC-qualified values at `now`.
    pub fn utc_cutoff(&self, now: DateTime<Utc>) -> Cutoff {
        Cutoff::Utc(now - self.utc_window)
    }

    /// Cutoff for local values at `now`, expressed in server local time.
    pub fn local_cutoff(&self, now: DateTime<Utc>) -> Cutoff {
        Cutoff::Local(now.with_timezone(&Local).naive_local() - self.local_window)
    }

    /// Both cutoffs, UTC batch first.
    pub fn cutoffs(&self, now: DateTime<Utc>) -> [Cutoff; 2] {
        [self.utc_cutoff(now), self.local_cutoff(now)]
    }

    /// Whether `eol` is eligible for deletion at `now`.
    pub fn is_expired(&self, eol: &EndOfLife, now: DateTime<Utc>) -> bool {
        let cutoff = match eol {
            EndOfLife::Utc(_) => self.utc_cutoff(now),
            EndOfLife::Local(_) => self.local_cutoff(now),
        };
        cutoff.has_expired(eol).unwrap_or(false)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn local_now(now: DateTime<Utc>) -> NaiveDateTime {
        now.with_timezone(&Local).naive_local()
    }

    #[test]
    fn utc_window_is_seven_days() {
        let policy = RetentionPolicy::default();
        let now = Utc::now();
        assert!(!policy.is_expired(&EndOfLife::Utc(now - Duration::days(6)), now));
        assert!(policy.is_expired(&EndOfLife::Utc(now - Duration::days(8)), now));
    }

    #[test]
    fn local_window_is_eight_days() {
        let policy = RetentionPolicy::default();
        let now = Utc::now();
        let seven_and_a_half = local_now(now) - Duration::hours(7 * 24 + 12);
        let nine = local_now(now) - Duration::days(9);
        assert!(!policy.is_expired(&EndOfLife::Local(seven_and_a_half), now));
        assert!(policy.is_expired(&EndOfLife::Local(nine), now));
    }

    #[test]
    fn boundary_is_strict() {
        let policy = RetentionPolicy::default();
        let now = Utc::now();
        let exactly = EndOfLife::Utc(now - Duration::days(7));
        assert!(!policy.is_expired(&exactly, now));
    }

    #[test]
    fn cutoff_ignores_other_policy() {
        let now = Utc::now();
        let cutoff = RetentionPolicy::default().utc_cutoff(now);
        assert_eq!(cutoff.policy(), TimestampPolicy::Utc);
        assert_eq!(
            cutoff.has_expired(&EndOfLife::Local(local_now(now) - Duration::days(30))),
            None
        );
    }

    #[test]
    fn custom_windows() {
        let policy = RetentionPolicy::from_days(1, 2);
        let now = Utc::now();
        assert!(policy.is_expired(&EndOfLife::Utc(now - Duration::hours(25)), now));
        assert!(!policy.is_expired(
            &EndOfLife::Local(local_now(now) - Duration::hours(47)),
            now
        ));
    }
}

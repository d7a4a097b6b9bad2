//! Days-remaining arithmetic and severity tiers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Above this many days an expiry is `Safe`.
pub const SAFE_ABOVE_DAYS: i64 = 60;

/// Above this many days (and up to `SAFE_ABOVE_DAYS`) an expiry is `Warning`.
pub const WARNING_ABOVE_DAYS: i64 = 30;

/// How urgently an expiry needs attention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Safe,
    Warning,
    Urgent,
}

impl Severity {
    /// Classify a days-remaining count.
    ///
    /// `> 60` is `Safe`, `31..=60` is `Warning`, anything else is `Urgent`.
    pub fn classify(days_remaining: i64) -> Self {
        if days_remaining > SAFE_ABOVE_DAYS {
            Severity::Safe
        } else if days_remaining > WARNING_ABOVE_DAYS {
            Severity::Warning
        } else {
            Severity::Urgent
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Safe => write!(f, "safe"),
            Severity::Warning => write!(f, "warning"),
            Severity::Urgent => write!(f, "urgent"),
        }
    }
}

/// Whole days from `now` until `expires_at`, rounded down, never negative.
pub fn days_remaining(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    if expires_at <= now {
        return 0;
    }
    // Positive spans truncate toward zero, which is the floor.
    (expires_at - now).num_days()
}

/// An expiry date with its derived countdown and tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExpiryStatus {
    pub expires_at: DateTime<Utc>,
    pub days_remaining: i64,
    pub severity: Severity,
}

impl ExpiryStatus {
    pub fn new(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        let days = days_remaining(expires_at, now);
        Self {
            expires_at,
            days_remaining: days,
            severity: Severity::classify(days),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

//! Decision and statistics types produced by the request governor.

// Author: kelexine (https://github.com/kelexine)

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Why the governor refused a request. Ordered by check priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DenialReason {
    /// The rolling 24 hour quota is used up.
    DailyLimit,
    /// The previous request was too recent.
    Cooldown,
    /// The trailing 60 second window is full.
    PerMinute,
}

impl DenialReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DenialReason::DailyLimit => "daily_limit",
            DenialReason::Cooldown => "cooldown",
            DenialReason::PerMinute => "per_minute",
        }
    }
}

impl fmt::Display for DenialReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            DenialReason::DailyLimit => "Daily limit reached",
            DenialReason::Cooldown => "Please wait a moment between requests",
            DenialReason::PerMinute => "Too many requests this minute",
        };
        f.write_str(message)
    }
}

/// Outcome of a permission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Allowed,
    Denied {
        reason: DenialReason,
        /// Milliseconds until this particular limit clears. Never negative.
        wait_ms: u64,
    },
}

impl Permission {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Permission::Allowed)
    }

    pub fn reason(&self) -> Option<DenialReason> {
        match self {
            Permission::Allowed => None,
            Permission::Denied { reason, .. } => Some(*reason),
        }
    }

    /// Zero when allowed.
    pub fn wait(&self) -> Duration {
        match self {
            Permission::Allowed => Duration::ZERO,
            Permission::Denied { wait_ms, .. } => Duration::from_millis(*wait_ms),
        }
    }
}

/// Daily quota usage as reported to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UsageStats {
    pub used: u32,
    pub limit: u32,
    pub remaining: u32,
}

/// Snapshot written to durable storage after every recorded request.
///
/// Field names match the `{count, resetTime}` object other clients of the
/// same storage key read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct DailySnapshot {
    pub count: u32,
    #[serde(rename = "resetTime")]
    pub reset_time: i64,
}

//! Warning-level assessment for locker occupancy duration.
//!
//! Pure logic -- no database access. The caller is responsible for fetching
//! the active usage row and passing its start time in. The same assessment
//! backs both the on-demand duration query and the periodic sweep.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// First-warning threshold: 13 hours, in minutes.
pub const WARNING_13H_MINUTES: i64 = 13 * 60;

/// Second threshold: 20 hours, in minutes.
pub const WARNING_20H_MINUTES: i64 = 20 * 60;

/// Final-hour threshold: 23 hours, in minutes.
pub const WARNING_23H_MINUTES: i64 = 23 * 60;

/// Nominal maximum occupancy: 24 hours, in minutes.
pub const MAX_USAGE_MINUTES: i64 = 24 * 60;

/// Occupancy in hours after which the items are due for admin takeover.
/// Three hours past the nominal maximum: a grace period during which the
/// user can still release before confiscation.
pub const TAKEOVER_THRESHOLD_HOURS: i64 = 27;

/// Severity classification derived from elapsed occupancy.
///
/// Ordered: `None < Medium < High < Critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WarningLevel {
    None,
    Medium,
    High,
    Critical,
}

/// Result of assessing one active occupancy at a point in time.
#[derive(Debug, Clone, Serialize)]
pub struct WarningAssessment {
    pub level: WarningLevel,
    pub duration_minutes: i64,
    /// Minutes left until the 24-hour nominal maximum, floored at zero.
    pub remaining_minutes: i64,
    pub message: String,
}

/// Elapsed occupancy in whole minutes, clamped to zero.
///
/// A start time in the future (clock skew between app servers and the
/// database) is treated as zero elapsed time rather than a negative value.
pub fn elapsed_minutes(start_time: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    now.signed_duration_since(start_time).num_minutes().max(0)
}

/// Assess an active occupancy: map elapsed time to a warning level.
///
/// Thresholds are checked highest-first so the most severe applicable
/// level wins. Side-effect free; whether a notification has already been
/// sent is tracked separately (see [`crate::escalation`]).
pub fn assess(start_time: DateTime<Utc>, now: DateTime<Utc>) -> WarningAssessment {
    let duration_minutes = elapsed_minutes(start_time, now);
    let hours = duration_minutes / 60;

    let (level, message) = if duration_minutes >= MAX_USAGE_MINUTES {
        (
            WarningLevel::Critical,
            "The 24 hour maximum has been reached. Please return the locker immediately."
                .to_string(),
        )
    } else if duration_minutes >= WARNING_23H_MINUTES {
        (
            WarningLevel::Critical,
            format!("Warning! You have used the locker for {hours} hours. Less than one hour remains."),
        )
    } else if duration_minutes >= WARNING_20H_MINUTES {
        (
            WarningLevel::High,
            format!(
                "You have used the locker for {hours} hours. About {} hours remain.",
                24 - hours
            ),
        )
    } else if duration_minutes >= WARNING_13H_MINUTES {
        (
            WarningLevel::Medium,
            format!("You have used the locker for {hours} hours. Maximum usage is 24 hours."),
        )
    } else {
        (WarningLevel::None, String::new())
    };

    WarningAssessment {
        level,
        duration_minutes,
        remaining_minutes: (MAX_USAGE_MINUTES - duration_minutes).max(0),
        message,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

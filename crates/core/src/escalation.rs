//! Escalation decision for the periodic duration sweep.
//!
//! The sweep walks all active occupancies and decides, per session, which
//! warning email (if any) is due. Idempotency is governed by the per-session
//! sent flags, not by timestamps: once a threshold's flag is set it never
//! fires again, so a late or skipped sweep never double-fires and never has
//! to catch up retroactively.
//!
//! This module is pure -- the conditional flag write that makes the decision
//! race-safe lives in the repository layer.

use serde::Serialize;

use crate::duration::{MAX_USAGE_MINUTES, TAKEOVER_THRESHOLD_HOURS, WARNING_13H_MINUTES};
use crate::types::DbId;

/// Which escalation email is due for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EscalationKind {
    /// 13-hour warning: the user is approaching the 24-hour maximum.
    DurationWarning,
    /// 27-hour warning: the items are about to be taken over by an admin.
    TakeoverWarning,
}

impl EscalationKind {
    /// Dot-separated event name published when this escalation fires.
    pub fn event_type(self) -> &'static str {
        match self {
            EscalationKind::DurationWarning => "usage.warning",
            EscalationKind::TakeoverWarning => "usage.takeover_warning",
        }
    }
}

/// A notification the sweep decided to send.
///
/// Produced by the sweep after winning the conditional flag write; handed
/// to the mailer and published on the event bus. The sweep itself never
/// talks SMTP.
#[derive(Debug, Clone, Serialize)]
pub struct NotificationCommand {
    pub kind: EscalationKind,
    pub usage_id: DbId,
    pub user_id: DbId,
    pub user_name: String,
    pub user_email: String,
    pub locker_id: DbId,
    pub locker_code: String,
    pub duration_minutes: i64,
    pub duration_hours: i64,
    /// Hours left until the 24-hour nominal maximum, floored at zero.
    pub remaining_hours: i64,
}

impl NotificationCommand {
    /// Hours remaining before the nominal maximum for a given duration.
    pub fn remaining_hours_for(duration_minutes: i64) -> i64 {
        ((MAX_USAGE_MINUTES - duration_minutes) / 60).max(0)
    }
}

/// Decide which escalation (if any) is due for a session.
///
/// Checked severity-first so a session discovered late (e.g. after downtime)
/// gets the takeover warning, not the stale 13-hour one. At most one kind is
/// returned per call; the matching flag must be set via a conditional write
/// before the notification is actually sent.
pub fn pending_escalation(
    duration_minutes: i64,
    warning_13h_sent: bool,
    warning_27h_sent: bool,
) -> Option<EscalationKind> {
    let duration_hours = duration_minutes / 60;

    if duration_hours >= TAKEOVER_THRESHOLD_HOURS && !warning_27h_sent {
        Some(EscalationKind::TakeoverWarning)
    } else if duration_minutes >= WARNING_13H_MINUTES && !warning_13h_sent {
        Some(EscalationKind::DurationWarning)
    } else {
        None
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Periodic duration sweep over all active locker sessions.
//!
//! Runs on a fixed interval (default 30 minutes, `SWEEP_INTERVAL_SECS` to
//! override) plus once shortly after startup. Each pass walks every active
//! session, decides via [`pending_escalation`] whether a warning is due,
//! and claims the send with a conditional flag write before emailing and
//! publishing the event. Losing the flag write means another sweep (or
//! another instance) already sent it; the loser stays silent.
//!
//! A slow or skipped pass is harmless: flags govern idempotency, so the
//! next pass picks up exactly the sessions that still owe a warning.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use lokr_core::duration::elapsed_minutes;
use lokr_core::escalation::{pending_escalation, EscalationKind, NotificationCommand};
use lokr_db::models::usage::ActiveUsage;
use lokr_db::repositories::UsageRepo;
use lokr_db::DbPool;
use lokr_events::{EventBus, LockerEvent, LockerMailer};

/// Delay before the first sweep after startup.
const STARTUP_DELAY: Duration = Duration::from_secs(10);

/// Outcome of one sweep pass.
///
/// Per-session failures are collected here rather than aborting the pass;
/// one session's broken email address must not delay another's warning.
#[derive(Debug, Default)]
pub struct SweepReport {
    /// Number of active sessions examined.
    pub checked: usize,
    /// Notification commands produced (conditional flag writes won).
    pub commands: Vec<NotificationCommand>,
    /// Per-session errors, for logging.
    pub errors: Vec<String>,
}

/// Run the duration sweep loop until `cancel` is triggered.
pub async fn run(
    pool: DbPool,
    event_bus: Arc<EventBus>,
    mailer: Option<Arc<LockerMailer>>,
    interval_secs: u64,
    cancel: CancellationToken,
) {
    tracing::info!(interval_secs, "Duration sweep started");

    // First pass shortly after boot so a restart never extends the
    // detection window by a full interval.
    tokio::select! {
        _ = cancel.cancelled() => return,
        _ = tokio::time::sleep(STARTUP_DELAY) => {}
    }

    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Duration sweep stopping");
                break;
            }
            _ = interval.tick() => {
                match sweep_once(&pool, &event_bus, mailer.as_deref()).await {
                    Ok(report) => {
                        if !report.errors.is_empty() {
                            tracing::warn!(
                                checked = report.checked,
                                sent = report.commands.len(),
                                errors = report.errors.len(),
                                "Duration sweep completed with errors"
                            );
                        } else {
                            tracing::info!(
                                checked = report.checked,
                                sent = report.commands.len(),
                                "Duration sweep completed"
                            );
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Duration sweep failed");
                    }
                }
            }
        }
    }
}

/// Execute one sweep pass over all active sessions.
///
/// Returns the commands that were actually sent (flag writes won). The
/// outer `Err` only covers failing to list active sessions; everything
/// per-session lands in [`SweepReport::errors`].
pub async fn sweep_once(
    pool: &DbPool,
    event_bus: &EventBus,
    mailer: Option<&LockerMailer>,
) -> Result<SweepReport, sqlx::Error> {
    let active = UsageRepo::list_active(pool).await?;
    let now = chrono::Utc::now();

    let mut report = SweepReport {
        checked: active.len(),
        ..Default::default()
    };

    for session in &active {
        let duration_minutes = elapsed_minutes(session.start_time, now);
        let Some(kind) = pending_escalation(
            duration_minutes,
            session.warning_13h_sent,
            session.warning_27h_sent,
        ) else {
            continue;
        };

        // Claim the send. A `false` here is a lost race, not an error:
        // a concurrent sweep already flipped the flag.
        match UsageRepo::try_mark_warning_sent(pool, session.id, kind).await {
            Ok(true) => {}
            Ok(false) => continue,
            Err(e) => {
                report
                    .errors
                    .push(format!("usage {}: flag write failed: {e}", session.id));
                continue;
            }
        }

        let cmd = build_command(session, kind, duration_minutes);

        if let Some(mailer) = mailer {
            if let Err(e) = mailer.send_warning(&cmd).await {
                // The flag stays set: a broken mailbox must not cause a
                // re-send storm on every subsequent sweep.
                report
                    .errors
                    .push(format!("usage {}: email failed: {e}", session.id));
            }
        } else {
            tracing::debug!(usage_id = session.id, kind = ?kind, "No mailer configured, email skipped");
        }

        event_bus.publish(
            LockerEvent::new(kind.event_type())
                .with_locker(cmd.locker_id)
                .with_user(cmd.user_id)
                .with_payload(serde_json::json!({
                    "usage_id": cmd.usage_id,
                    "locker_code": cmd.locker_code,
                    "duration_hours": cmd.duration_hours,
                    "remaining_hours": cmd.remaining_hours,
                })),
        );
        if kind == EscalationKind::TakeoverWarning {
            // The overtime list on the admin dashboard highlights sessions
            // that are now eligible for takeover.
            event_bus.publish(
                LockerEvent::new("overtime.changed")
                    .with_locker(cmd.locker_id)
                    .with_user(cmd.user_id)
                    .with_payload(serde_json::json!({
                        "action": "takeover_pending",
                        "usage_id": cmd.usage_id,
                    })),
            );
        }

        report.commands.push(cmd);
    }

    Ok(report)
}

/// Assemble the notification command for a session that owes a warning.
fn build_command(
    session: &ActiveUsage,
    kind: EscalationKind,
    duration_minutes: i64,
) -> NotificationCommand {
    NotificationCommand {
        kind,
        usage_id: session.id,
        user_id: session.user_id,
        user_name: session.user_name.clone(),
        user_email: session.user_email.clone(),
        locker_id: session.locker_id,
        locker_code: session.locker_code.clone(),
        duration_minutes,
        duration_hours: duration_minutes / 60,
        remaining_hours: NotificationCommand::remaining_hours_for(duration_minutes),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> ActiveUsage {
        ActiveUsage {
            id: 11,
            user_id: 7,
            user_name: "Siti".to_string(),
            user_email: "siti@example.edu".to_string(),
            user_nim: Some("2110512034".to_string()),
            locker_id: 3,
            locker_code: "A3".to_string(),
            start_time: chrono::Utc::now(),
            warning_13h_sent: false,
            warning_27h_sent: false,
        }
    }

    #[test]
    fn command_carries_session_identity_and_rounded_hours() {
        // 13h20m in.
        let cmd = build_command(&session(), EscalationKind::DurationWarning, 800);

        assert_eq!(cmd.usage_id, 11);
        assert_eq!(cmd.user_email, "siti@example.edu");
        assert_eq!(cmd.locker_code, "A3");
        assert_eq!(cmd.duration_hours, 13);
        // 24h cap minus 13h20m elapsed leaves roughly 10 hours.
        assert_eq!(cmd.remaining_hours, 10);
    }

    #[test]
    fn overdue_session_reports_zero_remaining() {
        let cmd = build_command(&session(), EscalationKind::TakeoverWarning, 1700);

        assert_eq!(cmd.duration_hours, 28);
        assert_eq!(cmd.remaining_hours, 0);
    }
}

//! Warning and confiscation email delivery via SMTP.
//!
//! [`LockerMailer`] wraps the `lettre` async SMTP transport to send the
//! plain-text mails the escalation flow requires. Configuration is loaded
//! from environment variables; if `SMTP_HOST` is not set,
//! [`EmailConfig::from_env`] returns `None` and no mailer should be
//! constructed -- the sweep then skips delivery and only logs.

use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use lokr_core::escalation::{EscalationKind, NotificationCommand};

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for email delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    /// SMTP transport-level failure (authentication, connection, etc.).
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    /// The recipient or sender address could not be parsed.
    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// The MIME message could not be assembled.
    #[error("Email build error: {0}")]
    Build(String),
}

// ---------------------------------------------------------------------------
// EmailConfig
// ---------------------------------------------------------------------------

/// Default SMTP port (STARTTLS).
const DEFAULT_SMTP_PORT: u16 = 587;

/// Default sender address when `SMTP_FROM` is not set.
const DEFAULT_FROM_ADDRESS: &str = "noreply@smartlocker.local";

/// Configuration for the SMTP email delivery service.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    /// SMTP server hostname.
    pub smtp_host: String,
    /// SMTP server port (defaults to 587).
    pub smtp_port: u16,
    /// RFC 5322 "From" address.
    pub from_address: String,
    /// Optional SMTP username.
    pub smtp_user: Option<String>,
    /// Optional SMTP password.
    pub smtp_password: Option<String>,
}

impl EmailConfig {
    /// Load configuration from environment variables.
    ///
    /// Returns `None` if `SMTP_HOST` is not set, signalling that email
    /// delivery is not configured and should be skipped.
    ///
    /// | Variable        | Required | Default                      |
    /// |-----------------|----------|------------------------------|
    /// | `SMTP_HOST`     | yes      | --                            |
    /// | `SMTP_PORT`     | no       | `587`                        |
    /// | `SMTP_FROM`     | no       | `noreply@smartlocker.local`  |
    /// | `SMTP_USER`     | no       | --                            |
    /// | `SMTP_PASSWORD` | no       | --                            |
    pub fn from_env() -> Option<Self> {
        let smtp_host = std::env::var("SMTP_HOST").ok()?;
        Some(Self {
            smtp_host,
            smtp_port: std::env::var("SMTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_SMTP_PORT),
            from_address: std::env::var("SMTP_FROM")
                .unwrap_or_else(|_| DEFAULT_FROM_ADDRESS.to_string()),
            smtp_user: std::env::var("SMTP_USER").ok(),
            smtp_password: std::env::var("SMTP_PASSWORD").ok(),
        })
    }
}

// ---------------------------------------------------------------------------
// LockerMailer
// ---------------------------------------------------------------------------

/// Sends escalation and confiscation emails via SMTP.
pub struct LockerMailer {
    config: EmailConfig,
}

impl LockerMailer {
    /// Create a new mailer with the given configuration.
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    /// Send the email for a sweep-produced [`NotificationCommand`].
    pub async fn send_warning(&self, cmd: &NotificationCommand) -> Result<(), EmailError> {
        let (subject, body) = match cmd.kind {
            EscalationKind::DurationWarning => (
                format!("[Smart Locker] Locker {} usage warning", cmd.locker_code),
                format!(
                    "Hello {},\n\n\
                     You have been using locker {} for {} hours. The maximum \
                     usage time is 24 hours; about {} hours remain.\n\n\
                     Please release the locker before the limit is reached.",
                    cmd.user_name, cmd.locker_code, cmd.duration_hours, cmd.remaining_hours
                ),
            ),
            EscalationKind::TakeoverWarning => (
                format!("[Smart Locker] Locker {} takeover notice", cmd.locker_code),
                format!(
                    "Hello {},\n\n\
                     Locker {} has been in use for {} hours, well past the \
                     24 hour maximum. Your items are now subject to removal \
                     by an administrator.\n\n\
                     Please release the locker immediately.",
                    cmd.user_name, cmd.locker_code, cmd.duration_hours
                ),
            ),
        };

        self.send(&cmd.user_email, &subject, &body).await?;
        tracing::info!(
            to = %cmd.user_email,
            kind = ?cmd.kind,
            locker_code = %cmd.locker_code,
            "Warning email sent"
        );
        Ok(())
    }

    /// Notify the prior occupant that an admin emptied the locker.
    pub async fn send_item_confiscated(
        &self,
        to_email: &str,
        user_name: &str,
        locker_code: &str,
        admin_note: Option<&str>,
    ) -> Result<(), EmailError> {
        let subject = format!("[Smart Locker] Items removed from locker {locker_code}");
        let mut body = format!(
            "Hello {user_name},\n\n\
             The 24 hour usage limit for locker {locker_code} was exceeded and \
             an administrator has removed your items for safekeeping. Please \
             contact the front desk to collect them."
        );
        if let Some(note) = admin_note {
            body.push_str(&format!("\n\nAdministrator note: {note}"));
        }

        self.send(to_email, &subject, &body).await?;
        tracing::info!(to = to_email, locker_code, "Confiscation email sent");
        Ok(())
    }

    /// Assemble and submit one plain-text message.
    async fn send(&self, to_email: &str, subject: &str, body: &str) -> Result<(), EmailError> {
        let email = Message::builder()
            .from(self.config.from_address.parse()?)
            .to(to_email.parse()?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| EmailError::Build(e.to_string()))?;

        let mut transport_builder =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.smtp_host)?
                .port(self.config.smtp_port);

        if let (Some(user), Some(pass)) = (&self.config.smtp_user, &self.config.smtp_password) {
            transport_builder =
                transport_builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        let mailer = transport_builder.build();
        mailer.send(email).await?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

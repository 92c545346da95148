//! Invitation notification delivery.
//!
//! The invitation token is the durable artifact; notification is courtesy.
//! Senders log failures and never propagate them into invitation issuance.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::sync::Arc;

use clipcast_core::models::InvitationKind;
use clipcast_core::Config;

/// Context rendered into an invitation notification.
#[derive(Debug, Clone)]
pub struct InviteContext {
    pub granter_name: String,
    pub content_title: String,
    pub accept_link: Option<String>,
    pub expires_in_days: i64,
}

/// Outbound notification channel for invitations.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(
        &self,
        recipient: &str,
        kind: InvitationKind,
        context: &InviteContext,
    ) -> Result<(), String>;
}

/// No-op notifier for tests and deployments without SMTP.
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn send(
        &self,
        recipient: &str,
        kind: InvitationKind,
        _context: &InviteContext,
    ) -> Result<(), String> {
        tracing::debug!(recipient = %recipient, kind = ?kind, "Invite notification suppressed (noop notifier)");
        Ok(())
    }
}

/// SMTP notifier for invitation emails.
#[derive(Clone)]
pub struct SmtpNotifier {
    mailer: Arc<AsyncSmtpTransport<Tokio1Executor>>,
    from: String,
}

impl SmtpNotifier {
    /// Create from config. Returns `None` if invites-by-email are disabled
    /// or SMTP is not configured.
    pub fn from_config(config: &Config) -> Option<Self> {
        if !config.email_invites_enabled {
            tracing::debug!("Email invites disabled (EMAIL_INVITES_ENABLED=false)");
            return None;
        }
        let host = config.smtp_host.as_deref()?;
        let from = config.smtp_from.clone()?;
        let port = config.smtp_port.unwrap_or(587);

        let mailer = if config.smtp_tls {
            let b = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host).ok()?;
            let b = b.port(port);
            let b = if let (Some(u), Some(p)) = (&config.smtp_user, &config.smtp_password) {
                b.credentials(Credentials::new(u.clone(), p.clone()))
            } else {
                b
            };
            tracing::info!(host = %host, port = port, "Invite notifier initialized (SMTP with STARTTLS)");
            b.build()
        } else {
            let b = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host).port(port);
            let b = if let (Some(u), Some(p)) = (&config.smtp_user, &config.smtp_password) {
                b.credentials(Credentials::new(u.clone(), p.clone()))
            } else {
                b
            };
            tracing::info!(host = %host, port = port, "Invite notifier initialized (SMTP)");
            b.build()
        };

        Some(Self {
            mailer: Arc::new(mailer),
            from,
        })
    }

    fn subject(kind: InvitationKind, context: &InviteContext) -> String {
        match kind {
            InvitationKind::ContentAccess => {
                format!("Podcast Access Granted - {}", context.content_title)
            }
            InvitationKind::ClipAccess => {
                format!("Clip Access Granted - {}", context.content_title)
            }
        }
    }

    fn body(kind: InvitationKind, context: &InviteContext) -> String {
        let (lede, call_to_action) = match kind {
            InvitationKind::ContentAccess => (
                format!(
                    "<p><strong>{}</strong> has granted you access to their podcast: <strong>{}</strong></p>",
                    context.granter_name, context.content_title
                ),
                "Accept the invitation to start creating clips:",
            ),
            InvitationKind::ClipAccess => (
                format!(
                    "<p><strong>{}</strong> has shared a clip with you: <strong>{}</strong></p>",
                    context.granter_name, context.content_title
                ),
                "Join as an editor to download the clip:",
            ),
        };

        let link = context
            .accept_link
            .as_deref()
            .map(|link| format!("<p><a href=\"{}\">Accept Invitation</a></p>", link))
            .unwrap_or_default();

        format!(
            "<div><h2>You've been invited!</h2>{}<p>{}</p>{}<p>This invitation expires in {} days.</p></div>",
            lede, call_to_action, link, context.expires_in_days
        )
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send(
        &self,
        recipient: &str,
        kind: InvitationKind,
        context: &InviteContext,
    ) -> Result<(), String> {
        let to: Mailbox = recipient
            .parse()
            .map_err(|e| format!("Invalid recipient address: {}", e))?;
        let from: Mailbox = self
            .from
            .parse()
            .map_err(|e| format!("Invalid SMTP_FROM: {}", e))?;

        let email = Message::builder()
            .from(from)
            .to(to)
            .subject(Self::subject(kind, context))
            .header(ContentType::TEXT_HTML)
            .body(Self::body(kind, context))
            .map_err(|e| e.to_string())?;

        self.mailer.send(email).await.map_err(|e| e.to_string())?;
        tracing::info!(recipient = %recipient, kind = ?kind, "Invite notification sent");
        Ok(())
    }
}

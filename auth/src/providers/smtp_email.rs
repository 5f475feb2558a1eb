//! SMTP email provider implementation using Lettre.

use crate::config::SmtpConfig;
use crate::error::{AuthError, Result};
use crate::providers::{EmailProvider, MagicLinkEmail};
use chrono::Utc;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

const SUBJECT: &str = "Your Betafits sign-in link";

/// SMTP email provider using Lettre.
///
/// This provider sends real emails via an SMTP relay (STARTTLS), suitable
/// for production use. The transport pools connections and is cheap to clone.
#[derive(Clone)]
pub struct SmtpEmailProvider {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpEmailProvider {
    /// Create a new SMTP email provider.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Configuration`] if the relay host or sender
    /// address is invalid.
    pub fn new(config: &SmtpConfig) -> Result<Self> {
        let credentials = Credentials::new(config.username.clone(), config.password.clone());

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.server)
            .map_err(|e| AuthError::Configuration(format!("SMTP relay error: {e}")))?
            .port(config.port)
            .credentials(credentials)
            .build();

        let from = format!("{} <{}>", config.from_name, config.from_email)
            .parse::<Mailbox>()
            .map_err(|e| AuthError::Configuration(format!("Invalid from address: {e}")))?;

        tracing::info!(server = %config.server, port = config.port, "SMTP email provider ready");

        Ok(Self { transport, from })
    }

    /// Build the message for `email`.
    fn build_message(&self, email: &MagicLinkEmail) -> Result<Message> {
        let expires_hours = email.expires_in_hours(Utc::now());
        let greeting = email.greeting();
        let link = &email.magic_link;

        let text_body = format!(
            "{greeting}\n\n\
             Use the link below to sign in to the Betafits Prospect Portal. \
             It expires in {expires_hours} hours and can only be used once.\n\n\
             {link}\n\n\
             If you didn't request this email, you can safely ignore it.\n"
        );

        let html_body = format!(
            r#"<!DOCTYPE html>
<html>
<head><meta charset="UTF-8"><title>{SUBJECT}</title></head>
<body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333;">
    <div style="max-width: 600px; margin: 0 auto; padding: 20px;">
        <p>{greeting}</p>
        <p>Use the button below to sign in to the Betafits Prospect Portal. This link expires in {expires_hours} hours and can only be used once.</p>
        <p style="margin: 30px 0;">
            <a href="{link}" style="display: inline-block; background-color: #2563eb; color: white; padding: 12px 24px; text-decoration: none; border-radius: 4px;">Sign In</a>
        </p>
        <p style="color: #666; font-size: 12px;">Or copy and paste this link into your browser:<br>{link}</p>
    </div>
</body>
</html>"#
        );

        let to = email
            .to
            .parse::<Mailbox>()
            .map_err(|e| AuthError::EmailDeliveryFailed(format!("Invalid to address: {e}")))?;

        Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(SUBJECT)
            .multipart(MultiPart::alternative_plain_html(text_body, html_body))
            .map_err(|e| AuthError::EmailDeliveryFailed(format!("Failed to build email: {e}")))
    }
}

impl EmailProvider for SmtpEmailProvider {
    async fn send_magic_link(&self, email: &MagicLinkEmail) -> Result<()> {
        let message = self.build_message(email)?;

        self.transport
            .send(message)
            .await
            .map_err(|e| AuthError::EmailDeliveryFailed(format!("SMTP send failed: {e}")))?;

        tracing::info!(to = %email.to, "Sent magic link email");
        Ok(())
    }
}

//! Console email provider for local development.

use crate::error::Result;
use crate::providers::{EmailProvider, MagicLinkEmail};
use chrono::Utc;
use tracing::info;

/// Console email provider.
///
/// This provider logs emails to the console instead of sending them, so a
/// developer can click the link straight from the terminal.
///
/// # Examples
///
/// ```ignore
/// use prospect_portal_auth::providers::ConsoleEmailProvider;
///
/// let provider = ConsoleEmailProvider::new();
/// provider.send_magic_link(&message).await?;
/// ```
#[derive(Clone, Debug, Default)]
pub struct ConsoleEmailProvider;

impl ConsoleEmailProvider {
    /// Create a new console email provider.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl EmailProvider for ConsoleEmailProvider {
    async fn send_magic_link(&self, email: &MagicLinkEmail) -> Result<()> {
        let expires_hours = email.expires_in_hours(Utc::now());

        info!(
            to = %email.to,
            expires_in_hours = expires_hours,
            "📧 Magic Link Email (Development Mode)"
        );
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║              BETAFITS PORTAL SIGN-IN LINK                    ║");
        println!("╠══════════════════════════════════════════════════════════════╣");
        println!("║ To: {:<57}║", email.to);
        println!("║ Subject: Your Betafits sign-in link{:<26}║", "");
        println!("╠══════════════════════════════════════════════════════════════╣");
        println!("║ {:<61}║", email.greeting());
        println!("║ This link will expire in {expires_hours:<3} hours.{:<26}║", "");
        println!("║                                                              ║");
        println!("║ {:<61}║", email.magic_link);
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_console_provider_always_succeeds() {
        let provider = ConsoleEmailProvider::new();
        let message = MagicLinkEmail {
            to: "dev@example.com".to_string(),
            magic_link: "http://localhost:3000/access?token=abc".to_string(),
            user_name: None,
            expires_at: Utc::now() + chrono::Duration::hours(24),
        };

        assert!(provider.send_magic_link(&message).await.is_ok());
    }
}

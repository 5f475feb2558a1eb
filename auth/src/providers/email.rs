//! Email provider trait.

use crate::error::Result;
use chrono::{DateTime, Utc};

/// A magic link ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MagicLinkEmail {
    /// Recipient email address.
    pub to: String,

    /// Full sign-in URL including the token.
    pub magic_link: String,

    /// Recipient display name, if the directory knows one.
    pub user_name: Option<String>,

    /// Token expiration timestamp.
    pub expires_at: DateTime<Utc>,
}

impl MagicLinkEmail {
    /// Greeting line for the message body.
    #[must_use]
    pub fn greeting(&self) -> String {
        match self.user_name.as_deref() {
            Some(name) if !name.trim().is_empty() => format!("Hi {},", name.trim()),
            _ => "Hi there,".to_string(),
        }
    }

    /// Whole hours until the link expires, as of `now`.
    #[must_use]
    pub fn expires_in_hours(&self, now: DateTime<Utc>) -> i64 {
        (self.expires_at - now).num_hours().max(0)
    }
}

/// Email provider.
///
/// This trait abstracts over email delivery services
/// (SMTP relays, SendGrid, AWS SES, etc.).
///
/// Delivery outcome does not affect the token: it is valid as soon as it is
/// stored, even if the message never arrives.
pub trait EmailProvider: Send + Sync {
    /// Send magic link email.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Network request fails
    /// - Email provider rejects the request
    /// - Email address is invalid
    fn send_magic_link(
        &self,
        email: &MagicLinkEmail,
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

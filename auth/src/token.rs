//! Magic link grants and token generation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Number of random bytes in a token (256 bits).
pub const TOKEN_BYTES: usize = 32;

/// Length of a base64url-encoded token without padding.
pub const TOKEN_LENGTH: usize = 43;

/// Generate a cryptographically secure random token.
///
/// Returns a 256-bit random token encoded as base64url (43 characters).
/// Never touches any store.
///
/// # Examples
///
/// ```
/// use prospect_portal_auth::token::{generate_token, TOKEN_LENGTH};
///
/// let token = generate_token();
/// assert_eq!(token.len(), TOKEN_LENGTH);
/// assert_ne!(token, generate_token());
/// ```
#[must_use]
pub fn generate_token() -> String {
    use base64::Engine;
    use rand::RngCore;

    let mut random_bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut random_bytes);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(random_bytes)
}

/// First characters of a token, safe to put in logs.
#[must_use]
pub fn token_prefix(token: &str) -> &str {
    token.get(..6).unwrap_or(token)
}

/// A pending sign-in grant.
///
/// Serializes as `{token, userId, email, expiresAt, usedAt?}` with epoch
/// millisecond timestamps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MagicLinkToken {
    /// Bearer token embedded in the emailed URL.
    pub token: String,

    /// Account this grant authenticates.
    pub user_id: String,

    /// Address the link was issued to.
    pub email: String,

    /// Absolute deadline.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub expires_at: DateTime<Utc>,

    /// Set the first time the token is consumed.
    #[serde(
        default,
        with = "chrono::serde::ts_milliseconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub used_at: Option<DateTime<Utc>>,
}

impl MagicLinkToken {
    /// Create an unused grant.
    #[must_use]
    pub fn new(
        token: impl Into<String>,
        user_id: impl Into<String>,
        email: impl Into<String>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            token: token.into(),
            user_id: user_id.into(),
            email: email.into(),
            expires_at,
            used_at: None,
        }
    }

    /// Whether the deadline has passed at `now`.
    ///
    /// A grant is still honored at exactly `expires_at`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Whether the grant has been consumed.
    #[must_use]
    pub const fn is_used(&self) -> bool {
        self.used_at.is_some()
    }

    /// Whether the grant authenticates at `now`.
    #[must_use]
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        !self.is_expired_at(now) && !self.is_used()
    }
}

/// Outcome of a diagnostic token check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenStatus {
    /// Present, unexpired and unused.
    Valid(MagicLinkToken),

    /// Never existed or already swept.
    NotFound,

    /// Deadline passed.
    Expired,

    /// Already exchanged.
    AlreadyUsed,
}

impl TokenStatus {
    /// The grant, if the token is valid.
    #[must_use]
    pub fn into_grant(self) -> Option<MagicLinkToken> {
        match self {
            Self::Valid(grant) => Some(grant),
            Self::NotFound | Self::Expired | Self::AlreadyUsed => None,
        }
    }
}

//! Error types for magic-link sign-in.

use thiserror::Error;

/// Result type alias for sign-in operations.
pub type Result<T> = std::result::Result<T, AuthError>;

/// Message shown to users for any rejected magic link.
///
/// Expired, unknown, and already-used links share one message.
pub const LINK_NO_LONGER_VALID: &str =
    "This magic link is no longer valid. Please request a new one.";

/// Error taxonomy for the magic-link sign-in flow.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    // ═══════════════════════════════════════════════════════════
    // Request Errors
    // ═══════════════════════════════════════════════════════════

    /// Email address is malformed.
    #[error("Invalid email address")]
    InvalidEmail,

    /// No portal account exists for the requested email.
    #[error("User not found")]
    UserNotFound,

    // ═══════════════════════════════════════════════════════════
    // Magic Link Errors
    // ═══════════════════════════════════════════════════════════

    /// Token never existed or has already been swept.
    #[error("Invalid magic link token")]
    MagicLinkInvalid,

    /// Token deadline has passed.
    #[error("Magic link has expired")]
    MagicLinkExpired,

    /// Token was already exchanged for a session.
    #[error("Magic link has already been used")]
    MagicLinkAlreadyUsed,

    // ═══════════════════════════════════════════════════════════
    // Collaborator Errors
    // ═══════════════════════════════════════════════════════════

    /// Session exchange failed.
    #[error("Failed to create session: {0}")]
    SessionCreationFailed(String),

    /// Email delivery failed.
    #[error("Failed to send email: {0}")]
    EmailDeliveryFailed(String),

    /// Token backend could not be reached or is in a bad state.
    #[error("Token store unavailable: {0}")]
    StoreUnavailable(String),

    /// Stored grant could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration value is missing or malformed.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl AuthError {
    /// Returns `true` if this error is due to invalid user input.
    ///
    /// # Examples
    ///
    /// ```
    /// # use prospect_portal_auth::AuthError;
    /// assert!(AuthError::InvalidEmail.is_user_error());
    /// assert!(!AuthError::StoreUnavailable("down".into()).is_user_error());
    /// ```
    #[must_use]
    pub const fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidEmail
                | Self::UserNotFound
                | Self::MagicLinkInvalid
                | Self::MagicLinkExpired
                | Self::MagicLinkAlreadyUsed
        )
    }

    /// Returns `true` if this error rejects a presented magic link.
    #[must_use]
    pub const fn is_link_rejection(&self) -> bool {
        matches!(
            self,
            Self::MagicLinkInvalid | Self::MagicLinkExpired | Self::MagicLinkAlreadyUsed
        )
    }

    /// User-facing message for this error.
    ///
    /// All link rejections collapse to [`LINK_NO_LONGER_VALID`]; system
    /// failures never expose their details.
    ///
    /// # Examples
    ///
    /// ```
    /// # use prospect_portal_auth::AuthError;
    /// assert_eq!(
    ///     AuthError::MagicLinkExpired.user_message(),
    ///     AuthError::MagicLinkAlreadyUsed.user_message(),
    /// );
    /// ```
    #[must_use]
    pub const fn user_message(&self) -> &'static str {
        match self {
            Self::InvalidEmail => "Please enter a valid email address.",
            Self::UserNotFound => "We couldn't find an account for that email address.",
            Self::MagicLinkInvalid | Self::MagicLinkExpired | Self::MagicLinkAlreadyUsed => {
                LINK_NO_LONGER_VALID
            }
            Self::EmailDeliveryFailed(_) => {
                "We couldn't send your sign-in email. Please try again."
            }
            Self::SessionCreationFailed(_)
            | Self::StoreUnavailable(_)
            | Self::Serialization(_)
            | Self::Configuration(_) => "Something went wrong. Please try again later.",
        }
    }
}

impl From<redis::RedisError> for AuthError {
    fn from(error: redis::RedisError) -> Self {
        Self::StoreUnavailable(error.to_string())
    }
}

impl From<serde_json::Error> for AuthError {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}

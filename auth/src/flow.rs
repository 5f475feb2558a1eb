//! Passwordless sign-in flow.
//!
//! Drives [`MagicLinkTokens`] through its collaborators.
//!
//! # Flow
//!
//! 1. User enters their email on the sign-in page
//! 2. Look the account up in the user directory
//! 3. Generate a 256-bit token and store the grant
//! 4. Email `{base_url}/access?token=...`
//! 5. The `/access` page previews the token (lenient, may repeat)
//! 6. The token is exchanged: strict check, claim, create session (the
//!    claim is released if this fails)
//!
//! A stored token is valid even if step 4 fails. Issuing a new link leaves
//! the user's earlier links valid until they expire or are used.

use crate::clock::{Clock, SystemClock};
use crate::config::MagicLinkConfig;
use crate::error::{AuthError, Result};
use crate::magic_link::MagicLinkTokens;
use crate::providers::{
    EmailProvider, MagicLinkEmail, PortalSession, SessionIssuer, TokenStore, UserDirectory,
};
use crate::token::{self, MagicLinkToken, TokenStatus, token_prefix};
use crate::utils::{is_valid_email, normalize_email};
use std::sync::Arc;

/// A magic link handed to the email provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedLink {
    /// The stored grant.
    pub grant: MagicLinkToken,

    /// The URL that was emailed.
    pub magic_link: String,
}

/// Magic link sign-in flow.
#[derive(Debug, Clone)]
pub struct MagicLinkFlow<S, U, E, X, C = SystemClock> {
    tokens: Arc<MagicLinkTokens<S, C>>,
    users: U,
    email: E,
    sessions: X,
    config: MagicLinkConfig,
}

impl<S, U, E, X, C> MagicLinkFlow<S, U, E, X, C>
where
    S: TokenStore,
    U: UserDirectory,
    E: EmailProvider,
    X: SessionIssuer,
    C: Clock,
{
    /// Create a flow.
    ///
    /// `tokens` is shared so the same store can be handed to a
    /// [`TokenSweeper`](crate::TokenSweeper).
    #[must_use]
    pub const fn new(
        tokens: Arc<MagicLinkTokens<S, C>>,
        users: U,
        email: E,
        sessions: X,
        config: MagicLinkConfig,
    ) -> Self {
        Self {
            tokens,
            users,
            email,
            sessions,
            config,
        }
    }

    /// The underlying token store.
    #[must_use]
    pub const fn tokens(&self) -> &Arc<MagicLinkTokens<S, C>> {
        &self.tokens
    }

    /// The flow configuration.
    #[must_use]
    pub const fn config(&self) -> &MagicLinkConfig {
        &self.config
    }

    /// Build the sign-in URL for `token`.
    #[must_use]
    pub fn magic_link_url(&self, token: &str) -> String {
        self.config.magic_link_url(token)
    }

    /// Issue a magic link for `email` and send it.
    ///
    /// # Errors
    ///
    /// - [`AuthError::InvalidEmail`] if the address is malformed
    /// - [`AuthError::UserNotFound`] if no account uses the address
    /// - [`AuthError::EmailDeliveryFailed`] if sending fails; the token
    ///   stays valid
    /// - Directory or token store failures
    pub async fn request_link(&self, email: &str) -> Result<IssuedLink> {
        let email = normalize_email(email);

        if !is_valid_email(&email) {
            tracing::warn!("Magic link requested with malformed email");
            return Err(AuthError::InvalidEmail);
        }

        let Some(user) = self.users.find_user_by_email(&email).await? else {
            tracing::info!(email = %email, "Magic link requested for unknown email");
            return Err(AuthError::UserNotFound);
        };

        let token = token::generate_token();
        let grant = self
            .tokens
            .store_token(&token, &user.user_id, &user.email)
            .await?;
        let magic_link = self.magic_link_url(&token);

        let message = MagicLinkEmail {
            to: user.email.clone(),
            magic_link: magic_link.clone(),
            user_name: user.name.clone(),
            expires_at: grant.expires_at,
        };

        if let Err(e) = self.email.send_magic_link(&message).await {
            tracing::warn!(
                user_id = %user.user_id,
                token = token_prefix(&token),
                error = %e,
                "Magic link email delivery failed; token remains valid"
            );
            return Err(match e {
                AuthError::EmailDeliveryFailed(_) => e,
                other => AuthError::EmailDeliveryFailed(other.to_string()),
            });
        }

        tracing::info!(
            user_id = %user.user_id,
            token = token_prefix(&token),
            "Magic link sent"
        );

        Ok(IssuedLink { grant, magic_link })
    }

    /// Look at a token without consuming it.
    ///
    /// Uses the lenient read, so repeated visits to the access page during
    /// one sign-in keep working until the exchange commits.
    ///
    /// # Errors
    ///
    /// Returns error if the token store fails.
    pub async fn preview(&self, token: &str) -> Result<Option<MagicLinkToken>> {
        self.tokens.validate_token(token).await
    }

    /// Exchange a token for a session.
    ///
    /// The token is claimed (marked used) before the session is created, so
    /// concurrent exchanges of one link yield at most one session. If the
    /// session cannot be created the claim is released.
    ///
    /// # Errors
    ///
    /// - [`AuthError::MagicLinkInvalid`], [`AuthError::MagicLinkExpired`],
    ///   [`AuthError::MagicLinkAlreadyUsed`] for rejected tokens, including
    ///   losing a concurrent claim
    /// - [`AuthError::SessionCreationFailed`] if the session exchange fails;
    ///   the token stays usable
    /// - Token store failures
    pub async fn exchange_token(&self, token: &str) -> Result<PortalSession> {
        let grant = match self.tokens.check_token(token).await? {
            TokenStatus::Valid(grant) => grant,
            rejected => {
                let error = match rejected {
                    TokenStatus::Expired => AuthError::MagicLinkExpired,
                    TokenStatus::AlreadyUsed => AuthError::MagicLinkAlreadyUsed,
                    TokenStatus::NotFound | TokenStatus::Valid(_) => AuthError::MagicLinkInvalid,
                };
                tracing::warn!(
                    token = token_prefix(token),
                    reason = %error,
                    "Magic link exchange rejected"
                );
                return Err(error);
            }
        };

        let Some(claimed_at) = self.tokens.claim_token(token).await? else {
            tracing::warn!(
                token = token_prefix(token),
                user_id = %grant.user_id,
                "Magic link was claimed by a concurrent exchange"
            );
            return Err(AuthError::MagicLinkAlreadyUsed);
        };

        let session = match self
            .sessions
            .create_session(&grant.user_id, &grant.email)
            .await
        {
            Ok(session) => session,
            Err(e) => {
                if let Err(release_error) = self.tokens.release_claim(token, claimed_at).await {
                    tracing::error!(
                        token = token_prefix(token),
                        error = %release_error,
                        "Failed to release magic link claim; link stays used"
                    );
                }
                return Err(e);
            }
        };

        tracing::info!(
            user_id = %grant.user_id,
            session_id = %session.session_id,
            "Magic link exchanged for session"
        );

        Ok(session)
    }
}

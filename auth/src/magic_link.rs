//! Magic link token lifecycle.
//!
//! [`MagicLinkTokens`] issues, validates, and retires single-use,
//! time-bounded sign-in grants on top of any [`TokenStore`] backend.
//!
//! # Lifecycle
//!
//! ```text
//! ISSUED ──► VALID ──┬──► USED     (mark_token_as_used, claim_token)
//!              ▲     └──► EXPIRED  (now > expires_at, used or not)
//!              └───────── release_claim (session exchange failed)
//! ```
//!
//! Expiry is absorbing and always enforced on read, so correctness never
//! depends on the sweep having run. A used grant only returns to valid when
//! its own claim is released.
//!
//! # Reads
//!
//! | method           | expired | used    | lazy delete |
//! |------------------|---------|---------|-------------|
//! | `validate_token` | `None`  | `Some`  | yes         |
//! | `get_token`      | `None`  | `None`  | yes         |
//! | `check_token`    | tagged  | tagged  | yes         |
//!
//! `validate_token` tolerates a sign-in page re-validating before the
//! session exchange commits the "used" mark.
//!
//! # Example
//!
//! ```
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! use prospect_portal_auth::MagicLinkTokens;
//! use prospect_portal_auth::stores::InMemoryTokenStore;
//! use prospect_portal_auth::token::generate_token;
//! use chrono::{DateTime, Duration, Utc};
//!
//! let tokens = MagicLinkTokens::new(InMemoryTokenStore::new(), Duration::hours(24));
//!
//! let token = generate_token();
//! tokens.store_token(&token, "rec123", "user@example.com").await.unwrap();
//! assert!(tokens.get_token(&token).await.unwrap().is_some());
//!
//! tokens.mark_token_as_used(&token).await.unwrap();
//! assert!(tokens.get_token(&token).await.unwrap().is_none());
//! assert!(tokens.validate_token(&token).await.unwrap().is_some());
//! # });
//! ```

use crate::clock::{Clock, SystemClock};
use crate::error::Result;
use crate::providers::TokenStore;
use crate::token::{self, MagicLinkToken, TokenStatus, token_prefix};
use chrono::{DateTime, Duration, Utc};

/// Result of looking a token up with expiry enforced.
enum Lookup {
    Missing,
    Expired,
    Live(MagicLinkToken),
}

/// Magic link token store.
///
/// Generic over the storage backend and the clock used for expiry.
#[derive(Debug, Clone)]
pub struct MagicLinkTokens<S, C = SystemClock> {
    store: S,
    clock: C,
    default_ttl: Duration,
}

impl<S: TokenStore> MagicLinkTokens<S, SystemClock> {
    /// Create a token store reading wall-clock time.
    ///
    /// # Arguments
    ///
    /// * `store` - Storage backend
    /// * `default_ttl` - Lifetime used by [`store_token`](Self::store_token)
    #[must_use]
    pub const fn new(store: S, default_ttl: Duration) -> Self {
        Self::with_clock(store, default_ttl, SystemClock)
    }
}

impl<S: TokenStore, C: Clock> MagicLinkTokens<S, C> {
    /// Create a token store with an injected clock.
    #[must_use]
    pub const fn with_clock(store: S, default_ttl: Duration, clock: C) -> Self {
        Self {
            store,
            clock,
            default_ttl,
        }
    }

    /// Generate a fresh 256-bit token. Never touches the store.
    #[must_use]
    pub fn generate_token() -> String {
        token::generate_token()
    }

    /// Lifetime applied by [`store_token`](Self::store_token).
    #[must_use]
    pub const fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// The storage backend.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// The clock used for expiry decisions.
    #[must_use]
    pub const fn clock(&self) -> &C {
        &self.clock
    }

    /// Store a grant valid for the default lifetime.
    ///
    /// Overwrites any grant already stored under `token`. Other live tokens
    /// for the same user are left untouched.
    ///
    /// # Errors
    ///
    /// Returns error if the backend fails.
    pub async fn store_token(
        &self,
        token: &str,
        user_id: &str,
        email: &str,
    ) -> Result<MagicLinkToken> {
        self.store_token_for(token, user_id, email, self.default_ttl)
            .await
    }

    /// Store a grant valid for `ttl`.
    ///
    /// A negative `ttl` stores a grant that is already expired.
    ///
    /// # Errors
    ///
    /// Returns error if the backend fails.
    pub async fn store_token_for(
        &self,
        token: &str,
        user_id: &str,
        email: &str,
        ttl: Duration,
    ) -> Result<MagicLinkToken> {
        let expires_at = self.clock.now() + ttl;
        let grant = MagicLinkToken::new(token, user_id, email, expires_at);

        self.store.put(grant.clone()).await?;

        tracing::info!(
            token = token_prefix(token),
            user_id = %user_id,
            expires_at = %expires_at,
            "Issued magic link token"
        );

        Ok(grant)
    }

    /// Return the grant if it exists and has not expired, used or not.
    ///
    /// Deletes the entry if it is found expired.
    ///
    /// # Errors
    ///
    /// Returns error if the backend fails.
    pub async fn validate_token(&self, token: &str) -> Result<Option<MagicLinkToken>> {
        match self.lookup(token).await? {
            Lookup::Live(grant) => Ok(Some(grant)),
            Lookup::Missing | Lookup::Expired => Ok(None),
        }
    }

    /// Return the grant only if it exists, has not expired, and is unused.
    ///
    /// Deletes the entry if it is found expired.
    ///
    /// # Errors
    ///
    /// Returns error if the backend fails.
    pub async fn get_token(&self, token: &str) -> Result<Option<MagicLinkToken>> {
        Ok(self.check_token(token).await?.into_grant())
    }

    /// Classify the token, distinguishing why it is not valid.
    ///
    /// Deletes the entry if it is found expired.
    ///
    /// # Errors
    ///
    /// Returns error if the backend fails.
    pub async fn check_token(&self, token: &str) -> Result<TokenStatus> {
        Ok(match self.lookup(token).await? {
            Lookup::Missing => TokenStatus::NotFound,
            Lookup::Expired => TokenStatus::Expired,
            Lookup::Live(grant) if grant.is_used() => TokenStatus::AlreadyUsed,
            Lookup::Live(grant) => TokenStatus::Valid(grant),
        })
    }

    /// Mark the grant as used.
    ///
    /// Idempotent: only the first call on an existing grant records a
    /// timestamp; later calls and calls for unknown tokens do nothing.
    ///
    /// # Returns
    ///
    /// `true` if this call performed the transition.
    ///
    /// # Errors
    ///
    /// Returns error if the backend fails.
    pub async fn mark_token_as_used(&self, token: &str) -> Result<bool> {
        let now = self.clock.now();
        let marked = self.store.mark_used(token, now).await?;

        if marked {
            tracing::info!(token = token_prefix(token), used_at = %now, "Magic link token used");
        } else {
            tracing::debug!(
                token = token_prefix(token),
                "Mark as used ignored (unknown or already used)"
            );
        }

        Ok(marked)
    }

    /// Atomically claim the grant for a session exchange.
    ///
    /// Sets `used_at` the same way as
    /// [`mark_token_as_used`](Self::mark_token_as_used), but hands back the
    /// stamp so the claim can be undone with
    /// [`release_claim`](Self::release_claim). Of any number of concurrent
    /// callers, at most one gets `Some`.
    ///
    /// # Errors
    ///
    /// Returns error if the backend fails.
    pub async fn claim_token(&self, token: &str) -> Result<Option<DateTime<Utc>>> {
        let now = self.clock.now();

        if self.store.mark_used(token, now).await? {
            tracing::debug!(token = token_prefix(token), "Claimed magic link token");
            Ok(Some(now))
        } else {
            Ok(None)
        }
    }

    /// Undo a claim from [`claim_token`](Self::claim_token).
    ///
    /// Only clears the mark if it is still the one `claimed_at` refers to.
    ///
    /// # Errors
    ///
    /// Returns error if the backend fails.
    pub async fn release_claim(&self, token: &str, claimed_at: DateTime<Utc>) -> Result<bool> {
        let released = self.store.release_used(token, claimed_at).await?;

        tracing::debug!(token = token_prefix(token), released, "Released magic link claim");
        Ok(released)
    }

    /// Delete every expired grant, used or not.
    ///
    /// # Returns
    ///
    /// Number of grants removed.
    ///
    /// # Errors
    ///
    /// Returns error if the backend fails.
    pub async fn sweep_expired(&self) -> Result<usize> {
        self.store.sweep_expired(self.clock.now()).await
    }

    /// Number of stored grants, including expired ones not yet removed.
    ///
    /// # Errors
    ///
    /// Returns error if the backend fails.
    pub async fn len(&self) -> Result<usize> {
        self.store.len().await
    }

    /// Whether the store holds no grants.
    ///
    /// # Errors
    ///
    /// Returns error if the backend fails.
    pub async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }

    async fn lookup(&self, token: &str) -> Result<Lookup> {
        let Some(grant) = self.store.get(token).await? else {
            return Ok(Lookup::Missing);
        };

        let now = self.clock.now();
        if grant.is_expired_at(now) {
            // Conditional, so a grant re-stored under this token since the
            // read survives.
            if self.store.remove_if_expired(token, now).await? {
                tracing::debug!(
                    token = token_prefix(token),
                    expires_at = %grant.expires_at,
                    "Removed expired magic link token on read"
                );
            }
            return Ok(Lookup::Expired);
        }

        Ok(Lookup::Live(grant))
    }
}

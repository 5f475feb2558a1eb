//! Session issuer trait.

use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique session identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// Generate a new random session ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// An authenticated portal session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortalSession {
    /// Session identifier.
    pub session_id: SessionId,

    /// Authenticated account.
    pub user_id: String,

    /// Account email.
    pub email: String,

    /// Session creation time.
    pub created_at: DateTime<Utc>,
}

/// Session issuer.
///
/// This trait abstracts over the auth middleware that turns a verified
/// identity into a browser session.
pub trait SessionIssuer: Send + Sync {
    /// Establish a session for `user_id`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::SessionCreationFailed`](crate::AuthError::SessionCreationFailed)
    /// if the session cannot be established.
    fn create_session(
        &self,
        user_id: &str,
        email: &str,
    ) -> impl std::future::Future<Output = Result<PortalSession>> + Send;
}

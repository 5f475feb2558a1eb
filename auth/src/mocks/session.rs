//! Mock session issuer for testing.

use crate::error::{AuthError, Result};
use crate::providers::{PortalSession, SessionId, SessionIssuer};
use chrono::Utc;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Mock session issuer.
///
/// Uses in-memory storage for testing.
#[derive(Debug, Clone)]
pub struct MockSessionIssuer {
    /// Whether to simulate success or failure.
    pub should_succeed: bool,

    /// Simulated round trip to the session backend.
    latency: Option<Duration>,

    sessions: Arc<Mutex<Vec<PortalSession>>>,
}

impl MockSessionIssuer {
    /// Create a new mock session issuer that succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self {
            should_succeed: true,
            latency: None,
            sessions: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Sleep for `latency` before each session is created.
    #[must_use]
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Create a mock session issuer whose exchanges fail.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            should_succeed: false,
            ..Self::new()
        }
    }

    /// Get count of issued sessions (for testing).
    ///
    /// # Errors
    ///
    /// Returns error if lock is poisoned.
    pub fn session_count(&self) -> Result<usize> {
        Ok(self
            .sessions
            .lock()
            .map_err(|_| AuthError::StoreUnavailable("Mutex lock failed".to_string()))?
            .len())
    }
}

impl Default for MockSessionIssuer {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionIssuer for MockSessionIssuer {
    fn create_session(
        &self,
        user_id: &str,
        email: &str,
    ) -> impl Future<Output = Result<PortalSession>> + Send {
        let sessions = Arc::clone(&self.sessions);
        let should_succeed = self.should_succeed;
        let latency = self.latency;
        let session = PortalSession {
            session_id: SessionId::new(),
            user_id: user_id.to_string(),
            email: email.to_string(),
            created_at: Utc::now(),
        };

        async move {
            if let Some(latency) = latency {
                tokio::time::sleep(latency).await;
            }

            if !should_succeed {
                return Err(AuthError::SessionCreationFailed(
                    "simulated session failure".to_string(),
                ));
            }

            sessions
                .lock()
                .map_err(|_| AuthError::StoreUnavailable("Mutex lock failed".to_string()))?
                .push(session.clone());
            Ok(session)
        }
    }
}

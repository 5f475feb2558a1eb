//! Mock email provider for testing.

use crate::error::{AuthError, Result};
use crate::providers::{EmailProvider, MagicLinkEmail};
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

/// Mock email provider.
///
/// Records every message instead of sending it. Clones share the outbox.
#[derive(Debug, Clone)]
pub struct MockEmailProvider {
    /// Whether to simulate success or failure.
    pub should_succeed: bool,

    sent: Arc<Mutex<Vec<MagicLinkEmail>>>,
}

impl MockEmailProvider {
    /// Create a new mock email provider that succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self {
            should_succeed: true,
            sent: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a mock email provider whose deliveries fail.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            should_succeed: false,
            ..Self::new()
        }
    }

    /// Messages delivered so far.
    #[must_use]
    pub fn sent(&self) -> Vec<MagicLinkEmail> {
        self.sent.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// The most recently delivered message.
    #[must_use]
    pub fn last_sent(&self) -> Option<MagicLinkEmail> {
        self.sent().pop()
    }
}

impl Default for MockEmailProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl EmailProvider for MockEmailProvider {
    fn send_magic_link(&self, email: &MagicLinkEmail) -> impl Future<Output = Result<()>> + Send {
        let sent = Arc::clone(&self.sent);
        let should_succeed = self.should_succeed;
        let email = email.clone();

        async move {
            if !should_succeed {
                return Err(AuthError::EmailDeliveryFailed(
                    "simulated delivery failure".to_string(),
                ));
            }

            sent.lock().unwrap_or_else(PoisonError::into_inner).push(email);
            Ok(())
        }
    }
}

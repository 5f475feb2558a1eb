//! Mock user directory for testing.

use crate::error::{AuthError, Result};
use crate::providers::{PortalUser, UserDirectory};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

/// Mock user directory.
///
/// Uses in-memory storage keyed by lowercase email.
#[derive(Debug, Clone, Default)]
pub struct MockUserDirectory {
    users_by_email: Arc<Mutex<HashMap<String, PortalUser>>>,
}

impl MockUserDirectory {
    /// Create an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a directory containing `users`.
    #[must_use]
    pub fn with_users(users: impl IntoIterator<Item = PortalUser>) -> Self {
        let directory = Self::new();
        for user in users {
            directory.insert(user);
        }
        directory
    }

    /// Add or replace a user.
    pub fn insert(&self, user: PortalUser) {
        if let Ok(mut users) = self.users_by_email.lock() {
            users.insert(user.email.to_lowercase(), user);
        }
    }
}

impl UserDirectory for MockUserDirectory {
    fn find_user_by_email(
        &self,
        email: &str,
    ) -> impl Future<Output = Result<Option<PortalUser>>> + Send {
        let users_by_email = Arc::clone(&self.users_by_email);
        let email = email.to_lowercase();

        async move {
            Ok(users_by_email
                .lock()
                .map_err(|_| AuthError::StoreUnavailable("Mutex lock failed".to_string()))?
                .get(&email)
                .cloned())
        }
    }
}

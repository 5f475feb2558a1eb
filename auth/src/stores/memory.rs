//! In-memory token store.
//!
//! Process-local and non-persistent: a restart invalidates every outstanding
//! link, and tokens issued by one replica are invisible to the others.

use crate::error::{AuthError, Result};
use crate::providers::TokenStore;
use crate::token::MagicLinkToken;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// In-memory token store.
///
/// Every read-modify-write runs under one mutex, so `mark_used` is atomic
/// across tasks. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTokenStore {
    grants: Arc<Mutex<HashMap<String, MagicLinkToken>>>,
}

impl InMemoryTokenStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, MagicLinkToken>>> {
        self.grants
            .lock()
            .map_err(|_| AuthError::StoreUnavailable("token map lock poisoned".to_string()))
    }
}

impl TokenStore for InMemoryTokenStore {
    async fn put(&self, grant: MagicLinkToken) -> Result<()> {
        self.lock()?.insert(grant.token.clone(), grant);
        Ok(())
    }

    async fn get(&self, token: &str) -> Result<Option<MagicLinkToken>> {
        Ok(self.lock()?.get(token).cloned())
    }

    async fn remove(&self, token: &str) -> Result<()> {
        self.lock()?.remove(token);
        Ok(())
    }

    async fn mark_used(&self, token: &str, used_at: DateTime<Utc>) -> Result<bool> {
        let mut grants = self.lock()?;

        match grants.get_mut(token) {
            Some(grant) if grant.used_at.is_none() => {
                grant.used_at = Some(used_at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn release_used(&self, token: &str, used_at: DateTime<Utc>) -> Result<bool> {
        let mut grants = self.lock()?;

        match grants.get_mut(token) {
            Some(grant) if grant.used_at == Some(used_at) => {
                grant.used_at = None;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn remove_if_expired(&self, token: &str, now: DateTime<Utc>) -> Result<bool> {
        let mut grants = self.lock()?;

        if grants.get(token).is_some_and(|grant| grant.is_expired_at(now)) {
            grants.remove(token);
            return Ok(true);
        }

        Ok(false)
    }

    async fn sweep_expired(&self, now: DateTime<Utc>) -> Result<usize> {
        let mut grants = self.lock()?;
        let before = grants.len();
        grants.retain(|_, grant| !grant.is_expired_at(now));
        Ok(before - grants.len())
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.lock()?.len())
    }
}

//! Token store trait.
//!
//! This module defines the key/value backend behind
//! [`MagicLinkTokens`](crate::MagicLinkTokens). Backends only store and
//! mutate grants; expiry policy lives in the facade.

use crate::error::Result;
use crate::token::MagicLinkToken;
use chrono::{DateTime, Utc};

/// Token store.
///
/// This trait abstracts over grant storage so the process-local map can be
/// swapped for a shared cache once the portal runs as more than one replica.
///
/// # Implementation Notes
///
/// - `put()` overwrites any grant already stored under the same token
/// - **CRITICAL**: `mark_used()` MUST be an atomic check-then-set; it is the
///   claim that makes an exchange single-use
/// - `release_used()` and `remove_if_expired()` are atomic compare-then-write
/// - `get()` returns expired grants as-is; callers decide what expiry means
/// - `sweep_expired()` may be a no-op for backends with native TTLs
pub trait TokenStore: Send + Sync {
    /// Insert or overwrite a grant.
    ///
    /// # Errors
    ///
    /// Returns error if the storage operation fails.
    fn put(
        &self,
        grant: MagicLinkToken,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Look up a grant by token.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(grant))`: A grant is stored under this token
    /// - `Ok(None)`: Nothing is stored under this token
    ///
    /// # Errors
    ///
    /// Returns error if the storage operation fails.
    fn get(
        &self,
        token: &str,
    ) -> impl std::future::Future<Output = Result<Option<MagicLinkToken>>> + Send;

    /// Delete a grant. Deleting an absent token is not an error.
    ///
    /// # Errors
    ///
    /// Returns error if the storage operation fails.
    fn remove(
        &self,
        token: &str,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Set `used_at` if the grant exists and is not already used.
    ///
    /// This operation MUST be atomic: concurrent callers for the same token
    /// see exactly one `Ok(true)`.
    ///
    /// # Returns
    ///
    /// `true` if this call marked the grant, `false` if it was absent or
    /// already marked.
    ///
    /// # Errors
    ///
    /// Returns error if the storage operation fails.
    fn mark_used(
        &self,
        token: &str,
        used_at: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<bool>> + Send;

    /// Clear `used_at` if it still holds exactly `used_at`.
    ///
    /// Undoes a [`mark_used`](Self::mark_used) whose follow-up failed. A
    /// grant overwritten or marked by someone else since is left alone.
    ///
    /// # Returns
    ///
    /// `true` if the mark was cleared.
    ///
    /// # Errors
    ///
    /// Returns error if the storage operation fails.
    fn release_used(
        &self,
        token: &str,
        used_at: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<bool>> + Send;

    /// Delete the grant only if its deadline is before `now`.
    ///
    /// The check and the delete MUST be atomic, so a fresh grant stored
    /// under the same token in between is never removed.
    ///
    /// # Returns
    ///
    /// `true` if an expired grant was removed.
    ///
    /// # Errors
    ///
    /// Returns error if the storage operation fails.
    fn remove_if_expired(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<bool>> + Send;

    /// Delete every grant whose deadline is before `now`, used or not.
    ///
    /// # Returns
    ///
    /// Number of grants removed.
    ///
    /// # Errors
    ///
    /// Returns error if the storage operation fails.
    fn sweep_expired(
        &self,
        now: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<usize>> + Send;

    /// Number of stored grants, including expired ones not yet swept.
    ///
    /// # Errors
    ///
    /// Returns error if the storage operation fails.
    fn len(&self) -> impl std::future::Future<Output = Result<usize>> + Send;
}

//! User directory trait.

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// A portal account as known to the identity source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortalUser {
    /// Opaque account identifier (an Airtable record id in production).
    pub user_id: String,

    /// Login email address.
    pub email: String,

    /// Display name.
    pub name: Option<String>,
}

/// User directory.
///
/// This trait abstracts over the system of record for portal accounts.
/// The token store trusts whatever identity it is handed and never
/// re-validates it.
pub trait UserDirectory: Send + Sync {
    /// Find a user by login email.
    ///
    /// Matching is case-insensitive.
    ///
    /// # Returns
    ///
    /// `Ok(None)` when no account uses this address.
    ///
    /// # Errors
    ///
    /// Returns error if the directory cannot be queried.
    fn find_user_by_email(
        &self,
        email: &str,
    ) -> impl std::future::Future<Output = Result<Option<PortalUser>>> + Send;
}

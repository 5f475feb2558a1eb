//! Redis-based token store implementation.
//!
//! Makes magic links usable on every replica of the portal, not just the one
//! that issued them.
//!
//! # Architecture
//!
//! Each grant is a Redis hash:
//! - **Key**: `portal:magic-link:{token}`
//! - **Fields**: `token`, `user_id`, `email`, `expires_at`, `used_at` (epoch millis)
//! - **Expiry**: `PEXPIREAT` at the grant deadline, so Redis drops expired
//!   grants on its own and the periodic sweep has nothing to do
//!
//! `mark_used` runs a server-side script (`EXISTS` + `HSETNX`) so the
//! check-then-set is atomic across replicas and keeps the key's TTL.
//! `release_used` and `remove_if_expired` are scripts for the same reason.
//!
//! # Example
//!
//! ```no_run
//! use prospect_portal_auth::stores::RedisTokenStore;
//! use prospect_portal_auth::token::generate_token;
//! use prospect_portal_auth::{MagicLinkConfig, MagicLinkTokens};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = RedisTokenStore::new("redis://127.0.0.1:6379").await?;
//! let tokens = MagicLinkTokens::new(store, MagicLinkConfig::default().token_ttl);
//!
//! let token = generate_token();
//! tokens.store_token(&token, "rec123", "user@example.com").await?;
//! # Ok(())
//! # }
//! ```

use crate::error::{AuthError, Result};
use crate::providers::TokenStore;
use crate::token::{MagicLinkToken, token_prefix};
use chrono::{DateTime, Utc};
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, Script};
use std::collections::HashMap;

/// Namespace for all magic link keys.
pub const KEY_PREFIX: &str = "portal:magic-link:";

const FIELD_TOKEN: &str = "token";
const FIELD_USER_ID: &str = "user_id";
const FIELD_EMAIL: &str = "email";
const FIELD_EXPIRES_AT: &str = "expires_at";
const FIELD_USED_AT: &str = "used_at";

/// Sets `used_at` only if the grant exists and has none yet.
const MARK_USED_SCRIPT: &str = r"
if redis.call('EXISTS', KEYS[1]) == 1 then
    return redis.call('HSETNX', KEYS[1], 'used_at', ARGV[1])
end
return 0
";

/// Clears `used_at` only if it still holds the caller's mark.
const RELEASE_USED_SCRIPT: &str = r"
if redis.call('HGET', KEYS[1], 'used_at') == ARGV[1] then
    return redis.call('HDEL', KEYS[1], 'used_at')
end
return 0
";

/// Deletes the grant only if its deadline is before `ARGV[1]`.
const REMOVE_IF_EXPIRED_SCRIPT: &str = r"
local expires_at = redis.call('HGET', KEYS[1], 'expires_at')
if expires_at and tonumber(expires_at) < tonumber(ARGV[1]) then
    return redis.call('DEL', KEYS[1])
end
return 0
";

/// `Redis`-based token store.
///
/// # Thread Safety
///
/// This type is `Clone` and can be safely shared across threads.
/// Each clone shares the same `ConnectionManager` (connection pool).
#[derive(Clone)]
pub struct RedisTokenStore {
    /// Connection manager for connection pooling.
    conn_manager: ConnectionManager,

    /// Atomic mark-as-used script.
    mark_used_script: Script,

    /// Atomic compare-and-clear of `used_at`.
    release_used_script: Script,

    /// Atomic compare-and-delete on expiry.
    remove_if_expired_script: Script,
}

impl RedisTokenStore {
    /// Create a new `Redis` token store.
    ///
    /// # Arguments
    ///
    /// * `redis_url` - `Redis` connection URL (e.g., "<redis://127.0.0.1:6379>")
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::StoreUnavailable`] if:
    /// - `Redis` URL is malformed
    /// - Connection to `Redis` server fails
    pub async fn new(redis_url: &str) -> Result<Self> {
        let client = Client::open(redis_url).map_err(|e| {
            AuthError::StoreUnavailable(format!("Failed to create Redis client: {e}"))
        })?;

        let conn_manager = ConnectionManager::new(client).await.map_err(|e| {
            AuthError::StoreUnavailable(format!(
                "Failed to create Redis connection manager: {e}"
            ))
        })?;

        tracing::info!("RedisTokenStore initialized successfully");

        Ok(Self {
            conn_manager,
            mark_used_script: Script::new(MARK_USED_SCRIPT),
            release_used_script: Script::new(RELEASE_USED_SCRIPT),
            remove_if_expired_script: Script::new(REMOVE_IF_EXPIRED_SCRIPT),
        })
    }

    /// Get the `Redis` key for a token.
    fn token_key(token: &str) -> String {
        format!("{KEY_PREFIX}{token}")
    }

    /// Flatten a grant into hash fields.
    fn encode(grant: &MagicLinkToken) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            (FIELD_TOKEN, grant.token.clone()),
            (FIELD_USER_ID, grant.user_id.clone()),
            (FIELD_EMAIL, grant.email.clone()),
            (FIELD_EXPIRES_AT, grant.expires_at.timestamp_millis().to_string()),
        ];
        if let Some(used_at) = grant.used_at {
            fields.push((FIELD_USED_AT, used_at.timestamp_millis().to_string()));
        }
        fields
    }

    /// Rebuild a grant from hash fields.
    fn decode(mut fields: HashMap<String, String>) -> Result<MagicLinkToken> {
        let used_at = fields
            .remove(FIELD_USED_AT)
            .map(|raw| parse_millis(&raw))
            .transpose()?;

        let mut take = |name: &str| {
            fields
                .remove(name)
                .ok_or_else(|| AuthError::Serialization(format!("grant missing field {name}")))
        };

        let token = take(FIELD_TOKEN)?;
        let user_id = take(FIELD_USER_ID)?;
        let email = take(FIELD_EMAIL)?;
        let expires_at = parse_millis(&take(FIELD_EXPIRES_AT)?)?;

        Ok(MagicLinkToken {
            token,
            user_id,
            email,
            expires_at,
            used_at,
        })
    }
}

fn parse_millis(raw: &str) -> Result<DateTime<Utc>> {
    raw.parse::<i64>()
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .ok_or_else(|| AuthError::Serialization(format!("invalid timestamp {raw:?}")))
}

impl TokenStore for RedisTokenStore {
    async fn put(&self, grant: MagicLinkToken) -> Result<()> {
        let mut conn = self.conn_manager.clone();
        let key = Self::token_key(&grant.token);
        let fields = Self::encode(&grant);

        // DEL first so an overwrite never keeps a stale used_at.
        let (): () = redis::pipe()
            .atomic()
            .del(&key)
            .ignore()
            .hset_multiple(&key, fields.as_slice())
            .ignore()
            .cmd("PEXPIREAT")
            .arg(&key)
            .arg(grant.expires_at.timestamp_millis())
            .ignore()
            .query_async(&mut conn)
            .await?;

        tracing::debug!(
            token = token_prefix(&grant.token),
            expires_at = %grant.expires_at,
            "Stored grant in Redis"
        );

        Ok(())
    }

    async fn get(&self, token: &str) -> Result<Option<MagicLinkToken>> {
        let mut conn = self.conn_manager.clone();
        let fields: HashMap<String, String> = conn.hgetall(Self::token_key(token)).await?;

        if fields.is_empty() {
            return Ok(None);
        }

        Self::decode(fields).map(Some)
    }

    async fn remove(&self, token: &str) -> Result<()> {
        let mut conn = self.conn_manager.clone();
        let deleted: i64 = conn.del(Self::token_key(token)).await?;

        tracing::trace!(token = token_prefix(token), deleted, "Removed grant from Redis");
        Ok(())
    }

    async fn mark_used(&self, token: &str, used_at: DateTime<Utc>) -> Result<bool> {
        let mut conn = self.conn_manager.clone();
        let marked: i64 = self
            .mark_used_script
            .key(Self::token_key(token))
            .arg(used_at.timestamp_millis())
            .invoke_async(&mut conn)
            .await?;

        Ok(marked == 1)
    }

    async fn release_used(&self, token: &str, used_at: DateTime<Utc>) -> Result<bool> {
        let mut conn = self.conn_manager.clone();
        let released: i64 = self
            .release_used_script
            .key(Self::token_key(token))
            .arg(used_at.timestamp_millis().to_string())
            .invoke_async(&mut conn)
            .await?;

        Ok(released == 1)
    }

    async fn remove_if_expired(&self, token: &str, now: DateTime<Utc>) -> Result<bool> {
        let mut conn = self.conn_manager.clone();
        let removed: i64 = self
            .remove_if_expired_script
            .key(Self::token_key(token))
            .arg(now.timestamp_millis())
            .invoke_async(&mut conn)
            .await?;

        Ok(removed == 1)
    }

    async fn sweep_expired(&self, _now: DateTime<Utc>) -> Result<usize> {
        // PEXPIREAT already evicts expired grants.
        Ok(0)
    }

    async fn len(&self) -> Result<usize> {
        let mut conn = self.conn_manager.clone();
        let pattern = format!("{KEY_PREFIX}*");
        let mut cursor: u64 = 0;
        let mut count = 0;

        // SCAN may repeat keys while the keyspace is rehashing, so this is
        // an estimate under churn.
        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(500)
                .query_async(&mut conn)
                .await?;

            count += batch.len();
            if next == 0 {
                break;
            }
            cursor = next;
        }

        Ok(count)
    }
}

//! Token store lifecycle and security properties.
//!
//! This module verifies:
//!
//! - Token uniqueness and format
//! - Expiry enforced on every read, independent of the sweep
//! - Single-use marking that never moves the first timestamp
//! - One session per link under concurrent exchange

#![allow(clippy::unwrap_used)]

use chrono::Duration;
use prospect_portal_auth::{
    AuthError, Clock, MagicLinkConfig, MagicLinkFlow, MagicLinkTokens, TokenStatus,
    mocks::{ManualClock, MockEmailProvider, MockSessionIssuer, MockUserDirectory},
    providers::PortalUser,
    stores::InMemoryTokenStore,
    token::{TOKEN_LENGTH, generate_token},
};
use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;

fn create_tokens() -> (MagicLinkTokens<InMemoryTokenStore, ManualClock>, ManualClock) {
    let clock = ManualClock::default();
    let tokens =
        MagicLinkTokens::with_clock(InMemoryTokenStore::new(), Duration::hours(24), clock.clone());
    (tokens, clock)
}

#[test]
fn test_generated_tokens_are_unique() {
    let mut seen = HashSet::with_capacity(100_000);

    for _ in 0..100_000 {
        let token = generate_token();
        assert_eq!(token.len(), TOKEN_LENGTH);
        assert!(
            token
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
        assert!(seen.insert(token), "duplicate token generated");
    }
}

#[tokio::test]
async fn test_store_get_mark_lifecycle() {
    let (tokens, clock) = create_tokens();

    tokens.store_token("abc", "user1", "a@x.com").await.unwrap();

    let grant = tokens.get_token("abc").await.unwrap().unwrap();
    assert_eq!(grant.user_id, "user1");
    assert_eq!(grant.email, "a@x.com");
    assert_eq!(grant.expires_at, clock.now() + Duration::hours(24));
    assert_eq!(grant.used_at, None);

    assert!(tokens.mark_token_as_used("abc").await.unwrap());
    assert!(tokens.get_token("abc").await.unwrap().is_none());

    let grant = tokens.validate_token("abc").await.unwrap().unwrap();
    assert!(grant.used_at.is_some());
}

#[tokio::test]
async fn test_negative_ttl_is_expired_and_removed() {
    let (tokens, _clock) = create_tokens();

    tokens
        .store_token_for("abc", "u1", "a@x.com", Duration::hours(-1))
        .await
        .unwrap();
    assert_eq!(tokens.len().await.unwrap(), 1);

    assert!(tokens.get_token("abc").await.unwrap().is_none());
    assert_eq!(tokens.len().await.unwrap(), 0);
}

#[tokio::test]
async fn test_second_mark_keeps_first_timestamp() {
    let (tokens, clock) = create_tokens();
    tokens.store_token("abc", "u1", "a@x.com").await.unwrap();

    assert!(tokens.mark_token_as_used("abc").await.unwrap());
    let first = tokens.validate_token("abc").await.unwrap().unwrap().used_at;

    clock.advance(Duration::minutes(5));
    assert!(!tokens.mark_token_as_used("abc").await.unwrap());

    let second = tokens.validate_token("abc").await.unwrap().unwrap().used_at;
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_mark_unknown_token_is_noop() {
    let (tokens, _clock) = create_tokens();

    assert!(!tokens.mark_token_as_used("missing").await.unwrap());
    assert!(tokens.is_empty().await.unwrap());
}

#[tokio::test]
async fn test_used_grant_still_expires() {
    let (tokens, clock) = create_tokens();
    tokens.store_token("abc", "u1", "a@x.com").await.unwrap();
    tokens.mark_token_as_used("abc").await.unwrap();

    clock.advance(Duration::hours(25));

    assert!(tokens.validate_token("abc").await.unwrap().is_none());
    assert!(tokens.is_empty().await.unwrap());
}

#[tokio::test]
async fn test_check_token_classifies() {
    let (tokens, clock) = create_tokens();
    tokens.store_token("live", "u1", "a@x.com").await.unwrap();
    tokens.store_token("used", "u1", "a@x.com").await.unwrap();
    tokens
        .store_token_for("short", "u1", "a@x.com", Duration::minutes(10))
        .await
        .unwrap();
    tokens.mark_token_as_used("used").await.unwrap();
    clock.advance(Duration::minutes(11));

    assert!(matches!(tokens.check_token("live").await.unwrap(), TokenStatus::Valid(_)));
    assert_eq!(tokens.check_token("used").await.unwrap(), TokenStatus::AlreadyUsed);
    assert_eq!(tokens.check_token("short").await.unwrap(), TokenStatus::Expired);
    assert_eq!(tokens.check_token("short").await.unwrap(), TokenStatus::NotFound);
}

#[tokio::test]
async fn test_sweep_removes_only_expired() {
    let (tokens, clock) = create_tokens();
    tokens
        .store_token_for("short", "u1", "a@x.com", Duration::minutes(30))
        .await
        .unwrap();
    tokens.store_token("long", "u2", "b@x.com").await.unwrap();
    tokens.mark_token_as_used("long").await.unwrap();

    clock.advance(Duration::hours(1));

    assert_eq!(tokens.sweep_expired().await.unwrap(), 1);
    assert_eq!(tokens.len().await.unwrap(), 1);
    assert!(tokens.validate_token("long").await.unwrap().is_some());
}

/// Concurrent exchanges of one link must yield exactly one session.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_exchange_creates_one_session() {
    let config = MagicLinkConfig::default();
    let tokens = Arc::new(MagicLinkTokens::new(InMemoryTokenStore::new(), config.token_ttl));
    let users = MockUserDirectory::with_users([PortalUser {
        user_id: "recProspect1".to_string(),
        email: "dana@acme.com".to_string(),
        name: None,
    }]);
    let sessions = MockSessionIssuer::new().with_latency(std::time::Duration::from_millis(20));
    let flow = Arc::new(MagicLinkFlow::new(
        Arc::clone(&tokens),
        users,
        MockEmailProvider::new(),
        sessions.clone(),
        config,
    ));

    let token = flow.request_link("dana@acme.com").await.unwrap().grant.token;

    let barrier = Arc::new(tokio::sync::Barrier::new(10));
    let mut handles = Vec::new();
    for _ in 0..10 {
        let flow = Arc::clone(&flow);
        let barrier = Arc::clone(&barrier);
        let token = token.clone();
        handles.push(tokio::spawn(async move {
            barrier.wait().await;
            flow.exchange_token(&token).await
        }));
    }

    let mut outcomes = Vec::new();
    for handle in handles {
        outcomes.push(handle.await.unwrap());
    }

    let successes = outcomes.iter().filter(|outcome| outcome.is_ok()).count();
    assert_eq!(successes, 1, "exactly one exchange should succeed");
    assert_eq!(sessions.session_count().unwrap(), 1);
    assert!(
        outcomes
            .iter()
            .filter_map(|outcome| outcome.as_ref().err())
            .all(|e| *e == AuthError::MagicLinkAlreadyUsed)
    );
    assert!(tokens.get_token(&token).await.unwrap().is_none());
}

/// A failed session exchange releases the claim for the next attempt.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_failed_exchange_releases_claim() {
    let config = MagicLinkConfig::default();
    let tokens = Arc::new(MagicLinkTokens::new(InMemoryTokenStore::new(), config.token_ttl));
    let users = MockUserDirectory::with_users([PortalUser {
        user_id: "recProspect1".to_string(),
        email: "dana@acme.com".to_string(),
        name: None,
    }]);
    let failing = MagicLinkFlow::new(
        Arc::clone(&tokens),
        users.clone(),
        MockEmailProvider::new(),
        MockSessionIssuer::failing().with_latency(std::time::Duration::from_millis(5)),
        config.clone(),
    );
    let working = MagicLinkFlow::new(
        Arc::clone(&tokens),
        users,
        MockEmailProvider::new(),
        MockSessionIssuer::new(),
        config,
    );

    let token = failing.request_link("dana@acme.com").await.unwrap().grant.token;

    assert!(matches!(
        failing.exchange_token(&token).await,
        Err(AuthError::SessionCreationFailed(_))
    ));
    assert!(working.exchange_token(&token).await.is_ok());
    assert_eq!(
        working.exchange_token(&token).await,
        Err(AuthError::MagicLinkAlreadyUsed)
    );
}

proptest! {
    #[test]
    fn prop_valid_until_deadline_then_rejected(ttl_secs in 1i64..=30 * 24 * 3600) {
        tokio_test::block_on(async {
            let (tokens, clock) = create_tokens();
            let ttl = Duration::seconds(ttl_secs);
            let token = generate_token();

            let grant = tokens.store_token_for(&token, "u1", "a@x.com", ttl).await.unwrap();
            prop_assert_eq!(grant.expires_at, clock.now() + ttl);
            prop_assert!(tokens.get_token(&token).await.unwrap().is_some());

            clock.advance(ttl);
            prop_assert!(tokens.validate_token(&token).await.unwrap().is_some());

            clock.advance(Duration::milliseconds(1));
            prop_assert!(tokens.validate_token(&token).await.unwrap().is_none());
            prop_assert!(tokens.get_token(&token).await.unwrap().is_none());
            Ok(())
        })?;
    }
}

//! Integration tests for the magic link sign-in flow.

use chrono::Duration;
use prospect_portal_auth::{
    AuthError, MagicLinkConfig, MagicLinkFlow, MagicLinkTokens,
    error::LINK_NO_LONGER_VALID,
    mocks::{ManualClock, MockEmailProvider, MockSessionIssuer, MockUserDirectory},
    providers::PortalUser,
    stores::InMemoryTokenStore,
};
use std::sync::Arc;

type TestFlow = MagicLinkFlow<
    InMemoryTokenStore,
    MockUserDirectory,
    MockEmailProvider,
    MockSessionIssuer,
    ManualClock,
>;

/// Mock collaborators, kept so tests can inspect them.
struct Harness {
    flow: TestFlow,
    clock: ManualClock,
    email: MockEmailProvider,
    sessions: MockSessionIssuer,
}

/// Route flow logs to the test output; ignored if already installed.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("prospect_portal_auth=debug")
        .with_test_writer()
        .try_init();
}

fn create_harness(email: MockEmailProvider, sessions: MockSessionIssuer) -> Harness {
    init_tracing();

    let config = MagicLinkConfig::new("https://portal.betafits.com/")
        .with_token_ttl(Duration::hours(24));
    let clock = ManualClock::default();
    let tokens = Arc::new(MagicLinkTokens::with_clock(
        InMemoryTokenStore::new(),
        config.token_ttl,
        clock.clone(),
    ));
    let users = MockUserDirectory::with_users([
        PortalUser {
            user_id: "recProspect1".to_string(),
            email: "dana@acme.com".to_string(),
            name: Some("Dana".to_string()),
        },
        PortalUser {
            user_id: "recProspect2".to_string(),
            email: "lee@globex.com".to_string(),
            name: None,
        },
    ]);

    Harness {
        flow: MagicLinkFlow::new(tokens, users, email.clone(), sessions.clone(), config),
        clock,
        email,
        sessions,
    }
}

fn create_test_harness() -> Harness {
    create_harness(MockEmailProvider::new(), MockSessionIssuer::new())
}

/// Pull the token back out of an emailed link.
fn token_from_link(link: &str) -> String {
    link.split_once("token=")
        .map(|(_, token)| token.to_string())
        .unwrap_or_default()
}

#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn test_magic_link_flow_complete_happy_path() {
    let harness = create_test_harness();

    // Step 1: Request a link
    let issued = harness.flow.request_link("dana@acme.com").await.unwrap();
    assert_eq!(
        issued.magic_link,
        format!("https://portal.betafits.com/access?token={}", issued.grant.token)
    );

    // Step 2: The email carries the same link
    let sent = harness.email.last_sent().unwrap();
    assert_eq!(sent.magic_link, issued.magic_link);
    let token = token_from_link(&sent.magic_link);
    assert_eq!(token, issued.grant.token);

    // Step 3: The access page previews the token
    let preview = harness.flow.preview(&token).await.unwrap().unwrap();
    assert_eq!(preview.user_id, "recProspect1");
    assert!(!preview.is_used());

    // Step 4: Exchange for a session
    let session = harness.flow.exchange_token(&token).await.unwrap();
    assert_eq!(session.user_id, "recProspect1");
    assert_eq!(session.email, "dana@acme.com");
    assert_eq!(harness.sessions.session_count().unwrap(), 1);

    // Step 5: The grant is now used
    let grant = harness.flow.tokens().validate_token(&token).await.unwrap().unwrap();
    assert!(grant.is_used());
    assert!(harness.flow.tokens().get_token(&token).await.unwrap().is_none());
}

#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn test_unknown_user_gets_no_token() {
    let harness = create_test_harness();

    let result = harness.flow.request_link("nobody@acme.com").await;

    assert_eq!(result, Err(AuthError::UserNotFound));
    assert!(harness.email.sent().is_empty());
    assert!(harness.flow.tokens().is_empty().await.unwrap());
}

#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn test_invalid_email_rejected() {
    let harness = create_test_harness();

    for email in ["", "dana", "dana@", "@acme.com", "dana@@acme.com"] {
        assert_eq!(
            harness.flow.request_link(email).await,
            Err(AuthError::InvalidEmail),
            "{email:?} should be rejected"
        );
    }
    assert!(harness.flow.tokens().is_empty().await.unwrap());
}

#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn test_email_failure_leaves_token_valid() {
    let harness = create_harness(MockEmailProvider::failing(), MockSessionIssuer::new());

    let result = harness.flow.request_link("dana@acme.com").await;
    assert!(matches!(result, Err(AuthError::EmailDeliveryFailed(_))));

    // The grant was stored before delivery was attempted
    assert_eq!(harness.flow.tokens().len().await.unwrap(), 1);
}

#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn test_reused_link_rejected() {
    let harness = create_test_harness();
    let token = harness.flow.request_link("dana@acme.com").await.unwrap().grant.token;

    harness.flow.exchange_token(&token).await.unwrap();

    let second = harness.flow.exchange_token(&token).await;
    assert_eq!(second, Err(AuthError::MagicLinkAlreadyUsed));
    assert_eq!(second.unwrap_err().user_message(), LINK_NO_LONGER_VALID);
    assert_eq!(harness.sessions.session_count().unwrap(), 1);
}

#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn test_expired_link_rejected() {
    let harness = create_test_harness();
    let token = harness.flow.request_link("dana@acme.com").await.unwrap().grant.token;

    // Exactly at the deadline the link still works
    harness.clock.advance(Duration::hours(24));
    assert!(harness.flow.preview(&token).await.unwrap().is_some());

    harness.clock.advance(Duration::milliseconds(1));
    let result = harness.flow.exchange_token(&token).await;
    assert_eq!(result, Err(AuthError::MagicLinkExpired));
    assert_eq!(result.unwrap_err().user_message(), LINK_NO_LONGER_VALID);
    assert_eq!(harness.sessions.session_count().unwrap(), 0);

    // The expired grant was evicted on read
    assert!(harness.flow.tokens().is_empty().await.unwrap());
}

#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn test_unknown_token_rejected() {
    let harness = create_test_harness();

    let result = harness.flow.exchange_token("not-a-real-token").await;

    assert_eq!(result, Err(AuthError::MagicLinkInvalid));
    assert_eq!(result.unwrap_err().user_message(), LINK_NO_LONGER_VALID);
}

#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn test_session_failure_does_not_consume_token() {
    let harness = create_harness(MockEmailProvider::new(), MockSessionIssuer::failing());
    let token = harness.flow.request_link("dana@acme.com").await.unwrap().grant.token;

    let result = harness.flow.exchange_token(&token).await;
    assert!(matches!(result, Err(AuthError::SessionCreationFailed(_))));

    let grant = harness.flow.tokens().get_token(&token).await.unwrap().unwrap();
    assert!(!grant.is_used());
}

#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn test_multiple_links_stay_valid() {
    let harness = create_test_harness();

    let first = harness.flow.request_link("lee@globex.com").await.unwrap().grant.token;
    let second = harness.flow.request_link("lee@globex.com").await.unwrap().grant.token;
    assert_ne!(first, second);

    // Using the newer link does not revoke the older one
    harness.flow.exchange_token(&second).await.unwrap();
    harness.flow.exchange_token(&first).await.unwrap();
    assert_eq!(harness.sessions.session_count().unwrap(), 2);
}

#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn test_greeting_without_name() {
    let harness = create_test_harness();

    harness.flow.request_link("lee@globex.com").await.unwrap();

    let sent = harness.email.last_sent().unwrap();
    assert_eq!(sent.user_name, None);
    assert_eq!(sent.greeting(), "Hi there,");
}

//! # Prospect Portal Authentication
//!
//! Passwordless sign-in for the Betafits prospect portal.
//!
//! ## Features
//!
//! - **Magic links**: single-use, time-bounded sign-in tokens
//! - **Pluggable storage**: in-memory for one process, Redis for many
//! - **Deterministic time**: expiry reads an injected [`Clock`](clock::Clock)
//! - **Background sweep**: explicit start and stop for expired-token eviction
//! - **Testable**: mock providers behind the `test-utils` feature
//!
//! ## Architecture
//!
//! ```text
//! MagicLinkFlow ──► MagicLinkTokens ──► TokenStore (memory | redis)
//!      │                  ▲
//!      │                  └── TokenSweeper (periodic sweep_expired)
//!      ├──► UserDirectory
//!      ├──► EmailProvider (console | smtp)
//!      └──► SessionIssuer
//! ```
//!
//! ## Example: Sign-in
//!
//! ```rust,ignore
//! use prospect_portal_auth::*;
//!
//! let config = MagicLinkConfig::from_env()?;
//! let tokens = Arc::new(MagicLinkTokens::new(InMemoryTokenStore::new(), config.token_ttl));
//! let sweeper = TokenSweeper::new(Arc::clone(&tokens), config.sweep_interval).spawn();
//!
//! let flow = MagicLinkFlow::new(tokens, users, email, sessions, config);
//!
//! // 1. Email a link
//! flow.request_link("dana@acme.com").await?;
//!
//! // 2. User clicks it; the access page previews, then exchanges
//! let session = flow.exchange_token(&token).await?;
//!
//! sweeper.shutdown().await;
//! ```

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]

// Public modules
pub mod clock;
pub mod config;
pub mod error;
pub mod flow;
pub mod magic_link;
pub mod providers;
pub mod stores;
pub mod sweeper;
pub mod token;
pub mod utils;

// Mock implementations for testing
#[cfg(any(test, feature = "test-utils"))]
pub mod mocks;

// Re-export main types for convenience
pub use clock::{Clock, SystemClock};
pub use config::{MagicLinkConfig, SmtpConfig};
pub use error::{AuthError, Result};
pub use flow::{IssuedLink, MagicLinkFlow};
pub use magic_link::MagicLinkTokens;
pub use sweeper::{SweeperHandle, TokenSweeper};
pub use token::{MagicLinkToken, TokenStatus};

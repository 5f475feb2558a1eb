//! Sign-in providers.
//!
//! This module defines traits for all external dependencies used by the
//! magic-link flow. These traits enable dependency injection and make the
//! flow testable.
//!
//! # Architecture
//!
//! Providers are **interfaces**, not implementations. The flow depends on
//! these traits, and the application provides concrete implementations:
//!
//! ```text
//!                 ┌──────────────────┐
//!                 │  MagicLinkFlow   │
//!                 └────────┬─────────┘
//!        ┌────────────┬────┴───────┬──────────────┐
//!        ▼            ▼            ▼              ▼
//!  UserDirectory  TokenStore  EmailProvider  SessionIssuer
//!  (Airtable)     (memory /   (SMTP /        (auth
//!                  Redis)      console)       middleware)
//! ```
//!
//! This enables:
//! - **Testing**: Use mocks (in-memory, deterministic)
//! - **Production**: Use real services (Redis, SMTP)
//! - **Development**: Use the console email provider

pub mod console_email;
pub mod email;
pub mod session;
pub mod smtp_email;
pub mod token_store;
pub mod user;

pub use console_email::ConsoleEmailProvider;
pub use email::{EmailProvider, MagicLinkEmail};
pub use session::{PortalSession, SessionId, SessionIssuer};
pub use smtp_email::SmtpEmailProvider;
pub use token_store::TokenStore;
pub use user::{PortalUser, UserDirectory};

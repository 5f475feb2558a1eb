//! Mock provider implementations for testing.
//!
//! This module provides simple, in-memory implementations of all provider traits
//! and a manually driven clock for use in unit and integration tests.

pub mod clock;
pub mod email;
pub mod session;
pub mod user;

pub use clock::ManualClock;
pub use email::MockEmailProvider;
pub use session::MockSessionIssuer;
pub use user::MockUserDirectory;

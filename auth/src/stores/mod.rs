//! Token store backends.
//!
//! - **In-memory** - Process-local map, for development and single-replica
//!   deployments
//! - **Redis** - Shared store with native key expiry, for horizontally
//!   scaled deployments

pub mod memory;
pub mod token_redis;

// Re-exports
pub use memory::InMemoryTokenStore;
pub use token_redis::RedisTokenStore;

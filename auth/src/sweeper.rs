//! Periodic eviction of expired magic link tokens.
//!
//! The sweep only bounds memory: reads already reject expired grants, so a
//! delayed or skipped pass never lets an expired token through.
//!
//! # Example
//!
//! ```no_run
//! use prospect_portal_auth::{MagicLinkConfig, MagicLinkTokens, TokenSweeper};
//! use prospect_portal_auth::stores::InMemoryTokenStore;
//! use std::sync::Arc;
//!
//! # async fn example() {
//! let config = MagicLinkConfig::default();
//! let tokens = Arc::new(MagicLinkTokens::new(InMemoryTokenStore::new(), config.token_ttl));
//!
//! let sweeper = TokenSweeper::new(Arc::clone(&tokens), config.sweep_interval).spawn();
//!
//! // ... serve requests ...
//!
//! sweeper.shutdown().await;
//! # }
//! ```

use crate::clock::Clock;
use crate::error::Result;
use crate::magic_link::MagicLinkTokens;
use crate::providers::TokenStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};

/// Scheduled sweep of expired grants.
#[derive(Debug)]
pub struct TokenSweeper<S, C> {
    tokens: Arc<MagicLinkTokens<S, C>>,
    interval: Duration,
}

impl<S, C> TokenSweeper<S, C>
where
    S: TokenStore + 'static,
    C: Clock + 'static,
{
    /// Create a sweeper running every `interval`.
    ///
    /// A zero interval is raised to one second.
    #[must_use]
    pub fn new(tokens: Arc<MagicLinkTokens<S, C>>, interval: Duration) -> Self {
        Self {
            tokens,
            interval: interval.max(Duration::from_secs(1)),
        }
    }

    /// Run a single pass.
    ///
    /// # Errors
    ///
    /// Returns error if the backend fails.
    pub async fn sweep_once(&self) -> Result<usize> {
        let removed = self.tokens.sweep_expired().await?;

        if removed > 0 {
            tracing::info!(removed, "Swept expired magic link tokens");
        } else {
            tracing::debug!("Token sweep found nothing to remove");
        }

        Ok(removed)
    }

    /// Start sweeping in the background.
    ///
    /// The first pass runs one interval after start. The task runs until
    /// [`SweeperHandle::shutdown`] is called or the handle is dropped.
    #[must_use]
    pub fn spawn(self) -> SweeperHandle {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let period = self.interval;

        tracing::info!(interval_secs = period.as_secs(), "Starting magic link token sweeper");

        let task = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(e) = self.sweep_once().await {
                            // Keep running; the next pass will retry.
                            tracing::error!(error = %e, "Magic link token sweep failed");
                        }
                    }

                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            tracing::info!("Magic link token sweeper stopped");
                            break;
                        }
                    }
                }
            }
        });

        SweeperHandle { shutdown_tx, task }
    }
}

/// Handle to a running [`TokenSweeper`].
///
/// Dropping the handle also stops the sweeper.
#[derive(Debug)]
pub struct SweeperHandle {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SweeperHandle {
    /// Signal the sweeper to stop and wait for it to finish.
    pub async fn shutdown(self) {
        self.shutdown_tx.send(true).ok();

        if let Err(e) = self.task.await {
            tracing::warn!(error = %e, "Magic link token sweeper task ended abnormally");
        }
    }

    /// Whether the background task has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::mocks::ManualClock;
    use crate::stores::InMemoryTokenStore;

    fn tokens() -> Arc<MagicLinkTokens<InMemoryTokenStore, ManualClock>> {
        Arc::new(MagicLinkTokens::with_clock(
            InMemoryTokenStore::new(),
            chrono::Duration::hours(24),
            ManualClock::default(),
        ))
    }

    #[tokio::test]
    async fn test_sweep_once() {
        let tokens = tokens();
        tokens
            .store_token_for("stale", "user1", "a@x.com", chrono::Duration::hours(-1))
            .await
            .unwrap();
        tokens.store_token("fresh", "user1", "a@x.com").await.unwrap();

        let sweeper = TokenSweeper::new(Arc::clone(&tokens), Duration::from_secs(3600));
        assert_eq!(sweeper.sweep_once().await.unwrap(), 1);
        assert_eq!(tokens.len().await.unwrap(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_background_sweep_runs_hourly() {
        let tokens = tokens();
        tokens
            .store_token_for("short", "user1", "a@x.com", chrono::Duration::minutes(30))
            .await
            .unwrap();

        let handle = TokenSweeper::new(Arc::clone(&tokens), Duration::from_secs(3600)).spawn();

        // Expired on the injected clock, but no tick has fired yet.
        tokens.clock().advance(chrono::Duration::hours(1));
        tokio::time::sleep(Duration::from_secs(1800)).await;
        assert_eq!(tokens.len().await.unwrap(), 1);

        tokio::time::sleep(Duration::from_secs(1801)).await;
        assert_eq!(tokens.len().await.unwrap(), 0);

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_task() {
        let handle = TokenSweeper::new(tokens(), Duration::from_secs(60)).spawn();
        assert!(!handle.is_finished());
        handle.shutdown().await;
    }

    #[test]
    fn test_zero_interval_is_clamped() {
        let sweeper = TokenSweeper::new(tokens(), Duration::ZERO);
        assert_eq!(sweeper.interval, Duration::from_secs(1));
    }
}

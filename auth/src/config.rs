//! Sign-in configuration.
//!
//! Configuration values should be provided by the application, not hardcoded.
//! [`MagicLinkConfig::from_env`] covers the usual deployment knobs.

use crate::error::{AuthError, Result};
use chrono::Duration;

/// Environment variable holding the portal's public base URL.
pub const ENV_BASE_URL: &str = "PORTAL_BASE_URL";

/// Environment variable holding the token lifetime in hours.
pub const ENV_TOKEN_TTL_HOURS: &str = "MAGIC_LINK_TTL_HOURS";

/// Environment variable holding the sweep interval in seconds.
pub const ENV_SWEEP_INTERVAL_SECS: &str = "MAGIC_LINK_SWEEP_INTERVAL_SECS";

/// Magic link configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MagicLinkConfig {
    /// Base URL for magic link generation (e.g., "https://portal.betafits.com").
    ///
    /// Magic links will be formatted as: `{base_url}{access_path}?token={token}`
    pub base_url: String,

    /// Path of the page that exchanges the token.
    ///
    /// Default: `/access`
    pub access_path: String,

    /// Token time-to-live.
    ///
    /// Default: 24 hours
    pub token_ttl: Duration,

    /// How often expired tokens are swept from the store.
    ///
    /// Default: 1 hour
    pub sweep_interval: std::time::Duration,
}

impl MagicLinkConfig {
    /// Create new magic link configuration.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Base URL for the portal (e.g., "https://portal.betafits.com")
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Load configuration from the environment.
    ///
    /// Unset variables fall back to the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Configuration`] if a numeric variable does not parse
    /// or the sweep interval is zero.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(base_url) = std::env::var(ENV_BASE_URL) {
            config.base_url = base_url;
        }

        if let Ok(raw) = std::env::var(ENV_TOKEN_TTL_HOURS) {
            let hours: i64 = raw.trim().parse().map_err(|e| {
                AuthError::Configuration(format!("{ENV_TOKEN_TTL_HOURS}={raw:?}: {e}"))
            })?;
            config.token_ttl = Duration::hours(hours);
        }

        if let Ok(raw) = std::env::var(ENV_SWEEP_INTERVAL_SECS) {
            let secs: u64 = raw.trim().parse().map_err(|e| {
                AuthError::Configuration(format!("{ENV_SWEEP_INTERVAL_SECS}={raw:?}: {e}"))
            })?;
            if secs == 0 {
                return Err(AuthError::Configuration(format!(
                    "{ENV_SWEEP_INTERVAL_SECS} must be greater than zero"
                )));
            }
            config.sweep_interval = std::time::Duration::from_secs(secs);
        }

        tracing::debug!(
            base_url = %config.base_url,
            token_ttl_hours = config.token_ttl.num_hours(),
            sweep_interval_secs = config.sweep_interval.as_secs(),
            "Loaded magic link configuration"
        );

        Ok(config)
    }

    /// Set the access page path.
    #[must_use]
    pub fn with_access_path(mut self, path: impl Into<String>) -> Self {
        self.access_path = path.into();
        self
    }

    /// Set token time-to-live.
    #[must_use]
    pub const fn with_token_ttl(mut self, ttl: Duration) -> Self {
        self.token_ttl = ttl;
        self
    }

    /// Set sweep interval.
    #[must_use]
    pub const fn with_sweep_interval(mut self, interval: std::time::Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    /// Build the URL embedding `token`.
    #[must_use]
    pub fn magic_link_url(&self, token: &str) -> String {
        format!(
            "{}{}?token={}",
            self.base_url.trim_end_matches('/'),
            self.access_path,
            urlencoding::encode(token)
        )
    }
}

impl Default for MagicLinkConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            access_path: "/access".to_string(),
            token_ttl: Duration::hours(24),
            sweep_interval: std::time::Duration::from_secs(60 * 60),
        }
    }
}

/// SMTP delivery configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpConfig {
    /// SMTP server address (e.g., "smtp.sendgrid.net").
    pub server: String,

    /// SMTP server port (usually 587 for STARTTLS).
    pub port: u16,

    /// SMTP authentication username.
    pub username: String,

    /// SMTP authentication password.
    pub password: String,

    /// Sender email address.
    pub from_email: String,

    /// Sender display name.
    pub from_name: String,
}

impl SmtpConfig {
    /// Create SMTP configuration with the default port and sender name.
    #[must_use]
    pub fn new(
        server: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        from_email: impl Into<String>,
    ) -> Self {
        Self {
            server: server.into(),
            port: 587,
            username: username.into(),
            password: password.into(),
            from_email: from_email.into(),
            from_name: "Betafits".to_string(),
        }
    }

    /// Set the SMTP port.
    #[must_use]
    pub const fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the sender display name.
    #[must_use]
    pub fn with_from_name(mut self, name: impl Into<String>) -> Self {
        self.from_name = name.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_magic_link_config_builder() {
        let config = MagicLinkConfig::new("https://portal.example.com")
            .with_access_path("/sign-in")
            .with_token_ttl(Duration::hours(2))
            .with_sweep_interval(std::time::Duration::from_secs(60));

        assert_eq!(config.base_url, "https://portal.example.com");
        assert_eq!(config.access_path, "/sign-in");
        assert_eq!(config.token_ttl, Duration::hours(2));
        assert_eq!(config.sweep_interval, std::time::Duration::from_secs(60));
    }

    #[test]
    fn test_default_config() {
        let config = MagicLinkConfig::default();
        assert_eq!(config.base_url, "http://localhost:3000");
        assert_eq!(config.access_path, "/access");
        assert_eq!(config.token_ttl, Duration::hours(24));
        assert_eq!(config.sweep_interval, std::time::Duration::from_secs(3600));
    }

    #[test]
    fn test_magic_link_url() {
        let config = MagicLinkConfig::new("https://portal.example.com/");
        assert_eq!(
            config.magic_link_url("abc-_123"),
            "https://portal.example.com/access?token=abc-_123"
        );
        assert_eq!(
            config.magic_link_url("a b"),
            "https://portal.example.com/access?token=a%20b"
        );
    }

    #[test]
    fn test_smtp_config_builder() {
        let config = SmtpConfig::new("smtp.example.com", "user", "secret", "noreply@example.com")
            .with_port(2525)
            .with_from_name("Portal");

        assert_eq!(config.port, 2525);
        assert_eq!(config.from_name, "Portal");
        assert_eq!(config.from_email, "noreply@example.com");
    }
}

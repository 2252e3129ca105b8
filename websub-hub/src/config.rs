//! Configuration types for the websub-hub crate
//!
//! A [`HubConfig`] is built once, validated when the [`Hub`](crate::Hub) is
//! constructed and then shared read-only by every request task.

use std::time::Duration;

use crate::error::ConfigError;

/// Default lease granted when a subscriber does not ask for one: one day.
pub const DEFAULT_LEASE_SECONDS: u64 = 86_400;

/// Configuration for the hub dispatcher
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Public URL of this hub, reported in every message as `hub`
    pub hub_url: String,

    /// Lease used when `hub.lease_seconds` is absent or unusable
    /// Default: 86400 seconds (one day)
    pub default_lease_seconds: u64,

    /// Outbound client used for intent verification
    pub client: ClientConfig,
}

impl HubConfig {
    /// Create a HubConfig for the hub reachable at `hub_url`
    pub fn new(hub_url: impl Into<String>) -> Self {
        Self {
            hub_url: hub_url.into(),
            default_lease_seconds: DEFAULT_LEASE_SECONDS,
            client: ClientConfig::default(),
        }
    }

    pub fn with_default_lease_seconds(mut self, lease_seconds: u64) -> Self {
        self.default_lease_seconds = lease_seconds;
        self
    }

    pub fn with_client(mut self, client: ClientConfig) -> Self {
        self.client = client;
        self
    }

    /// Validate the configuration and return any issues
    pub fn validate(&self) -> Result<(), ConfigError> {
        url::Url::parse(&self.hub_url).map_err(|e| ConfigError::InvalidHubUrl {
            url: self.hub_url.clone(),
            reason: e.to_string(),
        })?;

        if self.default_lease_seconds == 0 {
            return Err(ConfigError::ZeroLeaseSeconds);
        }

        Ok(())
    }
}

/// Settings for the outbound HTTP client that calls subscriber callbacks
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Total timeout for a verification request
    /// Default: 30 seconds
    pub timeout: Duration,

    /// Timeout for establishing the connection
    /// Default: 10 seconds
    pub connect_timeout: Duration,

    /// `User-Agent` sent to subscribers
    pub user_agent: String,

    /// Follow redirects returned by subscriber callbacks
    /// Default: true
    pub follow_redirects: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            user_agent: format!("websub-hub/{}", env!("CARGO_PKG_VERSION")),
            follow_redirects: true,
        }
    }
}

impl ClientConfig {
    /// Create a ClientConfig with short timeouts, useful on local networks and in tests
    pub fn fast() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(2),
            ..Default::default()
        }
    }

    /// Build the `reqwest` client described by this configuration
    pub fn build_client(&self) -> Result<reqwest::Client, reqwest::Error> {
        let redirect = if self.follow_redirects {
            reqwest::redirect::Policy::limited(10)
        } else {
            reqwest::redirect::Policy::none()
        };

        reqwest::Client::builder()
            .timeout(self.timeout)
            .connect_timeout(self.connect_timeout)
            .user_agent(self.user_agent.clone())
            .redirect(redirect)
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = HubConfig::new("https://hub.example.com/hub");
        assert_eq!(config.default_lease_seconds, DEFAULT_LEASE_SECONDS);
        assert_eq!(config.client.timeout, Duration::from_secs(30));
        assert!(config.client.follow_redirects);
        assert!(config.client.user_agent.starts_with("websub-hub/"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_methods() {
        let config = HubConfig::new("http://localhost:9090/hub")
            .with_default_lease_seconds(3600)
            .with_client(ClientConfig::fast());
        assert_eq!(config.default_lease_seconds, 3600);
        assert_eq!(config.client.timeout, Duration::from_secs(5));
        assert_eq!(config.client.connect_timeout, Duration::from_secs(2));
    }

    #[test]
    fn test_config_validation() {
        let config = HubConfig::new("not a url");
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidHubUrl { .. })
        ));

        let config = HubConfig::new("http://localhost/hub").with_default_lease_seconds(0);
        assert_eq!(config.validate(), Err(ConfigError::ZeroLeaseSeconds));
    }

    #[test]
    fn test_build_client() {
        assert!(ClientConfig::default().build_client().is_ok());

        let config = ClientConfig {
            follow_redirects: false,
            ..ClientConfig::fast()
        };
        assert!(config.build_client().is_ok());
    }
}

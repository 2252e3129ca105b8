//! Server configuration.

use std::net::{IpAddr, Ipv4Addr};

use crate::error::ServerError;

/// Where and how the hub endpoint is served.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Ports to try, inclusive. The first free one is used; `(0, 0)` lets
    /// the OS pick.
    /// Default: (9090, 9190)
    pub port_range: (u16, u16),

    /// Address to bind to
    /// Default: 127.0.0.1
    pub bind_ip: IpAddr,

    /// Path of the hub endpoint, without the leading slash
    /// Default: "hub"
    pub path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port_range: (9090, 9190),
            bind_ip: IpAddr::V4(Ipv4Addr::LOCALHOST),
            path: "hub".to_string(),
        }
    }
}

impl ServerConfig {
    /// Configuration for tests: loopback, OS-assigned port.
    pub fn ephemeral() -> Self {
        Self {
            port_range: (0, 0),
            ..Self::default()
        }
    }

    pub fn with_port_range(mut self, start: u16, end: u16) -> Self {
        self.port_range = (start, end);
        self
    }

    pub fn with_bind_ip(mut self, bind_ip: IpAddr) -> Self {
        self.bind_ip = bind_ip;
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// The endpoint path with exactly one leading slash.
    pub fn route_path(&self) -> String {
        format!("/{}", self.path.trim_matches('/'))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ServerError> {
        if self.port_range.0 > self.port_range.1 {
            return Err(ServerError::Configuration(format!(
                "Invalid port range {}-{}: start must not exceed end",
                self.port_range.0, self.port_range.1
            )));
        }

        if self.path.trim_matches('/').is_empty() {
            return Err(ServerError::Configuration(
                "Endpoint path must not be empty".to_string(),
            ));
        }

        if self.path.contains(['?', '#']) {
            return Err(ServerError::Configuration(format!(
                "Endpoint path `{}` must not contain a query or fragment",
                self.path
            )));
        }

        Ok(())
    }
}

//! HTTP transport for a `websub_hub::Hub`.
//!
//! This crate is a thin warp layer: it binds a port, accepts `POST` requests
//! on the hub path and passes method-independent request parts (query string,
//! headers, body) to [`websub_hub::Hub::handle`]. Status, headers and body of
//! the hub's response are sent back unchanged.
//!
//! # Example
//!
//! ```no_run
//! use hub_server::{HubServer, ServerConfig};
//! use websub_hub::{Hub, HubAdaptor, HubConfig};
//!
//! # async fn run<A: HubAdaptor>(adaptor: A) -> Result<(), Box<dyn std::error::Error>> {
//! let config = ServerConfig::default().with_port_range(8080, 8080);
//! let hub = Hub::new(HubConfig::new("http://127.0.0.1:8080/hub"), adaptor)?;
//!
//! let server = HubServer::new(config, hub).await?;
//! println!("POST to {}", server.endpoint_url());
//!
//! tokio::signal::ctrl_c().await?;
//! server.shutdown().await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod server;

pub use config::ServerConfig;
pub use error::ServerError;
pub use server::HubServer;

//! WebSub hub dispatcher.
//!
//! This crate implements the hub side of the WebSub protocol without tying it
//! to an HTTP server. A transport hands each request to [`Hub::handle`] as a
//! [`HubRequest`] and sends back the returned [`HubResponse`].
//!
//! # Overview
//!
//! - [`params`]: picks the protocol parameters out of the body or the query
//!   string depending on the content type
//! - [`router`]: maps `hub.mode` to one of five workflows
//! - [`message`]: validated, typed messages for each workflow
//! - [`capability`]: which optional hooks the adaptor implements, computed once
//! - [`HubAdaptor`]: the business hooks a hub owner implements
//! - [`Hub`]: runs the workflows, including the detached intent verification
//!   that follows an accepted subscription or unsubscription
//!
//! # Example
//!
//! ```no_run
//! use async_trait::async_trait;
//! use http::HeaderMap;
//! use websub_hub::{
//!     Hook, HookError, HookSet, Hub, HubAdaptor, HubConfig, HubResponse, Subscription,
//!     TopicDeregistration, TopicRegistration, UpdateMessage,
//! };
//!
//! struct Blog;
//!
//! #[async_trait]
//! impl HubAdaptor for Blog {
//!     fn hooks(&self) -> HookSet {
//!         HookSet::none().with(Hook::SubscriptionIntentVerified)
//!     }
//!
//!     async fn on_register_topic(&self, _: &TopicRegistration, _: &HeaderMap) -> Result<HubResponse, HookError> {
//!         Ok(HubResponse::ok())
//!     }
//!
//!     async fn on_deregister_topic(&self, _: &TopicDeregistration, _: &HeaderMap) -> Result<HubResponse, HookError> {
//!         Ok(HubResponse::ok())
//!     }
//!
//!     async fn on_update_message(&self, _: &UpdateMessage, _: &HeaderMap) -> Result<HubResponse, HookError> {
//!         Ok(HubResponse::accepted())
//!     }
//!
//!     async fn on_subscription_intent_verified(&self, sub: &Subscription, _: &HeaderMap) -> Result<(), HookError> {
//!         println!("{} now follows {}", sub.callback(), sub.topic());
//!         Ok(())
//!     }
//! }
//!
//! # fn main() -> websub_hub::Result<()> {
//! let hub = Hub::new(HubConfig::new("https://hub.example.com/hub"), Blog)?;
//! # let _ = hub;
//! # Ok(())
//! # }
//! ```

pub mod adaptor;
pub mod capability;
pub mod config;
pub mod error;
mod hub;
pub mod logging;
pub mod message;
pub mod params;
pub mod response;
pub mod router;
pub mod verification;

pub use adaptor::{Concurrency, HubAdaptor, SubscriptionAck};
pub use capability::{Capabilities, Hook, HookSet};
pub use config::{ClientConfig, HubConfig, DEFAULT_LEASE_SECONDS};
pub use error::{
    ConfigError, ExtractionError, HookError, HubError, RedirectError, Result, ValidationError,
    VerificationError,
};
pub use hub::Hub;
pub use message::{
    Subscription, TopicDeregistration, TopicRegistration, Unsubscription, UpdateKind,
    UpdateMessage,
};
pub use params::{extract_params, HubRequest, ParameterMap};
pub use response::{HubResponse, Redirect, WorkflowOutcome};
pub use router::{Mode, INVALID_MODE_MESSAGE};

pub use http;

//! A small hub keeping topics and subscribers in memory.
//!
//! ```text
//! cargo run -p websub-hub-server --example in_memory_hub
//! curl -d hub.mode=register -d hub.topic=news http://127.0.0.1:9090/hub
//! ```
//!
//! Set `WEBSUB_LOG_MODE=debug` for verbose output.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use hub_server::{HubServer, ServerConfig};
use tokio::sync::RwLock;
use tracing::info;
use websub_hub::http::HeaderMap;
use websub_hub::logging::{init_logging, mode_from_str};
use websub_hub::{
    Hook, HookError, HookSet, Hub, HubAdaptor, HubConfig, HubResponse, Subscription,
    SubscriptionAck, TopicDeregistration, TopicRegistration, Unsubscription, UpdateMessage,
};

#[derive(Default)]
struct InMemoryHub {
    topics: RwLock<HashSet<String>>,
    subscribers: RwLock<HashMap<String, HashSet<String>>>,
}

impl InMemoryHub {
    async fn require_topic(&self, topic: &str) -> Result<(), HookError> {
        if self.topics.read().await.contains(topic) {
            Ok(())
        } else {
            Err(HookError::new(format!("Topic `{topic}` is not registered")))
        }
    }
}

#[async_trait]
impl HubAdaptor for InMemoryHub {
    fn hooks(&self) -> HookSet {
        HookSet::none()
            .with(Hook::Subscription)
            .with(Hook::SubscriptionIntentVerified)
            .with(Hook::UnsubscriptionIntentVerified)
    }

    async fn on_register_topic(
        &self,
        message: &TopicRegistration,
        _headers: &HeaderMap,
    ) -> Result<HubResponse, HookError> {
        self.topics.write().await.insert(message.topic().to_string());
        info!(topic = message.topic(), "Topic registered");
        Ok(HubResponse::ok())
    }

    async fn on_deregister_topic(
        &self,
        message: &TopicDeregistration,
        _headers: &HeaderMap,
    ) -> Result<HubResponse, HookError> {
        self.require_topic(message.topic()).await?;
        self.topics.write().await.remove(message.topic());
        self.subscribers.write().await.remove(message.topic());
        info!(topic = message.topic(), "Topic deregistered");
        Ok(HubResponse::ok())
    }

    async fn on_update_message(
        &self,
        message: &UpdateMessage,
        _headers: &HeaderMap,
    ) -> Result<HubResponse, HookError> {
        self.require_topic(message.topic()).await?;
        let subscribers = self
            .subscribers
            .read()
            .await
            .get(message.topic())
            .map_or(0, HashSet::len);
        info!(
            topic = message.topic(),
            kind = ?message.kind(),
            bytes = message.content().len(),
            subscribers,
            "Content update received"
        );
        Ok(HubResponse::accepted())
    }

    async fn on_subscription(
        &self,
        message: &Subscription,
        _headers: &HeaderMap,
    ) -> Result<SubscriptionAck, HookError> {
        self.require_topic(message.topic()).await?;
        Ok(HubResponse::accepted().into())
    }

    async fn on_subscription_intent_verified(
        &self,
        message: &Subscription,
        _headers: &HeaderMap,
    ) -> Result<(), HookError> {
        self.subscribers
            .write()
            .await
            .entry(message.topic().to_string())
            .or_default()
            .insert(message.callback().to_string());
        info!(
            topic = message.topic(),
            callback = message.callback(),
            lease_seconds = message.lease_seconds(),
            "Subscriber added"
        );
        Ok(())
    }

    async fn on_unsubscription_intent_verified(
        &self,
        message: &Unsubscription,
        _headers: &HeaderMap,
    ) -> Result<(), HookError> {
        if let Some(callbacks) = self.subscribers.write().await.get_mut(message.topic()) {
            callbacks.remove(message.callback());
        }
        info!(topic = message.topic(), callback = message.callback(), "Subscriber removed");
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mode = std::env::var("WEBSUB_LOG_MODE").unwrap_or_else(|_| "development".to_string());
    init_logging(mode_from_str(&mode))?;

    let config = ServerConfig::default().with_port_range(9090, 9090);
    let hub_url = format!("http://{}:{}{}", config.bind_ip, config.port_range.0, config.route_path());
    let hub = Hub::new(HubConfig::new(hub_url), InMemoryHub::default())?;

    let server = HubServer::new(config, hub).await?;
    info!(endpoint = server.endpoint_url(), "In-memory hub ready, press Ctrl+C to stop");

    tokio::signal::ctrl_c().await?;
    server.shutdown().await?;
    Ok(())
}

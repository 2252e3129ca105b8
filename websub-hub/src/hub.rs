//! The hub dispatcher and its per-mode workflows.

use std::sync::Arc;

use http::HeaderMap;
use tracing::{debug, info, warn};

use crate::adaptor::{HookInvoker, HubAdaptor, SubscriptionAck};
use crate::capability::Capabilities;
use crate::config::HubConfig;
use crate::error::{Result, VerificationError};
use crate::message::{
    Subscription, TopicDeregistration, TopicRegistration, Unsubscription, UpdateMessage,
};
use crate::params::{extract_params, HubRequest, ParameterMap};
use crate::response::{HubResponse, WorkflowOutcome};
use crate::router::{Mode, INVALID_MODE_MESSAGE};
use crate::verification::IntentVerifier;

/// A WebSub hub endpoint backed by an adaptor.
///
/// `Hub` is cheap to clone; clones share the same configuration, capabilities,
/// adaptor and outbound client. None of these change after construction.
///
/// # Example
///
/// ```no_run
/// use websub_hub::{Hub, HubConfig, HubRequest};
/// # use websub_hub::HubAdaptor;
/// # async fn run<A: HubAdaptor>(adaptor: A) -> websub_hub::Result<()> {
/// let hub = Hub::new(HubConfig::new("https://hub.example.com/hub"), adaptor)?;
///
/// let response = hub
///     .handle(HubRequest::form("hub.mode=register&hub.topic=https%3A%2F%2Fblog%2Ffeed"))
///     .await;
/// println!("{}", response.status());
/// # Ok(())
/// # }
/// ```
pub struct Hub<A> {
    inner: Arc<HubInner<A>>,
}

impl<A> Clone for Hub<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct HubInner<A> {
    config: HubConfig,
    capabilities: Capabilities,
    invoker: HookInvoker<A>,
    verifier: IntentVerifier,
}

impl<A: HubAdaptor> Hub<A> {
    /// Build a hub around `adaptor`.
    ///
    /// Validates `config`, builds the outbound client and reads the adaptor's
    /// hook declaration once.
    pub fn new(config: HubConfig, adaptor: A) -> Result<Self> {
        Self::with_shared_adaptor(config, Arc::new(adaptor))
    }

    /// Build a hub around an adaptor the caller keeps a handle to.
    pub fn with_shared_adaptor(config: HubConfig, adaptor: Arc<A>) -> Result<Self> {
        config.validate()?;
        let verifier = IntentVerifier::new(config.client.build_client()?);
        let capabilities = Capabilities::from_hooks(&adaptor.hooks());

        info!(
            hub_url = %config.hub_url,
            concurrency = ?adaptor.concurrency(),
            ?capabilities,
            "Hub initialized"
        );

        Ok(Self {
            inner: Arc::new(HubInner {
                config,
                capabilities,
                invoker: HookInvoker::new(adaptor),
                verifier,
            }),
        })
    }

    pub fn config(&self) -> &HubConfig {
        &self.inner.config
    }

    pub fn capabilities(&self) -> Capabilities {
        self.inner.capabilities
    }

    pub fn adaptor(&self) -> &Arc<A> {
        self.inner.invoker.adaptor()
    }

    /// Handle one hub request and produce the response to send.
    ///
    /// For an accepted (un)subscription the intent verification is started in
    /// a detached task before this returns; its result is never reflected in
    /// the returned response.
    ///
    /// The hub does not own the connection, so it cannot wait for the `202`
    /// to be written. On a multi-threaded runtime the challenge may reach the
    /// subscriber before the requester has read the `202`. Subscribers must
    /// answer a challenge for a request whose acknowledgement is still in
    /// flight.
    pub async fn handle(&self, request: HubRequest) -> HubResponse {
        self.dispatch(&request).await.into_response()
    }

    /// Classify `request` and run the selected workflow.
    pub async fn dispatch(&self, request: &HubRequest) -> WorkflowOutcome {
        let params = match extract_params(request) {
            Ok(params) => params,
            Err(err) => {
                debug!("Rejecting request: {}", err);
                return err.into();
            }
        };

        let Some(mode) = Mode::from_params(&params) else {
            debug!("Rejecting request without a valid hub.mode");
            return WorkflowOutcome::error(INVALID_MODE_MESSAGE);
        };

        debug!(%mode, "Dispatching hub request");
        match mode {
            Mode::Register => self.register_topic(&params, &request.headers).await,
            Mode::Deregister => self.deregister_topic(&params, &request.headers).await,
            Mode::Subscribe => self.subscribe(&params, &request.headers).await,
            Mode::Unsubscribe => self.unsubscribe(&params, &request.headers).await,
            Mode::Publish => self.publish(&params, request).await,
        }
    }

    async fn register_topic(&self, params: &ParameterMap, headers: &HeaderMap) -> WorkflowOutcome {
        let message = match TopicRegistration::from_params(&self.inner.config.hub_url, params) {
            Ok(message) => message,
            Err(err) => return err.into(),
        };

        match self
            .inner
            .invoker
            .call(|adaptor| adaptor.on_register_topic(&message, headers))
            .await
        {
            Ok(response) => response.into(),
            Err(err) => {
                warn!(topic = message.topic(), "Topic registration failed: {}", err);
                err.into()
            }
        }
    }

    async fn deregister_topic(&self, params: &ParameterMap, headers: &HeaderMap) -> WorkflowOutcome {
        let message = match TopicDeregistration::from_params(&self.inner.config.hub_url, params) {
            Ok(message) => message,
            Err(err) => return err.into(),
        };

        match self
            .inner
            .invoker
            .call(|adaptor| adaptor.on_deregister_topic(&message, headers))
            .await
        {
            Ok(response) => response.into(),
            Err(err) => {
                warn!(topic = message.topic(), "Topic deregistration failed: {}", err);
                err.into()
            }
        }
    }

    async fn subscribe(&self, params: &ParameterMap, headers: &HeaderMap) -> WorkflowOutcome {
        let config = &self.inner.config;
        let subscription =
            match Subscription::from_params(&config.hub_url, config.default_lease_seconds, params) {
                Ok(subscription) => subscription,
                Err(err) => return err.into(),
            };

        let response = if self.inner.capabilities.subscription {
            match self
                .inner
                .invoker
                .call(|adaptor| adaptor.on_subscription(&subscription, headers))
                .await
            {
                Ok(SubscriptionAck::Respond(response)) => response,
                Ok(SubscriptionAck::Redirect(redirect)) => {
                    debug!(topic = subscription.topic(), "Subscription redirected");
                    return WorkflowOutcome::Redirect(redirect);
                }
                Err(err) => {
                    debug!(topic = subscription.topic(), "Subscription rejected: {}", err);
                    return err.into();
                }
            }
        } else {
            HubResponse::accepted()
        };

        if response.is_accepted() {
            let inner = Arc::clone(&self.inner);
            let headers = headers.clone();
            tokio::spawn(async move {
                inner.verify_subscription(subscription, headers).await;
            });
        }

        response.into()
    }

    async fn unsubscribe(&self, params: &ParameterMap, headers: &HeaderMap) -> WorkflowOutcome {
        let unsubscription =
            match Unsubscription::from_params(&self.inner.config.hub_url, params) {
                Ok(unsubscription) => unsubscription,
                Err(err) => return err.into(),
            };

        let response = if self.inner.capabilities.unsubscription {
            match self
                .inner
                .invoker
                .call(|adaptor| adaptor.on_unsubscription(&unsubscription, headers))
                .await
            {
                Ok(response) => response,
                Err(err) => {
                    debug!(topic = unsubscription.topic(), "Unsubscription rejected: {}", err);
                    return err.into();
                }
            }
        } else {
            HubResponse::accepted()
        };

        if response.is_accepted() {
            let inner = Arc::clone(&self.inner);
            let headers = headers.clone();
            tokio::spawn(async move {
                inner.verify_unsubscription(unsubscription, headers).await;
            });
        }

        response.into()
    }

    async fn publish(&self, params: &ParameterMap, request: &HubRequest) -> WorkflowOutcome {
        let message = match UpdateMessage::from_request(&self.inner.config.hub_url, params, request) {
            Ok(message) => message,
            Err(err) => return err.into(),
        };

        match self
            .inner
            .invoker
            .call(|adaptor| adaptor.on_update_message(&message, &request.headers))
            .await
        {
            Ok(response) => response.into(),
            Err(err) => {
                warn!(topic = message.topic(), "Content update failed: {}", err);
                err.into()
            }
        }
    }
}

impl<A: HubAdaptor> HubInner<A> {
    async fn verify_subscription(&self, subscription: Subscription, headers: HeaderMap) {
        match self.try_verify_subscription(&subscription, &headers).await {
            Ok(()) => info!(
                topic = subscription.topic(),
                callback = subscription.callback(),
                lease_seconds = subscription.lease_seconds(),
                "Subscription intent verified"
            ),
            Err(err) => warn!(
                topic = subscription.topic(),
                callback = subscription.callback(),
                "Subscription intent verification abandoned: {}",
                err
            ),
        }
    }

    async fn try_verify_subscription(
        &self,
        subscription: &Subscription,
        headers: &HeaderMap,
    ) -> std::result::Result<(), VerificationError> {
        if self.capabilities.subscription_validation {
            let validated = self
                .invoker
                .call(|adaptor| adaptor.on_subscription_validation(subscription, headers))
                .await;
            if let Err(err) = validated {
                self.deny(subscription.callback(), subscription.topic(), err.message())
                    .await;
                return Err(err.into());
            }
        }

        self.verifier.verify_subscription(subscription).await?;

        if self.capabilities.subscription_intent_verified {
            let confirmed = self
                .invoker
                .call(|adaptor| adaptor.on_subscription_intent_verified(subscription, headers))
                .await;
            if let Err(err) = confirmed {
                warn!(topic = subscription.topic(), "Subscription intent-verified hook failed: {}", err);
            }
        }
        Ok(())
    }

    async fn verify_unsubscription(&self, unsubscription: Unsubscription, headers: HeaderMap) {
        match self.try_verify_unsubscription(&unsubscription, &headers).await {
            Ok(()) => info!(
                topic = unsubscription.topic(),
                callback = unsubscription.callback(),
                "Unsubscription intent verified"
            ),
            Err(err) => warn!(
                topic = unsubscription.topic(),
                callback = unsubscription.callback(),
                "Unsubscription intent verification abandoned: {}",
                err
            ),
        }
    }

    async fn try_verify_unsubscription(
        &self,
        unsubscription: &Unsubscription,
        headers: &HeaderMap,
    ) -> std::result::Result<(), VerificationError> {
        if self.capabilities.unsubscription_validation {
            let validated = self
                .invoker
                .call(|adaptor| adaptor.on_unsubscription_validation(unsubscription, headers))
                .await;
            if let Err(err) = validated {
                self.deny(unsubscription.callback(), unsubscription.topic(), err.message())
                    .await;
                return Err(err.into());
            }
        }

        self.verifier.verify_unsubscription(unsubscription).await?;

        if self.capabilities.unsubscription_intent_verified {
            let confirmed = self
                .invoker
                .call(|adaptor| adaptor.on_unsubscription_intent_verified(unsubscription, headers))
                .await;
            if let Err(err) = confirmed {
                warn!(topic = unsubscription.topic(), "Unsubscription intent-verified hook failed: {}", err);
            }
        }
        Ok(())
    }

    /// Best-effort denial notice; failures are only logged.
    async fn deny(&self, callback: &str, topic: &str, reason: &str) {
        if let Err(err) = self.verifier.notify_denied(callback, topic, reason).await {
            debug!(callback, "Denial notice not delivered: {}", err);
        }
    }
}

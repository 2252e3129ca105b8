//! The adaptor contract: business hooks the hub delegates to.
//!
//! Topic registration, deregistration and content updates are mandatory. The
//! (un)subscription hooks are optional; an adaptor implements the ones it
//! needs and lists them in [`HubAdaptor::hooks`]. Undeclared hooks are never
//! called, even if the method is overridden.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use http::HeaderMap;
use tokio::sync::Mutex;

use crate::capability::{Hook, HookSet};
use crate::error::HookError;
use crate::message::{
    Subscription, TopicDeregistration, TopicRegistration, Unsubscription, UpdateMessage,
};
use crate::response::{HubResponse, Redirect};

/// What the subscription hook decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionAck {
    /// Answer with this response; a `202` starts intent verification
    Respond(HubResponse),
    /// Send the subscriber to another hub; no verification follows
    Redirect(Redirect),
}

impl From<HubResponse> for SubscriptionAck {
    fn from(response: HubResponse) -> Self {
        Self::Respond(response)
    }
}

impl From<Redirect> for SubscriptionAck {
    fn from(redirect: Redirect) -> Self {
        Self::Redirect(redirect)
    }
}

/// Whether hooks may run concurrently with each other.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Concurrency {
    /// Hooks are safe to call from many request tasks at once
    #[default]
    Concurrent,
    /// Hooks are called one at a time across the whole hub
    Sequential,
}

fn not_declared(hook: Hook) -> HookError {
    HookError::new(format!("Hook `{hook}` is not implemented"))
}

/// Business logic behind a hub.
///
/// Every hook receives the typed message and the headers of the request that
/// triggered it. A [`HookError`] is reported to the client as a `400` whose
/// body is the error message, except for hooks that run during intent
/// verification, whose errors are only logged.
#[async_trait]
pub trait HubAdaptor: Send + Sync + 'static {
    /// Optional hooks this adaptor implements. Read once, when the hub is built.
    fn hooks(&self) -> HookSet {
        HookSet::none()
    }

    /// Scheduling requirement for hook calls. Read once, when the hub is built.
    fn concurrency(&self) -> Concurrency {
        Concurrency::Concurrent
    }

    async fn on_register_topic(
        &self,
        message: &TopicRegistration,
        headers: &HeaderMap,
    ) -> Result<HubResponse, HookError>;

    async fn on_deregister_topic(
        &self,
        message: &TopicDeregistration,
        headers: &HeaderMap,
    ) -> Result<HubResponse, HookError>;

    async fn on_update_message(
        &self,
        message: &UpdateMessage,
        headers: &HeaderMap,
    ) -> Result<HubResponse, HookError>;

    /// Decide on a subscription request. Declare with [`Hook::Subscription`].
    async fn on_subscription(
        &self,
        _message: &Subscription,
        _headers: &HeaderMap,
    ) -> Result<SubscriptionAck, HookError> {
        Err(not_declared(Hook::Subscription))
    }

    /// Validate an accepted subscription before the challenge is sent.
    async fn on_subscription_validation(
        &self,
        _message: &Subscription,
        _headers: &HeaderMap,
    ) -> Result<(), HookError> {
        Err(not_declared(Hook::SubscriptionValidation))
    }

    /// The subscriber echoed the challenge; the subscription is confirmed.
    async fn on_subscription_intent_verified(
        &self,
        _message: &Subscription,
        _headers: &HeaderMap,
    ) -> Result<(), HookError> {
        Err(not_declared(Hook::SubscriptionIntentVerified))
    }

    /// Decide on an unsubscription request. Declare with [`Hook::Unsubscription`].
    async fn on_unsubscription(
        &self,
        _message: &Unsubscription,
        _headers: &HeaderMap,
    ) -> Result<HubResponse, HookError> {
        Err(not_declared(Hook::Unsubscription))
    }

    async fn on_unsubscription_validation(
        &self,
        _message: &Unsubscription,
        _headers: &HeaderMap,
    ) -> Result<(), HookError> {
        Err(not_declared(Hook::UnsubscriptionValidation))
    }

    async fn on_unsubscription_intent_verified(
        &self,
        _message: &Unsubscription,
        _headers: &HeaderMap,
    ) -> Result<(), HookError> {
        Err(not_declared(Hook::UnsubscriptionIntentVerified))
    }
}

/// Calls adaptor hooks under the adaptor's declared [`Concurrency`].
pub(crate) struct HookInvoker<A> {
    adaptor: Arc<A>,
    gate: Option<Mutex<()>>,
}

impl<A: HubAdaptor> HookInvoker<A> {
    pub(crate) fn new(adaptor: Arc<A>) -> Self {
        let gate = match adaptor.concurrency() {
            Concurrency::Concurrent => None,
            Concurrency::Sequential => Some(Mutex::new(())),
        };
        Self { adaptor, gate }
    }

    pub(crate) fn adaptor(&self) -> &Arc<A> {
        &self.adaptor
    }

    /// Run one hook call, waiting for the gate first when hooks are sequential.
    pub(crate) async fn call<'a, F, Fut, T>(&'a self, hook: F) -> T
    where
        F: FnOnce(&'a A) -> Fut,
        Fut: Future<Output = T>,
    {
        let _turn = match &self.gate {
            Some(gate) => Some(gate.lock().await),
            None => None,
        };
        hook(self.adaptor.as_ref()).await
    }
}

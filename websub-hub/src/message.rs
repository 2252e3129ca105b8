//! Typed hub messages built from request parameters.
//!
//! Each builder validates the parameters it needs and produces an immutable
//! message; the adaptor only ever sees these types, never raw parameters.

use std::collections::BTreeMap;

use bytes::Bytes;

use crate::error::ValidationError;
use crate::params::{
    HubRequest, ParameterMap, FORM_URLENCODED, HUB_CALLBACK, HUB_LEASE_SECONDS, HUB_MODE,
    HUB_SECRET, HUB_TOPIC, PUBLISHER_PUBLISH,
};

/// Parameters consumed by the builders; everything else is passed through
/// as extra parameters.
const RESERVED_PARAMS: [&str; 5] = [HUB_MODE, HUB_TOPIC, HUB_CALLBACK, HUB_LEASE_SECONDS, HUB_SECRET];

fn required<'a>(params: &'a ParameterMap, name: &'static str) -> Result<&'a str, ValidationError> {
    params
        .get_non_empty(name)
        .ok_or(ValidationError::MissingParameter(name))
}

fn callback_url(params: &ParameterMap) -> Result<String, ValidationError> {
    let callback = required(params, HUB_CALLBACK)?;
    let url = url::Url::parse(callback).map_err(|e| ValidationError::InvalidParameter {
        name: HUB_CALLBACK,
        reason: e.to_string(),
    })?;

    match url.scheme() {
        "http" | "https" => Ok(callback.to_string()),
        scheme => Err(ValidationError::InvalidParameter {
            name: HUB_CALLBACK,
            reason: format!("unsupported scheme `{scheme}`"),
        }),
    }
}

fn extra_params(params: &ParameterMap) -> BTreeMap<String, String> {
    params
        .iter()
        .filter(|(name, _)| !RESERVED_PARAMS.contains(name))
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect()
}

/// Request to register a topic with the hub.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicRegistration {
    hub: String,
    topic: String,
}

impl TopicRegistration {
    pub fn from_params(hub_url: &str, params: &ParameterMap) -> Result<Self, ValidationError> {
        Ok(Self {
            hub: hub_url.to_string(),
            topic: required(params, HUB_TOPIC)?.to_string(),
        })
    }

    pub fn hub(&self) -> &str {
        &self.hub
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }
}

/// Request to remove a topic from the hub.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicDeregistration {
    hub: String,
    topic: String,
}

impl TopicDeregistration {
    pub fn from_params(hub_url: &str, params: &ParameterMap) -> Result<Self, ValidationError> {
        Ok(Self {
            hub: hub_url.to_string(),
            topic: required(params, HUB_TOPIC)?.to_string(),
        })
    }

    pub fn hub(&self) -> &str {
        &self.hub
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }
}

/// A subscriber's request to receive content for a topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    hub: String,
    topic: String,
    callback: String,
    lease_seconds: u64,
    secret: Option<String>,
    extra_params: BTreeMap<String, String>,
}

impl Subscription {
    /// Build a subscription from `hub.topic`, `hub.callback`, and the optional
    /// `hub.lease_seconds` and `hub.secret`.
    ///
    /// A lease that is missing, non-numeric or zero falls back to
    /// `default_lease_seconds`; it never fails the request.
    pub fn from_params(
        hub_url: &str,
        default_lease_seconds: u64,
        params: &ParameterMap,
    ) -> Result<Self, ValidationError> {
        let topic = required(params, HUB_TOPIC)?.to_string();
        let callback = callback_url(params)?;

        let lease_seconds = match params.get_non_empty(HUB_LEASE_SECONDS) {
            Some(value) => match value.trim().parse::<u64>() {
                Ok(lease) if lease > 0 => lease,
                _ => {
                    tracing::debug!(
                        "Unusable {} value {:?}, using default {}",
                        HUB_LEASE_SECONDS,
                        value,
                        default_lease_seconds
                    );
                    default_lease_seconds
                }
            },
            None => default_lease_seconds,
        };

        Ok(Self {
            hub: hub_url.to_string(),
            topic,
            callback,
            lease_seconds,
            secret: params.get_non_empty(HUB_SECRET).map(str::to_string),
            extra_params: extra_params(params),
        })
    }

    pub fn hub(&self) -> &str {
        &self.hub
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn callback(&self) -> &str {
        &self.callback
    }

    pub fn lease_seconds(&self) -> u64 {
        self.lease_seconds
    }

    /// Secret the subscriber wants content signed with.
    pub fn secret(&self) -> Option<&str> {
        self.secret.as_deref()
    }

    /// Parameters outside the reserved `hub.*` set.
    pub fn extra_params(&self) -> &BTreeMap<String, String> {
        &self.extra_params
    }
}

/// A subscriber's request to stop receiving content for a topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unsubscription {
    hub: String,
    topic: String,
    callback: String,
    extra_params: BTreeMap<String, String>,
}

impl Unsubscription {
    pub fn from_params(hub_url: &str, params: &ParameterMap) -> Result<Self, ValidationError> {
        Ok(Self {
            hub: hub_url.to_string(),
            topic: required(params, HUB_TOPIC)?.to_string(),
            callback: callback_url(params)?,
            extra_params: extra_params(params),
        })
    }

    pub fn hub(&self) -> &str {
        &self.hub
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn callback(&self) -> &str {
        &self.callback
    }

    pub fn extra_params(&self) -> &BTreeMap<String, String> {
        &self.extra_params
    }
}

/// How the publisher delivered the update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateKind {
    /// The body is the new content of the topic
    Publish,
    /// The body is a form-encoded event
    Event,
}

/// Content published to a topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateMessage {
    kind: UpdateKind,
    hub: String,
    topic: String,
    content_type: Option<String>,
    content: Bytes,
}

impl UpdateMessage {
    pub fn from_request(
        hub_url: &str,
        params: &ParameterMap,
        request: &HubRequest,
    ) -> Result<Self, ValidationError> {
        let topic = required(params, HUB_TOPIC)?.to_string();

        let is_form = request.media_type().as_deref() == Some(FORM_URLENCODED);
        let kind = if is_form && request.publisher().as_deref() != Some(PUBLISHER_PUBLISH) {
            UpdateKind::Event
        } else {
            UpdateKind::Publish
        };

        Ok(Self {
            kind,
            hub: hub_url.to_string(),
            topic,
            content_type: request.content_type(),
            content: request.body.clone(),
        })
    }

    pub fn kind(&self) -> UpdateKind {
        self.kind
    }

    pub fn hub(&self) -> &str {
        &self.hub
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn content(&self) -> &Bytes {
        &self.content
    }
}

//! Outbound intent verification.
//!
//! After a (un)subscription is accepted the hub calls the subscriber's
//! callback with a random challenge. The subscriber proves it asked for the
//! change by answering with a 2xx whose body is exactly that challenge.

use url::Url;
use uuid::Uuid;

use crate::error::VerificationError;
use crate::message::{Subscription, Unsubscription};
use crate::params::{HUB_CHALLENGE, HUB_LEASE_SECONDS, HUB_MODE, HUB_REASON, HUB_TOPIC};
use crate::router::Mode;

/// `hub.mode` sent to a callback whose request was refused.
pub const DENIED_MODE: &str = "denied";

/// Largest callback body read while checking a challenge echo.
pub const MAX_ECHO_BYTES: usize = 1024;

/// Fresh, unguessable challenge token.
pub fn generate_challenge() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Append protocol parameters to a callback URL, keeping its own query.
fn callback_url(callback: &str, params: &[(&str, String)]) -> Result<Url, VerificationError> {
    let mut url = Url::parse(callback).map_err(|e| VerificationError::InvalidCallback {
        callback: callback.to_string(),
        reason: e.to_string(),
    })?;
    url.query_pairs_mut().extend_pairs(params.iter().map(|(k, v)| (*k, v.as_str())));
    Ok(url)
}

/// Read at most [`MAX_ECHO_BYTES`] of a callback response body.
async fn read_echo(mut response: reqwest::Response) -> Result<String, VerificationError> {
    let too_large = VerificationError::ResponseTooLarge {
        limit: MAX_ECHO_BYTES,
    };
    if response
        .content_length()
        .is_some_and(|len| len > MAX_ECHO_BYTES as u64)
    {
        return Err(too_large);
    }

    let mut body = Vec::new();
    while let Some(chunk) = response.chunk().await? {
        if body.len() + chunk.len() > MAX_ECHO_BYTES {
            return Err(too_large);
        }
        body.extend_from_slice(&chunk);
    }
    Ok(String::from_utf8_lossy(&body).into_owned())
}

/// Sends challenges and denial notices to subscriber callbacks.
#[derive(Debug, Clone)]
pub struct IntentVerifier {
    client: reqwest::Client,
}

impl IntentVerifier {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Challenge the callback of a subscription, including its lease.
    pub async fn verify_subscription(
        &self,
        subscription: &Subscription,
    ) -> Result<(), VerificationError> {
        self.challenge(
            subscription.callback(),
            Mode::Subscribe,
            subscription.topic(),
            Some(subscription.lease_seconds()),
        )
        .await
    }

    /// Challenge the callback of an unsubscription.
    pub async fn verify_unsubscription(
        &self,
        unsubscription: &Unsubscription,
    ) -> Result<(), VerificationError> {
        self.challenge(
            unsubscription.callback(),
            Mode::Unsubscribe,
            unsubscription.topic(),
            None,
        )
        .await
    }

    /// Send one challenge and check the echo.
    pub async fn challenge(
        &self,
        callback: &str,
        mode: Mode,
        topic: &str,
        lease_seconds: Option<u64>,
    ) -> Result<(), VerificationError> {
        let challenge = generate_challenge();

        let mut params = vec![
            (HUB_MODE, mode.to_string()),
            (HUB_TOPIC, topic.to_string()),
            (HUB_CHALLENGE, challenge.clone()),
        ];
        if let Some(lease_seconds) = lease_seconds {
            params.push((HUB_LEASE_SECONDS, lease_seconds.to_string()));
        }
        let url = callback_url(callback, &params)?;

        tracing::debug!("Sending {} challenge to {}", mode, callback);
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(VerificationError::UnexpectedStatus(status.as_u16()));
        }

        let body = read_echo(response).await?;
        if body.trim() != challenge {
            return Err(VerificationError::ChallengeMismatch);
        }

        Ok(())
    }

    /// Tell a subscriber its request was refused.
    pub async fn notify_denied(
        &self,
        callback: &str,
        topic: &str,
        reason: &str,
    ) -> Result<(), VerificationError> {
        let params = [
            (HUB_MODE, DENIED_MODE.to_string()),
            (HUB_TOPIC, topic.to_string()),
            (HUB_REASON, reason.to_string()),
        ];
        let url = callback_url(callback, &params)?;

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(VerificationError::UnexpectedStatus(status.as_u16()));
        }
        Ok(())
    }
}

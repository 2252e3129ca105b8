//! Error types for the websub-hub crate.
//!
//! Every error that can occur before or during a hook invocation renders a
//! message that is safe to return verbatim in a `400 Bad Request` body.

use crate::params::SUPPORTED_CONTENT_TYPES;

/// Errors raised while turning a raw request into a parameter map.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractionError {
    /// The request content type is not one the hub accepts
    #[error(
        "Content type {} is not supported. Supported content types are: {}",
        describe_content_type(content_type),
        SUPPORTED_CONTENT_TYPES.join(", ")
    )]
    UnsupportedContentType {
        /// The content type as sent by the client (empty when absent)
        content_type: String,
    },

    /// A transport header carried a value the hub does not understand
    #[error("Invalid value `{value}` found for header `{header}`")]
    InvalidHeader {
        /// The header name
        header: &'static str,
        /// The offending value
        value: String,
    },
}

fn describe_content_type(content_type: &str) -> String {
    if content_type.trim().is_empty() {
        "(missing)".to_string()
    } else {
        format!("`{content_type}`")
    }
}

/// Errors raised by the message builders.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// A required parameter is absent or empty
    #[error("Empty value found for parameter '{0}'")]
    MissingParameter(&'static str),

    /// A parameter is present but unusable
    #[error("Invalid value found for parameter '{name}': {reason}")]
    InvalidParameter {
        /// The parameter name
        name: &'static str,
        /// Why the value was rejected
        reason: String,
    },
}

/// Error returned by an adaptor hook.
///
/// The message is forwarded to the client as the body of a `400` response, so
/// it should be written for the publisher or subscriber that made the request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct HookError {
    message: String,
}

impl HookError {
    /// Create a hook error with the given client-facing message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The client-facing message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// A redirect instruction that cannot be turned into a response.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RedirectError {
    #[error("HTTP {0} is not a redirect status")]
    NotRedirectStatus(u16),

    #[error("A redirect needs at least one target URL")]
    NoLocation,

    #[error("Invalid redirect target `{0}`")]
    InvalidLocation(String),
}

/// Errors from the detached intent-verification phase.
///
/// These never reach the client that made the original request; they are
/// only reported through `tracing`.
#[derive(Debug, thiserror::Error)]
pub enum VerificationError {
    /// The callback URL could not be used to build a challenge request
    #[error("Invalid callback URL `{callback}`: {reason}")]
    InvalidCallback {
        /// The callback as submitted
        callback: String,
        /// Parse failure description
        reason: String,
    },

    /// The subscriber could not be reached
    #[error("Network error: {0}")]
    Network(String),

    /// The subscriber answered with a non-success status
    #[error("Subscriber responded with HTTP {0}")]
    UnexpectedStatus(u16),

    /// The subscriber answered with a body far larger than any challenge
    #[error("Subscriber response exceeded {limit} bytes")]
    ResponseTooLarge {
        /// Maximum accepted body size
        limit: usize,
    },

    /// The subscriber answered but did not echo the challenge
    #[error("Subscriber did not echo the challenge")]
    ChallengeMismatch,

    /// The validation hook refused the request
    #[error("Validation rejected: {0}")]
    Rejected(#[from] HookError),
}

impl From<reqwest::Error> for VerificationError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }
}

/// Invalid hub configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// The public hub URL is not an absolute URL
    #[error("Invalid hub URL `{url}`: {reason}")]
    InvalidHubUrl {
        /// The configured URL
        url: String,
        /// Parse failure description
        reason: String,
    },

    /// The default lease must be a positive number of seconds
    #[error("Default lease seconds must be greater than 0")]
    ZeroLeaseSeconds,
}

/// Errors raised while constructing a [`Hub`](crate::Hub).
#[derive(Debug, thiserror::Error)]
pub enum HubError {
    /// The configuration did not validate
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The outbound HTTP client could not be built
    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}

/// Convenience type alias for Results using HubError.
pub type Result<T> = std::result::Result<T, HubError>;

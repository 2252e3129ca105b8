//! Parameter extraction for inbound hub requests.
//!
//! The hub accepts protocol parameters from two places: form fields in the
//! body (register, deregister, subscribe, unsubscribe and form-encoded
//! publishes) or the query string (publishes whose body is the content
//! itself). [`extract_params`] picks exactly one of those sources per request
//! based on the content type and the [`PUBLISHER_HEADER`].

use std::collections::HashMap;

use bytes::Bytes;
use http::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use url::form_urlencoded;

use crate::error::ExtractionError;

/// `hub.mode` parameter name
pub const HUB_MODE: &str = "hub.mode";
/// `hub.topic` parameter name
pub const HUB_TOPIC: &str = "hub.topic";
/// `hub.callback` parameter name
pub const HUB_CALLBACK: &str = "hub.callback";
/// `hub.lease_seconds` parameter name
pub const HUB_LEASE_SECONDS: &str = "hub.lease_seconds";
/// `hub.secret` parameter name
pub const HUB_SECRET: &str = "hub.secret";
/// `hub.challenge` parameter name (outbound only)
pub const HUB_CHALLENGE: &str = "hub.challenge";
/// `hub.reason` parameter name (outbound only)
pub const HUB_REASON: &str = "hub.reason";

/// Header telling a form-encoded publish apart from a form-encoded event.
pub const PUBLISHER_HEADER: &str = "x-websub-publisher";
/// [`PUBLISHER_HEADER`] value: the body is the content, parameters are in the query.
pub const PUBLISHER_PUBLISH: &str = "publish";
/// [`PUBLISHER_HEADER`] value: the body is a form-encoded event.
pub const PUBLISHER_EVENT: &str = "event";

pub const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";
pub const APPLICATION_JSON: &str = "application/json";
pub const APPLICATION_XML: &str = "application/xml";
pub const OCTET_STREAM: &str = "application/octet-stream";
pub const TEXT_PLAIN: &str = "text/plain";

/// Content types the hub endpoint accepts.
pub const SUPPORTED_CONTENT_TYPES: [&str; 5] = [
    FORM_URLENCODED,
    APPLICATION_JSON,
    APPLICATION_XML,
    OCTET_STREAM,
    TEXT_PLAIN,
];

/// Transport-neutral view of an inbound hub request.
///
/// The HTTP layer fills this in from whatever server framework it runs on;
/// the dispatcher never looks at anything else.
#[derive(Debug, Clone, Default)]
pub struct HubRequest {
    /// Request headers, including `content-type`
    pub headers: HeaderMap,
    /// Raw query string without the leading `?`
    pub query: Option<String>,
    /// Raw request body
    pub body: Bytes,
}

impl HubRequest {
    /// Create a request from its parts.
    pub fn new(headers: HeaderMap, query: Option<String>, body: Bytes) -> Self {
        Self {
            headers,
            query,
            body,
        }
    }

    /// A form-encoded request carrying `body` as its form fields.
    pub fn form(body: impl Into<String>) -> Self {
        let body: String = body.into();
        Self::default()
            .with_content_type(FORM_URLENCODED)
            .with_body(body)
    }

    /// Set the `content-type` header.
    pub fn with_content_type(self, content_type: &str) -> Self {
        self.with_header(CONTENT_TYPE, content_type)
    }

    /// Add a header. Values that are not valid header text are ignored.
    pub fn with_header(mut self, name: HeaderName, value: &str) -> Self {
        if let Ok(value) = HeaderValue::from_str(value) {
            self.headers.insert(name, value);
        }
        self
    }

    /// Set the raw query string.
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Set the body.
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// The `content-type` header as sent, if any.
    pub fn content_type(&self) -> Option<String> {
        header_text(&self.headers, CONTENT_TYPE.as_str())
    }

    /// The content type reduced to its lowercase media type, without parameters.
    pub fn media_type(&self) -> Option<String> {
        self.content_type().map(|value| media_type(&value))
    }

    /// The [`PUBLISHER_HEADER`] value, if present.
    pub fn publisher(&self) -> Option<String> {
        header_text(&self.headers, PUBLISHER_HEADER)
    }
}

fn header_text(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .map(|value| String::from_utf8_lossy(value.as_bytes()).trim().to_string())
}

/// Reduce `application/json; charset=utf-8` to `application/json`.
pub fn media_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Protocol parameters of a single request, one value per name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterMap {
    params: HashMap<String, String>,
}

impl ParameterMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a form-encoded body.
    ///
    /// Bodies that are not valid UTF-8 yield an empty map rather than an
    /// error. When a field repeats, the first value wins.
    pub fn from_form_body(body: &[u8]) -> Self {
        let Ok(text) = std::str::from_utf8(body) else {
            tracing::debug!("Form body is not valid UTF-8, treating it as empty");
            return Self::new();
        };

        let mut params = HashMap::new();
        for (name, value) in form_urlencoded::parse(text.as_bytes()) {
            params
                .entry(name.into_owned())
                .or_insert_with(|| value.into_owned());
        }
        Self { params }
    }

    /// Pick `names` out of a query string.
    ///
    /// Each name must occur exactly once; a name that is absent or repeated
    /// maps to the empty string.
    pub fn from_query(query: Option<&str>, names: &[&str]) -> Self {
        let mut found: HashMap<&str, Vec<String>> = HashMap::new();
        if let Some(query) = query {
            for (name, value) in form_urlencoded::parse(query.as_bytes()) {
                if let Some(wanted) = names.iter().find(|wanted| **wanted == name) {
                    found.entry(*wanted).or_default().push(value.into_owned());
                }
            }
        }

        let params = names
            .iter()
            .map(|name| {
                let value = match found.remove(name) {
                    Some(mut values) if values.len() == 1 => values.remove(0),
                    _ => String::new(),
                };
                (name.to_string(), value)
            })
            .collect();
        Self { params }
    }

    /// Value of `name`, if present (possibly empty).
    pub fn get(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// Value of `name` when present and not blank.
    pub fn get_non_empty(&self, name: &str) -> Option<&str> {
        self.get(name).filter(|value| !value.trim().is_empty())
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.params.insert(name.into(), value.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ParameterMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            params: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Extract the protocol parameters of `request`.
///
/// Rules, in order:
/// 1. form-encoded with `x-websub-publisher: publish`: `hub.mode` and
///    `hub.topic` from the query string
/// 2. form-encoded with `x-websub-publisher: event`: the body as form fields
/// 3. form-encoded with any other publisher value: [`ExtractionError::InvalidHeader`]
/// 4. form-encoded without the header: the body as form fields
/// 5. JSON, XML, octet-stream or plain text: `hub.mode` and `hub.topic` from
///    the query string
/// 6. anything else: [`ExtractionError::UnsupportedContentType`]
pub fn extract_params(request: &HubRequest) -> Result<ParameterMap, ExtractionError> {
    let media = request.media_type().unwrap_or_default();
    let query = request.query.as_deref();

    match media.as_str() {
        FORM_URLENCODED => match request.publisher().as_deref() {
            Some(PUBLISHER_PUBLISH) => Ok(ParameterMap::from_query(query, &[HUB_MODE, HUB_TOPIC])),
            Some(PUBLISHER_EVENT) | None => Ok(ParameterMap::from_form_body(&request.body)),
            Some(other) => Err(ExtractionError::InvalidHeader {
                header: PUBLISHER_HEADER,
                value: other.to_string(),
            }),
        },
        APPLICATION_JSON | APPLICATION_XML | OCTET_STREAM | TEXT_PLAIN => {
            Ok(ParameterMap::from_query(query, &[HUB_MODE, HUB_TOPIC]))
        }
        _ => Err(ExtractionError::UnsupportedContentType {
            content_type: request.content_type().unwrap_or_default(),
        }),
    }
}

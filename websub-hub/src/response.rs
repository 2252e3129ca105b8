//! Workflow outcomes and their HTTP rendering.

use bytes::Bytes;
use http::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE, LOCATION};
use http::StatusCode;

use crate::error::{ExtractionError, HookError, RedirectError, ValidationError};

const TEXT_PLAIN_UTF8: &str = "text/plain; charset=utf-8";

/// A ready-to-send HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl HubResponse {
    /// An empty response with the given status.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    /// `200 OK`
    pub fn ok() -> Self {
        Self::new(StatusCode::OK)
    }

    /// `202 Accepted`, the answer that starts intent verification
    pub fn accepted() -> Self {
        Self::new(StatusCode::ACCEPTED)
    }

    /// `400 Bad Request` with a plain-text message
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST).with_text(message)
    }

    /// Set a body and its content type.
    pub fn with_body(mut self, content_type: &str, body: impl Into<Bytes>) -> Self {
        if let Ok(value) = HeaderValue::from_str(content_type) {
            self.headers.insert(CONTENT_TYPE, value);
        }
        self.body = body.into();
        self
    }

    /// Set a plain-text body.
    pub fn with_text(self, text: impl Into<String>) -> Self {
        let text: String = text.into();
        self.with_body(TEXT_PLAIN_UTF8, text)
    }

    /// Add a header. Values that are not valid header text are ignored.
    pub fn with_header(mut self, name: HeaderName, value: &str) -> Self {
        if let Ok(value) = HeaderValue::from_str(value) {
            self.headers.append(name, value);
        }
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Body as UTF-8 text, lossily decoded.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn is_accepted(&self) -> bool {
        self.status == StatusCode::ACCEPTED
    }

    /// Split into status, headers and body for the transport layer.
    pub fn into_parts(self) -> (StatusCode, HeaderMap, Bytes) {
        (self.status, self.headers, self.body)
    }
}

/// Instruction to send the subscriber elsewhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    status: StatusCode,
    locations: Vec<String>,
}

impl Redirect {
    /// A redirect with a 3xx `status` and at least one target.
    ///
    /// The first target becomes the `Location` header.
    pub fn new(status: StatusCode, locations: Vec<String>) -> Result<Self, RedirectError> {
        if !status.is_redirection() {
            return Err(RedirectError::NotRedirectStatus(status.as_u16()));
        }
        if locations.is_empty() {
            return Err(RedirectError::NoLocation);
        }
        if let Some(bad) = locations
            .iter()
            .find(|location| HeaderValue::from_str(location).is_err())
        {
            return Err(RedirectError::InvalidLocation(bad.clone()));
        }

        Ok(Self { status, locations })
    }

    /// `307 Temporary Redirect` to `location`
    pub fn temporary(location: impl Into<String>) -> Result<Self, RedirectError> {
        Self::new(StatusCode::TEMPORARY_REDIRECT, vec![location.into()])
    }

    /// `308 Permanent Redirect` to `location`
    pub fn permanent(location: impl Into<String>) -> Result<Self, RedirectError> {
        Self::new(StatusCode::PERMANENT_REDIRECT, vec![location.into()])
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn locations(&self) -> &[String] {
        &self.locations
    }

    fn into_response(self) -> HubResponse {
        let mut response = HubResponse::new(self.status);
        if let Some(location) = self.locations.first() {
            response = response.with_header(LOCATION, location);
        }
        response
    }
}

/// Result of running one workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowOutcome {
    /// Send this response
    Respond(HubResponse),
    /// Redirect the caller
    Redirect(Redirect),
    /// Reject the request with `400` and this message
    Error(String),
}

impl WorkflowOutcome {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error(message.into())
    }

    /// Render the outcome as an HTTP response. Never fails.
    pub fn into_response(self) -> HubResponse {
        match self {
            WorkflowOutcome::Respond(response) => response,
            WorkflowOutcome::Redirect(redirect) => redirect.into_response(),
            WorkflowOutcome::Error(message) => HubResponse::bad_request(message),
        }
    }
}

impl From<HubResponse> for WorkflowOutcome {
    fn from(response: HubResponse) -> Self {
        Self::Respond(response)
    }
}

impl From<ExtractionError> for WorkflowOutcome {
    fn from(err: ExtractionError) -> Self {
        Self::Error(err.to_string())
    }
}

impl From<ValidationError> for WorkflowOutcome {
    fn from(err: ValidationError) -> Self {
        Self::Error(err.to_string())
    }
}

impl From<HookError> for WorkflowOutcome {
    fn from(err: HookError) -> Self {
        Self::Error(err.to_string())
    }
}

//! Single-attempt forwarding of a delivery to one destination.

use std::fmt;
use std::time::Duration;

use bytes::Bytes;
use http::header::{CONTENT_LENGTH, HOST};
use http::{HeaderMap, HeaderValue, StatusCode};
use url::Url;

use crate::config::defaults;

use super::{HttpClient, HttpError, HttpRequest};

/// Result of one forwarding attempt to one destination.
///
/// Any HTTP response counts as [`ForwardOutcome::Success`], whatever its
/// status: the destination was reached and answered. Everything else is a
/// [`ForwardOutcome::Failure`] carrying a human-readable reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForwardOutcome {
    /// The destination answered with this status.
    Success(StatusCode),
    /// No response was obtained. The reason is `"timeout"` or the
    /// underlying network error message.
    Failure(String),
}

impl ForwardOutcome {
    /// Failure reason reported when the attempt exceeds its timeout.
    pub const TIMEOUT: &'static str = "timeout";

    /// Returns true if the destination answered.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Returns the response status, if any.
    #[must_use]
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Success(status) => Some(*status),
            Self::Failure(_) => None,
        }
    }

    /// Returns the failure reason, if any.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Success(_) => None,
            Self::Failure(reason) => Some(reason),
        }
    }

    /// Returns true if the attempt failed by timing out.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        self.reason() == Some(Self::TIMEOUT)
    }
}

impl From<HttpError> for ForwardOutcome {
    fn from(error: HttpError) -> Self {
        Self::Failure(error.reason())
    }
}

impl fmt::Display for ForwardOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success(status) => write!(f, "success ({status})"),
            Self::Failure(reason) => write!(f, "failure ({reason})"),
        }
    }
}

/// Sends deliveries to destinations, one POST per call.
///
/// Each call is bounded by the forwarder's timeout and never retried.
/// Errors never escape [`Forwarder::forward`]; they are reduced to a
/// [`ForwardOutcome::Failure`].
///
/// # Type Parameters
///
/// - `H`: The HTTP client implementation
///
/// # Example
///
/// ```
/// use webhook_relay::forward::{Forwarder, ReqwestClient};
/// use std::time::Duration;
///
/// let forwarder = Forwarder::new(ReqwestClient::new());
/// assert_eq!(forwarder.timeout(), Duration::from_secs(10));
/// ```
#[derive(Debug)]
pub struct Forwarder<H> {
    client: H,
    timeout: Duration,
}

impl<H> Forwarder<H> {
    /// Creates a forwarder with the default 10 second timeout.
    #[must_use]
    pub const fn new(client: H) -> Self {
        Self {
            client,
            timeout: defaults::forward_timeout(),
        }
    }

    /// Sets the per-attempt timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the per-attempt timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns the underlying HTTP client.
    #[must_use]
    pub const fn client(&self) -> &H {
        &self.client
    }
}

impl<H: HttpClient> Forwarder<H> {
    /// Forwards a payload to `destination`.
    ///
    /// `headers` should already be sanitized; `host` and `content-length`
    /// are overridden for the destination. `label` tags the log record.
    pub async fn forward(
        &self,
        destination: &Url,
        headers: &HeaderMap,
        body: &Bytes,
        label: &str,
    ) -> ForwardOutcome {
        let outcome = match build_request(destination, headers, body) {
            Ok(request) => self.attempt(request).await,
            Err(e) => e.into(),
        };

        log_outcome(destination, label, &outcome);
        outcome
    }

    async fn attempt(&self, request: HttpRequest) -> ForwardOutcome {
        match tokio::time::timeout(self.timeout, self.client.request(request)).await {
            Ok(Ok(response)) => ForwardOutcome::Success(response.status),
            Ok(Err(e)) => e.into(),
            Err(_elapsed) => ForwardOutcome::Failure(ForwardOutcome::TIMEOUT.to_string()),
        }
    }
}

/// Builds the outbound POST for one destination.
///
/// # Errors
///
/// Returns [`HttpError::InvalidUrl`] if the destination is not an
/// absolute `http` or `https` URL with a host.
pub fn build_request(
    destination: &Url,
    headers: &HeaderMap,
    body: &Bytes,
) -> Result<HttpRequest, HttpError> {
    if !matches!(destination.scheme(), "http" | "https") {
        return Err(HttpError::InvalidUrl(format!(
            "unsupported scheme '{}' in {destination}",
            destination.scheme()
        )));
    }

    let host = destination
        .host_str()
        .ok_or_else(|| HttpError::InvalidUrl(format!("missing host in {destination}")))?;

    // url omits the port when it is the scheme's default
    let authority = destination
        .port()
        .map_or_else(|| host.to_string(), |port| format!("{host}:{port}"));

    let host_value = HeaderValue::from_str(&authority)
        .map_err(|e| HttpError::InvalidUrl(format!("invalid host '{authority}': {e}")))?;

    Ok(HttpRequest::post(destination.clone())
        .with_headers(headers.clone())
        .with_header(HOST, host_value)
        .with_header(CONTENT_LENGTH, HeaderValue::from(body.len()))
        .with_body(body.clone()))
}

fn log_outcome(destination: &Url, label: &str, outcome: &ForwardOutcome) {
    match outcome {
        ForwardOutcome::Success(status) if status.is_success() => {
            tracing::info!(%destination, label, status = status.as_u16(), "Forwarded");
        }
        ForwardOutcome::Success(status) => {
            tracing::warn!(
                %destination,
                label,
                status = status.as_u16(),
                "Forwarded, destination answered with non-success status"
            );
        }
        ForwardOutcome::Failure(reason) if reason == ForwardOutcome::TIMEOUT => {
            tracing::warn!(%destination, label, "Forward timed out");
        }
        ForwardOutcome::Failure(reason) => {
            tracing::warn!(%destination, label, error = %reason, "Forward failed");
        }
    }
}

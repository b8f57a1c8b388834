//! Error types for HTTP operations.

use thiserror::Error;

/// Error type for a single outbound HTTP exchange.
///
/// Describes what went wrong at the transport level. The forwarder never
/// lets these escape; each one is reduced to a failure reason string.
#[derive(Debug, Error)]
pub enum HttpError {
    /// Network connection failed.
    ///
    /// This includes DNS resolution failures, connection refused,
    /// connection resets, and errors while reading the response body.
    #[error("Connection error: {0}")]
    Connection(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Request timed out.
    #[error("Request timed out")]
    Timeout,

    /// The destination URL cannot be requested.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl HttpError {
    /// Returns the failure reason reported for this error.
    ///
    /// Timeouts are reported as exactly `"timeout"`. Connection errors
    /// report the underlying message including its causes, without the
    /// `Connection error:` prefix.
    #[must_use]
    pub fn reason(&self) -> String {
        match self {
            Self::Timeout => super::ForwardOutcome::TIMEOUT.to_string(),
            Self::Connection(source) => error_chain(source.as_ref()),
            Self::InvalidUrl(_) => self.to_string(),
        }
    }
}

/// Joins an error and its sources into one line.
fn error_chain(error: &(dyn std::error::Error + 'static)) -> String {
    let mut message = error.to_string();
    let mut current = error.source();
    while let Some(cause) = current {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        current = cause.source();
    }
    message
}

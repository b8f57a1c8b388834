//! Captured webhook deliveries and header sanitization.
//!
//! A [`Delivery`] is one webhook received from the upstream source: its
//! identifier, topic, forwardable headers, and the raw body bytes.

use std::time::SystemTime;

use bytes::Bytes;
use http::HeaderMap;
use http::header::HeaderName;

#[cfg(test)]
#[path = "delivery_tests.rs"]
mod tests;

/// Header carrying the event classification.
pub const HEADER_TOPIC: &str = "vgg-topic";

/// Header carrying the upstream delivery identifier.
pub const HEADER_DELIVERY_ID: &str = "vgg-deliveryid";

/// Fallback used when the topic or delivery id header is missing.
pub const UNKNOWN: &str = "unknown";

/// Transport-only headers that are never forwarded.
///
/// These describe the inbound connection rather than the webhook, and are
/// recomputed per destination when forwarding.
pub const EXCLUDED_HEADERS: [&str; 3] = ["host", "content-length", "connection"];

/// One received webhook delivery.
///
/// The header map never contains any of [`EXCLUDED_HEADERS`]. The body is
/// reference-counted and immutable, so handing it to several destinations
/// never copies or alters it.
#[derive(Debug, Clone)]
pub struct Delivery {
    /// Upstream delivery identifier, `"unknown"` when absent.
    pub id: String,
    /// Event classification, `"unknown"` when absent.
    pub topic: String,
    /// Sanitized headers to forward.
    pub headers: HeaderMap,
    /// Raw payload, forwarded unmodified.
    pub body: Bytes,
    /// Time of arrival, used for retention expiry.
    pub received_at: SystemTime,
}

impl Delivery {
    /// Captures a delivery from inbound request headers and body.
    ///
    /// The id and topic are read from the `vgg-deliveryid` and `vgg-topic`
    /// headers; the header map is sanitized before being stored.
    #[must_use]
    pub fn capture(headers: &HeaderMap, body: Bytes, received_at: SystemTime) -> Self {
        Self {
            id: delivery_id(headers),
            topic: topic(headers),
            headers: sanitize_headers(headers),
            body,
            received_at,
        }
    }

    /// Returns the body length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.body.len()
    }

    /// Returns true if the body is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}

/// Reads the delivery identifier, falling back to `"unknown"`.
#[must_use]
pub fn delivery_id(headers: &HeaderMap) -> String {
    header_or_unknown(headers, HEADER_DELIVERY_ID)
}

/// Reads the delivery topic, falling back to `"unknown"`.
#[must_use]
pub fn topic(headers: &HeaderMap) -> String {
    header_or_unknown(headers, HEADER_TOPIC)
}

fn header_or_unknown(headers: &HeaderMap, name: &str) -> String {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map_or_else(|| UNKNOWN.to_string(), ToString::to_string)
}

/// Returns true if the header is transport-only and must not be forwarded.
#[must_use]
pub fn is_excluded(name: &HeaderName) -> bool {
    EXCLUDED_HEADERS.contains(&name.as_str())
}

/// Copies every header except the transport-only ones.
///
/// Header names in an [`http::HeaderMap`] are already lowercase, so the
/// comparison is case-insensitive with respect to what the sender wrote.
/// Repeated headers keep all of their values, in order.
#[must_use]
pub fn sanitize_headers(headers: &HeaderMap) -> HeaderMap {
    let mut sanitized = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        if !is_excluded(name) {
            sanitized.append(name.clone(), value.clone());
        }
    }
    sanitized
}

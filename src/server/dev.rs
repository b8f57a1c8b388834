//! Developer endpoints.
//!
//! Fan-out mode exposes `/dev/register` and `/dev/list` for managing
//! secondary destinations. Retention mode exposes `/dev/poll` and
//! `/dev/status` for pulling retained deliveries.

use std::collections::BTreeMap;

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use serde::{Deserialize, Serialize};

use super::AppState;
use super::error::ApiError;
use crate::delivery::Delivery;
use crate::relay::{RetentionQueue, SecondaryRegistry, parse_destination};
use crate::time::to_rfc3339;

/// What a registration request does.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegisterAction {
    Add,
    Remove,
    /// Any other or missing action; leaves the registry unchanged
    #[default]
    #[serde(other)]
    Other,
}

/// Body of `POST /dev/register`.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub url: String,
    #[serde(default)]
    pub action: RegisterAction,
}

/// Current secondary destinations, in registration order.
#[derive(Debug, Serialize)]
pub struct EndpointList {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    pub endpoints: Vec<String>,
}

impl EndpointList {
    fn of(registry: &SecondaryRegistry) -> Self {
        Self {
            success: None,
            endpoints: registry.endpoints().iter().map(ToString::to_string).collect(),
        }
    }
}

/// Adds or removes a secondary destination.
///
/// # Errors
///
/// - [`ApiError::MalformedRequest`] if the body is not JSON with a `url`
/// - [`ApiError::InvalidDestination`] if an added URL is not an absolute
///   http or https URL
pub async fn register<H>(
    State(state): State<AppState<H>>,
    body: Bytes,
) -> Result<Json<EndpointList>, ApiError> {
    let registry = state.registry()?;
    let request: RegisterRequest =
        serde_json::from_slice(&body).map_err(|e| ApiError::MalformedRequest(e.to_string()))?;

    match request.action {
        RegisterAction::Add => {
            registry.add(parse_destination(&request.url)?);
        }
        RegisterAction::Remove => {
            registry.remove(&request.url);
        }
        RegisterAction::Other => {
            tracing::debug!(url = %request.url, "Ignoring registration without a known action");
        }
    }

    let mut list = EndpointList::of(registry);
    list.success = Some(true);
    Ok(Json(list))
}

/// Lists the secondary destinations.
///
/// # Errors
///
/// Returns [`ApiError::NotFound`] outside fan-out mode.
pub async fn list<H>(State(state): State<AppState<H>>) -> Result<Json<EndpointList>, ApiError> {
    Ok(Json(EndpointList::of(state.registry()?)))
}

/// One retained delivery as returned by a poll.
#[derive(Debug, Serialize)]
pub struct PolledWebhook {
    pub id: String,
    pub topic: String,
    /// Header name to value; repeated names are joined with `", "`
    pub headers: BTreeMap<String, String>,
    /// Body as text, with invalid UTF-8 replaced
    pub body: String,
    /// Arrival time, RFC 3339
    pub timestamp: String,
}

impl From<Delivery> for PolledWebhook {
    fn from(delivery: Delivery) -> Self {
        let mut headers: BTreeMap<String, String> = BTreeMap::new();
        for (name, value) in &delivery.headers {
            let value = String::from_utf8_lossy(value.as_bytes());
            headers
                .entry(name.as_str().to_string())
                .and_modify(|joined| {
                    joined.push_str(", ");
                    joined.push_str(&value);
                })
                .or_insert_with(|| value.into_owned());
        }

        Self {
            id: delivery.id,
            topic: delivery.topic,
            headers,
            body: String::from_utf8_lossy(&delivery.body).into_owned(),
            timestamp: to_rfc3339(delivery.received_at),
        }
    }
}

/// Body of `GET /dev/poll`.
#[derive(Debug, Serialize)]
pub struct PollResponse {
    pub webhooks: Vec<PolledWebhook>,
}

/// Drains the retention queue, oldest first.
///
/// Requires `Authorization: Bearer <secret>`. A rejected request leaves
/// the queue untouched.
///
/// # Errors
///
/// Returns [`ApiError::Unauthorized`] on missing or wrong credentials.
pub async fn poll<H>(
    State(state): State<AppState<H>>,
    headers: HeaderMap,
) -> Result<Json<PollResponse>, ApiError> {
    let queue = state.queue()?;
    if !is_authorized(&headers, state.poll_secret()) {
        return Err(ApiError::Unauthorized);
    }

    let webhooks: Vec<PolledWebhook> = queue.drain_all().into_iter().map(Into::into).collect();
    tracing::info!(count = webhooks.len(), "Retention queue drained by poll");

    Ok(Json(PollResponse { webhooks }))
}

/// Body of `GET /dev/status`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueStatus {
    pub queue_size: usize,
    pub max_size: usize,
    pub ttl_minutes: u64,
}

impl QueueStatus {
    fn of(queue: &RetentionQueue) -> Self {
        Self {
            queue_size: queue.size(),
            max_size: queue.capacity(),
            ttl_minutes: queue.ttl().as_secs() / 60,
        }
    }
}

/// Reports the retention queue size and limits.
///
/// # Errors
///
/// Returns [`ApiError::NotFound`] outside retention mode.
pub async fn status<H>(State(state): State<AppState<H>>) -> Result<Json<QueueStatus>, ApiError> {
    Ok(Json(QueueStatus::of(state.queue()?)))
}

fn is_authorized(headers: &HeaderMap, secret: Option<&str>) -> bool {
    let Some(secret) = secret else {
        return false;
    };

    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.as_bytes().strip_prefix(b"Bearer "))
        .is_some_and(|token| constant_time_eq(token, secret.as_bytes()))
}

/// Compares two byte strings without short-circuiting on the first
/// mismatch. Only the length comparison returns early.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

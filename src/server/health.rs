//! Health check endpoint.

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use super::AppState;
use crate::relay::{DistributionStrategy, RelayMode};
use crate::time::to_rfc3339;

/// Service name reported by the health check.
pub const SERVICE_NAME: &str = "webhook-relay";

/// Health check body.
///
/// Carries `devEndpoints` in fan-out mode and `queueSize` in retention mode.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Health {
    pub status: &'static str,
    pub service: &'static str,
    pub production: String,
    pub mode: RelayMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dev_endpoints: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue_size: Option<usize>,
    pub timestamp: String,
}

/// Health check handler, served on `GET /` and `GET /health`.
pub async fn health<H>(State(state): State<AppState<H>>) -> Json<Health> {
    let relay = state.relay();
    let (dev_endpoints, queue_size) = match relay.strategy() {
        DistributionStrategy::FanOut { registry } => (Some(registry.len()), None),
        DistributionStrategy::RetentionPoll { queue } => (None, Some(queue.size())),
    };

    Json(Health {
        status: "ok",
        service: SERVICE_NAME,
        production: relay.primary().to_string(),
        mode: relay.strategy().mode(),
        dev_endpoints,
        queue_size,
        timestamp: to_rfc3339(relay.clock().now()),
    })
}

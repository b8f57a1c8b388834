//! The relay orchestrator.

use std::sync::Arc;

use bytes::Bytes;
use http::HeaderMap;
use tokio::task::JoinHandle;
use url::Url;

use crate::delivery::Delivery;
use crate::forward::{ForwardOutcome, Forwarder, HttpClient};
use crate::time::{Clock, SystemClock};

use super::DistributionStrategy;

/// Log label for attempts against the primary destination.
pub const LABEL_PRIMARY: &str = "primary";

/// Log label for attempts against secondary destinations.
pub const LABEL_SECONDARY: &str = "secondary";

/// Summary of what happened to one delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayReport {
    /// Delivery identifier
    pub delivery_id: String,
    /// Outcome of the primary attempt
    pub primary: ForwardOutcome,
    /// Outcome per secondary destination, in attempt order
    pub secondaries: Vec<(Url, ForwardOutcome)>,
    /// Whether the delivery was appended to the retention queue
    pub enqueued: bool,
}

impl RelayReport {
    /// Number of secondary attempts that failed.
    #[must_use]
    pub fn failed_secondaries(&self) -> usize {
        self.secondaries
            .iter()
            .filter(|(_, outcome)| !outcome.is_success())
            .count()
    }
}

/// Drives each delivery through primary forwarding and the configured
/// distribution strategy.
///
/// # Type Parameters
///
/// - `H`: The HTTP client implementation used by the forwarder
pub struct Relay<H> {
    forwarder: Forwarder<H>,
    primary: Url,
    strategy: DistributionStrategy,
    clock: Arc<dyn Clock>,
}

impl<H> Relay<H> {
    /// Creates a relay using the system clock.
    #[must_use]
    pub fn new(forwarder: Forwarder<H>, primary: Url, strategy: DistributionStrategy) -> Self {
        Self {
            forwarder,
            primary,
            strategy,
            clock: Arc::new(SystemClock),
        }
    }

    /// Sets the clock used to stamp arrivals.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Returns the primary destination.
    #[must_use]
    pub const fn primary(&self) -> &Url {
        &self.primary
    }

    /// Returns the distribution strategy.
    #[must_use]
    pub const fn strategy(&self) -> &DistributionStrategy {
        &self.strategy
    }

    /// Returns the clock used to stamp arrivals.
    #[must_use]
    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Returns the forwarder.
    #[must_use]
    pub const fn forwarder(&self) -> &Forwarder<H> {
        &self.forwarder
    }
}

impl<H: HttpClient + 'static> Relay<H> {
    /// Hands a received request to an independent background task that
    /// starts forwarding right away.
    ///
    /// See [`Relay::accept_after`].
    pub fn accept(
        self: &Arc<Self>,
        headers: HeaderMap,
        body: Bytes,
    ) -> JoinHandle<Option<RelayReport>> {
        self.accept_after(headers, body, std::future::ready(()))
    }

    /// Hands a received request to an independent background task that
    /// waits for `gate` before the first forwarding attempt.
    ///
    /// The arrival time is stamped now, not when the gate opens. The task
    /// is not tied to the calling request, so dropping the request (or the
    /// returned handle) does not cancel forwarding. The handle resolves to
    /// `None` if the task panicked.
    pub fn accept_after<G>(
        self: &Arc<Self>,
        headers: HeaderMap,
        body: Bytes,
        gate: G,
    ) -> JoinHandle<Option<RelayReport>>
    where
        G: Future<Output = ()> + Send + 'static,
    {
        let received_at = self.clock.now();
        let relay = Arc::clone(self);

        let work = tokio::spawn(async move {
            gate.await;
            let delivery = Delivery::capture(&headers, body, received_at);
            relay.deliver(delivery).await
        });

        tokio::spawn(async move {
            match work.await {
                Ok(report) => Some(report),
                Err(e) => {
                    tracing::error!(error = %e, "Relay task failed");
                    None
                }
            }
        })
    }
}

impl<H: HttpClient> Relay<H> {
    /// Forwards a captured delivery to the primary destination, then
    /// applies the distribution strategy.
    ///
    /// Every step runs regardless of earlier outcomes.
    pub async fn deliver(&self, delivery: Delivery) -> RelayReport {
        let primary = self
            .forwarder
            .forward(&self.primary, &delivery.headers, &delivery.body, LABEL_PRIMARY)
            .await;

        let mut report = RelayReport {
            delivery_id: delivery.id.clone(),
            primary,
            secondaries: Vec::new(),
            enqueued: false,
        };

        match &self.strategy {
            DistributionStrategy::FanOut { registry } => {
                let endpoints = registry.endpoints();
                if !endpoints.is_empty() {
                    tracing::debug!(
                        delivery_id = %delivery.id,
                        count = endpoints.len(),
                        "Forwarding to secondary endpoints"
                    );
                }
                for url in endpoints {
                    let outcome = self
                        .forwarder
                        .forward(&url, &delivery.headers, &delivery.body, LABEL_SECONDARY)
                        .await;
                    report.secondaries.push((url, outcome));
                }
            }
            DistributionStrategy::RetentionPoll { queue } => {
                queue.append(delivery);
                report.enqueued = true;
            }
        }

        tracing::info!(
            delivery_id = %report.delivery_id,
            primary = %report.primary,
            secondaries = report.secondaries.len(),
            failed_secondaries = report.failed_secondaries(),
            enqueued = report.enqueued,
            "Delivery done"
        );

        report
    }
}

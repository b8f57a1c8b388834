//! Tests for the `Relay` orchestrator.

use super::{DistributionStrategy, Relay, RetentionQueue, SecondaryRegistry};
use crate::forward::mock::{Behavior, MockClient};
use crate::forward::{ForwardOutcome, Forwarder};
use crate::time::mock::MockClock;
use crate::time::Clock;
use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

const PRIMARY: &str = "https://primary.example.com/api/webhooks/stubhub";
const DEV_A: &str = "http://dev-a.example.com:4000/hooks";
const DEV_B: &str = "http://dev-b.example.com:4000/hooks";

/// Seconds since the epoch at which every test clock starts.
const START_SECS: u64 = 1_000_000;

fn url(s: &str) -> Url {
    Url::parse(s).unwrap()
}

fn inbound_headers(id: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("vgg-topic", "order.created".parse().unwrap());
    headers.insert("vgg-deliveryid", id.parse().unwrap());
    headers.insert("content-type", "application/json".parse().unwrap());
    headers.insert("host", "relay.example.com".parse().unwrap());
    headers.insert("connection", "keep-alive".parse().unwrap());
    headers
}

fn body() -> Bytes {
    Bytes::from_static(b"{\"x\":1}")
}

fn fan_out_relay(
    client: Arc<MockClient>,
    secondaries: &[&str],
) -> (Relay<Arc<MockClient>>, Arc<SecondaryRegistry>) {
    let registry = Arc::new(SecondaryRegistry::with_endpoints(
        secondaries.iter().map(|s| url(s)),
    ));
    let relay = Relay::new(
        Forwarder::new(client),
        url(PRIMARY),
        DistributionStrategy::fan_out(Arc::clone(&registry)),
    );
    (relay, registry)
}

fn retention_relay(
    client: Arc<MockClient>,
    clock: Arc<MockClock>,
) -> (Relay<Arc<MockClient>>, Arc<RetentionQueue>) {
    let queue = Arc::new(RetentionQueue::with_clock(clock.clone()));
    let relay = Relay::new(
        Forwarder::new(client),
        url(PRIMARY),
        DistributionStrategy::retention(Arc::clone(&queue)),
    )
    .with_clock(clock);
    (relay, queue)
}

fn capture(id: &str) -> crate::delivery::Delivery {
    crate::delivery::Delivery::capture(
        &inbound_headers(id),
        body(),
        std::time::SystemTime::UNIX_EPOCH + Duration::from_secs(START_SECS),
    )
}

mod fan_out {
    use super::*;

    #[tokio::test]
    async fn primary_first_then_secondaries_in_registration_order() {
        let client = Arc::new(MockClient::new());
        let (relay, _registry) = fan_out_relay(Arc::clone(&client), &[DEV_B, DEV_A]);

        let report = relay.deliver(capture("abc-123")).await;

        assert_eq!(
            client.requested_urls(),
            vec![PRIMARY.to_string(), DEV_B.to_string(), DEV_A.to_string()]
        );
        assert_eq!(report.delivery_id, "abc-123");
        assert_eq!(report.primary, ForwardOutcome::Success(StatusCode::OK));
        assert_eq!(report.secondaries.len(), 2);
        assert!(!report.enqueued);
    }

    #[tokio::test]
    async fn every_destination_gets_identical_body_and_sanitized_headers() {
        let client = Arc::new(MockClient::new());
        let (relay, _registry) = fan_out_relay(Arc::clone(&client), &[DEV_A]);

        relay.deliver(capture("abc-123")).await;

        let requests = client.captured_requests();
        assert_eq!(requests.len(), 2);
        for request in &requests {
            assert_eq!(request.body, Some(body()));
            assert_eq!(request.headers.get("vgg-deliveryid").unwrap(), "abc-123");
            assert_eq!(request.headers.get("content-length").unwrap(), "7");
            assert!(request.headers.get("connection").is_none());
        }
        assert_eq!(
            requests[0].headers.get("host").unwrap(),
            "primary.example.com"
        );
        assert_eq!(
            requests[1].headers.get("host").unwrap(),
            "dev-a.example.com:4000"
        );
    }

    #[tokio::test]
    async fn primary_failure_does_not_stop_secondaries() {
        let client = Arc::new(
            MockClient::new().script(PRIMARY, Behavior::Refuse("connection refused".into())),
        );
        let (relay, _registry) = fan_out_relay(Arc::clone(&client), &[DEV_A]);

        let report = relay.deliver(capture("abc-123")).await;

        assert!(!report.primary.is_success());
        assert_eq!(client.calls(), 2);
        assert_eq!(report.secondaries[0].1, ForwardOutcome::Success(StatusCode::OK));
    }

    #[tokio::test]
    async fn secondary_failure_is_independent() {
        let client = Arc::new(
            MockClient::new()
                .script(DEV_A, Behavior::Refuse("connection refused".into()))
                .script(DEV_B, Behavior::Respond(StatusCode::BAD_GATEWAY)),
        );
        let (relay, _registry) = fan_out_relay(Arc::clone(&client), &[DEV_A, DEV_B]);

        let report = relay.deliver(capture("abc-123")).await;

        assert_eq!(client.calls(), 3);
        assert_eq!(report.failed_secondaries(), 1);
        assert_eq!(
            report.secondaries[1].1,
            ForwardOutcome::Success(StatusCode::BAD_GATEWAY)
        );
    }

    #[tokio::test]
    async fn no_secondaries_means_primary_only() {
        let client = Arc::new(MockClient::new());
        let (relay, _registry) = fan_out_relay(Arc::clone(&client), &[]);

        let report = relay.deliver(capture("abc-123")).await;

        assert_eq!(client.requested_urls(), vec![PRIMARY.to_string()]);
        assert!(report.secondaries.is_empty());
    }

    #[tokio::test]
    async fn uses_registry_contents_at_delivery_time() {
        let client = Arc::new(MockClient::new());
        let (relay, registry) = fan_out_relay(Arc::clone(&client), &[DEV_A]);

        registry.add(url(DEV_B));
        registry.remove(DEV_A);
        relay.deliver(capture("abc-123")).await;

        assert_eq!(
            client.requested_urls(),
            vec![PRIMARY.to_string(), DEV_B.to_string()]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_secondary_times_out_and_the_next_still_runs() {
        let client = Arc::new(MockClient::new().script(DEV_A, Behavior::Hang));
        let (relay, _registry) = fan_out_relay(Arc::clone(&client), &[DEV_A, DEV_B]);

        let report = relay.deliver(capture("abc-123")).await;

        assert!(report.secondaries[0].1.is_timeout());
        assert!(report.secondaries[1].1.is_success());
    }
}

mod retention {
    use super::*;

    #[tokio::test]
    async fn forwards_primary_then_enqueues() {
        let client = Arc::new(MockClient::new());
        let clock = Arc::new(MockClock::new(START_SECS));
        let (relay, queue) = retention_relay(Arc::clone(&client), clock);

        let report = relay.deliver(capture("abc-123")).await;

        assert!(report.enqueued);
        assert!(report.secondaries.is_empty());
        assert_eq!(client.requested_urls(), vec![PRIMARY.to_string()]);
        let drained = queue.drain_all();
        assert_eq!(drained.len(), 1);
        assert_eq!(drained[0].id, "abc-123");
        assert_eq!(drained[0].topic, "order.created");
    }

    #[tokio::test]
    async fn primary_failure_still_enqueues() {
        let client = Arc::new(MockClient::with_fallback(Behavior::Refuse(
            "connection refused".into(),
        )));
        let clock = Arc::new(MockClock::new(START_SECS));
        let (relay, queue) = retention_relay(client, clock);

        let report = relay.deliver(capture("abc-123")).await;

        assert!(!report.primary.is_success());
        assert!(report.enqueued);
        assert_eq!(queue.size(), 1);
    }

    #[tokio::test]
    async fn delivery_enqueued_at_clock_start_is_still_pollable() {
        let client = Arc::new(MockClient::new());
        let clock = Arc::new(MockClock::new(START_SECS));
        let (relay, queue) = retention_relay(client, clock.clone());

        relay.deliver(capture("abc-123")).await;
        clock.advance(Duration::from_secs(4 * 60));

        assert_eq!(queue.size(), 1);
    }
}

mod accept {
    use super::*;

    #[tokio::test]
    async fn handle_resolves_to_report() {
        let client = Arc::new(MockClient::new());
        let (relay, _registry) = fan_out_relay(Arc::clone(&client), &[DEV_A]);
        let relay = Arc::new(relay);

        let handle = relay.accept(inbound_headers("abc-123"), body());
        let report = handle.await.unwrap().unwrap();

        assert_eq!(report.delivery_id, "abc-123");
        assert_eq!(client.calls(), 2);
    }

    #[tokio::test]
    async fn missing_id_is_reported_as_unknown() {
        let client = Arc::new(MockClient::new());
        let (relay, _registry) = fan_out_relay(client, &[]);
        let relay = Arc::new(relay);

        let report = relay
            .accept(HeaderMap::new(), body())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(report.delivery_id, "unknown");
    }

    #[tokio::test]
    async fn arrival_is_stamped_from_the_relay_clock() {
        let client = Arc::new(MockClient::new());
        let clock = Arc::new(MockClock::new(START_SECS));
        let (relay, queue) = retention_relay(client, clock.clone());
        let relay = Arc::new(relay);
        let stamped = clock.now();

        relay
            .accept(inbound_headers("abc-123"), body())
            .await
            .unwrap();

        let drained = queue.drain_all();
        assert_eq!(drained[0].received_at, stamped);
    }

    #[tokio::test]
    async fn stamp_is_taken_at_accept_not_at_enqueue() {
        let client = Arc::new(MockClient::new());
        let clock = Arc::new(MockClock::new(START_SECS));
        let (relay, queue) = retention_relay(client, clock.clone());
        let relay = Arc::new(relay);

        let handle = relay.accept(inbound_headers("abc-123"), body());
        clock.advance(Duration::from_secs(60));
        handle.await.unwrap();

        let drained = queue.drain_all();
        assert_eq!(
            drained[0].received_at,
            std::time::SystemTime::UNIX_EPOCH + Duration::from_secs(START_SECS)
        );
    }

    #[tokio::test]
    async fn dropping_the_handle_does_not_cancel_forwarding() {
        let client = Arc::new(MockClient::new());
        let (relay, _registry) = fan_out_relay(Arc::clone(&client), &[DEV_A, DEV_B]);
        let relay = Arc::new(relay);

        drop(relay.accept(inbound_headers("abc-123"), body()));

        for _ in 0..100 {
            if client.calls() == 3 {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(client.calls(), 3);
    }

    #[tokio::test]
    async fn nothing_is_forwarded_until_the_gate_opens() {
        let client = Arc::new(MockClient::new());
        let (relay, _registry) = fan_out_relay(Arc::clone(&client), &[DEV_A]);
        let relay = Arc::new(relay);
        let (open, gate) = tokio::sync::oneshot::channel::<()>();

        let handle = relay.accept_after(inbound_headers("abc-123"), body(), async move {
            let _ = gate.await;
        });
        for _ in 0..50 {
            tokio::task::yield_now().await;
        }
        assert_eq!(client.calls(), 0);

        open.send(()).unwrap();
        let report = handle.await.unwrap().unwrap();

        assert_eq!(report.delivery_id, "abc-123");
        assert_eq!(client.calls(), 2);
    }

    #[tokio::test]
    async fn gate_stamp_is_taken_before_the_gate_opens() {
        let client = Arc::new(MockClient::new());
        let clock = Arc::new(MockClock::new(START_SECS));
        let (relay, queue) = retention_relay(client, clock.clone());
        let relay = Arc::new(relay);
        let (open, gate) = tokio::sync::oneshot::channel::<()>();

        let handle = relay.accept_after(inbound_headers("abc-123"), body(), async move {
            let _ = gate.await;
        });
        clock.advance(Duration::from_secs(30));
        open.send(()).unwrap();
        handle.await.unwrap();

        let drained = queue.drain_all();
        assert_eq!(
            drained[0].received_at,
            std::time::SystemTime::UNIX_EPOCH + Duration::from_secs(START_SECS)
        );
    }
}

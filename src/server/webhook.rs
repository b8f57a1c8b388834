//! Webhook intake endpoint.
//!
//! Acknowledges every delivery immediately. Forwarding starts only after the
//! acknowledgment body has been handed to the connection, in a background
//! task owned by the relay.

use std::convert::Infallible;
use std::pin::Pin;
use std::task::{Context, Poll};

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, header};
use axum::response::{IntoResponse, Response};
use tokio::sync::oneshot;
use tokio_stream::Stream;

use super::AppState;
use crate::delivery;
use crate::forward::HttpClient;

/// Path the upstream source posts deliveries to.
pub const WEBHOOK_PATH: &str = "/api/webhooks/stubhub";

/// Single-chunk response body that signals once it has been read to the end.
///
/// Dropping it unread also releases the waiting side, since the sender is
/// dropped with it.
struct AckStream {
    chunk: Option<Bytes>,
    written: Option<oneshot::Sender<()>>,
}

impl Stream for AckStream {
    type Item = Result<Bytes, Infallible>;

    fn poll_next(mut self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if let Some(chunk) = self.chunk.take() {
            return Poll::Ready(Some(Ok(chunk)));
        }
        if let Some(written) = self.written.take() {
            // The receiver may already be gone if the relay task panicked
            let _ = written.send(());
        }
        Poll::Ready(None)
    }
}

/// Webhook handler.
///
/// # Response
///
/// Always `200 OK` with `{"received": true, "deliveryId": <id>}`, written
/// before any forwarding attempt starts. Forwarding outcomes never change
/// the response.
pub async fn receive_webhook<H: HttpClient + 'static>(
    State(state): State<AppState<H>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let delivery_id = delivery::delivery_id(&headers);

    tracing::info!(
        delivery_id = %delivery_id,
        topic = %delivery::topic(&headers),
        bytes = body.len(),
        "Webhook received"
    );

    let ack = serde_json::json!({ "received": true, "deliveryId": delivery_id });
    let (written, gate) = oneshot::channel();

    // The task is detached; its outcome is logged by the relay
    drop(state.relay().accept_after(headers, body, async move {
        // A dropped sender means the response was discarded; forward anyway
        let _ = gate.await;
    }));

    let stream = AckStream {
        chunk: Some(Bytes::from(ack.to_string())),
        written: Some(written),
    };
    (
        [(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        )],
        Body::from_stream(stream),
    )
        .into_response()
}

//! HTTP server for the webhook relay.
//!
//! # Endpoints
//!
//! - `POST /api/webhooks/stubhub` - Accepts a delivery (always 200, before forwarding)
//! - `GET /`, `GET /health` - Health check with mode details
//! - `POST /dev/register`, `GET /dev/list` - Secondary destinations (fan-out mode only)
//! - `GET /dev/poll`, `GET /dev/status` - Retained deliveries (retention mode only)
//!
//! Routes belonging to the other mode are not mounted. Any unmatched path or
//! method answers `404 {"error":"Not found"}`, except `OPTIONS`, which
//! answers `200` with an empty body. Every response carries permissive CORS
//! headers.

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, AUTHORIZATION, CONTENT_TYPE,
};
use axum::http::{HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::forward::HttpClient;
use crate::relay::{Relay, RelayMode, RetentionQueue, SecondaryRegistry};

pub mod dev;
mod error;
pub mod health;
pub mod webhook;


pub use error::ApiError;
pub use health::health;
pub use webhook::{WEBHOOK_PATH, receive_webhook};

/// Shared application state.
///
/// This is passed to all handlers via Axum's `State` extractor. Cloning is
/// cheap; every clone refers to the same relay.
pub struct AppState<H> {
    inner: Arc<AppStateInner<H>>,
}

struct AppStateInner<H> {
    relay: Arc<Relay<H>>,
    /// Bearer secret for `/dev/poll`.
    poll_secret: Option<String>,
}

// Manual impl: derive would require `H: Clone`
impl<H> Clone for AppState<H> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<H> AppState<H> {
    /// Creates the state shared by all handlers.
    pub fn new(relay: Arc<Relay<H>>, poll_secret: Option<String>) -> Self {
        Self {
            inner: Arc::new(AppStateInner { relay, poll_secret }),
        }
    }

    /// Returns the relay.
    #[must_use]
    pub fn relay(&self) -> &Arc<Relay<H>> {
        &self.inner.relay
    }

    /// Returns the poll secret.
    #[must_use]
    pub fn poll_secret(&self) -> Option<&str> {
        self.inner.poll_secret.as_deref()
    }

    fn registry(&self) -> Result<&Arc<SecondaryRegistry>, ApiError> {
        self.inner.relay.strategy().registry().ok_or(ApiError::NotFound)
    }

    fn queue(&self) -> Result<&Arc<RetentionQueue>, ApiError> {
        self.inner.relay.strategy().queue().ok_or(ApiError::NotFound)
    }
}

/// Builds the axum Router with the endpoints for the relay's mode.
pub fn build_router<H: HttpClient + 'static>(app_state: AppState<H>) -> Router {
    let router = Router::new()
        .route("/", get(health::<H>))
        .route("/health", get(health::<H>))
        // Deliveries of any size are acknowledged and forwarded
        .route(
            WEBHOOK_PATH,
            post(receive_webhook::<H>).layer(DefaultBodyLimit::disable()),
        );

    let router = match app_state.relay().strategy().mode() {
        RelayMode::FanOut => router
            .route("/dev/register", post(dev::register::<H>))
            .route("/dev/list", get(dev::list::<H>)),
        RelayMode::Retention => router
            .route("/dev/poll", get(dev::poll::<H>))
            .route("/dev/status", get(dev::status::<H>)),
    };

    router
        .fallback(not_found)
        .method_not_allowed_fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer())
        // CorsLayer only lists methods and headers on preflight responses
        .layer(SetResponseHeaderLayer::if_not_present(
            ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOWED_METHODS),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOWED_HEADERS),
        ))
        .with_state(app_state)
}

/// Value of `access-control-allow-methods` on every response.
pub const ALLOWED_METHODS: &str = "GET, POST, DELETE, OPTIONS";

/// Value of `access-control-allow-headers` on every response.
pub const ALLOWED_HEADERS: &str = "Content-Type, Authorization";

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
}

async fn not_found(method: Method) -> Response {
    if method == Method::OPTIONS {
        StatusCode::OK.into_response()
    } else {
        ApiError::NotFound.into_response()
    }
}

//! Mock HTTP client for tests.
//!
//! Behavior is scripted per destination URL; every request is recorded
//! in arrival order so tests can assert on call order and contents.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use http::StatusCode;

use super::{HttpClient, HttpError, HttpRequest, HttpResponse};

/// What the mock does when a URL is requested.
#[derive(Debug, Clone)]
pub enum Behavior {
    /// Answer with this status.
    Respond(StatusCode),
    /// Fail with a connection error carrying this message.
    Refuse(String),
    /// Never answer.
    Hang,
}

/// A mock implementation of [`HttpClient`].
#[derive(Debug)]
pub struct MockClient {
    behaviors: Mutex<HashMap<String, Behavior>>,
    fallback: Behavior,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockClient {
    /// Creates a mock that answers `200 OK` to any URL without a script.
    pub fn new() -> Self {
        Self::with_fallback(Behavior::Respond(StatusCode::OK))
    }

    /// Creates a mock with the given behavior for unscripted URLs.
    pub fn with_fallback(fallback: Behavior) -> Self {
        Self {
            behaviors: Mutex::new(HashMap::new()),
            fallback,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Scripts the behavior for one URL.
    pub fn script(self, url: &str, behavior: Behavior) -> Self {
        let key = url::Url::parse(url).unwrap().to_string();
        self.behaviors.lock().unwrap().insert(key, behavior);
        self
    }

    /// Returns every request received so far, in order.
    pub fn captured_requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Returns the URLs requested so far, in order.
    pub fn requested_urls(&self) -> Vec<String> {
        self.captured_requests()
            .iter()
            .map(|r| r.url.to_string())
            .collect()
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn behavior_for(&self, url: &url::Url) -> Behavior {
        self.behaviors
            .lock()
            .unwrap()
            .get(url.as_str())
            .cloned()
            .unwrap_or_else(|| self.fallback.clone())
    }
}

impl HttpClient for MockClient {
    async fn request(&self, req: HttpRequest) -> Result<HttpResponse, HttpError> {
        let behavior = self.behavior_for(&req.url);
        self.requests.lock().unwrap().push(req);

        match behavior {
            Behavior::Respond(status) => Ok(HttpResponse::with_status(status)),
            Behavior::Refuse(message) => Err(HttpError::Connection(Box::new(
                std::io::Error::new(std::io::ErrorKind::ConnectionRefused, message),
            ))),
            Behavior::Hang => std::future::pending().await,
        }
    }
}

impl HttpClient for Arc<MockClient> {
    async fn request(&self, req: HttpRequest) -> Result<HttpResponse, HttpError> {
        (**self).request(req).await
    }
}

//! Errors returned by the HTTP surface.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

use crate::relay::RegistryError;

/// Errors a request handler can answer with.
///
/// Every variant renders as a JSON object `{"error": <message>}`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request body is not valid JSON or lacks required fields.
    #[error("{0}")]
    MalformedRequest(String),

    /// A destination URL was rejected.
    #[error(transparent)]
    InvalidDestination(#[from] RegistryError),

    /// Missing or mismatched poll credentials.
    #[error("Unauthorized")]
    Unauthorized,

    /// No route for this path and method.
    #[error("Not found")]
    NotFound,
}

impl ApiError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::MalformedRequest(_) | Self::InvalidDestination(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::NotFound => StatusCode::NOT_FOUND,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status == StatusCode::UNAUTHORIZED {
            tracing::warn!("Rejected poll with missing or wrong credentials");
        }
        (
            status,
            Json(ErrorBody {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

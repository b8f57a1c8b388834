//! Forwarding layer for relaying deliveries to downstream consumers.
//!
//! This module provides types and traits for:
//! - Building HTTP requests ([`HttpRequest`])
//! - Handling HTTP responses ([`HttpResponse`])
//! - Abstracting HTTP clients ([`HttpClient`])
//! - Production HTTP client implementation ([`ReqwestClient`])
//! - Single-attempt, time-bounded forwarding ([`Forwarder`], [`ForwardOutcome`])

mod client;
mod error;
mod forwarder;
mod request;

#[cfg(test)]
pub mod mock;

#[cfg(test)]
mod client_tests;

pub use client::ReqwestClient;
pub use error::HttpError;
pub use forwarder::{ForwardOutcome, Forwarder};
pub use request::{HttpClient, HttpRequest, HttpResponse};

//! Dynamically registered secondary destinations.

use std::sync::{Mutex, MutexGuard, PoisonError};

use thiserror::Error;
use url::Url;

/// Error returned when a destination cannot be registered.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// The URL could not be parsed.
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl {
        /// The rejected URL string
        url: String,
        /// Reason for rejection
        reason: String,
    },

    /// The URL is not an `http` or `https` URL.
    #[error("Unsupported URL scheme '{scheme}' in '{url}': expected http or https")]
    UnsupportedScheme {
        /// The rejected URL string
        url: String,
        /// The scheme found
        scheme: String,
    },
}

/// Parses a destination URL, accepting only absolute `http`/`https` URLs.
///
/// # Errors
///
/// Returns [`RegistryError`] if the URL does not parse or has another scheme.
pub fn parse_destination(raw: &str) -> Result<Url, RegistryError> {
    let url = Url::parse(raw.trim()).map_err(|e| RegistryError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;

    match url.scheme() {
        "http" | "https" if url.has_host() => Ok(url),
        "http" | "https" => Err(RegistryError::InvalidUrl {
            url: raw.to_string(),
            reason: "missing host".to_string(),
        }),
        scheme => Err(RegistryError::UnsupportedScheme {
            url: raw.to_string(),
            scheme: scheme.to_string(),
        }),
    }
}

/// Ordered set of secondary destinations.
///
/// Membership is by URL equality after parsing; iteration order is
/// registration order. Lost on restart.
#[derive(Debug, Default)]
pub struct SecondaryRegistry {
    endpoints: Mutex<Vec<Url>>,
}

impl SecondaryRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry seeded with the given destinations.
    ///
    /// Duplicates are dropped, keeping the first occurrence.
    #[must_use]
    pub fn with_endpoints(endpoints: impl IntoIterator<Item = Url>) -> Self {
        let registry = Self::new();
        for url in endpoints {
            registry.add(url);
        }
        registry
    }

    /// Adds a destination. Returns false if it was already registered.
    pub fn add(&self, url: Url) -> bool {
        let mut endpoints = self.lock();
        if endpoints.contains(&url) {
            return false;
        }
        tracing::info!(endpoint = %url, "Secondary endpoint registered");
        endpoints.push(url);
        true
    }

    /// Removes every entry matching `raw`, returning how many were removed.
    ///
    /// `raw` matches an entry if it is the entry's exact string or parses
    /// to the same URL. Removing an unknown URL is a no-op.
    pub fn remove(&self, raw: &str) -> usize {
        let parsed = Url::parse(raw.trim()).ok();
        let mut endpoints = self.lock();
        let before = endpoints.len();
        endpoints.retain(|u| u.as_str() != raw && parsed.as_ref() != Some(u));
        let removed = before - endpoints.len();
        if removed > 0 {
            tracing::info!(endpoint = raw, "Secondary endpoint removed");
        }
        removed
    }

    /// Returns a snapshot of the registered destinations, in order.
    #[must_use]
    pub fn endpoints(&self) -> Vec<Url> {
        self.lock().clone()
    }

    /// Returns the number of registered destinations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns true if no destination is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Url>> {
        self.endpoints.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

//! Default values for configuration options.
//!
//! Centralized constants to avoid magic numbers scattered across the codebase.

use std::time::Duration;

/// Default listen port.
pub const PORT: u16 = 3080;

/// Default bind address.
pub const BIND: &str = "0.0.0.0";

/// Default primary destination.
pub const PRODUCTION_URL: &str = "https://inventory.ticketits.com/api/webhooks/stubhub";

/// Timeout for a single forwarding attempt, in seconds.
pub const FORWARD_TIMEOUT_SECS: u64 = 10;

/// Maximum number of deliveries held by the retention queue.
pub const QUEUE_CAPACITY: usize = 100;

/// Age in minutes at which a retained delivery expires.
pub const QUEUE_TTL_MINUTES: u64 = 5;

/// Forwarding timeout as Duration.
#[must_use]
pub const fn forward_timeout() -> Duration {
    Duration::from_secs(FORWARD_TIMEOUT_SECS)
}

/// Retention time-to-live as Duration.
#[must_use]
pub const fn queue_ttl() -> Duration {
    Duration::from_secs(QUEUE_TTL_MINUTES * 60)
}

//! Delivery distribution strategies.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use super::{RetentionQueue, SecondaryRegistry};

/// Which distribution strategy a relay runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RelayMode {
    /// Forward to every registered secondary destination.
    FanOut,
    /// Retain deliveries for pull-based retrieval.
    Retention,
}

impl fmt::Display for RelayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FanOut => write!(f, "fan-out"),
            Self::Retention => write!(f, "retention"),
        }
    }
}

/// What happens to a delivery after the primary destination.
///
/// Selected once at startup. The shared state each variant needs is owned
/// here and handed to the HTTP layer by reference, never held in globals.
#[derive(Debug, Clone)]
pub enum DistributionStrategy {
    /// Forward sequentially to each registered secondary destination.
    FanOut {
        /// Registered secondary destinations
        registry: Arc<SecondaryRegistry>,
    },
    /// Append to the retention queue for later polling.
    RetentionPoll {
        /// Deliveries awaiting a poll
        queue: Arc<RetentionQueue>,
    },
}

impl DistributionStrategy {
    /// Fan-out strategy with the given registry.
    #[must_use]
    pub const fn fan_out(registry: Arc<SecondaryRegistry>) -> Self {
        Self::FanOut { registry }
    }

    /// Retention strategy with the given queue.
    #[must_use]
    pub const fn retention(queue: Arc<RetentionQueue>) -> Self {
        Self::RetentionPoll { queue }
    }

    /// Returns the mode this strategy implements.
    #[must_use]
    pub const fn mode(&self) -> RelayMode {
        match self {
            Self::FanOut { .. } => RelayMode::FanOut,
            Self::RetentionPoll { .. } => RelayMode::Retention,
        }
    }

    /// Returns the secondary registry in fan-out mode.
    #[must_use]
    pub const fn registry(&self) -> Option<&Arc<SecondaryRegistry>> {
        match self {
            Self::FanOut { registry } => Some(registry),
            Self::RetentionPoll { .. } => None,
        }
    }

    /// Returns the retention queue in retention mode.
    #[must_use]
    pub const fn queue(&self) -> Option<&Arc<RetentionQueue>> {
        match self {
            Self::FanOut { .. } => None,
            Self::RetentionPoll { queue } => Some(queue),
        }
    }
}

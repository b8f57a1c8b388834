//! Relay orchestration: distributing deliveries after acknowledgment.
//!
//! This module provides:
//! - The in-memory retention buffer ([`RetentionQueue`])
//! - The dynamic set of secondary destinations ([`SecondaryRegistry`])
//! - The distribution strategy selected at startup ([`DistributionStrategy`])
//! - The orchestrator driving each delivery ([`Relay`], [`RelayReport`])
//!
//! # Lifecycle of a delivery
//!
//! The HTTP layer acknowledges the sender first, then hands the raw request
//! to [`Relay::accept`], which spawns an independent task. The task
//! sanitizes headers, forwards to the primary destination, and then either
//! forwards to every registered secondary (fan-out) or appends the delivery
//! to the retention queue (retention). A failure at any destination never
//! stops the remaining steps.

mod orchestrator;
mod queue;
mod registry;
mod strategy;

#[cfg(test)]
mod orchestrator_tests;

pub use orchestrator::{LABEL_PRIMARY, LABEL_SECONDARY, Relay, RelayReport};
pub use queue::RetentionQueue;
pub use registry::{RegistryError, SecondaryRegistry, parse_destination};
pub use strategy::{DistributionStrategy, RelayMode};

//! Webhook relay
//!
//! A library for receiving webhook deliveries, acknowledging them
//! immediately, and relaying each one to a primary destination plus either
//! a set of registered secondary destinations or a pull-based retention
//! queue.

pub mod config;
pub mod delivery;
pub mod forward;
pub mod relay;
pub mod server;
pub mod time;

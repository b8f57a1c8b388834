//! Configuration layer for the webhook relay.
//!
//! This module provides:
//! - CLI argument parsing ([`Cli`], [`Command`])
//! - TOML configuration file parsing ([`TomlConfig`])
//! - Validated configuration ([`ValidatedConfig`])
//! - Configuration file generation ([`write_default_config`])
//! - Default values ([`defaults`])
//!
//! # Priority
//!
//! Configuration values are resolved with the following priority (highest to lowest):
//!
//! 1. **Explicit CLI arguments** - Values passed on the command line
//! 2. **Environment variables** - `PORT`, `BIND_ADDRESS`, `PRODUCTION_URL`,
//!    `RELAY_MODE`, `POLL_SECRET`
//! 3. **TOML config file** - Values from the configuration file
//! 4. **Built-in defaults** - Hardcoded default values
//!
//! Environment variables are read by clap, so a value from the environment
//! is indistinguishable from an explicit flag.
//!
//! Secondary destinations (`--secondary`) **replace** the TOML list
//! entirely when given on the command line; they are not merged.
//!
//! # Internal Tuning Parameters
//!
//! The forward timeout (10s), retention queue capacity (100) and retention
//! time-to-live (5 minutes) are not user-configurable.

mod cli;
pub mod defaults;
mod error;
mod toml;
mod validated;

#[cfg(test)]
mod validated_tests;

pub use cli::{Cli, Command, ModeArg};
pub use error::{ConfigError, field};
pub use toml::{TomlConfig, default_config_template};
pub use validated::{ValidatedConfig, write_default_config};

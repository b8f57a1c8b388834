//! CLI argument parsing using clap.
//!
//! Defines the command-line interface with all options and subcommands.
//! Most options can also be given through environment variables.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::relay::RelayMode;

/// Webhook relay
///
/// Receives webhooks, acknowledges them immediately, and forwards each one
/// to a primary destination plus registered development destinations.
#[derive(Debug, Parser)]
#[command(name = "webhook-relay")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Port to listen on
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Address to bind
    #[arg(long, env = "BIND_ADDRESS")]
    pub bind: Option<String>,

    /// Primary destination every delivery is forwarded to
    #[arg(long = "production-url", env = "PRODUCTION_URL")]
    pub production_url: Option<String>,

    /// What to do with deliveries after the primary destination
    #[arg(long, value_enum, env = "RELAY_MODE")]
    pub mode: Option<ModeArg>,

    /// Shared secret for the poll endpoint (required in retention mode)
    #[arg(long = "poll-secret", env = "POLL_SECRET", hide_env_values = true)]
    pub poll_secret: Option<String>,

    /// Secondary destination registered at startup (can be specified multiple times)
    #[arg(long = "secondary", value_name = "URL")]
    pub secondaries: Vec<String>,

    /// Path to configuration file
    #[arg(long, short, env = "WEBHOOK_RELAY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long, short)]
    pub verbose: bool,
}

/// Subcommands for webhook-relay
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate a default configuration file
    Init {
        /// Output path for the configuration file
        #[arg(long, short, default_value = "webhook-relay.toml")]
        output: PathBuf,
    },
}

/// Relay mode argument for CLI parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    /// Forward each delivery to every registered secondary destination
    #[value(name = "fan-out")]
    FanOut,
    /// Keep deliveries for retrieval through the poll endpoint
    #[value(name = "retention")]
    Retention,
}

impl From<ModeArg> for RelayMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::FanOut => Self::FanOut,
            ModeArg::Retention => Self::Retention,
        }
    }
}

impl Cli {
    /// Parses CLI arguments from the command line.
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Parses CLI arguments from an iterator (useful for testing).
    pub fn parse_from_iter<I, T>(iter: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Self::parse_from(iter)
    }

    /// Returns true if this is the init command.
    #[must_use]
    pub const fn is_init(&self) -> bool {
        matches!(self.command, Some(Command::Init { .. }))
    }
}

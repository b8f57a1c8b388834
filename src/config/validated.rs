//! Validated configuration after merging CLI and TOML sources.
//!
//! This module contains the final, validated configuration that is used
//! by the application. All validation is performed during construction.

use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::Path;

use url::Url;

use crate::relay::{RelayMode, parse_destination};

use super::cli::Cli;
use super::defaults;
use super::error::{ConfigError, field};
use super::toml::TomlConfig;

/// Fully validated configuration ready for use by the application.
///
/// # Construction
///
/// Use [`ValidatedConfig::from_raw`] to create from CLI args and optional TOML config.
/// The function validates all inputs and returns errors for invalid configurations.
#[derive(Debug)]
pub struct ValidatedConfig {
    /// Socket address to listen on
    pub listen: SocketAddr,

    /// Primary destination
    pub production_url: Url,

    /// Distribution mode
    pub mode: RelayMode,

    /// Poll endpoint secret, always present in retention mode
    pub poll_secret: Option<String>,

    /// Secondary destinations registered at startup, in order
    pub secondaries: Vec<Url>,

    /// Verbose logging enabled
    pub verbose: bool,
}

impl fmt::Display for ValidatedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secret = if self.poll_secret.is_some() {
            "set"
        } else {
            "none"
        };

        write!(
            f,
            "Config {{ listen: {}, production: {}, mode: {}, secondaries: {}, poll_secret: {} }}",
            self.listen,
            self.production_url,
            self.mode,
            self.secondaries.len(),
            secret,
        )
    }
}

impl ValidatedConfig {
    /// Creates a validated configuration from CLI arguments and optional TOML config.
    ///
    /// CLI arguments (including their environment variables) take precedence
    /// over TOML config values.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A destination URL is not an absolute http or https URL
    /// - The mode is unknown
    /// - The port is zero or the bind address is not an IP address
    /// - Retention mode is selected without a poll secret
    pub fn from_raw(cli: &Cli, toml: Option<&TomlConfig>) -> Result<Self, ConfigError> {
        let listen = Self::resolve_listen(cli, toml)?;
        let production_url = Self::resolve_production_url(cli, toml)?;
        let mode = Self::resolve_mode(cli, toml)?;
        let poll_secret = Self::resolve_poll_secret(cli, toml, mode)?;
        let secondaries = Self::resolve_secondaries(cli, toml)?;

        Ok(Self {
            listen,
            production_url,
            mode,
            poll_secret,
            secondaries,
            verbose: cli.verbose,
        })
    }

    /// Loads and merges configuration from CLI and optional config file.
    ///
    /// If `cli.config` is set, loads the TOML file from that path.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The config file cannot be read or parsed
    /// - The merged configuration is invalid
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let toml = if let Some(ref path) = cli.config {
            Some(TomlConfig::load(path)?)
        } else {
            None
        };

        Self::from_raw(cli, toml.as_ref())
    }

    fn resolve_listen(cli: &Cli, toml: Option<&TomlConfig>) -> Result<SocketAddr, ConfigError> {
        // Priority: CLI explicit > TOML > default
        let port = cli
            .port
            .or_else(|| toml.and_then(|t| t.server.port))
            .unwrap_or(defaults::PORT);

        if port == 0 {
            return Err(ConfigError::InvalidPort { value: port });
        }

        let bind = cli
            .bind
            .as_deref()
            .or_else(|| toml.and_then(|t| t.server.bind.as_deref()))
            .unwrap_or(defaults::BIND);

        let ip = bind
            .trim()
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidBind {
                value: bind.to_string(),
                reason: e.to_string(),
            })?;

        Ok(SocketAddr::new(ip, port))
    }

    fn resolve_production_url(cli: &Cli, toml: Option<&TomlConfig>) -> Result<Url, ConfigError> {
        let url_str = cli
            .production_url
            .as_deref()
            .or_else(|| toml.and_then(|t| t.relay.production_url.as_deref()))
            .unwrap_or(defaults::PRODUCTION_URL);

        parse_url(field::PRODUCTION_URL, url_str)
    }

    fn resolve_mode(cli: &Cli, toml: Option<&TomlConfig>) -> Result<RelayMode, ConfigError> {
        // CLI takes precedence
        if let Some(mode) = cli.mode {
            return Ok(mode.into());
        }

        // Fall back to TOML
        if let Some(mode_str) = toml.and_then(|t| t.relay.mode.as_deref()) {
            return parse_mode(mode_str);
        }

        Ok(RelayMode::FanOut)
    }

    fn resolve_poll_secret(
        cli: &Cli,
        toml: Option<&TomlConfig>,
        mode: RelayMode,
    ) -> Result<Option<String>, ConfigError> {
        let secret = cli
            .poll_secret
            .as_deref()
            .or_else(|| toml.and_then(|t| t.retention.poll_secret.as_deref()))
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        if mode == RelayMode::Retention && secret.is_none() {
            return Err(ConfigError::missing(
                field::POLL_SECRET,
                "Retention mode needs --poll-secret, POLL_SECRET, or retention.poll_secret in config file",
            ));
        }

        Ok(secret)
    }

    fn resolve_secondaries(cli: &Cli, toml: Option<&TomlConfig>) -> Result<Vec<Url>, ConfigError> {
        // CLI list replaces the TOML list
        let raw: &[String] = if cli.secondaries.is_empty() {
            toml.map(|t| t.fan_out.secondaries.as_slice())
                .unwrap_or_default()
        } else {
            &cli.secondaries
        };

        raw.iter()
            .map(|s| parse_url(field::SECONDARIES, s))
            .collect()
    }
}

/// Writes the default configuration template to a file.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_default_config(path: &Path) -> Result<(), ConfigError> {
    let template = super::toml::default_config_template();
    std::fs::write(path, template).map_err(|e| ConfigError::FileWrite {
        path: path.to_path_buf(),
        source: e,
    })
}

// Helper functions

fn parse_url(field: &'static str, s: &str) -> Result<Url, ConfigError> {
    parse_destination(s).map_err(|e| ConfigError::InvalidUrl {
        field,
        url: s.to_string(),
        reason: e.to_string(),
    })
}

fn parse_mode(s: &str) -> Result<RelayMode, ConfigError> {
    match s.trim().to_lowercase().as_str() {
        "fan-out" | "fan_out" | "fanout" => Ok(RelayMode::FanOut),
        "retention" | "poll" => Ok(RelayMode::Retention),
        _ => Err(ConfigError::InvalidMode {
            value: s.to_string(),
        }),
    }
}

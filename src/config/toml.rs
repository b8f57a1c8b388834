//! TOML configuration file parsing.
//!
//! Defines the structure of the configuration file with serde.

use std::path::Path;

use serde::Deserialize;

use super::ConfigError;

/// Root configuration structure from TOML file.
///
/// All fields are optional to allow partial configuration
/// that can be merged with CLI arguments.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    /// Listener configuration section
    #[serde(default)]
    pub server: ServerSection,

    /// Relay configuration section
    #[serde(default)]
    pub relay: RelaySection,

    /// Fan-out mode configuration
    #[serde(default)]
    pub fan_out: FanOutSection,

    /// Retention mode configuration
    #[serde(default)]
    pub retention: RetentionSection,
}

/// Listener configuration section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    /// Port to listen on
    pub port: Option<u16>,

    /// Address to bind
    pub bind: Option<String>,
}

/// Relay configuration section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RelaySection {
    /// Primary destination URL
    pub production_url: Option<String>,

    /// Relay mode: "fan-out" or "retention"
    pub mode: Option<String>,
}

/// Fan-out mode configuration section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FanOutSection {
    /// Secondary destinations registered at startup
    #[serde(default)]
    pub secondaries: Vec<String>,
}

/// Retention mode configuration section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetentionSection {
    /// Shared secret for the poll endpoint
    pub poll_secret: Option<String>,
}

impl TomlConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        Self::parse(&content)
    }

    /// Parses configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::from)
    }
}

/// Generates a default configuration file with comments.
#[must_use]
pub fn default_config_template() -> String {
    r#"# Webhook Relay Configuration File

[server]
# Port to listen on (default: 3080, env: PORT)
port = 3080

# Address to bind (default: 0.0.0.0, env: BIND_ADDRESS)
# bind = "0.0.0.0"

[relay]
# Primary destination every delivery is forwarded to (env: PRODUCTION_URL)
# production_url = "https://inventory.ticketits.com/api/webhooks/stubhub"

# What happens after the primary destination (env: RELAY_MODE)
# Accepted values: "fan-out" (forward to registered secondaries)
#                  "retention" (keep deliveries for /dev/poll)
mode = "fan-out"

[fan_out]
# Secondary destinations registered at startup
# More can be added at runtime through POST /dev/register
# Note: --secondary CLI flags REPLACE this list entirely (not merged)
# secondaries = ["http://localhost:4000/api/webhooks/stubhub"]

[retention]
# Shared secret required as "Authorization: Bearer <secret>" on /dev/poll
# Required in retention mode (env: POLL_SECRET)
# poll_secret = "change-me"
"#
    .to_string()
}

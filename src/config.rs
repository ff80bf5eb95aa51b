//! # Configuration Management
//!
//! Centralized configuration for relay devices and the proxy.
//!
//! Proxy, controller and toy share one configuration shape. The proxy ignores
//! `proxy_url`; devices use it to find the proxy.
//!
//! ## Configuration Sources
//! - TOML files via `from_file()`
//! - Direct instantiation with defaults (`for_role()`)
//! - Environment overrides via `from_env()`
//!
//! Controller and toy must use the same port, channel and compression setting
//! as the proxy they talk to.

use crate::error::{ProtocolError, Result};
use crate::utils::compression::CompressionKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, Level};

/// Max size of one decompressed delivered buffer (16 MB)
pub const MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;

/// Port shared by proxy, controller and toy
pub const DEFAULT_PORT: u16 = 33330;

/// Seconds between keepalive pings
pub const DEFAULT_KEEPALIVE_SECS: u64 = 30;

/// Whether to enable compression by default
pub const ENABLE_COMPRESSION: bool = false;

/// Role a process plays in the relay network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The go-between server.
    Proxy,
    #[default]
    Controller,
    Toy,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Proxy => "proxy",
            Role::Controller => "controller",
            Role::Toy => "toy",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "proxy" => Ok(Role::Proxy),
            "controller" => Ok(Role::Controller),
            "toy" => Ok(Role::Toy),
            _ => Err(ProtocolError::ConfigError(format!(
                "Could not determine device role: '{s}'"
            ))),
        }
    }
}

/// Main relay configuration structure that contains all configurable settings
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct RelayConfig {
    #[serde(default)]
    pub device: DeviceConfig,

    #[serde(default)]
    pub transport: TransportConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl RelayConfig {
    /// Defaults for the given role
    pub fn for_role(role: Role) -> Self {
        Self::default_with_overrides(|config| config.device.role = role)
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path.as_ref())
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to open config file: {e}")))?;

        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to read config file: {e}")))?;

        let config = Self::from_toml(&contents)?;
        info!(path = %path.as_ref().display(), role = %config.device.role, "Loaded relay configuration");
        Ok(config)
    }

    /// Load configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str::<Self>(content)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to parse TOML: {e}")))
    }

    /// Load configuration from environment variables
    ///
    /// Unset variables keep their defaults. Set but unparsable values are an error.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(role) = std::env::var("RELAY_ROLE") {
            config.device.role = role.parse()?;
        }

        if let Ok(url) = std::env::var("RELAY_PROXY_URL") {
            config.device.proxy_url = url;
        }

        if let Ok(port) = std::env::var("RELAY_PORT") {
            config.device.port = parse_env("RELAY_PORT", &port)?;
        }

        if let Ok(channel) = std::env::var("RELAY_CHANNEL") {
            config.device.channel = channel;
        }

        if let Ok(keepalive) = std::env::var("RELAY_KEEPALIVE_SECS") {
            config.device.keepalive =
                Duration::from_secs(parse_env("RELAY_KEEPALIVE_SECS", &keepalive)?);
        }

        if let Ok(enabled) = std::env::var("RELAY_COMPRESSION") {
            config.transport.compression_enabled = parse_env("RELAY_COMPRESSION", &enabled)?;
        }

        if let Ok(kind) = std::env::var("RELAY_COMPRESSION_KIND") {
            config.transport.compression_kind = kind.parse()?;
        }

        if let Ok(tcp4) = std::env::var("RELAY_TCP4") {
            config.transport.tcp4 = parse_env("RELAY_TCP4", &tcp4)?;
        }

        if let Ok(udp4) = std::env::var("RELAY_UDP4") {
            config.transport.udp4 = parse_env("RELAY_UDP4", &udp4)?;
        }

        Ok(config)
    }

    /// Apply overrides to the default configuration
    pub fn default_with_overrides<F>(mutator: F) -> Self
    where
        F: FnOnce(&mut Self),
    {
        let mut config = Self::default();
        mutator(&mut config);
        config
    }

    /// Generate example configuration file content
    pub fn example_config() -> String {
        toml::to_string_pretty(&Self::default())
            .unwrap_or_else(|_| String::from("# Failed to generate example config"))
    }

    /// Save configuration to a file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, content)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to write config file: {e}")))?;

        Ok(())
    }

    /// Validate the configuration for common issues and misconfigurations
    ///
    /// Returns a list of validation errors. Empty list means configuration is valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        errors.extend(self.device.validate());
        errors.extend(self.transport.validate(self.device.role));
        errors.extend(self.logging.validate());
        errors
    }

    /// Validate and return Result - convenience method
    pub fn validate_strict(&self) -> Result<()> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ProtocolError::ConfigError(format!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            )))
        }
    }
}

fn parse_env<T: FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .parse::<T>()
        .map_err(|_| ProtocolError::ConfigError(format!("Invalid value for {name}: '{value}'")))
}

/// Device identity and addressing
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DeviceConfig {
    pub role: Role,

    /// Host of the proxy. Only toys and controllers use it.
    pub proxy_url: String,

    pub port: u16,

    /// Only devices on the same channel can talk to each other
    #[serde(with = "channel_serde")]
    pub channel: String,

    /// Interval between keepalive pings; zero disables them
    #[serde(with = "duration_secs_serde")]
    pub keepalive: Duration,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            role: Role::default(),
            proxy_url: String::from("localhost"),
            port: DEFAULT_PORT,
            channel: String::from("1"),
            keepalive: Duration::from_secs(DEFAULT_KEEPALIVE_SECS),
        }
    }
}

impl DeviceConfig {
    pub fn keepalive_enabled(&self) -> bool {
        !self.keepalive.is_zero()
    }

    /// `host:port` a device connects to
    pub fn proxy_address(&self) -> String {
        format!("{}:{}", self.proxy_url, self.port)
    }

    /// Validate device configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.role != Role::Proxy && self.proxy_url.is_empty() {
            errors.push("Proxy URL cannot be empty".to_string());
        }

        if self.port == 0 {
            errors.push("Port must be greater than 0".to_string());
        }

        if self.channel.is_empty() {
            errors.push("Channel cannot be empty".to_string());
        }

        if self.keepalive.as_secs() > 3600 {
            errors.push("Keepalive interval too long (maximum: 1 hour)".to_string());
        }

        errors
    }
}

/// Transport configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TransportConfig {
    pub tcp4: bool,

    pub udp4: bool,

    /// Whether frames are compressed. Must match on both ends.
    pub compression_enabled: bool,

    pub compression_kind: CompressionKind,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tcp4: false,
            udp4: true,
            compression_enabled: ENABLE_COMPRESSION,
            compression_kind: CompressionKind::default(),
        }
    }
}

impl TransportConfig {
    /// Validate transport configuration for the given role
    pub fn validate(&self, role: Role) -> Vec<String> {
        let mut errors = Vec::new();

        if !self.tcp4 && !self.udp4 {
            errors.push("At least one transport (tcp4 or udp4) must be enabled".to_string());
        }

        if self.tcp4 && self.udp4 && role != Role::Proxy {
            errors.push(format!(
                "Only the proxy can use both TCP and UDP (role: {role})"
            ));
        }

        errors
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Application name for logs
    pub app_name: String,

    #[serde(with = "log_level_serde")]
    pub log_level: Level,

    pub log_to_console: bool,

    pub log_to_file: bool,

    /// Path to log file (if log_to_file is true)
    pub log_file_path: Option<String>,

    /// Whether to use JSON formatting for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            app_name: String::from("relay-protocol"),
            log_level: Level::INFO,
            log_to_console: true,
            log_to_file: false,
            log_file_path: None,
            json_format: false,
        }
    }
}

impl LoggingConfig {
    /// Validate logging configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.app_name.is_empty() {
            errors.push("Application name cannot be empty".to_string());
        } else if self.app_name.len() > 64 {
            errors.push(format!(
                "Application name too long: {} characters (maximum: 64)",
                self.app_name.len()
            ));
        }

        if self.log_to_file {
            if let Some(ref path) = self.log_file_path {
                if let Some(parent) = Path::new(path).parent() {
                    if !parent.as_os_str().is_empty() && !parent.exists() {
                        errors.push(format!(
                            "Log file directory does not exist: {}",
                            parent.display()
                        ));
                    }
                }
            } else {
                errors.push("log_file_path must be specified when log_to_file is true".to_string());
            }
        }

        if !self.log_to_console && !self.log_to_file {
            errors
                .push("At least one logging output (console or file) must be enabled".to_string());
        }

        errors
    }
}

/// Channels may be written as numbers or strings; both are kept as strings.
mod channel_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawChannel {
        Number(i64),
        Text(String),
    }

    pub fn serialize<S>(channel: &str, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        channel.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match RawChannel::deserialize(deserializer)? {
            RawChannel::Number(n) => n.to_string(),
            RawChannel::Text(s) => s,
        })
    }
}

/// Helper module for Duration (whole seconds) serialization/deserialization
mod duration_secs_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

/// Helper module for tracing::Level serialization/deserialization
mod log_level_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::str::FromStr;
    use tracing::Level;

    pub fn serialize<S>(level: &Level, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        level.as_str().to_ascii_lowercase().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Level, D::Error>
    where
        D: Deserializer<'de>,
    {
        let level_str = String::deserialize(deserializer)?;
        Level::from_str(&level_str)
            .map_err(|_| serde::de::Error::custom(format!("Invalid log level: {level_str}")))
    }
}

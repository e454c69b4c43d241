//! Configuration loading and logging setup.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::error::{Error, Result};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub server: ServerConfig,
    pub session: SessionConfig,
    pub logging: LoggingConfig,
}

/// Listener addresses. Devices expect three fixed ports: command, map and
/// time sync.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub bind_address: String,
    pub cmd_port: u16,
    pub map_port: u16,
    pub time_port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            cmd_port: 4010,
            map_port: 4030,
            time_port: 4050,
        }
    }
}

impl ServerConfig {
    pub fn cmd_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.cmd_port)
    }

    pub fn map_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.map_port)
    }

    pub fn time_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.time_port)
    }
}

/// Per-session behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// How long a request waits for the device's reply.
    #[serde(with = "humantime_serde")]
    pub recv_timeout: Duration,
    /// Timezone offset reported to devices asking for the time, in seconds.
    pub timezone_offset_secs: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            recv_timeout: Duration::from_secs(5),
            timezone_offset_secs: 3600,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Default filter directive when RUST_LOG is unset.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load a TOML configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {e}", path.display())))?;
        let config: Config = toml::from_str(&raw)
            .map_err(|e| Error::InvalidConfig(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Render the default configuration as an annotated starting point.
    pub fn example() -> String {
        toml::to_string_pretty(&Config::default()).unwrap_or_default()
    }

    pub fn validate(&self) -> Result<()> {
        let ports = [
            self.server.cmd_port,
            self.server.map_port,
            self.server.time_port,
        ];
        for (i, port) in ports.iter().enumerate() {
            // Port zero asks the OS for an ephemeral port; duplicates of it
            // are fine.
            if *port != 0 && ports[..i].contains(port) {
                return Err(Error::InvalidConfig(format!(
                    "listener port {port} used more than once"
                )));
            }
        }
        if self.session.recv_timeout.is_zero() {
            return Err(Error::InvalidConfig(
                "session.recv_timeout must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Install the global tracing subscriber. RUST_LOG overrides the configured
/// level.
pub fn init_logging(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn test_example_round_trips() {
        let example = Config::example();
        let parsed: Config = toml::from_str(&example).unwrap();
        assert_eq!(parsed.server.cmd_port, 4010);
        assert_eq!(parsed.session.recv_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_duplicate_ports_rejected() {
        let mut config = Config::default();
        config.server.map_port = config.server.cmd_port;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_ephemeral_ports_allowed() {
        let mut config = Config::default();
        config.server.cmd_port = 0;
        config.server.map_port = 0;
        config.server.time_port = 0;
        config.validate().unwrap();
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = toml::from_str::<Config>("[server]\nbogus = 1\n").unwrap_err();
        assert!(err.to_string().contains("bogus"));
    }

    #[test]
    fn test_humantime_timeout_parses() {
        let config: Config = toml::from_str("[session]\nrecv_timeout = \"250ms\"\n").unwrap();
        assert_eq!(config.session.recv_timeout, Duration::from_millis(250));
    }
}

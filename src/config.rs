//! Layered configuration.
//!
//! Sources, later ones winning:
//!
//! 1. Built-in defaults (public test broker, `platoon/speed`)
//! 2. An optional TOML/YAML/JSON file passed with `--config`
//! 3. Environment variables prefixed `PLATOON_`, nested keys separated by
//!    `__` (e.g. `PLATOON_BROKER__HOST=localhost`)
//! 4. Command-line overrides (`--host`, `--port`, `--topic`)
//!
//! ```toml
//! topic = "platoon/speed"
//!
//! [broker]
//! host = "test.mosquitto.org"
//! port = 1883
//! keep_alive_secs = 60
//!
//! [follower]
//! refresh_ms = 100
//! stale_after_secs = 5
//! ```

use std::path::Path;
use std::time::Duration;

use config::{Config, Environment, File};
use platoon_types::DEFAULT_TOPIC;
use serde::Deserialize;

use crate::error::{Error, Result};

/// Broker connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BrokerConfig {
    pub host: String,
    pub port: u16,
    /// Keep-alive interval, also used as the connection handshake timeout.
    pub keep_alive_secs: u64,
    /// Client identifier; derived from the role and process id when unset.
    pub client_id: Option<String>,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            host: "test.mosquitto.org".to_string(),
            port: 1883,
            keep_alive_secs: 60,
            client_id: None,
        }
    }
}

impl BrokerConfig {
    pub fn keep_alive(&self) -> Duration {
        Duration::from_secs(self.keep_alive_secs)
    }

    /// `host:port`
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Client id to use for the given role (`leader` or `follower`).
    ///
    /// Public brokers drop an older session when a new one reuses its id,
    /// so the default includes the process id.
    pub fn client_id_for(&self, role: &str) -> String {
        match &self.client_id {
            Some(id) => id.clone(),
            None => format!("platoon-{}-{}", role, std::process::id()),
        }
    }
}

/// Follower display settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FollowerConfig {
    /// How often the display re-reads the current view.
    pub refresh_ms: u64,
    /// Mark the view stale when no record arrived for this long.
    pub stale_after_secs: Option<u64>,
}

impl Default for FollowerConfig {
    fn default() -> Self {
        Self {
            refresh_ms: 100,
            stale_after_secs: None,
        }
    }
}

impl FollowerConfig {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_ms)
    }

    pub fn stale_after(&self) -> Option<Duration> {
        self.stale_after_secs.map(Duration::from_secs)
    }
}

/// Overrides supplied on the command line.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub topic: Option<String>,
}

/// Complete process configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PlatoonConfig {
    /// Topic records are published on.
    pub topic: String,
    pub broker: BrokerConfig,
    pub follower: FollowerConfig,
}

impl Default for PlatoonConfig {
    fn default() -> Self {
        Self {
            topic: DEFAULT_TOPIC.to_string(),
            broker: BrokerConfig::default(),
            follower: FollowerConfig::default(),
        }
    }
}

impl PlatoonConfig {
    /// Load from defaults, the optional file and the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(path, None)
    }

    /// Like [`load`](Self::load), reading environment variables from
    /// `env` instead of the process when given.
    pub fn load_with_env(path: Option<&Path>, env: Option<config::Map<String, String>>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        builder = builder.add_source(
            Environment::with_prefix("PLATOON")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .source(env),
        );

        let config: PlatoonConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Apply command-line overrides and re-validate.
    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Result<Self> {
        if let Some(host) = overrides.host {
            self.broker.host = host;
        }
        if let Some(port) = overrides.port {
            self.broker.port = port;
        }
        if let Some(topic) = overrides.topic {
            self.topic = topic;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.topic.trim().is_empty() {
            return Err(Error::Config("topic must not be empty".into()));
        }
        if self.broker.host.trim().is_empty() {
            return Err(Error::Config("broker.host must not be empty".into()));
        }
        if self.broker.port == 0 {
            return Err(Error::Config("broker.port must be non-zero".into()));
        }
        if self.broker.keep_alive_secs < 5 {
            return Err(Error::Config(format!(
                "broker.keep_alive_secs must be at least 5 (got {})",
                self.broker.keep_alive_secs
            )));
        }
        if self.follower.refresh_ms < 10 {
            return Err(Error::Config(format!(
                "follower.refresh_ms must be at least 10 (got {})",
                self.follower.refresh_ms
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn no_env() -> Option<config::Map<String, String>> {
        Some(config::Map::new())
    }

    fn env(pairs: &[(&str, &str)]) -> Option<config::Map<String, String>> {
        Some(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_defaults() {
        let config = PlatoonConfig::load_with_env(None, no_env()).unwrap();

        assert_eq!(config, PlatoonConfig::default());
        assert_eq!(config.topic, "platoon/speed");
        assert_eq!(config.broker.endpoint(), "test.mosquitto.org:1883");
        assert_eq!(config.broker.keep_alive(), Duration::from_secs(60));
        assert_eq!(config.follower.refresh_interval(), Duration::from_millis(100));
        assert_eq!(config.follower.stale_after(), None);
    }

    #[test]
    fn test_file_source() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
topic = "convoy/a"

[broker]
host = "localhost"
port = 1884

[follower]
stale_after_secs = 5
"#
        )
        .unwrap();

        let config = PlatoonConfig::load_with_env(Some(file.path()), no_env()).unwrap();

        assert_eq!(config.topic, "convoy/a");
        assert_eq!(config.broker.host, "localhost");
        assert_eq!(config.broker.port, 1884);
        // Unspecified keys keep their defaults
        assert_eq!(config.broker.keep_alive_secs, 60);
        assert_eq!(config.follower.stale_after(), Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_env_overrides_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[broker]\nhost = \"localhost\"\nport = 1884").unwrap();

        let config = PlatoonConfig::load_with_env(
            Some(file.path()),
            env(&[
                ("PLATOON_BROKER__HOST", "broker.internal"),
                ("PLATOON_FOLLOWER__REFRESH_MS", "250"),
            ]),
        )
        .unwrap();

        assert_eq!(config.broker.host, "broker.internal");
        assert_eq!(config.broker.port, 1884);
        assert_eq!(config.follower.refresh_ms, 250);
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let result =
            PlatoonConfig::load_with_env(Some(Path::new("/nonexistent/platoon.toml")), no_env());
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_cli_overrides() {
        let config = PlatoonConfig::default()
            .with_overrides(ConfigOverrides {
                host: Some("127.0.0.1".into()),
                port: Some(1885),
                topic: None,
            })
            .unwrap();

        assert_eq!(config.broker.endpoint(), "127.0.0.1:1885");
        assert_eq!(config.topic, "platoon/speed");
    }

    #[test]
    fn test_validation() {
        let bad_port = PlatoonConfig::default().with_overrides(ConfigOverrides {
            port: Some(0),
            ..Default::default()
        });
        assert!(matches!(bad_port, Err(Error::Config(_))));

        let empty_topic = PlatoonConfig::default().with_overrides(ConfigOverrides {
            topic: Some("  ".into()),
            ..Default::default()
        });
        assert!(matches!(empty_topic, Err(Error::Config(_))));

        let mut short_keep_alive = PlatoonConfig::default();
        short_keep_alive.broker.keep_alive_secs = 1;
        assert!(short_keep_alive.validate().is_err());
    }

    #[test]
    fn test_client_id() {
        let mut broker = BrokerConfig::default();
        assert!(broker.client_id_for("leader").starts_with("platoon-leader-"));

        broker.client_id = Some("truck-7".into());
        assert_eq!(broker.client_id_for("follower"), "truck-7");
    }
}

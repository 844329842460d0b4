//! Layered runtime settings.
//!
//! Sources, lowest to highest precedence: built-in defaults, an optional TOML
//! file, `KINTO_*` environment variables (`__` separates nested keys, e.g.
//! `KINTO_BROKER__HOST`), then whatever the binary overrides from its CLI.

use std::path::Path;
use std::time::Duration;

use anyhow::{ensure, Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;

use kinto_types::DEFAULT_TOPIC;

use crate::feed::SimulatorOptions;
use crate::transport::BrokerOptions;

/// Longest accepted render or publish cadence.
pub const MAX_INTERVAL_MS: u64 = 60_000;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BrokerSettings {
    pub host: String,
    pub port: u16,
    /// Empty means "derive one from the process id".
    pub client_id: String,
    pub keep_alive_secs: u64,
    pub retry_delay_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SimulatorSettings {
    pub enabled: bool,
    pub interval_ms: u64,
    pub fall_probability: f64,
}

/// Everything the binaries need to wire a pipeline.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Settings {
    pub topic: String,
    pub tick_interval_ms: u64,
    pub log_filter: String,
    pub broker: BrokerSettings,
    pub simulator: SimulatorSettings,
}

impl Settings {
    /// Load defaults, then `path` (if any), then the `KINTO_` environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let env = Environment::with_prefix("KINTO")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true);
        Self::from_sources(path, Some(env))
    }

    /// Like [`Settings::load`] but with an explicit environment source.
    pub fn from_sources(path: Option<&Path>, env: Option<Environment>) -> Result<Self> {
        let mut builder = Config::builder()
            .set_default("topic", DEFAULT_TOPIC)?
            .set_default("tick_interval_ms", 500_i64)?
            .set_default("log_filter", "info")?
            .set_default("broker.host", "broker.hivemq.com")?
            .set_default("broker.port", 1883_i64)?
            .set_default("broker.client_id", "")?
            .set_default("broker.keep_alive_secs", 60_i64)?
            .set_default("broker.retry_delay_ms", 2000_i64)?
            .set_default("simulator.enabled", false)?
            .set_default("simulator.interval_ms", 500_i64)?
            .set_default("simulator.fall_probability", 0.01)?;

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).format(FileFormat::Toml));
        }
        if let Some(env) = env {
            builder = builder.add_source(env);
        }

        let settings: Settings = builder
            .build()
            .and_then(|c| c.try_deserialize())
            .with_context(|| match path {
                Some(path) => format!("Failed to load settings from {}", path.display()),
                None => "Failed to load settings".to_string(),
            })?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        ensure!(!self.topic.is_empty(), "topic must not be empty");
        ensure!(
            !self.topic.contains(['+', '#']),
            "topic must not contain wildcards: {}",
            self.topic
        );
        check_interval("tick_interval_ms", self.tick_interval_ms)?;
        check_interval("simulator.interval_ms", self.simulator.interval_ms)?;
        ensure!(!self.broker.host.is_empty(), "broker.host must not be empty");
        ensure!(
            (1..=u64::from(u16::MAX)).contains(&self.broker.keep_alive_secs),
            "broker.keep_alive_secs must be between 1 and {}, got {}",
            u16::MAX,
            self.broker.keep_alive_secs
        );
        ensure!(
            (0.0..=1.0).contains(&self.simulator.fall_probability),
            "simulator.fall_probability must be within [0, 1], got {}",
            self.simulator.fall_probability
        );
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn broker_options(&self) -> BrokerOptions {
        let defaults = BrokerOptions::default();
        BrokerOptions {
            host: self.broker.host.clone(),
            port: self.broker.port,
            client_id: if self.broker.client_id.is_empty() {
                defaults.client_id
            } else {
                self.broker.client_id.clone()
            },
            keep_alive: Duration::from_secs(self.broker.keep_alive_secs),
            retry_delay: Duration::from_millis(self.broker.retry_delay_ms),
        }
    }

    pub fn simulator_options(&self) -> SimulatorOptions {
        SimulatorOptions {
            interval: Duration::from_millis(self.simulator.interval_ms),
            fall_probability: self.simulator.fall_probability,
            enabled: self.simulator.enabled,
        }
    }
}

fn check_interval(key: &str, ms: u64) -> Result<()> {
    ensure!(
        (1..=MAX_INTERVAL_MS).contains(&ms),
        "{} must be between 1 and {} ms, got {}",
        key,
        MAX_INTERVAL_MS,
        ms
    );
    Ok(())
}

/// Convert a CLI duration into milliseconds for an interval setting.
pub fn interval_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn write_toml(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::from_sources(None, None).unwrap();
        assert_eq!(settings.topic, "kinto/wearable/v1/data");
        assert_eq!(settings.tick_interval(), Duration::from_millis(500));
        assert_eq!(settings.broker.host, "broker.hivemq.com");
        assert_eq!(settings.broker.port, 1883);
        assert!(!settings.simulator.enabled);
        assert_eq!(settings.simulator.fall_probability, 0.01);
        assert_eq!(settings.log_filter, "info");

        let broker = settings.broker_options();
        assert!(broker.client_id.starts_with("kinto-monitor-"));
        assert_eq!(broker.keep_alive, Duration::from_secs(60));
        assert_eq!(broker.retry_delay, Duration::from_millis(2000));
    }

    #[test]
    fn test_file_overrides_defaults() {
        let file = write_toml(
            r#"
topic = "ward/3/bed/12"
tick_interval_ms = 250

[broker]
host = "localhost"
client_id = "bedside"

[simulator]
enabled = true
fall_probability = 0.5
"#,
        );
        let settings = Settings::from_sources(Some(file.path()), None).unwrap();
        assert_eq!(settings.topic, "ward/3/bed/12");
        assert_eq!(settings.tick_interval_ms, 250);
        assert_eq!(settings.broker.host, "localhost");
        // Untouched keys keep their defaults
        assert_eq!(settings.broker.port, 1883);
        assert_eq!(settings.broker_options().client_id, "bedside");

        let sim = settings.simulator_options();
        assert!(sim.enabled);
        assert_eq!(sim.fall_probability, 0.5);
        assert_eq!(sim.interval, Duration::from_millis(500));
    }

    #[test]
    fn test_environment_overrides_file() {
        let file = write_toml("[broker]\nhost = \"localhost\"\n");
        let vars: HashMap<String, String> = [
            ("KINTO_BROKER__HOST", "mqtt.internal"),
            ("KINTO_BROKER__PORT", "8883"),
            ("KINTO_TICK_INTERVAL_MS", "1000"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        let env = Environment::with_prefix("KINTO")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
            .source(Some(vars));

        let settings = Settings::from_sources(Some(file.path()), Some(env)).unwrap();
        assert_eq!(settings.broker.host, "mqtt.internal");
        assert_eq!(settings.broker.port, 8883);
        assert_eq!(settings.tick_interval_ms, 1000);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        let err = Settings::from_sources(Some(&missing), None).unwrap_err();
        assert!(err.to_string().contains("nope.toml"));
    }

    #[test]
    fn test_validation() {
        let base = Settings::from_sources(None, None).unwrap();

        let mut s = base.clone();
        s.tick_interval_ms = 0;
        assert!(s.validate().is_err());

        let mut s = base.clone();
        s.simulator.interval_ms = MAX_INTERVAL_MS + 1;
        assert!(s.validate().is_err());

        let mut s = base.clone();
        s.simulator.fall_probability = 1.5;
        assert!(s.validate().is_err());

        let mut s = base.clone();
        s.topic = "kinto/#".to_string();
        assert!(s.validate().is_err());

        let mut s = base.clone();
        s.broker.keep_alive_secs = 0;
        assert!(s.validate().is_err());

        let mut s = base;
        s.simulator.fall_probability = 1.0;
        assert!(s.validate().is_ok());
    }

    #[test]
    fn test_invalid_file_value_rejected() {
        let file = write_toml("[simulator]\nfall_probability = -0.1\n");
        assert!(Settings::from_sources(Some(file.path()), None).is_err());
    }

    #[test]
    fn test_interval_ms() {
        assert_eq!(interval_ms(Duration::from_millis(750)), 750);
        assert_eq!(interval_ms(Duration::from_secs(2)), 2000);
    }
}

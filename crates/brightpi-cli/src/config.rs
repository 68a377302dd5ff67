//! Configuration management.

use anyhow::{ensure, Context, Result};
use brightpi_hw::registers::MAX_GAIN;
use brightpi_hw::{DEFAULT_ADDRESS, DEFAULT_BUS_DEVICE};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Configuration file used when `--config` is not given.
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    /// Bus configuration
    #[serde(default)]
    pub bus: BusConfig,

    /// Demo script configuration
    #[serde(default)]
    pub demo: DemoConfig,

    /// Effect defaults
    #[serde(default)]
    pub effects: EffectsConfig,
}

/// Register bus configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BusConfig {
    /// I2C device path
    #[serde(default = "default_device")]
    pub device: String,

    /// Slave address of the LED driver
    #[serde(default = "default_address")]
    pub address: u16,

    /// Use an in-memory register file instead of hardware
    #[serde(default)]
    pub simulate: bool,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            device: default_device(),
            address: default_address(),
            simulate: false,
        }
    }
}

/// Demo script configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DemoConfig {
    /// Gain set by the demo scripts (0-15)
    #[serde(default = "default_demo_gain")]
    pub gain: u8,

    /// How long the final state is held, in milliseconds
    #[serde(default = "default_hold")]
    pub hold_ms: u64,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            gain: default_demo_gain(),
            hold_ms: default_hold(),
        }
    }
}

/// Effect defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EffectsConfig {
    /// Number of effect cycles
    #[serde(default = "default_repetitions")]
    pub repetitions: u32,

    /// Frame period in milliseconds
    #[serde(default = "default_period")]
    pub period_ms: u64,
}

impl Default for EffectsConfig {
    fn default() -> Self {
        Self {
            repetitions: default_repetitions(),
            period_ms: default_period(),
        }
    }
}

// Default value functions
fn default_device() -> String {
    DEFAULT_BUS_DEVICE.to_string()
}

fn default_address() -> u16 {
    DEFAULT_ADDRESS
}

fn default_demo_gain() -> u8 {
    9
}

fn default_hold() -> u64 {
    2000
}

fn default_repetitions() -> u32 {
    5
}

fn default_period() -> u64 {
    200
}

impl Config {
    /// Loads configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content =
            std::fs::read_to_string(path.as_ref()).context("Failed to read configuration file")?;
        Self::parse(&content)
    }

    /// Parses configuration from TOML text.
    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("Failed to parse configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values the hardware or the effects cannot use.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.bus.address <= 0x7F,
            "bus.address 0x{:X} is not a 7-bit I2C address",
            self.bus.address
        );
        ensure!(
            self.demo.gain <= MAX_GAIN,
            "demo.gain must be between 0 and {}, got {}",
            MAX_GAIN,
            self.demo.gain
        );
        ensure!(
            self.effects.repetitions >= 1,
            "effects.repetitions must be at least 1"
        );
        Ok(())
    }

    /// Loads `path` if given, else the default file if present, else defaults.
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display())),
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => Self::load(DEFAULT_CONFIG_PATH),
            None => {
                debug!("No configuration file, using defaults");
                Ok(Self::default())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.bus.device, "/dev/i2c-1");
        assert_eq!(config.bus.address, 0x70);
        assert_eq!(config.demo.gain, 9);
    }

    #[test]
    fn test_partial_config() {
        let config = Config::parse(
            r#"
            [bus]
            address = 0x71
            simulate = true

            [effects]
            period_ms = 50
            "#,
        )
        .unwrap();
        assert_eq!(config.bus.address, 0x71);
        assert_eq!(config.bus.device, "/dev/i2c-1");
        assert!(config.bus.simulate);
        assert_eq!(config.effects.period_ms, 50);
        assert_eq!(config.effects.repetitions, 5);
    }

    #[test]
    fn test_invalid_config() {
        assert!(Config::parse("[bus]\naddress = \"seventy\"").is_err());
    }

    #[test]
    fn test_out_of_range_values_rejected() {
        let err = Config::parse("[demo]\ngain = 20").unwrap_err();
        assert!(err.to_string().contains("demo.gain"), "{}", err);
        assert!(Config::parse("[demo]\ngain = 15").is_ok());
        assert!(Config::parse("[effects]\nrepetitions = 0").is_err());
        assert!(Config::parse("[bus]\naddress = 0x80").is_err());
    }

    #[test]
    fn test_serialize_round_trip() {
        let config = Config::default();
        let text = toml::to_string_pretty(&config).unwrap();
        assert_eq!(Config::parse(&text).unwrap(), config);
    }

    #[test]
    fn test_missing_explicit_file() {
        assert!(Config::resolve(Some(Path::new("/nonexistent/brightpi.toml"))).is_err());
    }
}

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{path::Path, time::Duration};

/// Settings for the firmware programming tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlashConfig {
    /// Executable that is launched for every programming action
    pub program: String,
    /// Value passed to `-t`
    pub tool: String,
    /// Value passed to `-d`
    pub device: String,
    /// Baud rate used when checking that the tool port can be opened
    pub baud_rate: u32,
    /// Upper bound for a single tool action, in seconds
    pub timeout_secs: u64,
    /// Appended verbatim after the common arguments
    pub extra_args: Vec<String>,
}

impl Default for FlashConfig {
    fn default() -> Self {
        Self {
            program: "pymcuprog".to_string(),
            tool: "uart".to_string(),
            device: "attiny202".to_string(),
            baud_rate: 115_200,
            timeout_secs: 120,
            extra_args: Vec::new(),
        }
    }
}

/// Settings for the Modbus link to the probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    pub baud_rate: u32,
    pub station_id: u8,
    /// Coil written to start a test run
    pub command_coil: u16,
    /// Holding register that reports the test state
    pub state_register: u16,
    pub response_timeout_ms: u64,
    /// Delay between two reads of the state register
    pub poll_interval_ms: u64,
    /// Consecutive unanswered reads tolerated before a run is abandoned
    pub max_missed_polls: u32,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            baud_rate: 115_200,
            station_id: 1,
            command_coil: 0,
            state_register: 1,
            response_timeout_ms: 50,
            poll_interval_ms: 100,
            max_missed_polls: 50,
        }
    }
}

impl ProbeConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Interval of the pane poll tick
    pub poll_interval_ms: u64,
    /// Interval of the serial port refresh
    pub port_refresh_ms: u64,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 100,
            port_refresh_ms: 1000,
        }
    }
}

impl UiConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn port_refresh(&self) -> Duration {
        Duration::from_millis(self.port_refresh_ms)
    }
}

/// Whole bench configuration. Every field has a default, so an empty or
/// partial file is valid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchConfig {
    pub flash: FlashConfig,
    pub probe: ProbeConfig,
    pub ui: UiConfig,
}

impl BenchConfig {
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).context("invalid bench configuration")
    }

    /// Read the configuration file, or fall back to defaults when no path
    /// was given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            log::debug!("no configuration file given, using defaults");
            return Ok(Self::default());
        };

        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config = Self::from_toml(&text)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        log::info!("loaded configuration from {}", path.display());
        Ok(config)
    }
}

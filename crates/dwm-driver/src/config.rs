//! Driver configuration.

use std::path::Path;
use std::time::Duration;

use dwm_protocol::InterruptConfig;
use serde::{Deserialize, Serialize};

use crate::error::{DriverError, Result};
use crate::reader::DEFAULT_MAX_TRAILING_BYTES;

/// Settings for one driver session.
///
/// Every field has a default, so a YAML file only needs the values it
/// changes:
///
/// ```yaml
/// port: /dev/ttyACM0
/// read_timeout_ms: 10
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Serial port path.
    pub port: String,
    /// Baud rate.
    pub baud_rate: u32,
    /// Per-read timeout in milliseconds. A read that times out with no bytes
    /// marks the end of a response.
    pub read_timeout_ms: u64,
    /// Retry limit. Advisory: no driver operation reads it except
    /// [`with_retries`](crate::with_retries).
    pub max_retry_count: u32,
    /// How long to wait for the module to reboot after a hard reset.
    pub reboot_delay_ms: u64,
    /// Cap on bytes accepted after the data envelope of a response.
    pub max_trailing_bytes: usize,
    /// Interrupts enabled during initialisation.
    pub interrupts: InterruptConfig,
}

impl Default for DriverConfig {
    fn default() -> Self {
        DriverConfig {
            port: String::new(),
            baud_rate: 115_200,
            read_timeout_ms: 5,
            max_retry_count: 5,
            reboot_delay_ms: 2_500,
            max_trailing_bytes: DEFAULT_MAX_TRAILING_BYTES,
            interrupts: InterruptConfig::data_ready_only(),
        }
    }
}

impl DriverConfig {
    /// Default configuration for a given port.
    pub fn for_port(port: impl Into<String>) -> Self {
        DriverConfig {
            port: port.into(),
            ..Default::default()
        }
    }

    /// Parse a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: DriverConfig =
            serde_yaml::from_str(yaml).map_err(|e| DriverError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| DriverError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_yaml_str(&yaml)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        if self.baud_rate == 0 {
            return Err(DriverError::Config("baud_rate must be non-zero".to_string()));
        }
        if self.read_timeout_ms == 0 {
            return Err(DriverError::Config(
                "read_timeout_ms must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Per-read timeout.
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    /// Reboot wait after a hard reset.
    pub fn reboot_delay(&self) -> Duration {
        Duration::from_millis(self.reboot_delay_ms)
    }
}

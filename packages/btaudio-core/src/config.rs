//! Runtime configuration for the bridge core.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{BridgeError, BridgeResult};
use crate::mqtt::MqttConfig;
use crate::protocol_constants::DEFAULT_DISCOVERY_PREFIX;
use crate::supervisor::SupervisorConfig;

/// Configuration for the bridge.
///
/// All fields have defaults matching a Home Assistant add-on install.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Options document listing the configured devices.
    pub options_path: PathBuf,

    /// Seconds between state reconciliation passes.
    pub poll_interval_secs: u64,

    /// Home Assistant discovery prefix.
    pub discovery_prefix: String,

    /// Broker connection settings.
    pub mqtt: MqttConfig,

    /// Supervisor REST API settings.
    pub supervisor: SupervisorConfig,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            options_path: PathBuf::from("/data/options.json"),
            poll_interval_secs: 10,
            discovery_prefix: DEFAULT_DISCOVERY_PREFIX.to_string(),
            mqtt: MqttConfig::default(),
            supervisor: SupervisorConfig::default(),
        }
    }
}

impl BridgeConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Rejects values that would break the runtime loops.
    pub fn validate(&self) -> BridgeResult<()> {
        if self.poll_interval_secs == 0 {
            return Err(BridgeError::Configuration(
                "poll interval must be at least 1 second".into(),
            ));
        }
        if self.discovery_prefix.trim().is_empty() || self.discovery_prefix.contains(['+', '#']) {
            return Err(BridgeError::Configuration(format!(
                "invalid discovery prefix {:?}",
                self.discovery_prefix
            )));
        }
        self.mqtt.validate()?;
        Ok(())
    }
}

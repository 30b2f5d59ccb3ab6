//! Server configuration.
//!
//! Supports loading from YAML files with environment variable overrides.
//! Environment variable names follow the Home Assistant add-on conventions.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use btaudio_core::{BridgeConfig, MqttConfig, SupervisorConfig};
use serde::Deserialize;

/// Server configuration loaded from YAML with environment overrides.
#[derive(Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Broker host name.
    /// Override: `MQTT_HOST`
    pub mqtt_host: String,

    /// Broker port.
    /// Override: `MQTT_PORT`
    pub mqtt_port: u16,

    /// Broker user name.
    /// Override: `MQTT_USER`
    pub mqtt_user: Option<String>,

    /// Broker password.
    /// Override: `MQTT_PASSWORD`
    pub mqtt_password: Option<String>,

    /// Supervisor API base URL.
    /// Override: `SUPERVISOR_URL`
    pub supervisor_url: String,

    /// Supervisor bearer token.
    /// Override: `SUPERVISOR_TOKEN`
    pub supervisor_token: Option<String>,

    /// Options document listing the devices.
    pub options_path: PathBuf,

    /// Seconds between state polls.
    /// Override: `BTAUDIO_POLL_INTERVAL`
    pub poll_interval: u64,

    /// Home Assistant discovery prefix.
    pub discovery_prefix: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        let core = BridgeConfig::default();
        Self {
            mqtt_host: core.mqtt.host,
            mqtt_port: core.mqtt.port,
            mqtt_user: None,
            mqtt_password: None,
            supervisor_url: core.supervisor.base_url,
            supervisor_token: None,
            options_path: core.options_path,
            poll_interval: core.poll_interval_secs,
            discovery_prefix: core.discovery_prefix,
        }
    }
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let masked = |secret: &Option<String>| secret.as_ref().map(|_| "********");
        f.debug_struct("ServerConfig")
            .field("mqtt_host", &self.mqtt_host)
            .field("mqtt_port", &self.mqtt_port)
            .field("mqtt_user", &self.mqtt_user)
            .field("mqtt_password", &masked(&self.mqtt_password))
            .field("supervisor_url", &self.supervisor_url)
            .field("supervisor_token", &masked(&self.supervisor_token))
            .field("options_path", &self.options_path)
            .field("poll_interval", &self.poll_interval)
            .field("discovery_prefix", &self.discovery_prefix)
            .finish()
    }
}

impl ServerConfig {
    /// Loads configuration from a YAML file, then applies environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = if let Some(path) = path {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?
        } else {
            Self::default()
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Applies overrides looked up by environment variable name.
    ///
    /// Empty values are ignored; unparsable numbers are logged and ignored.
    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(host) = var("MQTT_HOST") {
            self.mqtt_host = host;
        }
        if let Some(val) = var("MQTT_PORT") {
            match val.parse() {
                Ok(port) => self.mqtt_port = port,
                Err(_) => log::warn!("Ignoring invalid MQTT_PORT: {}", val),
            }
        }
        if let Some(user) = var("MQTT_USER") {
            self.mqtt_user = Some(user);
        }
        if let Some(password) = var("MQTT_PASSWORD") {
            self.mqtt_password = Some(password);
        }
        if let Some(url) = var("SUPERVISOR_URL") {
            self.supervisor_url = url;
        }
        if let Some(token) = var("SUPERVISOR_TOKEN") {
            self.supervisor_token = Some(token);
        }
        if let Some(val) = var("BTAUDIO_POLL_INTERVAL") {
            match val.parse() {
                Ok(secs) => self.poll_interval = secs,
                Err(_) => log::warn!("Ignoring invalid BTAUDIO_POLL_INTERVAL: {}", val),
            }
        }

        // Note: BTAUDIO_OPTIONS_PATH is handled by clap via #[arg(env = ...)] in main.rs
    }

    /// Converts to btaudio-core's config type.
    pub fn to_core_config(&self) -> BridgeConfig {
        BridgeConfig {
            options_path: self.options_path.clone(),
            poll_interval_secs: self.poll_interval,
            discovery_prefix: self.discovery_prefix.clone(),
            mqtt: MqttConfig {
                host: self.mqtt_host.clone(),
                port: self.mqtt_port,
                username: self.mqtt_user.clone(),
                password: self.mqtt_password.clone(),
                ..MqttConfig::default()
            },
            supervisor: SupervisorConfig {
                base_url: self.supervisor_url.clone(),
                token: self.supervisor_token.clone(),
            },
        }
    }
}

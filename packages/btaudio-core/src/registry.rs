//! Loads configured speakers from the add-on options document.
//!
//! Loading never fails: every problem is logged and degrades to fewer (or
//! zero) speakers. Deciding whether zero speakers is fatal is left to the
//! caller.

use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::device::DeviceAddress;
use crate::mqtt::topics::is_topic_safe;
use crate::speaker::{DeviceBackends, Speaker};

/// Errors that can occur while reading the options document.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The file is not valid JSON.
    #[error("invalid JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

pub type RegistryResult<T> = Result<T, RegistryError>;

#[derive(Debug, Default, Deserialize)]
struct OptionsDocument {
    #[serde(default)]
    devices: Option<Vec<serde_json::Value>>,
}

/// One `devices[]` entry. Both fields must be present for the entry to count.
#[derive(Debug, Deserialize)]
struct DeviceEntry {
    mac_address: Option<String>,
    friendly_name: Option<String>,
}

/// Builds [`Speaker`]s from device descriptors.
pub struct DeviceRegistry {
    backends: DeviceBackends,
}

impl DeviceRegistry {
    pub fn new(backends: DeviceBackends) -> Self {
        Self { backends }
    }

    /// Reads the options file at `path` and builds one speaker per valid entry.
    pub fn load(&self, path: &Path) -> Vec<Speaker> {
        log::info!("[Registry] Loading device configuration from {}", path.display());

        match read_options(path) {
            Ok(contents) => self.from_document(&contents),
            Err(RegistryError::Read { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                log::error!(
                    "[Registry] Configuration file not found at {}. Did you set options?",
                    path.display()
                );
                Vec::new()
            }
            Err(e) => {
                log::error!("[Registry] Error loading configuration: {}", e);
                Vec::new()
            }
        }
    }

    /// Same as [`load`](Self::load) for an in-memory document.
    pub fn from_document(&self, document: &str) -> Vec<Speaker> {
        let entries = match parse_document(document) {
            Ok(entries) => entries,
            Err(e) => {
                log::error!("[Registry] Could not decode options document: {}", e);
                return Vec::new();
            }
        };

        if entries.is_empty() {
            log::warn!(
                "[Registry] No devices configured. Add devices in the add-on 'Configuration' tab."
            );
            return Vec::new();
        }

        let mut slugs = HashSet::new();
        let mut speakers = Vec::with_capacity(entries.len());

        for raw in entries {
            let Some((address, name)) = validate_entry(&raw) else {
                continue;
            };

            let speaker = Speaker::new(address, name, self.backends.clone());
            if !is_topic_safe(speaker.slug()) {
                log::warn!(
                    "[Registry] Skipping {} ({}): name cannot be used in a topic",
                    speaker.display_name(),
                    speaker.address()
                );
                continue;
            }
            if !slugs.insert(speaker.slug().to_string()) {
                log::warn!(
                    "[Registry] Skipping {} ({}): slug '{}' is already in use",
                    speaker.display_name(),
                    speaker.address(),
                    speaker.slug()
                );
                continue;
            }
            speakers.push(speaker);
        }

        log::info!("[Registry] Loaded {} speaker(s)", speakers.len());
        speakers
    }
}

fn read_options(path: &Path) -> RegistryResult<String> {
    std::fs::read_to_string(path).map_err(|source| RegistryError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_document(document: &str) -> RegistryResult<Vec<serde_json::Value>> {
    let parsed: OptionsDocument = serde_json::from_str(document)?;
    Ok(parsed.devices.unwrap_or_default())
}

fn validate_entry(raw: &serde_json::Value) -> Option<(DeviceAddress, String)> {
    let entry = match DeviceEntry::deserialize(raw) {
        Ok(DeviceEntry {
            mac_address: Some(mac),
            friendly_name: Some(name),
        }) => (mac, name),
        _ => {
            log::warn!("[Registry] Skipping invalid device config: {}", raw);
            return None;
        }
    };

    match DeviceAddress::parse(&entry.0) {
        Ok(address) => Some((address, entry.1)),
        Err(e) => {
            log::warn!("[Registry] Skipping device '{}': {}", entry.1, e);
            None
        }
    }
}

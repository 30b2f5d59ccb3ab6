//! Bluetooth device identity and polled audio status.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

use crate::protocol_constants::{SINK_PREFIX, SINK_SUFFIX};

/// Number of octets in a Bluetooth device address.
const ADDRESS_OCTETS: usize = 6;

/// Error returned when a configured address is not a valid Bluetooth address.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid Bluetooth address: {0:?}")]
pub struct InvalidAddress(pub String);

/// Bluetooth device address in canonical `AA:BB:CC:DD:EE:FF` form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeviceAddress(String);

impl DeviceAddress {
    /// Parses and normalizes an address.
    ///
    /// Accepts `:` or `-` separators in any letter case; the stored form is
    /// uppercase and colon-delimited.
    pub fn parse(raw: &str) -> Result<Self, InvalidAddress> {
        let normalized = raw.trim().to_uppercase().replace('-', ":");
        let octets: Vec<&str> = normalized.split(':').collect();

        let valid = octets.len() == ADDRESS_OCTETS
            && octets
                .iter()
                .all(|o| o.len() == 2 && o.chars().all(|c| c.is_ascii_hexdigit()));

        if valid {
            Ok(Self(normalized))
        } else {
            Err(InvalidAddress(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// PulseAudio sink name BlueZ registers for this device's A2DP profile.
    #[must_use]
    pub fn sink_id(&self) -> String {
        format!("{}.{}.{}", SINK_PREFIX, self.0.replace(':', "_"), SINK_SUFFIX)
    }
}

impl FromStr for DeviceAddress {
    type Err = InvalidAddress;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for DeviceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Live audio state of a speaker, recomputed on every poll.
///
/// Volume and mute are only meaningful while connected; a disconnected
/// status always reports zero volume, unmuted and not default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeviceStatus {
    pub connected: bool,
    #[serde(rename = "volume")]
    pub volume_percent: i32,
    pub muted: bool,
    pub is_default_sink: bool,
}

impl DeviceStatus {
    /// Status of a device with no active sink.
    #[must_use]
    pub fn disconnected() -> Self {
        Self::default()
    }
}

/// JSON document published on a speaker's `status` topic.
#[derive(Debug, Serialize)]
pub struct StatusReport<'a> {
    #[serde(flatten)]
    pub status: DeviceStatus,
    pub sink_name: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_is_uppercased() {
        let addr = DeviceAddress::parse("aa:bb:cc:dd:ee:ff").unwrap();
        assert_eq!(addr.as_str(), "AA:BB:CC:DD:EE:FF");
    }

    #[test]
    fn hyphenated_address_is_normalized() {
        let addr: DeviceAddress = " 00-1a-7d-da-71-13 ".parse().unwrap();
        assert_eq!(addr.to_string(), "00:1A:7D:DA:71:13");
    }

    #[test]
    fn malformed_addresses_are_rejected() {
        for raw in [
            "",
            "AA:BB:CC:DD:EE",
            "AA:BB:CC:DD:EE:FF:00",
            "AA:BB:CC:DD:EE:GG",
            "AAA:BB:CC:DD:EE:F",
            "AA:BB:CC:DD:EE:FF; reboot",
        ] {
            assert!(DeviceAddress::parse(raw).is_err(), "accepted {raw:?}");
        }
    }

    #[test]
    fn sink_id_is_derived_from_address() {
        let addr = DeviceAddress::parse("00:1A:7D:DA:71:13").unwrap();
        assert_eq!(addr.sink_id(), "bluez_sink.00_1A_7D_DA_71_13.a2dp_sink");
    }

    #[test]
    fn disconnected_status_is_neutral() {
        let status = DeviceStatus::disconnected();
        assert!(!status.connected);
        assert_eq!(status.volume_percent, 0);
        assert!(!status.muted);
        assert!(!status.is_default_sink);
    }

    #[test]
    fn status_report_uses_published_field_names() {
        let report = StatusReport {
            status: DeviceStatus {
                connected: true,
                volume_percent: 42,
                muted: false,
                is_default_sink: true,
            },
            sink_name: "bluez_sink.AA_BB_CC_DD_EE_FF.a2dp_sink",
        };

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "connected": true,
                "volume": 42,
                "muted": false,
                "is_default_sink": true,
                "sink_name": "bluez_sink.AA_BB_CC_DD_EE_FF.a2dp_sink",
            })
        );
    }
}

//! Fixed protocol constants that should NOT be changed.
//!
//! These values are defined by the topic schema consumers already rely on,
//! by Home Assistant's MQTT discovery conventions, or by the external tools
//! the bridge drives. Changing them breaks existing installations.

// ─────────────────────────────────────────────────────────────────────────────
// Topic Schema
// ─────────────────────────────────────────────────────────────────────────────

/// Root topic for every speaker this bridge exposes.
pub const BASE_TOPIC: &str = "btaudio2mqtt";

/// Literal segment separating a speaker prefix from its command name.
pub const SET_SEGMENT: &str = "set";

/// Default Home Assistant MQTT discovery prefix.
pub const DEFAULT_DISCOVERY_PREFIX: &str = "homeassistant";

/// Payload used for "on" states and accepted (case-insensitively) for commands.
pub const PAYLOAD_ON: &str = "ON";

/// Payload used for "off" states.
pub const PAYLOAD_OFF: &str = "OFF";

/// Exact payload a button entity sends when pressed.
pub const PAYLOAD_PRESS: &str = "PRESS";

// ─────────────────────────────────────────────────────────────────────────────
// Device Identity
// ─────────────────────────────────────────────────────────────────────────────

/// Manufacturer reported in the shared discovery device descriptor.
pub const DEVICE_MANUFACTURER: &str = "Bluetooth Audio MQTT Bridge";

/// Prefix of the PulseAudio sink created by BlueZ for an A2DP device.
pub const SINK_PREFIX: &str = "bluez_sink";

/// Suffix of the PulseAudio sink created by BlueZ for an A2DP device.
pub const SINK_SUFFIX: &str = "a2dp_sink";

/// Add-on restarted after the default sink changes so it reopens its stream.
pub const PLAYER_ADDON_SLUG: &str = "core_vlc";

// ─────────────────────────────────────────────────────────────────────────────
// External Tools
// ─────────────────────────────────────────────────────────────────────────────

/// PulseAudio command-line client.
pub const PACTL_PROGRAM: &str = "pactl";

/// BlueZ interactive control tool.
pub const BLUETOOTHCTL_PROGRAM: &str = "bluetoothctl";

/// Hard timeout for a single bluetoothctl session (seconds).
pub const BLUETOOTH_TIMEOUT_SECS: u64 = 10;

/// Timeout for pactl queries and mutations (seconds).
pub const AUDIO_TIMEOUT_SECS: u64 = 5;

// ─────────────────────────────────────────────────────────────────────────────
// HTTP / MQTT
// ─────────────────────────────────────────────────────────────────────────────

/// Timeout for Supervisor REST calls (seconds).
pub const HTTP_TIMEOUT_SECS: u64 = 5;

/// MQTT keep-alive interval (seconds).
pub const MQTT_KEEP_ALIVE_SECS: u64 = 60;

/// Capacity of the MQTT client's outgoing request queue.
pub const MQTT_REQUEST_CAPACITY: usize = 100;

/// Delay before polling the MQTT event loop again after a connection error (seconds).
pub const MQTT_RECONNECT_DELAY_SECS: u64 = 5;

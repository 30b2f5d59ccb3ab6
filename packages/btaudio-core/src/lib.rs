//! btaudio-core - shared library for the Bluetooth audio to MQTT bridge.
//!
//! The crate exposes a set of Bluetooth A2DP speakers as Home Assistant
//! entities over MQTT: it announces them through MQTT discovery, publishes
//! their polled audio state, and turns inbound commands into `pactl`,
//! `bluetoothctl` and Supervisor API calls.
//!
//! # Architecture
//!
//! - [`shell`]: Typed tool invocations and the audio / Bluetooth adapters
//! - [`supervisor`]: Home Assistant Supervisor REST calls
//! - [`device`]: Bluetooth addresses and polled device status
//! - [`speaker`]: Per-device aggregate and its control operations
//! - [`registry`]: Loads speakers from the options document
//! - [`mqtt`]: Topic schema, publisher seam and the broker connection
//! - [`services`]: Discovery, state reconciliation and command routing
//! - [`bootstrap`]: Composition root
//! - [`error`]: Centralized error types
//!
//! # Abstraction Traits
//!
//! - [`CommandRunner`](shell::CommandRunner): Running external tools
//! - [`AudioControl`](shell::AudioControl): Sink queries and mutations
//! - [`BluetoothControl`](shell::BluetoothControl): Bluetooth sessions
//! - [`HomeAutomationApi`](supervisor::HomeAutomationApi): Supervisor side effects
//! - [`BusPublisher`](mqtt::BusPublisher): Publishing and subscribing

#![warn(clippy::all)]

pub mod bootstrap;
pub mod config;
pub mod device;
pub mod error;
pub mod mqtt;
pub mod protocol_constants;
pub mod registry;
pub mod services;
pub mod shell;
pub mod speaker;
pub mod supervisor;

#[cfg(test)]
pub(crate) mod test_fixtures;

// Re-export commonly used types at the crate root
pub use config::BridgeConfig;
pub use device::{DeviceAddress, DeviceStatus, InvalidAddress};
pub use error::{BridgeError, BridgeResult, ErrorCode};
pub use mqtt::{BusError, BusHandle, BusPublisher, MqttConfig, OutboundMessage};
pub use registry::DeviceRegistry;
pub use speaker::{DeviceBackends, Speaker};
pub use supervisor::SupervisorConfig;

// Re-export service types
pub use services::{
    BridgeSession, CommandKind, CommandRouter, DiscoveryPublisher, ReconcileSummary,
    RouteOutcome, SpeakerCommand, StateReconciler,
};

// Re-export bootstrap types
pub use bootstrap::{bootstrap_services, BootstrappedServices};

//! Shared test doubles and fixtures.
//!
//! Mocks record every call so tests can assert exactly which device
//! operations a code path performed.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::device::{DeviceAddress, DeviceStatus};
use crate::mqtt::{BusError, BusPublisher, BusResult, OutboundMessage};
use crate::shell::{
    AudioControl, BluetoothAction, BluetoothControl, CommandOutput, CommandRunner, Invocation,
    ShellError, ShellResult,
};
use crate::speaker::{DeviceBackends, Speaker};
use crate::supervisor::HomeAutomationApi;

pub const ADDRESS: &str = "00:1A:7D:DA:71:13";
pub const SINK_ID: &str = "bluez_sink.00_1A_7D_DA_71_13.a2dp_sink";
pub const OTHER_ADDRESS: &str = "AA:BB:CC:DD:EE:FF";
pub const OTHER_SINK_ID: &str = "bluez_sink.AA_BB_CC_DD_EE_FF.a2dp_sink";

/// `pactl list short sinks` with one Bluetooth sink and one ALSA sink.
pub const PACTL_SINKS: &str = "0\talsa_output.pci-0000_00_1b.0.analog-stereo\tmodule-alsa-card.c\ts16le 2ch 44100Hz\tSUSPENDED
3\tbluez_sink.00_1A_7D_DA_71_13.a2dp_sink\tmodule-bluez5-device.c\ts16le 2ch 44100Hz\tRUNNING
";

/// `pactl get-sink-volume` for a stereo sink at 65%.
pub const PACTL_VOLUME_65: &str = "Volume: front-left: 42598 /  65% / -11.22 dB,   front-right: 42598 /  65% / -11.22 dB
        balance 0.00";

// ─────────────────────────────────────────────────────────────────────────────
// Command Runner
// ─────────────────────────────────────────────────────────────────────────────

enum Rule {
    Respond(CommandOutput),
    SpawnFail,
    Timeout,
}

/// Runner that answers invocations from a script instead of spawning processes.
///
/// Rules match when the invocation's display form contains the key; the
/// first matching rule wins. Unmatched invocations succeed with no output.
#[derive(Default)]
pub struct ScriptedRunner {
    rules: Mutex<Vec<(String, Rule)>>,
    calls: Mutex<Vec<Invocation>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, key: &str, output: CommandOutput) {
        self.rules.lock().push((key.to_string(), Rule::Respond(output)));
    }

    pub fn fail_to_spawn(&self, key: &str) {
        self.rules.lock().push((key.to_string(), Rule::SpawnFail));
    }

    pub fn time_out(&self, key: &str) {
        self.rules.lock().push((key.to_string(), Rule::Timeout));
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().iter().map(ToString::to_string).collect()
    }

    pub fn stdin_scripts(&self) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .filter_map(|i| i.stdin_script().map(str::to_string))
            .collect()
    }

    pub fn timeouts(&self) -> Vec<Duration> {
        self.calls.lock().iter().map(Invocation::timeout).collect()
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, invocation: &Invocation) -> ShellResult<CommandOutput> {
        self.calls.lock().push(invocation.clone());

        let line = invocation.to_string();
        let rules = self.rules.lock();
        match rules.iter().find(|(key, _)| line.contains(key.as_str())) {
            Some((_, Rule::Respond(output))) => Ok(output.clone()),
            Some((_, Rule::SpawnFail)) => Err(ShellError::Spawn {
                program: invocation.program().to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "not installed"),
            }),
            Some((_, Rule::Timeout)) => Err(ShellError::Timeout {
                program: invocation.program().to_string(),
                secs: invocation.timeout().as_secs(),
            }),
            None => Ok(CommandOutput::ok("")),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Device Backends
// ─────────────────────────────────────────────────────────────────────────────

/// Audio backend with per-sink canned statuses.
#[derive(Default)]
pub struct MockAudio {
    statuses: Mutex<HashMap<String, DeviceStatus>>,
    failing: Mutex<Vec<String>>,
    queries: Mutex<Vec<String>>,
    volumes: Mutex<Vec<(String, i32)>>,
    mutes: Mutex<Vec<(String, bool)>>,
    default_sinks: Mutex<Vec<String>>,
}

impl MockAudio {
    pub fn set_status(&self, sink_id: &str, status: DeviceStatus) {
        self.statuses.lock().insert(sink_id.to_string(), status);
    }

    /// Makes status queries for `sink_id` fail as if `pactl` were missing.
    pub fn fail_queries_for(&self, sink_id: &str) {
        self.failing.lock().push(sink_id.to_string());
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().clone()
    }

    pub fn volumes(&self) -> Vec<(String, i32)> {
        self.volumes.lock().clone()
    }

    pub fn mutes(&self) -> Vec<(String, bool)> {
        self.mutes.lock().clone()
    }

    pub fn default_sinks(&self) -> Vec<String> {
        self.default_sinks.lock().clone()
    }
}

#[async_trait]
impl AudioControl for MockAudio {
    async fn query_audio_state(&self, sink_id: &str) -> ShellResult<DeviceStatus> {
        self.queries.lock().push(sink_id.to_string());
        if self.failing.lock().iter().any(|s| s == sink_id) {
            return Err(ShellError::Spawn {
                program: "pactl".into(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "not installed"),
            });
        }
        Ok(self
            .statuses
            .lock()
            .get(sink_id)
            .copied()
            .unwrap_or_else(DeviceStatus::disconnected))
    }

    async fn set_volume(&self, sink_id: &str, level: i32) {
        self.volumes.lock().push((sink_id.to_string(), level));
    }

    async fn set_mute(&self, sink_id: &str, on: bool) {
        self.mutes.lock().push((sink_id.to_string(), on));
    }

    async fn set_default_sink(&self, sink_id: &str) {
        self.default_sinks.lock().push(sink_id.to_string());
    }
}

/// Bluetooth backend recording every action.
#[derive(Default)]
pub struct MockBluetooth {
    actions: Mutex<Vec<(BluetoothAction, String)>>,
    output: Mutex<String>,
}

impl MockBluetooth {
    pub fn set_output(&self, output: &str) {
        *self.output.lock() = output.to_string();
    }

    pub fn actions(&self) -> Vec<(BluetoothAction, String)> {
        self.actions.lock().clone()
    }
}

#[async_trait]
impl BluetoothControl for MockBluetooth {
    async fn run(&self, action: BluetoothAction, address: &DeviceAddress) -> String {
        self.actions.lock().push((action, address.to_string()));
        self.output.lock().clone()
    }
}

/// Home-automation backend recording every call.
#[derive(Default)]
pub struct MockHome {
    calls: Mutex<Vec<String>>,
}

impl MockHome {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl HomeAutomationApi for MockHome {
    async fn reload_audio(&self) {
        self.calls.lock().push("reload_audio".to_string());
    }

    async fn restart_addon(&self, slug: &str) {
        self.calls.lock().push(format!("restart_addon:{}", slug));
    }
}

/// Mock backends plus typed handles for assertions.
pub struct MockBackends {
    pub audio: Arc<MockAudio>,
    pub bluetooth: Arc<MockBluetooth>,
    pub home: Arc<MockHome>,
}

impl MockBackends {
    pub fn new() -> Self {
        Self {
            audio: Arc::new(MockAudio::default()),
            bluetooth: Arc::new(MockBluetooth::default()),
            home: Arc::new(MockHome::default()),
        }
    }

    pub fn backends(&self) -> DeviceBackends {
        DeviceBackends {
            audio: Arc::clone(&self.audio) as Arc<dyn AudioControl>,
            bluetooth: Arc::clone(&self.bluetooth) as Arc<dyn BluetoothControl>,
            home: Arc::clone(&self.home) as Arc<dyn HomeAutomationApi>,
        }
    }
}

/// Builds a speaker wired to `mocks`.
pub fn speaker(mocks: &MockBackends, address: &str, name: &str) -> Speaker {
    let address = DeviceAddress::parse(address).expect("fixture address is valid");
    Speaker::new(address, name, mocks.backends())
}

// ─────────────────────────────────────────────────────────────────────────────
// Bus
// ─────────────────────────────────────────────────────────────────────────────

/// Bus publisher that records messages and can reject selected topics.
#[derive(Default)]
pub struct MockBus {
    published: Mutex<Vec<OutboundMessage>>,
    subscriptions: Mutex<Vec<String>>,
    rejected: Mutex<Vec<String>>,
    queued: Mutex<Vec<String>>,
}

impl MockBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects every publish whose topic contains `pattern`.
    pub fn reject_topics_containing(&self, pattern: &str) {
        self.rejected.lock().push(pattern.to_string());
    }

    pub fn published(&self) -> Vec<OutboundMessage> {
        self.published.lock().clone()
    }

    pub fn subscriptions(&self) -> Vec<String> {
        self.subscriptions.lock().clone()
    }

    /// Topics that went through [`BusPublisher::publish_queued`].
    pub fn queued_topics(&self) -> Vec<String> {
        self.queued.lock().clone()
    }

    pub fn topics(&self) -> Vec<String> {
        self.published.lock().iter().map(|m| m.topic.clone()).collect()
    }

    pub fn payload_for(&self, topic: &str) -> Option<String> {
        self.published
            .lock()
            .iter()
            .rev()
            .find(|m| m.topic == topic)
            .map(|m| m.payload.clone())
    }
}

#[async_trait]
impl BusPublisher for MockBus {
    async fn publish(&self, message: OutboundMessage) -> BusResult<()> {
        if self.rejected.lock().iter().any(|p| message.topic.contains(p.as_str())) {
            return Err(BusError::NotConnected);
        }
        self.published.lock().push(message);
        Ok(())
    }

    async fn publish_queued(&self, message: OutboundMessage) -> BusResult<()> {
        let topic = message.topic.clone();
        self.publish(message).await?;
        self.queued.lock().push(topic);
        Ok(())
    }

    async fn subscribe(&self, filter: &str) -> BusResult<()> {
        self.subscriptions.lock().push(filter.to_string());
        Ok(())
    }
}

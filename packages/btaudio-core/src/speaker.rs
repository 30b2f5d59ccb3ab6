//! Per-device aggregate: identity, derived names and control operations.

use std::fmt;
use std::sync::Arc;

use crate::device::{DeviceAddress, DeviceStatus};
use crate::mqtt::topics::{self, StateTopic};
use crate::protocol_constants::PLAYER_ADDON_SLUG;
use crate::shell::{AudioControl, BluetoothAction, BluetoothControl, ShellResult};
use crate::supervisor::HomeAutomationApi;

/// The external collaborators every speaker operation is built on.
///
/// Shared by all speakers; each backend is stateless.
#[derive(Clone)]
pub struct DeviceBackends {
    pub audio: Arc<dyn AudioControl>,
    pub bluetooth: Arc<dyn BluetoothControl>,
    pub home: Arc<dyn HomeAutomationApi>,
}

/// Lowercases a display name and replaces spaces with underscores.
#[must_use]
pub fn slugify(display_name: &str) -> String {
    display_name.to_lowercase().replace(' ', "_")
}

/// A configured Bluetooth speaker.
///
/// Constructed once at startup and never mutated.
pub struct Speaker {
    address: DeviceAddress,
    display_name: String,
    slug: String,
    sink_id: String,
    topic_prefix: String,
    entity_id_prefix: String,
    backends: DeviceBackends,
}

impl Speaker {
    pub fn new(
        address: DeviceAddress,
        display_name: impl Into<String>,
        backends: DeviceBackends,
    ) -> Self {
        let display_name = display_name.into();
        let slug = slugify(&display_name);
        let speaker = Self {
            sink_id: address.sink_id(),
            topic_prefix: topics::topic_prefix(&slug),
            entity_id_prefix: topics::entity_id_prefix(&slug),
            address,
            display_name,
            slug,
            backends,
        };

        log::info!(
            "Initializing speaker: {} ({}) on topic {}",
            speaker.display_name,
            speaker.address,
            speaker.topic_prefix
        );
        speaker
    }

    pub fn address(&self) -> &DeviceAddress {
        &self.address
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }

    pub fn sink_id(&self) -> &str {
        &self.sink_id
    }

    pub fn topic_prefix(&self) -> &str {
        &self.topic_prefix
    }

    pub fn entity_id_prefix(&self) -> &str {
        &self.entity_id_prefix
    }

    #[must_use]
    pub fn state_topic(&self, topic: StateTopic) -> String {
        topics::state_topic(&self.topic_prefix, topic)
    }

    #[must_use]
    pub fn command_topic(&self, command: &str) -> String {
        topics::command_topic(&self.topic_prefix, command)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Reads the speaker's live audio status.
    pub async fn get_status(&self) -> ShellResult<DeviceStatus> {
        self.backends.audio.query_audio_state(&self.sink_id).await
    }

    /// Sets the volume in percent. The level is passed through unclamped.
    pub async fn set_volume(&self, level: i32) {
        log::info!("[{}] Setting volume to {}%", self.slug, level);
        self.backends.audio.set_volume(&self.sink_id, level).await;
    }

    pub async fn set_mute(&self, on: bool) {
        log::info!("[{}] Setting mute to {}", self.slug, u8::from(on));
        self.backends.audio.set_mute(&self.sink_id, on).await;
    }

    /// Makes this speaker the default sink, then asks the host to reload
    /// audio and restart the player add-on so they pick up the change.
    pub async fn set_as_default_sink(&self) {
        log::info!("[{}] Setting as default sink", self.slug);
        self.backends.audio.set_default_sink(&self.sink_id).await;
        self.backends.home.reload_audio().await;
        self.backends.home.restart_addon(PLAYER_ADDON_SLUG).await;
    }

    pub async fn connect(&self) {
        log::info!("[{}] Connecting...", self.slug);
        self.bluetooth(BluetoothAction::Connect).await;
    }

    pub async fn disconnect(&self) {
        log::info!("[{}] Disconnecting...", self.slug);
        self.bluetooth(BluetoothAction::Disconnect).await;
    }

    /// Pairs, then trusts regardless of whether pairing succeeded.
    pub async fn pair(&self) {
        log::info!("[{}] Pairing and trusting...", self.slug);
        self.bluetooth(BluetoothAction::Pair).await;
        self.bluetooth(BluetoothAction::Trust).await;
    }

    /// Unpairs and forgets the device.
    pub async fn unpair(&self) {
        log::info!("[{}] Unpairing (removing)...", self.slug);
        self.bluetooth(BluetoothAction::Remove).await;
    }

    async fn bluetooth(&self, action: BluetoothAction) -> String {
        self.backends.bluetooth.run(action, &self.address).await
    }
}

impl fmt::Debug for Speaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Speaker")
            .field("address", &self.address)
            .field("display_name", &self.display_name)
            .field("slug", &self.slug)
            .field("sink_id", &self.sink_id)
            .finish_non_exhaustive()
    }
}

//! Home Assistant MQTT discovery documents.
//!
//! Each speaker is announced as one device grouping seven entities. The
//! documents depend only on the speaker's identity, so republishing them on
//! every reconnect is idempotent.

use std::sync::Arc;

use serde::Serialize;

use crate::mqtt::topics::{self, StateTopic};
use crate::mqtt::{BusPublisher, OutboundMessage};
use crate::protocol_constants::{DEVICE_MANUFACTURER, PAYLOAD_OFF, PAYLOAD_ON, PAYLOAD_PRESS};
use crate::speaker::Speaker;

/// Device descriptor shared by every entity of one speaker.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DeviceDescriptor {
    pub identifiers: Vec<String>,
    pub name: String,
    pub manufacturer: &'static str,
    pub model: String,
}

impl DeviceDescriptor {
    fn for_speaker(speaker: &Speaker) -> Self {
        Self {
            identifiers: vec![speaker.entity_id_prefix().to_string()],
            name: speaker.display_name().to_string(),
            manufacturer: DEVICE_MANUFACTURER,
            model: format!("PulseAudio Control ({})", speaker.address()),
        }
    }
}

/// One entity configuration document.
///
/// Fields not used by an entity's component are omitted from the JSON.
#[derive(Debug, Clone, Serialize)]
pub struct EntityConfig {
    pub name: &'static str,
    pub unique_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command_topic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_topic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload_on: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload_off: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload_press: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_class: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json_attributes_topic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_category: Option<&'static str>,
    pub icon: &'static str,
    pub device: DeviceDescriptor,
}

impl EntityConfig {
    fn new(speaker: &Speaker, kind: &str, name: &'static str, icon: &'static str) -> Self {
        Self {
            name,
            unique_id: format!("{}_{}", speaker.entity_id_prefix(), kind),
            command_topic: None,
            state_topic: None,
            min: None,
            max: None,
            step: None,
            payload_on: None,
            payload_off: None,
            payload_press: None,
            device_class: None,
            json_attributes_topic: None,
            entity_category: None,
            icon,
            device: DeviceDescriptor::for_speaker(speaker),
        }
    }

    fn commands(mut self, speaker: &Speaker, command: &str) -> Self {
        self.command_topic = Some(speaker.command_topic(command));
        self
    }

    fn state(mut self, speaker: &Speaker, topic: StateTopic) -> Self {
        self.state_topic = Some(speaker.state_topic(topic));
        self
    }

    fn on_off(mut self) -> Self {
        self.payload_on = Some(PAYLOAD_ON);
        self.payload_off = Some(PAYLOAD_OFF);
        self
    }

    fn press(mut self) -> Self {
        self.payload_press = Some(PAYLOAD_PRESS);
        self
    }

    fn config_category(mut self) -> Self {
        self.entity_category = Some("config");
        self
    }
}

/// A discovery document together with its topic coordinates.
#[derive(Debug, Clone)]
pub struct DiscoveryEntity {
    pub component: &'static str,
    pub config: EntityConfig,
}

impl DiscoveryEntity {
    /// `{prefix}/{component}/{unique_id}/config`
    pub fn topic(&self, discovery_prefix: &str) -> String {
        topics::discovery_topic(discovery_prefix, self.component, &self.config.unique_id)
    }
}

/// Builds the seven entity documents announcing `speaker`.
pub fn discovery_entities(speaker: &Speaker) -> Vec<DiscoveryEntity> {
    let entity = |component, config| DiscoveryEntity { component, config };

    let mut volume = EntityConfig::new(speaker, "volume", "Volume", "mdi:volume-high")
        .commands(speaker, "volume")
        .state(speaker, StateTopic::Volume);
    volume.min = Some(0);
    volume.max = Some(100);
    volume.step = Some(1);

    let mut status = EntityConfig::new(speaker, "status", "Status", "mdi:bluetooth")
        .state(speaker, StateTopic::Connection)
        .on_off();
    status.device_class = Some("connectivity");
    status.json_attributes_topic = Some(speaker.state_topic(StateTopic::Status));

    vec![
        entity("number", volume),
        entity(
            "switch",
            EntityConfig::new(speaker, "mute", "Mute", "mdi:volume-mute")
                .commands(speaker, "mute")
                .state(speaker, StateTopic::Mute)
                .on_off(),
        ),
        entity(
            "switch",
            EntityConfig::new(speaker, "connect", "Connect", "mdi:bluetooth-connect")
                .commands(speaker, "connect")
                .state(speaker, StateTopic::Connection)
                .on_off(),
        ),
        entity(
            "button",
            EntityConfig::new(speaker, "setsink", "Set as Default Sink", "mdi:audio-video")
                .commands(speaker, "setsink")
                .press(),
        ),
        entity("binary_sensor", status),
        entity(
            "button",
            EntityConfig::new(speaker, "pair_bt", "Pair Device", "mdi:bluetooth-settings")
                .commands(speaker, "pair")
                .press()
                .config_category(),
        ),
        entity(
            "button",
            EntityConfig::new(speaker, "unpair_bt", "Unpair Device", "mdi:bluetooth-off")
                .commands(speaker, "unpair")
                .press()
                .config_category(),
        ),
    ]
}

/// Announces speakers to Home Assistant.
pub struct DiscoveryPublisher {
    bus: Arc<dyn BusPublisher>,
    discovery_prefix: String,
}

impl DiscoveryPublisher {
    pub fn new(bus: Arc<dyn BusPublisher>, discovery_prefix: impl Into<String>) -> Self {
        Self {
            bus,
            discovery_prefix: discovery_prefix.into(),
        }
    }

    /// Publishes every discovery document for `speaker` (retained, QoS 1).
    ///
    /// A failed document is logged and the rest are still attempted.
    /// Returns the number of documents enqueued.
    pub async fn publish_discovery(&self, speaker: &Speaker) -> usize {
        log::info!("[Discovery] Publishing discovery for {}", speaker.display_name());

        let mut published = 0;
        for entity in discovery_entities(speaker) {
            let topic = entity.topic(&self.discovery_prefix);
            let payload = match serde_json::to_string(&entity.config) {
                Ok(payload) => payload,
                Err(e) => {
                    log::warn!("[Discovery] Failed to serialize {}: {}", topic, e);
                    continue;
                }
            };

            match self
                .bus
                .publish_queued(OutboundMessage::retained_reliable(&topic, payload))
                .await
            {
                Ok(()) => published += 1,
                Err(e) => log::warn!("[Discovery] Failed to publish {}: {}", topic, e),
            }
        }
        published
    }

    /// Announces every speaker in order.
    pub async fn publish_all(&self, speakers: &[Speaker]) {
        for speaker in speakers {
            self.publish_discovery(speaker).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mqtt::QoS;
    use crate::test_fixtures::{speaker, MockBackends, MockBus, ADDRESS};
    use serde_json::{json, Value};

    fn kitchen() -> (MockBackends, Speaker) {
        let mocks = MockBackends::new();
        let speaker = speaker(&mocks, ADDRESS, "Kitchen Speaker");
        (mocks, speaker)
    }

    fn document(bus: &MockBus, topic: &str) -> Value {
        let payload = bus.payload_for(topic).expect("document published");
        serde_json::from_str(&payload).unwrap()
    }

    #[tokio::test]
    async fn publishes_seven_documents_on_expected_topics() {
        let (_mocks, speaker) = kitchen();
        let bus = Arc::new(MockBus::new());
        let publisher = DiscoveryPublisher::new(bus.clone(), "homeassistant");

        assert_eq!(publisher.publish_discovery(&speaker).await, 7);
        assert_eq!(
            bus.topics(),
            vec![
                "homeassistant/number/btaudio2mqtt_kitchen_speaker_volume/config",
                "homeassistant/switch/btaudio2mqtt_kitchen_speaker_mute/config",
                "homeassistant/switch/btaudio2mqtt_kitchen_speaker_connect/config",
                "homeassistant/button/btaudio2mqtt_kitchen_speaker_setsink/config",
                "homeassistant/binary_sensor/btaudio2mqtt_kitchen_speaker_status/config",
                "homeassistant/button/btaudio2mqtt_kitchen_speaker_pair_bt/config",
                "homeassistant/button/btaudio2mqtt_kitchen_speaker_unpair_bt/config",
            ]
        );
        assert!(bus
            .published()
            .iter()
            .all(|m| m.retain && m.qos == QoS::AtLeastOnce));
    }

    #[tokio::test]
    async fn documents_wait_for_queue_room_instead_of_dropping() {
        let (_mocks, speaker) = kitchen();
        let bus = Arc::new(MockBus::new());
        DiscoveryPublisher::new(bus.clone(), "homeassistant")
            .publish_discovery(&speaker)
            .await;

        assert_eq!(bus.queued_topics().len(), 7);
        assert_eq!(bus.queued_topics(), bus.topics());
    }

    #[tokio::test]
    async fn volume_document_matches_schema() {
        let (_mocks, speaker) = kitchen();
        let bus = Arc::new(MockBus::new());
        DiscoveryPublisher::new(bus.clone(), "homeassistant")
            .publish_discovery(&speaker)
            .await;

        let doc = document(
            &bus,
            "homeassistant/number/btaudio2mqtt_kitchen_speaker_volume/config",
        );
        assert_eq!(
            doc,
            json!({
                "name": "Volume",
                "unique_id": "btaudio2mqtt_kitchen_speaker_volume",
                "command_topic": "btaudio2mqtt/kitchen_speaker/set/volume",
                "state_topic": "btaudio2mqtt/kitchen_speaker/state/volume",
                "min": 0, "max": 100, "step": 1,
                "icon": "mdi:volume-high",
                "device": {
                    "identifiers": ["btaudio2mqtt_kitchen_speaker"],
                    "name": "Kitchen Speaker",
                    "manufacturer": "Bluetooth Audio MQTT Bridge",
                    "model": format!("PulseAudio Control ({ADDRESS})"),
                }
            })
        );
    }

    #[tokio::test]
    async fn status_sensor_exposes_attributes_and_device_class() {
        let (_mocks, speaker) = kitchen();
        let bus = Arc::new(MockBus::new());
        DiscoveryPublisher::new(bus.clone(), "homeassistant")
            .publish_discovery(&speaker)
            .await;

        let doc = document(
            &bus,
            "homeassistant/binary_sensor/btaudio2mqtt_kitchen_speaker_status/config",
        );
        assert_eq!(doc["state_topic"], "btaudio2mqtt/kitchen_speaker/state/connection");
        assert_eq!(doc["json_attributes_topic"], "btaudio2mqtt/kitchen_speaker/status");
        assert_eq!(doc["device_class"], "connectivity");
        assert_eq!(doc["payload_on"], "ON");
        assert!(doc.get("command_topic").is_none());
    }

    #[tokio::test]
    async fn pairing_buttons_are_config_entities() {
        let (_mocks, speaker) = kitchen();
        let bus = Arc::new(MockBus::new());
        DiscoveryPublisher::new(bus.clone(), "homeassistant")
            .publish_discovery(&speaker)
            .await;

        let pair = document(
            &bus,
            "homeassistant/button/btaudio2mqtt_kitchen_speaker_pair_bt/config",
        );
        assert_eq!(pair["command_topic"], "btaudio2mqtt/kitchen_speaker/set/pair");
        assert_eq!(pair["payload_press"], "PRESS");
        assert_eq!(pair["entity_category"], "config");

        let sink = document(
            &bus,
            "homeassistant/button/btaudio2mqtt_kitchen_speaker_setsink/config",
        );
        assert!(sink.get("entity_category").is_none());
    }

    #[tokio::test]
    async fn republishing_is_idempotent() {
        let (_mocks, speaker) = kitchen();
        let bus = Arc::new(MockBus::new());
        let publisher = DiscoveryPublisher::new(bus.clone(), "homeassistant");

        publisher.publish_discovery(&speaker).await;
        publisher.publish_discovery(&speaker).await;

        let published = bus.published();
        assert_eq!(published.len(), 14);
        assert_eq!(published[..7], published[7..]);
    }

    #[tokio::test]
    async fn failed_document_does_not_stop_the_rest() {
        let (_mocks, speaker) = kitchen();
        let bus = Arc::new(MockBus::new());
        bus.reject_topics_containing("_mute/");
        let publisher = DiscoveryPublisher::new(bus.clone(), "homeassistant");

        assert_eq!(publisher.publish_discovery(&speaker).await, 6);
        assert!(bus.topics().iter().any(|t| t.ends_with("_unpair_bt/config")));
    }

    #[tokio::test]
    async fn custom_prefix_is_honoured() {
        let (_mocks, speaker) = kitchen();
        let bus = Arc::new(MockBus::new());
        DiscoveryPublisher::new(bus.clone(), "ha")
            .publish_discovery(&speaker)
            .await;

        assert!(bus.topics().iter().all(|t| t.starts_with("ha/")));
    }
}

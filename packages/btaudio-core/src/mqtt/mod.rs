//! MQTT transport: topic schema, publisher seam and the `rumqttc` session.
//!
//! # Module Structure
//!
//! - `topics` - Deterministic topic names derived from speaker slugs
//! - `client` - Connection settings, [`BusHandle`] and the event-loop driver

pub mod client;
pub mod topics;

use async_trait::async_trait;
use thiserror::Error;

pub use client::{create_client, drive_event_loop, BusHandle, MqttConfig, SessionEvent};
pub use rumqttc::QoS;

// ─────────────────────────────────────────────────────────────────────────────
// Error Types
// ─────────────────────────────────────────────────────────────────────────────

/// Errors that can occur when talking to the message bus.
#[derive(Debug, Error)]
pub enum BusError {
    /// The client refused to enqueue the request (queue full or closed).
    #[error("MQTT client error: {0}")]
    Client(#[from] rumqttc::ClientError),

    /// No broker connection is currently established.
    #[error("Not connected to MQTT broker")]
    NotConnected,

    /// Connection settings are unusable.
    #[error("Invalid MQTT configuration: {0}")]
    InvalidConfig(String),
}

/// Convenient Result alias for bus operations.
pub type BusResult<T> = Result<T, BusError>;

// ─────────────────────────────────────────────────────────────────────────────
// Trait
// ─────────────────────────────────────────────────────────────────────────────

/// A single message to publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub topic: String,
    pub payload: String,
    pub qos: QoS,
    pub retain: bool,
}

impl OutboundMessage {
    /// Retained message at QoS 0, used for state topics.
    pub fn retained(topic: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
            qos: QoS::AtMostOnce,
            retain: true,
        }
    }

    /// Retained message at QoS 1, used for discovery documents.
    pub fn retained_reliable(topic: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            qos: QoS::AtLeastOnce,
            ..Self::retained(topic, payload)
        }
    }
}

/// Publish/subscribe side of the message bus.
///
/// Implementations must not block waiting for the broker. A disconnected bus
/// fails every request immediately.
#[async_trait]
pub trait BusPublisher: Send + Sync {
    /// Enqueues `message` for delivery.
    async fn publish(&self, message: OutboundMessage) -> BusResult<()>;

    /// Like [`publish`](Self::publish), but while connected waits for room in
    /// the request queue instead of failing when it is full. Used for bursts
    /// that must not be dropped, such as discovery after a reconnect.
    async fn publish_queued(&self, message: OutboundMessage) -> BusResult<()> {
        self.publish(message).await
    }

    /// Subscribes to `filter` at QoS 0.
    async fn subscribe(&self, filter: &str) -> BusResult<()>;
}

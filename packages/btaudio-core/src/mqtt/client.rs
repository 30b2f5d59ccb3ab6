//! `rumqttc` client wiring.
//!
//! The event loop task only translates broker traffic into [`SessionEvent`]s
//! and tracks connectivity. It never touches devices, so a slow `bluetoothctl`
//! session can never stall keep-alives.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rumqttc::{AsyncClient, ConnectReturnCode, Event, EventLoop, MqttOptions, Packet, QoS};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::{BusError, BusPublisher, BusResult, OutboundMessage};
use crate::protocol_constants::{
    BASE_TOPIC, MQTT_KEEP_ALIVE_SECS, MQTT_RECONNECT_DELAY_SECS, MQTT_REQUEST_CAPACITY,
};

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Broker connection settings.
#[derive(Clone)]
pub struct MqttConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub client_id: String,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            host: "core-mosquitto".to_string(),
            port: 1883,
            username: None,
            password: None,
            client_id: format!("{}-{}", BASE_TOPIC, std::process::id()),
        }
    }
}

impl MqttConfig {
    /// Checks the settings before any connection attempt.
    pub fn validate(&self) -> BusResult<()> {
        if self.host.trim().is_empty() {
            return Err(BusError::InvalidConfig("broker host is empty".into()));
        }
        if self.port == 0 {
            return Err(BusError::InvalidConfig("broker port must be non-zero".into()));
        }
        if self.client_id.trim().is_empty() {
            return Err(BusError::InvalidConfig("client id is empty".into()));
        }
        Ok(())
    }

    fn to_options(&self) -> MqttOptions {
        let mut options = MqttOptions::new(&self.client_id, &self.host, self.port);
        options.set_keep_alive(Duration::from_secs(MQTT_KEEP_ALIVE_SECS));
        if let Some(user) = &self.username {
            options.set_credentials(user, self.password.as_deref().unwrap_or_default());
        }
        options
    }
}

impl fmt::Debug for MqttConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MqttConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "********"))
            .field("client_id", &self.client_id)
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Handle
// ─────────────────────────────────────────────────────────────────────────────

/// What the event loop reports to the session task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The broker acknowledged a (re)connection.
    Connected,
    /// An inbound publish on a subscribed topic.
    Message { topic: String, payload: String },
}

/// Cloneable publishing handle over a `rumqttc` client.
#[derive(Clone)]
pub struct BusHandle {
    client: AsyncClient,
    connected: Arc<AtomicBool>,
}

impl BusHandle {
    /// Returns whether the last broker event was a successful connection.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    /// Sends a DISCONNECT so the broker drops the session cleanly.
    pub async fn disconnect(&self) {
        if let Err(e) = self.client.disconnect().await {
            log::debug!("[Bus] Disconnect request failed: {}", e);
        }
        self.set_connected(false);
    }
}

#[async_trait]
impl BusPublisher for BusHandle {
    async fn publish(&self, message: OutboundMessage) -> BusResult<()> {
        if !self.is_connected() {
            return Err(BusError::NotConnected);
        }
        self.client
            .try_publish(message.topic, message.qos, message.retain, message.payload)?;
        Ok(())
    }

    async fn publish_queued(&self, message: OutboundMessage) -> BusResult<()> {
        if !self.is_connected() {
            return Err(BusError::NotConnected);
        }
        self.client
            .publish(message.topic, message.qos, message.retain, message.payload)
            .await?;
        Ok(())
    }

    async fn subscribe(&self, filter: &str) -> BusResult<()> {
        self.client.try_subscribe(filter, QoS::AtMostOnce)?;
        Ok(())
    }
}

/// Builds the client and its event loop. Nothing connects until the event
/// loop is polled by [`drive_event_loop`].
pub fn create_client(config: &MqttConfig) -> BusResult<(BusHandle, EventLoop)> {
    config.validate()?;
    let (client, event_loop) = AsyncClient::new(config.to_options(), MQTT_REQUEST_CAPACITY);
    let handle = BusHandle {
        client,
        connected: Arc::new(AtomicBool::new(false)),
    };
    Ok((handle, event_loop))
}

// ─────────────────────────────────────────────────────────────────────────────
// Event Loop
// ─────────────────────────────────────────────────────────────────────────────

/// Polls the broker connection until cancelled or the session task goes away.
///
/// Connection errors are logged and followed by a fixed delay; the next poll
/// reconnects.
pub async fn drive_event_loop(
    mut event_loop: EventLoop,
    handle: BusHandle,
    events: mpsc::UnboundedSender<SessionEvent>,
    cancel: CancellationToken,
) {
    log::info!("[Bus] Event loop started");

    loop {
        let polled = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            polled = event_loop.poll() => polled,
        };

        let forwarded = match polled {
            Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                if ack.code == ConnectReturnCode::Success {
                    log::info!("[Bus] Connected to broker");
                    handle.set_connected(true);
                    Some(SessionEvent::Connected)
                } else {
                    log::error!("[Bus] Broker refused connection: {:?}", ack.code);
                    None
                }
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => Some(SessionEvent::Message {
                topic: publish.topic,
                payload: String::from_utf8_lossy(&publish.payload).into_owned(),
            }),
            Ok(_) => None,
            Err(e) => {
                if handle.is_connected() {
                    log::warn!("[Bus] Connection lost: {}", e);
                } else {
                    log::warn!("[Bus] Connection attempt failed: {}", e);
                }
                handle.set_connected(false);

                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(Duration::from_secs(MQTT_RECONNECT_DELAY_SECS)) => {}
                }
                None
            }
        };

        if let Some(event) = forwarded {
            if events.send(event).is_err() {
                log::debug!("[Bus] Session receiver dropped, stopping event loop");
                break;
            }
        }
    }

    handle.set_connected(false);
    log::info!("[Bus] Event loop stopped");
}

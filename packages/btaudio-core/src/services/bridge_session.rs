//! Consumes bus session events one at a time.
//!
//! Every (re)connection re-establishes the command subscription and
//! re-announces all speakers; inbound messages go to the [`CommandRouter`].
//! Processing is strictly sequential, so commands apply in arrival order.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::command_router::{CommandRouter, RouteOutcome};
use super::discovery_publisher::DiscoveryPublisher;
use crate::mqtt::topics::command_subscription;
use crate::mqtt::{BusPublisher, SessionEvent};
use crate::speaker::Speaker;

pub struct BridgeSession {
    speakers: Arc<[Speaker]>,
    bus: Arc<dyn BusPublisher>,
    discovery: DiscoveryPublisher,
    router: CommandRouter,
}

impl BridgeSession {
    pub fn new(
        speakers: Arc<[Speaker]>,
        bus: Arc<dyn BusPublisher>,
        discovery_prefix: impl Into<String>,
    ) -> Self {
        Self {
            discovery: DiscoveryPublisher::new(Arc::clone(&bus), discovery_prefix),
            router: CommandRouter::new(Arc::clone(&speakers)),
            speakers,
            bus,
        }
    }

    /// Handles a single event. Returns the routing outcome for messages.
    pub async fn handle(&self, event: SessionEvent) -> Option<RouteOutcome> {
        match event {
            SessionEvent::Connected => {
                self.on_connected().await;
                None
            }
            SessionEvent::Message { topic, payload } => {
                Some(self.router.route(&topic, &payload).await)
            }
        }
    }

    async fn on_connected(&self) {
        let filter = command_subscription();
        match self.bus.subscribe(&filter).await {
            Ok(()) => log::info!("[Bus] Subscribed to {}", filter),
            Err(e) => log::error!("[Bus] Failed to subscribe to {}: {}", filter, e),
        }
        self.discovery.publish_all(&self.speakers).await;
    }

    /// Processes events until the channel closes or `cancel` fires.
    pub async fn run(
        &self,
        mut events: mpsc::UnboundedReceiver<SessionEvent>,
        cancel: CancellationToken,
    ) {
        loop {
            let event = tokio::select! {
                _ = cancel.cancelled() => break,
                event = events.recv() => event,
            };
            let Some(event) = event else {
                break;
            };
            self.handle(event).await;
        }
        log::debug!("[Bus] Session task stopped");
    }
}

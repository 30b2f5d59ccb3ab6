//! Periodic device poll and retained state publishing.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::device::StatusReport;
use crate::error::{BridgeError, BridgeResult};
use crate::mqtt::topics::StateTopic;
use crate::mqtt::{BusPublisher, OutboundMessage};
use crate::protocol_constants::{PAYLOAD_OFF, PAYLOAD_ON};
use crate::speaker::Speaker;

/// Outcome of one reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    /// Speakers whose four state topics were all published.
    pub published: usize,
    /// Speakers skipped because of a status, serialization or publish error.
    pub failed: usize,
}

/// Polls every speaker and publishes its state.
pub struct StateReconciler {
    speakers: Arc<[Speaker]>,
    bus: Arc<dyn BusPublisher>,
    interval: Duration,
}

fn on_off(value: bool) -> &'static str {
    if value {
        PAYLOAD_ON
    } else {
        PAYLOAD_OFF
    }
}

impl StateReconciler {
    pub fn new(speakers: Arc<[Speaker]>, bus: Arc<dyn BusPublisher>, interval: Duration) -> Self {
        Self {
            speakers,
            bus,
            interval,
        }
    }

    /// Runs one pass over all speakers.
    ///
    /// A failing speaker is logged and counted; the pass always continues
    /// with the next one.
    pub async fn reconcile_once(&self) -> ReconcileSummary {
        log::debug!("[Reconciler] Updating {} speaker state(s)", self.speakers.len());

        let mut summary = ReconcileSummary::default();
        for speaker in self.speakers.iter() {
            match self.publish_state(speaker).await {
                Ok(()) => summary.published += 1,
                Err(e) => {
                    log::warn!(
                        "[Reconciler] [{}] Failed to update state: {}",
                        speaker.slug(),
                        e
                    );
                    summary.failed += 1;
                }
            }
        }

        log::debug!(
            "[Reconciler] Update complete: {} published, {} failed",
            summary.published,
            summary.failed
        );
        summary
    }

    async fn publish_state(&self, speaker: &Speaker) -> BridgeResult<()> {
        let status = speaker.get_status().await?;
        let report = serde_json::to_string(&StatusReport {
            status,
            sink_name: speaker.sink_id(),
        })?;

        let messages = [
            (StateTopic::Status, report),
            (StateTopic::Connection, on_off(status.connected).to_string()),
            (StateTopic::Volume, status.volume_percent.to_string()),
            (StateTopic::Mute, on_off(status.muted).to_string()),
        ];

        let mut first_error = None;
        for (topic, payload) in messages {
            let topic = speaker.state_topic(topic);
            if let Err(e) = self.bus.publish(OutboundMessage::retained(&topic, payload)).await {
                log::debug!("[Reconciler] Failed to publish {}: {}", topic, e);
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(BridgeError::from(e)),
            None => Ok(()),
        }
    }

    /// Reconciles immediately, then every interval until `cancel` fires.
    pub async fn run(&self, cancel: CancellationToken) {
        log::info!(
            "[Reconciler] Polling {} speaker(s) every {:?}",
            self.speakers.len(),
            self.interval
        );

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    log::info!("[Reconciler] Stopped");
                    break;
                }
                _ = ticker.tick() => {
                    self.reconcile_once().await;
                }
            }
        }
    }
}

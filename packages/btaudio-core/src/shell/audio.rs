//! Audio sink queries and mutations through `pactl`.
//!
//! Every query tolerates failure on its own: a tool that exits non-zero or
//! times out yields empty output, which parses to the neutral value
//! (disconnected, 0%, unmuted, not default).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::device::DeviceStatus;
use crate::protocol_constants::{AUDIO_TIMEOUT_SECS, PACTL_PROGRAM};

use super::command::{CommandRunner, Invocation, ShellResult};

/// Trait for audio-subsystem operations on a single sink.
#[async_trait]
pub trait AudioControl: Send + Sync {
    /// Reads the live status of `sink_id`.
    ///
    /// Returns the disconnected status without further queries when the sink
    /// does not exist or the audio tool cannot be run at all.
    async fn query_audio_state(&self, sink_id: &str) -> ShellResult<DeviceStatus>;

    /// Sets the sink volume in percent. Best-effort; failures are logged.
    async fn set_volume(&self, sink_id: &str, level: i32);

    /// Mutes or unmutes the sink. Best-effort; failures are logged.
    async fn set_mute(&self, sink_id: &str, on: bool);

    /// Routes system audio to the sink. Best-effort; failures are logged.
    async fn set_default_sink(&self, sink_id: &str);
}

/// [`AudioControl`] backed by the PulseAudio `pactl` client.
pub struct PactlAudio {
    runner: Arc<dyn CommandRunner>,
    timeout: Duration,
}

impl PactlAudio {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            runner,
            timeout: Duration::from_secs(AUDIO_TIMEOUT_SECS),
        }
    }

    fn pactl<I, S>(&self, args: I) -> Invocation
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Invocation::new(PACTL_PROGRAM, self.timeout).args(args)
    }

    /// Runs an invocation, downgrading every failure to empty output.
    async fn run_tolerant(&self, invocation: Invocation) -> String {
        match self.runner.run(&invocation).await {
            Ok(out) if out.success => out.stdout.trim().to_string(),
            Ok(out) => {
                log::warn!(
                    "[Audio] Command failed: {}\nOutput: {}",
                    invocation,
                    out.stderr.trim()
                );
                String::new()
            }
            Err(e) => {
                log::warn!("[Audio] Command failed: {}: {}", invocation, e);
                String::new()
            }
        }
    }

    async fn sink_exists(&self, sink_id: &str) -> bool {
        let listing = self.run_tolerant(self.pactl(["list", "short", "sinks"])).await;
        sink_listed(&listing, sink_id)
    }
}

#[async_trait]
impl AudioControl for PactlAudio {
    async fn query_audio_state(&self, sink_id: &str) -> ShellResult<DeviceStatus> {
        if !self.sink_exists(sink_id).await {
            return Ok(DeviceStatus::disconnected());
        }

        let volume = self
            .run_tolerant(self.pactl(["get-sink-volume", sink_id]))
            .await;
        let mute = self.run_tolerant(self.pactl(["get-sink-mute", sink_id])).await;
        let default_sink = self.run_tolerant(self.pactl(["get-default-sink"])).await;

        Ok(DeviceStatus {
            connected: true,
            volume_percent: parse_volume_percent(&volume),
            muted: parse_muted(&mute),
            is_default_sink: default_sink == sink_id,
        })
    }

    async fn set_volume(&self, sink_id: &str, level: i32) {
        self.run_tolerant(self.pactl([
            "set-sink-volume".to_string(),
            sink_id.to_string(),
            format!("{}%", level),
        ]))
        .await;
    }

    async fn set_mute(&self, sink_id: &str, on: bool) {
        let value = if on { "1" } else { "0" };
        self.run_tolerant(self.pactl(["set-sink-mute", sink_id, value]))
            .await;
    }

    async fn set_default_sink(&self, sink_id: &str) {
        self.run_tolerant(self.pactl(["set-default-sink", sink_id]))
            .await;
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Output Parsing
// ─────────────────────────────────────────────────────────────────────────────

/// Returns true if `pactl list short sinks` output lists `sink_id`.
///
/// Each line is `<index>\t<name>\t<driver>\t<format>\t<state>`.
pub(crate) fn sink_listed(listing: &str, sink_id: &str) -> bool {
    listing
        .lines()
        .any(|line| line.split_whitespace().nth(1) == Some(sink_id))
}

/// Extracts the first channel's percentage from `pactl get-sink-volume` output.
///
/// Typical output is
/// `Volume: front-left: 42598 /  65% / -11.22 dB,   front-right: ...`.
/// Anything that does not parse yields 0.
pub(crate) fn parse_volume_percent(output: &str) -> i32 {
    output
        .split('/')
        .nth(1)
        .and_then(|field| field.replace('%', "").trim().parse().ok())
        .unwrap_or(0)
}

/// Returns true if `pactl get-sink-mute` output reports the sink as muted.
pub(crate) fn parse_muted(output: &str) -> bool {
    output.to_lowercase().contains("yes")
}

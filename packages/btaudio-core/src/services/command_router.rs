//! Inbound command routing.
//!
//! Command topics have the shape `btaudio2mqtt/{slug}/set/{command}`. The
//! router resolves the speaker, parses the payload into a [`SpeakerCommand`]
//! and applies it. Nothing is ever published back; effects surface on the
//! next reconciliation pass.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use thiserror::Error;

use crate::protocol_constants::{BASE_TOPIC, PAYLOAD_PRESS, SET_SEGMENT};
use crate::speaker::Speaker;

/// A command payload that cannot be interpreted.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("payload is not a valid integer")]
pub struct InvalidPayload;

/// Command names accepted in the last topic segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Volume,
    Mute,
    Connect,
    SetSink,
    Pair,
    Unpair,
}

impl CommandKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Volume => "volume",
            Self::Mute => "mute",
            Self::Connect => "connect",
            Self::SetSink => "setsink",
            Self::Pair => "pair",
            Self::Unpair => "unpair",
        }
    }

    /// Interprets `payload` for this command.
    ///
    /// Returns `Ok(None)` for button commands whose payload is not `PRESS`,
    /// and an error when a volume payload is not an integer.
    pub fn parse_payload(self, payload: &str) -> Result<Option<SpeakerCommand>, InvalidPayload> {
        let is_on = payload.eq_ignore_ascii_case("on");
        let pressed = payload == PAYLOAD_PRESS;

        let command = match self {
            Self::Volume => {
                let level = payload.trim().parse::<i32>().map_err(|_| InvalidPayload)?;
                Some(SpeakerCommand::SetVolume(level))
            }
            Self::Mute => Some(SpeakerCommand::SetMute(is_on)),
            Self::Connect if is_on => Some(SpeakerCommand::Connect),
            Self::Connect => Some(SpeakerCommand::Disconnect),
            Self::SetSink => pressed.then_some(SpeakerCommand::SetAsDefaultSink),
            Self::Pair => pressed.then_some(SpeakerCommand::Pair),
            Self::Unpair => pressed.then_some(SpeakerCommand::Unpair),
        };
        Ok(command)
    }
}

impl FromStr for CommandKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "volume" => Ok(Self::Volume),
            "mute" => Ok(Self::Mute),
            "connect" => Ok(Self::Connect),
            "setsink" => Ok(Self::SetSink),
            "pair" => Ok(Self::Pair),
            "unpair" => Ok(Self::Unpair),
            _ => Err(()),
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully parsed operation on one speaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeakerCommand {
    SetVolume(i32),
    SetMute(bool),
    Connect,
    Disconnect,
    SetAsDefaultSink,
    Pair,
    Unpair,
}

impl SpeakerCommand {
    /// Runs the command against `speaker`.
    pub async fn apply(self, speaker: &Speaker) {
        match self {
            Self::SetVolume(level) => speaker.set_volume(level).await,
            Self::SetMute(on) => speaker.set_mute(on).await,
            Self::Connect => speaker.connect().await,
            Self::Disconnect => speaker.disconnect().await,
            Self::SetAsDefaultSink => speaker.set_as_default_sink().await,
            Self::Pair => speaker.pair().await,
            Self::Unpair => speaker.unpair().await,
        }
    }
}

/// What happened to one inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    /// The command was applied to the named speaker.
    Dispatched { slug: String, command: SpeakerCommand },
    /// Topic is not of the form `btaudio2mqtt/{slug}/set/{command}`.
    NotACommand,
    /// No configured speaker has this slug.
    UnknownSpeaker(String),
    /// The command segment is not recognised.
    UnknownCommand(String),
    /// The payload could not be parsed for this command.
    InvalidPayload { command: CommandKind, payload: String },
    /// A button command arrived without the press payload.
    Ignored(CommandKind),
}

/// Dispatches inbound bus messages to speakers.
pub struct CommandRouter {
    speakers: Arc<[Speaker]>,
}

impl CommandRouter {
    pub fn new(speakers: Arc<[Speaker]>) -> Self {
        Self { speakers }
    }

    fn find(&self, slug: &str) -> Option<&Speaker> {
        self.speakers.iter().find(|s| s.slug() == slug)
    }

    /// Handles one message. Never panics; every outcome is returned.
    pub async fn route(&self, topic: &str, payload: &str) -> RouteOutcome {
        log::info!("[Router] RX: {} -> {}", topic, payload);

        let segments: Vec<&str> = topic.split('/').collect();
        let [base, slug, set, command] = segments.as_slice() else {
            return RouteOutcome::NotACommand;
        };
        if *base != BASE_TOPIC || *set != SET_SEGMENT {
            return RouteOutcome::NotACommand;
        }

        let Some(speaker) = self.find(slug) else {
            log::warn!("[Router] Received command for unknown speaker: {}", slug);
            return RouteOutcome::UnknownSpeaker(slug.to_string());
        };

        let Ok(kind) = command.parse::<CommandKind>() else {
            log::warn!("[Router] [{}] Unknown command: {}", slug, command);
            return RouteOutcome::UnknownCommand(command.to_string());
        };

        match kind.parse_payload(payload) {
            Ok(Some(parsed)) => {
                parsed.apply(speaker).await;
                RouteOutcome::Dispatched {
                    slug: slug.to_string(),
                    command: parsed,
                }
            }
            Ok(None) => {
                log::debug!("[Router] [{}] Ignoring {} payload {:?}", slug, kind, payload);
                RouteOutcome::Ignored(kind)
            }
            Err(e) => {
                log::warn!("[Router] [{}] Invalid {} payload {:?}: {}", slug, kind, payload, e);
                RouteOutcome::InvalidPayload {
                    command: kind,
                    payload: payload.to_string(),
                }
            }
        }
    }
}

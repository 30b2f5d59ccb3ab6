//! Topic schema for state, commands and Home Assistant discovery.
//!
//! All names derive deterministically from a speaker's slug, so repeated
//! discovery and state publishes always land on the same topics.

use crate::protocol_constants::{BASE_TOPIC, SET_SEGMENT};

/// Retained state subtopics published for every speaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateTopic {
    /// Full JSON status document.
    Status,
    /// `ON` / `OFF` connection state.
    Connection,
    /// Volume as a decimal string.
    Volume,
    /// `ON` / `OFF` mute state.
    Mute,
}

impl StateTopic {
    #[must_use]
    pub fn suffix(&self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::Connection => "state/connection",
            Self::Volume => "state/volume",
            Self::Mute => "state/mute",
        }
    }
}

/// Whether `segment` can stand as a single topic level: non-empty and free of
/// the `/` separator and the `+` / `#` wildcards.
#[must_use]
pub fn is_topic_safe(segment: &str) -> bool {
    !segment.is_empty() && !segment.contains(['/', '+', '#'])
}

/// `btaudio2mqtt/{slug}`
#[must_use]
pub fn topic_prefix(slug: &str) -> String {
    format!("{}/{}", BASE_TOPIC, slug)
}

/// `btaudio2mqtt_{slug}`, the base of every entity `unique_id`.
#[must_use]
pub fn entity_id_prefix(slug: &str) -> String {
    format!("{}_{}", BASE_TOPIC, slug)
}

/// `{prefix}/{state suffix}`
#[must_use]
pub fn state_topic(prefix: &str, topic: StateTopic) -> String {
    format!("{}/{}", prefix, topic.suffix())
}

/// `{prefix}/set/{command}`
#[must_use]
pub fn command_topic(prefix: &str, command: &str) -> String {
    format!("{}/{}/{}", prefix, SET_SEGMENT, command)
}

/// Wildcard filter matching every speaker's command topics.
#[must_use]
pub fn command_subscription() -> String {
    format!("{}/+/{}/#", BASE_TOPIC, SET_SEGMENT)
}

/// `{discovery_prefix}/{component}/{object_id}/config`
#[must_use]
pub fn discovery_topic(discovery_prefix: &str, component: &str, object_id: &str) -> String {
    format!("{}/{}/{}/config", discovery_prefix, component, object_id)
}

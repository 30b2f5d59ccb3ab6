//! Application services layer.
//!
//! This module contains the bridge logic that sits between the message bus
//! (mqtt/) and the device adapters (shell/, supervisor).

pub mod bridge_session;
pub mod command_router;
pub mod discovery_publisher;
pub mod state_reconciler;

pub use bridge_session::BridgeSession;
pub use command_router::{CommandKind, CommandRouter, RouteOutcome, SpeakerCommand};
pub use discovery_publisher::{discovery_entities, DiscoveryPublisher};
pub use state_reconciler::{ReconcileSummary, StateReconciler};

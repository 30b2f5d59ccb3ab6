//! Application bootstrap and dependency wiring.
//!
//! This module is the composition root: the single place where the command
//! runner, device adapters, HTTP client, speakers and bus tasks are created
//! and wired together.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::config::BridgeConfig;
use crate::error::{BridgeError, BridgeResult};
use crate::mqtt::{self, BusHandle, BusPublisher};
use crate::protocol_constants::HTTP_TIMEOUT_SECS;
use crate::registry::DeviceRegistry;
use crate::services::{BridgeSession, StateReconciler};
use crate::shell::{
    AudioControl, BluetoothControl, BluetoothCtl, CommandRunner, PactlAudio, SystemCommandRunner,
};
use crate::speaker::{DeviceBackends, Speaker};
use crate::supervisor::{ApiError, HomeAutomationApi, SupervisorClient};

/// Container for all bootstrapped services.
pub struct BootstrappedServices {
    /// Immutable snapshot of the configured speakers.
    pub speakers: Arc<[Speaker]>,
    /// Publishing handle for the broker connection.
    pub bus: BusHandle,
    /// Periodic state publisher, run on the caller's task.
    pub reconciler: StateReconciler,
    /// Cancellation token for graceful shutdown.
    pub cancel_token: CancellationToken,
}

impl BootstrappedServices {
    /// Runs the state reconciler until shutdown is requested.
    pub async fn run(&self) {
        self.reconciler.run(self.cancel_token.clone()).await;
    }

    /// Stops background tasks and disconnects from the broker.
    pub async fn shutdown(&self) {
        log::info!("[Bootstrap] Beginning graceful shutdown...");
        self.bus.disconnect().await;
        self.cancel_token.cancel();
        log::info!("[Bootstrap] Shutdown complete");
    }
}

/// Creates the shared HTTP client for Supervisor calls.
fn create_http_client() -> BridgeResult<Client> {
    Client::builder()
        .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
        .build()
        .map_err(|e| BridgeError::Api(ApiError::Http(e)))
}

/// Wires the production device backends.
pub fn create_backends(config: &BridgeConfig) -> BridgeResult<DeviceBackends> {
    let runner: Arc<dyn CommandRunner> = Arc::new(SystemCommandRunner);
    let supervisor = SupervisorClient::new(create_http_client()?, config.supervisor.clone());

    Ok(DeviceBackends {
        audio: Arc::new(PactlAudio::new(Arc::clone(&runner))) as Arc<dyn AudioControl>,
        bluetooth: Arc::new(BluetoothCtl::new(runner)) as Arc<dyn BluetoothControl>,
        home: Arc::new(supervisor) as Arc<dyn HomeAutomationApi>,
    })
}

/// Loads speakers from the options document.
///
/// # Errors
///
/// Returns [`BridgeError::NoSpeakers`] when no usable device is configured.
pub fn load_speakers(
    config: &BridgeConfig,
    backends: DeviceBackends,
) -> BridgeResult<Arc<[Speaker]>> {
    let speakers = DeviceRegistry::new(backends).load(&config.options_path);
    if speakers.is_empty() {
        return Err(BridgeError::NoSpeakers(
            config.options_path.display().to_string(),
        ));
    }
    Ok(speakers.into())
}

/// Bootstraps the bridge in dependency order:
///
/// 1. Validate configuration
/// 2. Device backends (command runner, HTTP client)
/// 3. Speakers from the options document
/// 4. MQTT client, event loop task and session task
/// 5. State reconciler
///
/// Must be called from within a Tokio runtime.
pub fn bootstrap_services(config: &BridgeConfig) -> BridgeResult<BootstrappedServices> {
    config.validate()?;

    let backends = create_backends(config)?;
    let speakers = load_speakers(config, backends)?;

    log::info!("[Bootstrap] Connecting to MQTT broker: {:?}", config.mqtt);
    let (bus, event_loop) = mqtt::create_client(&config.mqtt)?;
    let publisher: Arc<dyn BusPublisher> = Arc::new(bus.clone());

    let cancel_token = CancellationToken::new();
    let (events_tx, events_rx) = mpsc::unbounded_channel();

    tokio::spawn(mqtt::drive_event_loop(
        event_loop,
        bus.clone(),
        events_tx,
        cancel_token.clone(),
    ));

    let session = BridgeSession::new(
        Arc::clone(&speakers),
        Arc::clone(&publisher),
        config.discovery_prefix.clone(),
    );
    let session_cancel = cancel_token.clone();
    tokio::spawn(async move { session.run(events_rx, session_cancel).await });

    let reconciler =
        StateReconciler::new(Arc::clone(&speakers), publisher, config.poll_interval());

    Ok(BootstrappedServices {
        speakers,
        bus,
        reconciler,
        cancel_token,
    })
}

//! Pairing and connection control through `bluetoothctl`.
//!
//! `bluetoothctl` is interactive, so each action is piped to it on stdin
//! followed by `quit`. Every session has a hard timeout; a hung device can
//! never block the caller for longer than that.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::device::DeviceAddress;
use crate::protocol_constants::{BLUETOOTHCTL_PROGRAM, BLUETOOTH_TIMEOUT_SECS};

use super::command::{CommandRunner, Invocation};

/// A single `bluetoothctl` device command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BluetoothAction {
    Connect,
    Disconnect,
    Pair,
    Trust,
    /// Unpair and forget the device.
    Remove,
}

impl BluetoothAction {
    /// The `bluetoothctl` command word.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connect => "connect",
            Self::Disconnect => "disconnect",
            Self::Pair => "pair",
            Self::Trust => "trust",
            Self::Remove => "remove",
        }
    }
}

impl fmt::Display for BluetoothAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trait for Bluetooth device control.
#[async_trait]
pub trait BluetoothControl: Send + Sync {
    /// Runs `action` against `address` and returns the tool's stdout.
    ///
    /// Never fails: timeouts and execution errors are logged and produce an
    /// empty string.
    async fn run(&self, action: BluetoothAction, address: &DeviceAddress) -> String;
}

/// [`BluetoothControl`] backed by the BlueZ `bluetoothctl` tool.
pub struct BluetoothCtl {
    runner: Arc<dyn CommandRunner>,
    timeout: Duration,
}

impl BluetoothCtl {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            runner,
            timeout: Duration::from_secs(BLUETOOTH_TIMEOUT_SECS),
        }
    }

    /// Builds the stdin session for one action.
    fn session(&self, action: BluetoothAction, address: &DeviceAddress) -> Invocation {
        Invocation::new(BLUETOOTHCTL_PROGRAM, self.timeout)
            .stdin(format!("{} {}\nquit\n", action, address))
    }
}

#[async_trait]
impl BluetoothControl for BluetoothCtl {
    async fn run(&self, action: BluetoothAction, address: &DeviceAddress) -> String {
        log::info!("[Bluetooth] Executing bluetoothctl command: {} {}", action, address);

        match self.runner.run(&self.session(action, address)).await {
            Ok(out) => {
                if !out.stdout.is_empty() {
                    log::info!("[Bluetooth] bluetoothctl stdout: {}", out.stdout.trim_end());
                }
                if !out.stderr.is_empty() {
                    log::warn!("[Bluetooth] bluetoothctl stderr: {}", out.stderr.trim_end());
                }
                out.stdout
            }
            Err(e) => {
                log::error!("[Bluetooth] {} {} failed: {}", action, address, e);
                String::new()
            }
        }
    }
}

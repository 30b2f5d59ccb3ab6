//! Adapters over the external device-control tools.
//!
//! # Module Structure
//!
//! - `command` - Typed tool invocation and the process runner
//! - `audio` - Sink status, volume, mute and default-sink control via `pactl`
//! - `bluetooth` - Connect, pair, trust and remove via `bluetoothctl`

pub mod audio;
pub mod bluetooth;
pub mod command;

pub use audio::{AudioControl, PactlAudio};
pub use bluetooth::{BluetoothAction, BluetoothControl, BluetoothCtl};
pub use command::{
    CommandOutput, CommandRunner, Invocation, ShellError, ShellResult, SystemCommandRunner,
};

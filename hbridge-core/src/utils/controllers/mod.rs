//! Module Exports
//!
//! This file exports the H-bridge driver and the pieces around it.
//!
//! - `hbridge`: the driver, its configuration and the mutex-guarded wrapper.
//! - `outputs`: the `FloatOutput` sink trait and hardware adapters.
//! - `action`: deferred set-output actions.
//!
//! Commands from other tasks arrive as `BridgeCommand`s over a channel and
//! are applied by a single `BridgeController`.

pub mod action;
pub mod hbridge;
pub mod outputs;

use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex, channel::Channel};
use serde::{Deserialize, Serialize};

pub use action::OutputAction;
pub use hbridge::{BridgeSettings, ConfigError, EnablePolicy, HBridge, HBridgeConfig, SharedHBridge};
pub use outputs::{FloatOutput, NoOutput, Pca9685Output, PinOutput, PwmOutput};

/// Channel carrying `BridgeCommand`s to a `BridgeController`.
pub type BridgeChannel = Channel<CriticalSectionRawMutex, BridgeCommand, 16>;

/// Default command channel.
pub static BRIDGE_CHANNEL: BridgeChannel = Channel::new();

/// Bridge command variants.
///
/// Serialized as JSON with tag `"bc"`, e.g. `{"bc":"set_output","output":-0.4}`.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(tag = "bc", rename_all = "snake_case")]
pub enum BridgeCommand {
    /// Apply a signed command in `[-1.0, 1.0]` (clamped).
    SetOutput { output: f32 },
    /// Coast both half-bridges.
    Stop,
}

/// Parse a JSON `BridgeCommand`, logging and discarding malformed input.
pub fn parse_command(data: &[u8]) -> Option<BridgeCommand> {
    match serde_json::from_slice::<BridgeCommand>(data) {
        Ok(command) => Some(command),
        Err(error) => {
            tracing::error!(?error, "error deserializing BridgeCommand");
            None
        }
    }
}

/// Applies commands from a channel to one shared bridge.
pub struct BridgeController<'a, A, B, E = NoOutput> {
    bridge: &'a SharedHBridge<A, B, E>,
    channel: &'a BridgeChannel,
}

impl<'a, A, B, E> BridgeController<'a, A, B, E>
where
    A: FloatOutput,
    B: FloatOutput,
    E: FloatOutput,
{
    pub fn new(
        bridge: &'a SharedHBridge<A, B, E>,
        channel: &'a BridgeChannel,
    ) -> Self {
        Self { bridge, channel }
    }

    pub fn execute_command(
        &self,
        command: BridgeCommand,
    ) {
        match command {
            BridgeCommand::SetOutput { output } => self.bridge.set_output(output),
            BridgeCommand::Stop => self.bridge.set_output(0.0),
        }
    }

    /// Apply every command currently queued. Returns how many were applied.
    pub fn poll_commands(&self) -> usize {
        let mut applied = 0;
        while let Ok(command) = self.channel.try_receive() {
            tracing::info!("Received bridge command: {:?}", command);
            self.execute_command(command);
            applied += 1;
        }
        applied
    }

    /// Control task: wait for commands and apply them, forever.
    pub async fn bridge_ch(&self) -> ! {
        loop {
            let command = self.channel.receive().await;
            tracing::info!("Received bridge command: {:?}", command);
            self.execute_command(command);
        }
    }
}

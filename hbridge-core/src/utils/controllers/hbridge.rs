//! H-bridge driver.
//!
//! `HBridge` turns one signed command into two unipolar drive levels (output
//! A for forward, output B for reverse) and an optional enable level. Writes
//! are ordered so that the half-bridge being switched off reaches zero before
//! the opposite one is switched on, and the enable line only goes high once
//! the direction for the new command is in place.
//!
//! ```rust
//! use hbridge_core::utils::controllers::{FloatOutput, HBridge, HBridgeConfig};
//!
//! struct Duty(f32);
//! impl FloatOutput for Duty {
//!     fn set_level(&mut self, level: f32) { self.0 = level; }
//! }
//!
//! let (mut a, mut b) = (Duty(0.0), Duty(0.0));
//! let mut bridge = HBridge::new(HBridgeConfig::new().output_a(&mut a).output_b(&mut b)).unwrap();
//! bridge.set_output(-0.5);
//! drop(bridge);
//! assert_eq!((a.0, b.0), (0.0, 0.5));
//! ```

use core::{cell::RefCell, fmt};

use embassy_sync::blocking_mutex::{raw::CriticalSectionRawMutex, Mutex};
use serde::{Deserialize, Serialize};

use super::outputs::{FloatOutput, NoOutput};
use crate::utils::math::mapping::{clamp_command, DriveState};

/// Errors detected while building an `HBridge`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    MissingOutputA,
    MissingOutputB,
    /// Deadband is not a finite value in `[0.0, 1.0)`.
    InvalidDeadband,
}

impl fmt::Display for ConfigError {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            ConfigError::MissingOutputA => f.write_str("output_a is required"),
            ConfigError::MissingOutputB => f.write_str("output_b is required"),
            ConfigError::InvalidDeadband => f.write_str("deadband must be within [0.0, 1.0)"),
        }
    }
}

/// How the enable output follows the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnablePolicy {
    /// Enable is high only while a direction is driven; stopping releases it.
    #[default]
    TrackMagnitude,
    /// Enable is held high for as long as the driver exists.
    AlwaysOn,
}

/// Scalar bridge settings.
///
/// Deserializable from JSON, e.g. `{"enable_policy":"always_on","deadband":0.01}`.
/// Missing fields take their defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeSettings {
    pub enable_policy: EnablePolicy,
    /// Commands with `|value| <= deadband` coast the bridge.
    pub deadband: f32,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            enable_policy: EnablePolicy::TrackMagnitude,
            deadband: 0.0,
        }
    }
}

impl BridgeSettings {
    pub fn from_json(data: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(data)
    }
}

/// Outputs and settings an `HBridge` is built from.
///
/// Outputs A and B are required; `HBridge::new` rejects a configuration
/// missing either of them.
pub struct HBridgeConfig<A, B, E = NoOutput> {
    output_a: Option<A>,
    output_b: Option<B>,
    output_enable: Option<E>,
    settings: BridgeSettings,
}

impl<A, B> HBridgeConfig<A, B, NoOutput> {
    pub fn new() -> Self {
        Self {
            output_a: None,
            output_b: None,
            output_enable: None,
            settings: BridgeSettings::default(),
        }
    }
}

impl<A, B> Default for HBridgeConfig<A, B, NoOutput> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A, B, E> HBridgeConfig<A, B, E> {
    /// Forward half-bridge.
    pub fn output_a(
        mut self,
        output: A,
    ) -> Self {
        self.output_a = Some(output);
        self
    }

    /// Reverse half-bridge.
    pub fn output_b(
        mut self,
        output: B,
    ) -> Self {
        self.output_b = Some(output);
        self
    }

    /// Bridge enable line.
    pub fn output_enable<E2>(
        self,
        output: E2,
    ) -> HBridgeConfig<A, B, E2> {
        HBridgeConfig {
            output_a: self.output_a,
            output_b: self.output_b,
            output_enable: Some(output),
            settings: self.settings,
        }
    }

    pub fn enable_policy(
        mut self,
        policy: EnablePolicy,
    ) -> Self {
        self.settings.enable_policy = policy;
        self
    }

    pub fn deadband(
        mut self,
        deadband: f32,
    ) -> Self {
        self.settings.deadband = deadband;
        self
    }

    pub fn settings(
        mut self,
        settings: BridgeSettings,
    ) -> Self {
        self.settings = settings;
        self
    }
}

/// Driver for one H-bridge.
///
/// At most one of output A and output B carries a non-zero level at any time.
pub struct HBridge<A, B, E = NoOutput> {
    output_a: A,
    output_b: B,
    output_enable: Option<E>,
    settings: BridgeSettings,
    command: f32,
    state: DriveState,
    enabled: bool,
}

impl<A, B, E> HBridge<A, B, E>
where
    A: FloatOutput,
    B: FloatOutput,
    E: FloatOutput,
{
    /// Validate `config` and put the bridge in its stopped state.
    ///
    /// Both half-bridges are written to `0.0`. With `EnablePolicy::AlwaysOn`
    /// the enable output is then raised; otherwise it is written low first.
    pub fn new(config: HBridgeConfig<A, B, E>) -> Result<Self, ConfigError> {
        let HBridgeConfig {
            output_a,
            output_b,
            output_enable,
            settings,
        } = config;

        let output_a = output_a.ok_or(ConfigError::MissingOutputA)?;
        let output_b = output_b.ok_or(ConfigError::MissingOutputB)?;
        if !settings.deadband.is_finite() || !(0.0..1.0).contains(&settings.deadband) {
            return Err(ConfigError::InvalidDeadband);
        }

        let mut bridge = HBridge {
            output_a,
            output_b,
            output_enable,
            settings,
            command: 0.0,
            state: DriveState::Stopped,
            enabled: false,
        };
        bridge.setup();
        Ok(bridge)
    }

    fn setup(&mut self) {
        let always_on = self.settings.enable_policy == EnablePolicy::AlwaysOn;
        if !always_on {
            self.write_enable(false);
        }
        self.write_drive(DriveState::Stopped);
        if always_on {
            self.write_enable(true);
        }
        tracing::debug!("H-bridge ready (enable output: {})", self.has_enable_output());
    }

    /// Apply a signed command.
    ///
    /// `value` is clamped to `[-1.0, 1.0]` (NaN stops the bridge). Positive
    /// commands drive output A, negative ones output B, and zero (or anything
    /// inside the deadband) drives neither.
    pub fn set_output(
        &mut self,
        value: f32,
    ) {
        let command = clamp_command(value);
        let state = DriveState::from_command(command, self.settings.deadband);
        let enable = match self.settings.enable_policy {
            EnablePolicy::AlwaysOn => true,
            EnablePolicy::TrackMagnitude => state.is_active(),
        };

        // gate off before touching the direction outputs
        if !enable {
            self.write_enable(false);
        }
        self.write_drive(state);
        if enable {
            self.write_enable(true);
        }

        self.command = command;
        self.state = state;
        tracing::trace!(command, ?state, "h-bridge output applied");
    }

    /// Write the A/B levels for `state`, zeroing the released side first.
    fn write_drive(
        &mut self,
        state: DriveState,
    ) {
        let (a, b) = state.levels();
        if a > 0.0 {
            self.output_b.set_level(b);
            self.output_a.set_level(a);
        } else {
            self.output_a.set_level(a);
            self.output_b.set_level(b);
        }
    }

    fn write_enable(
        &mut self,
        on: bool,
    ) {
        if let Some(enable) = self.output_enable.as_mut() {
            enable.set_level(if on { 1.0 } else { 0.0 });
            self.enabled = on;
        }
    }

    /// Log the bridge configuration.
    pub fn log_config(&self) {
        tracing::info!("H-Bridge:");
        tracing::info!(
            "  Enable output: {}",
            if self.has_enable_output() { "configured" } else { "none" }
        );
        tracing::info!("  Enable policy: {:?}", self.settings.enable_policy);
        tracing::info!("  Deadband: {}", self.settings.deadband);
    }
}

impl<A, B, E> HBridge<A, B, E> {
    /// Last command passed to `set_output`, after clamping.
    ///
    /// Commands swallowed by the deadband are still reported here; see
    /// [`HBridge::state`] for what is actually driven.
    pub fn command(&self) -> f32 {
        self.command
    }

    pub fn state(&self) -> DriveState {
        self.state
    }

    /// Whether the enable output is currently high. Always `false` without one.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn has_enable_output(&self) -> bool {
        self.output_enable.is_some()
    }

    pub fn settings(&self) -> BridgeSettings {
        self.settings
    }
}

/// `HBridge` behind a critical-section mutex.
///
/// Every `set_output` runs to completion inside one critical section, so
/// callers on different threads or interrupt priorities cannot interleave
/// their output writes.
pub struct SharedHBridge<A, B, E = NoOutput> {
    inner: Mutex<CriticalSectionRawMutex, RefCell<HBridge<A, B, E>>>,
}

impl<A, B, E> SharedHBridge<A, B, E>
where
    A: FloatOutput,
    B: FloatOutput,
    E: FloatOutput,
{
    pub fn new(config: HBridgeConfig<A, B, E>) -> Result<Self, ConfigError> {
        HBridge::new(config).map(Self::from_bridge)
    }

    pub fn from_bridge(bridge: HBridge<A, B, E>) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(bridge)),
        }
    }

    pub fn set_output(
        &self,
        value: f32,
    ) {
        self.inner.lock(|bridge| bridge.borrow_mut().set_output(value));
    }

    /// Run `f` with exclusive access to the bridge.
    ///
    /// `f` must not call back into this `SharedHBridge`.
    pub fn with<R>(
        &self,
        f: impl FnOnce(&mut HBridge<A, B, E>) -> R,
    ) -> R {
        self.inner.lock(|bridge| {
            let mut bridge = bridge.borrow_mut();
            f(&mut *bridge)
        })
    }

    pub fn command(&self) -> f32 {
        self.with(|bridge| bridge.command())
    }

    pub fn state(&self) -> DriveState {
        self.with(|bridge| bridge.state())
    }

    pub fn is_enabled(&self) -> bool {
        self.with(|bridge| bridge.is_enabled())
    }

    pub fn into_inner(self) -> HBridge<A, B, E> {
        self.inner.into_inner().into_inner()
    }
}

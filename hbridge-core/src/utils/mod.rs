//! Utility re-exports for the H-bridge driver.
//!
//! - `controllers`: the driver, output adapters, actions and command dispatch
//! - `math`: signed command to dual unipolar level mapping

pub mod controllers;
pub mod math;

pub use controllers::{BridgeController, HBridge, SharedHBridge};
pub use math::mapping::{clamp_command, DriveState};

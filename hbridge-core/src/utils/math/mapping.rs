//! Signed command to dual unipolar level mapping.
//!
//! A command in `[-1.0, 1.0]` selects a direction and a drive magnitude. The
//! `DriveState` it maps to never drives both half-bridges at once: forward
//! puts the magnitude on output A, reverse puts it on output B, and anything
//! inside the deadband coasts with both outputs at zero.
//!
//! # Example
//! ```rust
//! use hbridge_core::utils::math::mapping::DriveState;
//! let state = DriveState::from_command(-0.4, 0.0);
//! assert_eq!(state.levels(), (0.0, 0.4));
//! ```

/// Full reverse.
pub const COMMAND_MIN: f32 = -1.0;
/// Full forward.
pub const COMMAND_MAX: f32 = 1.0;

/// Clamp a raw command into `[COMMAND_MIN, COMMAND_MAX]`.
///
/// Out-of-range input is not an error, it saturates. NaN carries no
/// direction and maps to `0.0`.
pub fn clamp_command(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(COMMAND_MIN, COMMAND_MAX)
    }
}

/// Direction and magnitude applied to the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DriveState {
    /// Both outputs at zero (coast).
    #[default]
    Stopped,
    /// Output A carries the magnitude, output B is zero.
    Forward(f32),
    /// Output B carries the magnitude, output A is zero.
    Reverse(f32),
}

impl DriveState {
    /// Map a signed command onto a drive state.
    ///
    /// The command is clamped first. Commands whose clamped value lies in
    /// `[-deadband, deadband]` stop the bridge; with a deadband of `0.0` only
    /// an exact zero does.
    pub fn from_command(
        value: f32,
        deadband: f32,
    ) -> Self {
        let clamped = clamp_command(value);
        let magnitude = libm::fabsf(clamped);

        if clamped > deadband {
            DriveState::Forward(magnitude)
        } else if clamped < -deadband {
            DriveState::Reverse(magnitude)
        } else {
            DriveState::Stopped
        }
    }

    /// `(a, b)` levels for this state. At least one of them is `0.0`.
    pub fn levels(&self) -> (f32, f32) {
        match *self {
            DriveState::Stopped => (0.0, 0.0),
            DriveState::Forward(m) => (m, 0.0),
            DriveState::Reverse(m) => (0.0, m),
        }
    }

    pub fn magnitude(&self) -> f32 {
        match *self {
            DriveState::Stopped => 0.0,
            DriveState::Forward(m) | DriveState::Reverse(m) => m,
        }
    }

    /// Signed command equivalent of this state.
    pub fn command(&self) -> f32 {
        match *self {
            DriveState::Stopped => 0.0,
            DriveState::Forward(m) => m,
            DriveState::Reverse(m) => -m,
        }
    }

    /// Whether either half-bridge is being driven.
    pub fn is_active(&self) -> bool {
        !matches!(self, DriveState::Stopped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_command_bounds() {
        assert_eq!(clamp_command(1.5), 1.0);
        assert_eq!(clamp_command(-2.0), -1.0);
        assert_eq!(clamp_command(0.25), 0.25);
        assert_eq!(clamp_command(f32::INFINITY), 1.0);
        assert_eq!(clamp_command(f32::NEG_INFINITY), -1.0);
    }

    #[test]
    fn test_clamp_command_nan_stops() {
        assert_eq!(clamp_command(f32::NAN), 0.0);
        assert_eq!(DriveState::from_command(f32::NAN, 0.0), DriveState::Stopped);
    }

    #[test]
    fn test_direction_split() {
        assert_eq!(DriveState::from_command(0.6, 0.0), DriveState::Forward(0.6));
        assert_eq!(DriveState::from_command(-0.3, 0.0), DriveState::Reverse(0.3));
        assert_eq!(DriveState::from_command(0.0, 0.0), DriveState::Stopped);
        assert_eq!(DriveState::from_command(-0.0, 0.0), DriveState::Stopped);
    }

    #[test]
    fn test_levels_are_exclusive() {
        for &cmd in &[-1.0, -0.5, -0.01, 0.0, 0.01, 0.5, 1.0] {
            let (a, b) = DriveState::from_command(cmd, 0.0).levels();
            assert_eq!(a * b, 0.0, "both sides driven for {}", cmd);
            assert!(a >= 0.0 && b >= 0.0);
        }
    }

    #[test]
    fn test_deadband() {
        assert_eq!(DriveState::from_command(0.01, 0.01), DriveState::Stopped);
        assert_eq!(DriveState::from_command(-0.01, 0.01), DriveState::Stopped);
        assert_eq!(DriveState::from_command(0.02, 0.01), DriveState::Forward(0.02));
        assert_eq!(DriveState::from_command(-0.02, 0.01), DriveState::Reverse(0.02));
    }

    #[test]
    fn test_command_read_back() {
        assert_eq!(DriveState::Reverse(0.4).command(), -0.4);
        assert_eq!(DriveState::Forward(0.4).magnitude(), 0.4);
        assert!(!DriveState::Stopped.is_active());
        assert!(DriveState::Forward(1.0).is_active());
    }
}

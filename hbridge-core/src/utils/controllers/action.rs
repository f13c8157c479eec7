//! Deferred "set output" action.
//!
//! An `OutputAction` binds a shared bridge to a value producer. The value is
//! computed when the action is played, not when it is built, so the same
//! action can replay a fixed setpoint or sample a live source each time.

use super::{hbridge::SharedHBridge, outputs::FloatOutput};

pub struct OutputAction<'a, A, B, E, F> {
    bridge: &'a SharedHBridge<A, B, E>,
    output: F,
}

impl<'a, A, B, E, F> OutputAction<'a, A, B, E, F>
where
    A: FloatOutput,
    B: FloatOutput,
    E: FloatOutput,
    F: FnMut() -> f32,
{
    /// Bind `output` to `bridge`. Use `move || 0.5` for a fixed value.
    pub fn new(
        bridge: &'a SharedHBridge<A, B, E>,
        output: F,
    ) -> Self {
        Self { bridge, output }
    }

    /// Evaluate the producer and apply the result to the bridge.
    pub fn play(&mut self) {
        let value = (self.output)();
        tracing::debug!(value, "hbridge.set_output");
        self.bridge.set_output(value);
    }
}

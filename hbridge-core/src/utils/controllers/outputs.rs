//! Float outputs driven by the H-bridge.
//!
//! A [`FloatOutput`] accepts a level in `[0.0, 1.0]` and never reports
//! failure to its caller; the adapters below log their own bus or pin errors
//! instead. Adapters are provided for:
//!
//! - `PwmOutput`: any `embedded_hal::pwm::SetDutyCycle` channel
//! - `PinOutput`: a digital `OutputPin`, typically a bridge enable line
//! - `Pca9685Output`: one channel of a PCA9685 shared over I2C

use core::cell::RefCell;

use embedded_hal::{digital::OutputPin, i2c::I2c, pwm::SetDutyCycle};
use pwm_pca9685::{Channel, Pca9685};

/// Full-scale duty of a PCA9685 channel (12-bit).
pub const PCA9685_MAX_DUTY: u16 = 4095;

/// An output channel that accepts a non-negative drive level.
pub trait FloatOutput {
    /// Drive the output to `level` (`0.0` = off, `1.0` = full).
    fn set_level(
        &mut self,
        level: f32,
    );
}

/// Borrowed outputs stay owned by the caller.
impl<T: FloatOutput + ?Sized> FloatOutput for &mut T {
    fn set_level(
        &mut self,
        level: f32,
    ) {
        (**self).set_level(level)
    }
}

/// Stand-in for an enable output that is not wired. Never written.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOutput;

impl FloatOutput for NoOutput {
    fn set_level(
        &mut self,
        _level: f32,
    ) {
    }
}

fn unit_level(level: f32) -> f32 {
    if level.is_nan() {
        0.0
    } else {
        level.clamp(0.0, 1.0)
    }
}

fn scale_duty(
    level: f32,
    max_duty: u16,
) -> u16 {
    libm::roundf(unit_level(level) * max_duty as f32) as u16
}

/// PWM channel driven as a fraction of its maximum duty cycle.
pub struct PwmOutput<P> {
    pwm: P,
    max_duty: u16,
}

impl<P: SetDutyCycle> PwmOutput<P> {
    /// Wrap a PWM channel. The maximum duty cycle is read once here.
    pub fn new(pwm: P) -> Self {
        let max_duty = pwm.max_duty_cycle();
        Self { pwm, max_duty }
    }

    /// Duty cycle written for `level`.
    pub fn duty_for(
        &self,
        level: f32,
    ) -> u16 {
        scale_duty(level, self.max_duty)
    }

    pub fn release(self) -> P {
        self.pwm
    }
}

impl<P: SetDutyCycle> FloatOutput for PwmOutput<P> {
    fn set_level(
        &mut self,
        level: f32,
    ) {
        let duty = self.duty_for(level);
        if let Err(e) = self.pwm.set_duty_cycle(duty) {
            tracing::error!("PWM duty write ({}) failed: {:?}", duty, e);
        }
    }
}

/// Digital pin used as a float output: levels of `0.5` and above drive it high.
pub struct PinOutput<P> {
    pin: P,
}

impl<P: OutputPin> PinOutput<P> {
    pub fn new(pin: P) -> Self {
        Self { pin }
    }

    pub fn release(self) -> P {
        self.pin
    }
}

impl<P: OutputPin> FloatOutput for PinOutput<P> {
    fn set_level(
        &mut self,
        level: f32,
    ) {
        let result = if level >= 0.5 {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        };
        if let Err(e) = result {
            tracing::error!("Output pin write failed: {:?}", e);
        }
    }
}

/// One channel of a PCA9685 PWM controller.
///
/// The controller is shared through a `RefCell` so that both half-bridges
/// (and the enable line) can live on the same chip.
pub struct Pca9685Output<'a, I2C> {
    pca: &'a RefCell<Pca9685<I2C>>,
    channel: Channel,
}

impl<'a, I2C, E> Pca9685Output<'a, I2C>
where
    I2C: I2c<Error = E>,
    E: core::fmt::Debug,
{
    pub fn new(
        pca: &'a RefCell<Pca9685<I2C>>,
        channel: Channel,
    ) -> Self {
        Self { pca, channel }
    }
}

impl<I2C, E> FloatOutput for Pca9685Output<'_, I2C>
where
    I2C: I2c<Error = E>,
    E: core::fmt::Debug,
{
    fn set_level(
        &mut self,
        level: f32,
    ) {
        let off = scale_duty(level, PCA9685_MAX_DUTY);
        if let Err(e) = self
            .pca
            .borrow_mut()
            .set_channel_on_off(self.channel, 0, off)
        {
            tracing::error!("PCA9685 channel write ({}) failed: {:?}", off, e);
        }
    }
}

//! Heater power stage: power PWM plus safety-interlock PWM.
//!
//! The MOSFET only conducts while the interlock channel is toggling; if
//! firmware hangs with the power PWM stuck high, the external safety
//! circuit sees the interlock stop and cuts the heater.
//!
//! ## Safety contract
//!
//! Callers pair every non-zero power level with `set_enabled(true)` and
//! every heater-off with `set_enabled(false)`.  The actuation mediator
//! is the only caller; this driver is a dumb actuator.
//!
//! ## Dual-target design
//!
//! Generic over `embedded-hal` `SetDutyCycle`: LEDC channels on ESP-IDF
//! (100 Hz power, 200 Hz interlock), recorded mocks on host.

use embedded_hal::pwm::SetDutyCycle;

use crate::error::ActuatorError;

/// Interlock duty while the heater is authorised (50 %).
const INTERLOCK_DUTY_PERCENT: u8 = 50;

pub struct HeaterDriver<P, S> {
    power: P,
    interlock: S,
    level: f32,
    enabled: bool,
}

impl<P: SetDutyCycle, S: SetDutyCycle> HeaterDriver<P, S> {
    pub fn new(power: P, interlock: S) -> Self {
        Self {
            power,
            interlock,
            level: 0.0,
            enabled: false,
        }
    }

    /// Set heater power as a fraction of full duty.  Values are clamped
    /// to `[0, 1]`; NaN is treated as off.
    pub fn set_level(&mut self, level: f32) -> Result<(), ActuatorError> {
        let level = if level.is_nan() { 0.0 } else { level.clamp(0.0, 1.0) };
        let duty = (level * f32::from(self.power.max_duty_cycle())).round() as u16;
        self.power
            .set_duty_cycle(duty)
            .map_err(|_| ActuatorError::PwmWriteFailed)?;
        self.level = level;
        Ok(())
    }

    /// Start or stop the interlock signal.
    pub fn set_enabled(&mut self, enabled: bool) -> Result<(), ActuatorError> {
        let percent = if enabled { INTERLOCK_DUTY_PERCENT } else { 0 };
        self.interlock
            .set_duty_cycle_percent(percent)
            .map_err(|_| ActuatorError::PwmWriteFailed)?;
        self.enabled = enabled;
        Ok(())
    }

    /// Power off and interlock released.
    pub fn off(&mut self) -> Result<(), ActuatorError> {
        // Release the interlock even if the power write fails.
        let power = self.set_level(0.0);
        self.set_enabled(false)?;
        power
    }

    pub fn level(&self) -> f32 {
        self.level
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

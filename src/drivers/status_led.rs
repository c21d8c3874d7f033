//! Power / mode indicator LED.
//!
//! Lit while temperature control is enabled.  A single GPIO; polarity is
//! chosen at construction.

use embedded_hal::digital::{OutputPin, PinState};

use crate::error::ActuatorError;

pub struct StatusLed<P> {
    pin: P,
    on_level: PinState,
    lit: bool,
}

impl<P: OutputPin> StatusLed<P> {
    pub fn new(pin: P, active_low: bool) -> Self {
        Self {
            pin,
            on_level: PinState::from(!active_low),
            lit: false,
        }
    }

    pub fn set(&mut self, on: bool) -> Result<(), ActuatorError> {
        let level = if on { self.on_level } else { !self.on_level };
        self.pin
            .set_state(level)
            .map_err(|_| ActuatorError::GpioWriteFailed)?;
        self.lit = on;
        Ok(())
    }

    pub fn off(&mut self) -> Result<(), ActuatorError> {
        self.set(false)
    }

    pub fn is_lit(&self) -> bool {
        self.lit
    }
}

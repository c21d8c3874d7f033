//! Fan relay driver.
//!
//! A single GPIO drives the relay coil.  The relay module on the board is
//! active-high; an inverted module can be used by constructing with
//! `active_high = false`.

use embedded_hal::digital::{OutputPin, PinState};

use crate::error::ActuatorError;

pub struct RelayDriver<P> {
    pin: P,
    active_high: bool,
    on: bool,
}

impl<P: OutputPin> RelayDriver<P> {
    pub fn new(pin: P, active_high: bool) -> Self {
        Self {
            pin,
            active_high,
            on: false,
        }
    }

    pub fn set(&mut self, on: bool) -> Result<(), ActuatorError> {
        let state = PinState::from(on == self.active_high);
        self.pin
            .set_state(state)
            .map_err(|_| ActuatorError::GpioWriteFailed)?;
        self.on = on;
        Ok(())
    }

    pub fn is_on(&self) -> bool {
        self.on
    }
}

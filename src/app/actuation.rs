//! Actuation mediator — the only path from control decisions to outputs.
//!
//! Pairs every heater power change with the safety-interlock signal: the
//! interlock is asserted exactly while a non-zero heater level is
//! commanded.  All writes are idempotent, so the heater and fan halves of
//! a tick can be applied in either order and repeated safely.

use log::debug;

use crate::fsm::context::ActuatorCommands;

use super::ports::ActuatorPort;

/// Bring an arbitrary heater request into `[0, 1]`; NaN means off.
pub fn sanitize_level(level: f32) -> f32 {
    if level.is_nan() {
        0.0
    } else {
        level.clamp(0.0, 1.0)
    }
}

/// Tracks what was last written so the service can report it.
#[derive(Debug, Default)]
pub struct ActuationMediator {
    applied: ActuatorCommands,
}

impl ActuationMediator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drive the heater at `level` and authorise power through the
    /// interlock.  A level that sanitises to zero is treated as off.
    pub fn heater_on(&mut self, hw: &mut impl ActuatorPort, level: f32) {
        let level = sanitize_level(level);
        if level <= 0.0 {
            self.heater_off(hw);
            return;
        }
        hw.set_heater_duty(level);
        hw.set_heater_enable(true);
        self.applied.heater_level = level;
    }

    /// Zero the heater duty and release the interlock.
    pub fn heater_off(&mut self, hw: &mut impl ActuatorPort) {
        hw.set_heater_duty(0.0);
        hw.set_heater_enable(false);
        self.applied.heater_level = 0.0;
    }

    pub fn set_fan(&mut self, hw: &mut impl ActuatorPort, on: bool) {
        if on != self.applied.fan_on {
            debug!("Fan {}", if on { "on" } else { "off" });
        }
        hw.set_fan(on);
        self.applied.fan_on = on;
    }

    pub fn set_power_led(&mut self, hw: &mut impl ActuatorPort, on: bool) {
        hw.set_power_led(on);
        self.applied.power_led = on;
    }

    /// Apply a full set of handler outputs.
    pub fn apply(&mut self, hw: &mut impl ActuatorPort, cmds: &ActuatorCommands) {
        self.heater_on(hw, cmds.heater_level);
        self.set_fan(hw, cmds.fan_on);
        self.set_power_led(hw, cmds.power_led);
    }

    /// Kill everything (boot and shutdown).
    pub fn all_off(&mut self, hw: &mut impl ActuatorPort) {
        hw.all_off();
        self.applied = ActuatorCommands::all_off();
    }

    /// Outputs as last written.
    pub fn applied(&self) -> ActuatorCommands {
        self.applied
    }
}

//! Hardware adapter — bridges real peripherals to domain port traits.
//!
//! Owns both climate sensors and every actuator driver, exposing them
//! through [`SensorPort`] and [`ActuatorPort`].  This is the only
//! module in the system that touches actual hardware.  Drivers are
//! generic over `embedded-hal`, so the same adapter runs on ESP-IDF
//! peripherals and on host mocks.

use embedded_hal::digital::OutputPin;
use embedded_hal::pwm::SetDutyCycle;
use log::warn;

use crate::app::ports::{ActuatorPort, SensorPort};
use crate::drivers::fan::RelayDriver;
use crate::drivers::heater::HeaterDriver;
use crate::drivers::status_led::StatusLed;
use crate::error::{ActuatorError, SensorError};
use crate::sensors::{ClimateReading, ClimateSensor};

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter<E, R, HP, HS, F, L> {
    enclosure: E,
    room: R,
    heater: HeaterDriver<HP, HS>,
    fan: RelayDriver<F>,
    led: StatusLed<L>,
}

impl<E, R, HP, HS, F, L> HardwareAdapter<E, R, HP, HS, F, L> {
    pub fn new(
        enclosure: E,
        room: R,
        heater: HeaterDriver<HP, HS>,
        fan: RelayDriver<F>,
        led: StatusLed<L>,
    ) -> Self {
        Self {
            enclosure,
            room,
            heater,
            fan,
            led,
        }
    }
}

fn log_failure(what: &str, result: Result<(), ActuatorError>) {
    if let Err(e) = result {
        warn!("{} write failed: {}", what, e);
    }
}

// ── SensorPort implementation ─────────────────────────────────

impl<E, R, HP, HS, F, L> SensorPort for HardwareAdapter<E, R, HP, HS, F, L>
where
    E: ClimateSensor,
    R: ClimateSensor,
{
    fn read_enclosure(&mut self) -> Result<ClimateReading, SensorError> {
        self.enclosure.read()
    }

    fn read_room(&mut self) -> Result<ClimateReading, SensorError> {
        self.room.read()
    }
}

// ── ActuatorPort implementation ───────────────────────────────

impl<E, R, HP, HS, F, L> ActuatorPort for HardwareAdapter<E, R, HP, HS, F, L>
where
    HP: SetDutyCycle,
    HS: SetDutyCycle,
    F: OutputPin,
    L: OutputPin,
{
    fn set_heater_duty(&mut self, level: f32) {
        log_failure("Heater", self.heater.set_level(level));
    }

    fn set_heater_enable(&mut self, enabled: bool) {
        log_failure("Interlock", self.heater.set_enabled(enabled));
    }

    fn set_fan(&mut self, on: bool) {
        log_failure("Fan", self.fan.set(on));
    }

    fn set_power_led(&mut self, on: bool) {
        log_failure("LED", self.led.set(on));
    }

    fn all_off(&mut self) {
        log_failure("Heater", self.heater.off());
        log_failure("Fan", self.fan.set(false));
        log_failure("LED", self.led.off());
    }
}

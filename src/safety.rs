//! Temperature validity gate.
//!
//! Every enclosure sample passes through the gate **before** it reaches
//! the trajectory planner or the closed-loop controller.  A sample is
//! usable only if it lies inside the configured plausible range; a failed
//! sensor read is classified exactly like an implausible value.
//!
//! ## Fault lifecycle
//!
//! 1. The gate rejects a sample and returns a [`SensorFault`].
//! 2. If the controller is in any state other than Disabled, the FSM
//!    transitions to `Error`; the heater is forced off and the fan runs
//!    for the cooldown period.
//! 3. `Error` re-polls on the slow cadence and is left only through an
//!    explicit disable (→ Disabled) or a fresh enable.

use crate::config::ControlConfig;
use crate::error::{SensorError, SensorFault};
use crate::sensors::ClimateReading;

/// Plausibility bounds for the enclosure temperature.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValidityGate {
    min_c: f32,
    max_c: f32,
}

impl ValidityGate {
    pub fn new(min_c: f32, max_c: f32) -> Self {
        Self { min_c, max_c }
    }

    /// True iff `min ≤ temp ≤ max`.  NaN never passes.
    pub fn is_valid(&self, temp_c: f32) -> bool {
        temp_c >= self.min_c && temp_c <= self.max_c
    }

    /// Classify a raw sensor result into a usable temperature or a fault.
    pub fn check(
        &self,
        reading: Result<ClimateReading, SensorError>,
    ) -> Result<f32, SensorFault> {
        let reading = reading.map_err(SensorFault::ReadFailed)?;
        if self.is_valid(reading.temperature_c) {
            Ok(reading.temperature_c)
        } else {
            Err(SensorFault::OutOfRange {
                temp_c: reading.temperature_c,
                min_c: self.min_c,
                max_c: self.max_c,
            })
        }
    }
}

impl From<&ControlConfig> for ValidityGate {
    fn from(config: &ControlConfig) -> Self {
        Self::new(config.min_valid_temp_c, config.max_valid_temp_c)
    }
}

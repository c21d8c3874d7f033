//! Sensor subsystem — climate sensor drivers.
//!
//! The enclosure sensor drives control; the room sensor is telemetry
//! only.  Both are SHTC3 parts on separate I2C buses.

pub mod shtc3;

use crate::error::SensorError;

/// One temperature/humidity sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClimateReading {
    /// Temperature (°C).
    pub temperature_c: f32,
    /// Relative humidity (%).
    pub humidity_pct: f32,
}

/// A sensor that produces climate samples on demand.
///
/// Individual read failures are returned to the caller and the previous
/// good value is retained.
pub trait ClimateSensor {
    /// Take a fresh measurement.
    fn read(&mut self) -> Result<ClimateReading, SensorError>;

    /// Last successful measurement, if any.
    fn last_reading(&self) -> Option<ClimateReading>;
}

//! Error types for the proofer firmware.
//!
//! All variants are `Copy` so they can be passed through the state
//! machine and the event sink without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// The I2C transaction with the sensor failed or timed out.
    BusError,
    /// A received word failed its CRC-8 check.
    CrcMismatch,
    /// The sensor did not answer with the expected device ID.
    NotDetected,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BusError => write!(f, "I2C bus error"),
            Self::CrcMismatch => write!(f, "CRC mismatch"),
            Self::NotDetected => write!(f, "sensor not detected"),
        }
    }
}

// ---------------------------------------------------------------------------
// Actuator errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorError {
    /// PWM duty-cycle write failed.
    PwmWriteFailed,
    /// GPIO set failed.
    GpioWriteFailed,
}

impl fmt::Display for ActuatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PwmWriteFailed => write!(f, "PWM write failed"),
            Self::GpioWriteFailed => write!(f, "GPIO write failed"),
        }
    }
}

// ---------------------------------------------------------------------------
// Sensor faults
// ---------------------------------------------------------------------------

/// Why a temperature sample could not be used for control.  Any fault
/// outside the Disabled state sends the controller to Error.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SensorFault {
    /// The enclosure sensor could not produce a sample.
    ReadFailed(SensorError),
    /// The sample is outside the configured plausible range.
    OutOfRange { temp_c: f32, min_c: f32, max_c: f32 },
}

impl fmt::Display for SensorFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadFailed(e) => write!(f, "enclosure sensor read failed ({e})"),
            Self::OutOfRange {
                temp_c,
                min_c,
                max_c,
            } => write!(
                f,
                "temperature {temp_c:.1} outside valid range {min_c:.1}-{max_c:.1}"
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// Command errors
// ---------------------------------------------------------------------------

/// Rejections at the remote-command boundary.  None of these mutate state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CommandError {
    /// The topic is not one of the registered command endpoints.
    UnknownTopic,
    /// The mode payload is not one of the advertised modes.
    UnknownMode,
    /// The payload is not valid UTF-8 or not a number.
    Unparseable,
    /// Requested target exceeds the allowed maximum.
    TargetTooHigh(f32),
    /// Requested target is below the allowed minimum.
    TargetTooLow(f32),
    /// Manual test actuation is only allowed while Disabled.
    NotPermitted,
    /// A configuration update failed range validation.
    InvalidConfig(&'static str),
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownTopic => write!(f, "unknown topic"),
            Self::UnknownMode => write!(f, "unknown mode"),
            Self::Unparseable => write!(f, "failed to parse payload"),
            Self::TargetTooHigh(t) => write!(f, "target {t} too high"),
            Self::TargetTooLow(t) => write!(f, "target {t} too low"),
            Self::NotPermitted => write!(f, "not permitted in current state"),
            Self::InvalidConfig(msg) => write!(f, "invalid config: {msg}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn faults_render_their_cause() {
        assert_eq!(
            SensorFault::ReadFailed(SensorError::CrcMismatch).to_string(),
            "enclosure sensor read failed (CRC mismatch)"
        );
        assert_eq!(
            SensorFault::OutOfRange { temp_c: 55.0, min_c: 10.0, max_c: 40.0 }.to_string(),
            "temperature 55.0 outside valid range 10.0-40.0"
        );
        assert_eq!(CommandError::TargetTooHigh(50.0).to_string(), "target 50 too high");
    }
}

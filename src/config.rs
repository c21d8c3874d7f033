//! Control configuration parameters
//!
//! All tunable parameters for the proofing-chamber controller.
//! Values can be overridden at runtime (web form, remote commands) and
//! are persisted through the [`ConfigPort`](crate::app::ports::ConfigPort).

use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;

/// Lowest target temperature an operator may request (°C).
pub const TARGET_TEMP_MIN_C: f32 = 15.0;
/// Highest target temperature an operator may request (°C).
pub const TARGET_TEMP_MAX_C: f32 = 35.0;

/// Core control configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlConfig {
    // --- Validity gate ---
    /// Lowest plausible enclosure temperature (°C)
    pub min_valid_temp_c: f32,
    /// Highest plausible enclosure temperature (°C)
    pub max_valid_temp_c: f32,

    // --- Setpoint trajectory ---
    /// Operator setpoint (°C), always within [`TARGET_TEMP_MIN_C`, `TARGET_TEMP_MAX_C`]
    pub setpoint_c: f32,
    /// Maximum ramp rate of the live target (°C/s)
    pub ramp_rate_c_per_sec: f32,

    // --- Feedforward ---
    /// Heater command per °C gained since control was enabled (insulation loss)
    pub ff_per_delta_c: f32,
    /// Heater command per °C/s of target rate (thermal mass)
    pub ff_per_rate: f32,

    // --- Closed-loop gains ---
    pub kp: f32,
    pub ki: f32,
    pub kd: f32,
    /// Lower clamp on the integral term
    pub i_min: f32,
    /// Upper clamp on the integral term
    pub i_max: f32,

    // --- Timing ---
    /// Fan run-on after heating stops or a fault occurs (milliseconds)
    pub cooldown_ms: u32,
    /// Control tick period while Enabled (milliseconds)
    pub on_period_ms: u32,
    /// Poll period in every other state (milliseconds)
    pub off_period_ms: u32,
    /// Delay before the first tick after a state transition (milliseconds)
    pub settle_delay_ms: u32,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            // Validity gate
            min_valid_temp_c: 10.0,
            max_valid_temp_c: 40.0,

            // Trajectory
            setpoint_c: 27.0,
            ramp_rate_c_per_sec: 0.05,

            // Feedforward
            ff_per_delta_c: 0.01,
            ff_per_rate: 0.0,

            // PID
            kp: 0.25,
            ki: 0.001,
            kd: 5.0,
            i_min: -0.15,
            i_max: 0.15,

            // Timing
            cooldown_ms: 90_000,
            on_period_ms: 1_000,
            off_period_ms: 10_000,
            settle_delay_ms: 100,
        }
    }
}

impl ControlConfig {
    /// Clamp a requested setpoint into the accepted absolute range.
    /// Non-finite requests fall back to the current setpoint.
    pub fn clamp_setpoint(&self, requested_c: f32) -> f32 {
        if requested_c.is_finite() {
            requested_c.clamp(TARGET_TEMP_MIN_C, TARGET_TEMP_MAX_C)
        } else {
            self.setpoint_c
        }
    }

    /// Range-check every field.  Rejects rather than clamps so that a bad
    /// remote update can never loosen the validity gate unnoticed.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(-20.0..=60.0).contains(&self.min_valid_temp_c) {
            return Err(ConfigError::ValidationFailed(
                "min_valid_temp_c must be -20.0–60.0",
            ));
        }
        if !(0.0..=80.0).contains(&self.max_valid_temp_c) {
            return Err(ConfigError::ValidationFailed(
                "max_valid_temp_c must be 0.0–80.0",
            ));
        }
        if self.min_valid_temp_c >= self.max_valid_temp_c {
            return Err(ConfigError::ValidationFailed(
                "min_valid_temp_c must be < max_valid_temp_c",
            ));
        }
        if !(TARGET_TEMP_MIN_C..=TARGET_TEMP_MAX_C).contains(&self.setpoint_c) {
            return Err(ConfigError::ValidationFailed(
                "setpoint_c must be 15.0–35.0",
            ));
        }
        if !(self.ramp_rate_c_per_sec > 0.0 && self.ramp_rate_c_per_sec <= 1.0) {
            return Err(ConfigError::ValidationFailed(
                "ramp_rate_c_per_sec must be > 0.0 and <= 1.0",
            ));
        }
        if !(self.ff_per_delta_c.is_finite() && self.ff_per_rate.is_finite()) {
            return Err(ConfigError::ValidationFailed(
                "feedforward coefficients must be finite",
            ));
        }
        if !(self.kp.is_finite() && self.ki.is_finite() && self.kd.is_finite()) {
            return Err(ConfigError::ValidationFailed("PID gains must be finite"));
        }
        if !(self.i_min <= 0.0 && self.i_max >= 0.0) {
            return Err(ConfigError::ValidationFailed(
                "i_min must be <= 0.0 and i_max >= 0.0",
            ));
        }
        if !(1_000..=600_000).contains(&self.cooldown_ms) {
            return Err(ConfigError::ValidationFailed(
                "cooldown_ms must be 1000–600000",
            ));
        }
        if !(100..=1_900).contains(&self.on_period_ms) {
            return Err(ConfigError::ValidationFailed(
                "on_period_ms must be 100–1900",
            ));
        }
        if !(1_000..=60_000).contains(&self.off_period_ms) {
            return Err(ConfigError::ValidationFailed(
                "off_period_ms must be 1000–60000",
            ));
        }
        if !(1..=1_000).contains(&self.settle_delay_ms) {
            return Err(ConfigError::ValidationFailed(
                "settle_delay_ms must be 1–1000",
            ));
        }
        Ok(())
    }
}

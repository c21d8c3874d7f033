//! Setpoint trajectory planner.
//!
//! Moves the live PID target from wherever control started toward the
//! operator setpoint at a bounded rate, and estimates the feedforward bias
//! the heater needs to hold the ramp.
//!
//! ```text
//!  rate
//!   +limit ┤─────────────╮
//!          │              ╲
//!        0 ┤───────────────●───────────────  error = goal − target
//!          │                ╲
//!   −limit ┤                 ╰─────────────
//!             −1           0           +1
//! ```
//!
//! Outside one degree of the goal the ramp runs at full speed; inside it
//! the rate tapers linearly to zero.  The approach is monotone and never
//! overshoots; the PID closes the remaining gap.

use log::debug;

/// Ticks whose interval is at or above this (seconds) are treated as a
/// scheduling stall and do not advance the ramp.
pub const MAX_TICK_SECS: f32 = 2.0;

/// Width of the linear taper band around the goal (°C).
const TAPER_BAND_C: f32 = 1.0;

/// Signed target rate (°C/s) toward `goal_c` from `current_c`.
pub fn plan_rate(goal_c: f32, current_c: f32, limit_c_per_sec: f32) -> f32 {
    let error = goal_c - current_c;
    let scale = if error > TAPER_BAND_C {
        1.0
    } else if error < -TAPER_BAND_C {
        -1.0
    } else {
        error
    };
    scale * limit_c_per_sec
}

/// Advance `current_c` by one step, or `None` if `dt_secs` is outside
/// the open interval `(0, MAX_TICK_SECS)`.
pub fn advance(current_c: f32, rate_c_per_sec: f32, dt_secs: f32) -> Option<f32> {
    if dt_secs > 0.0 && dt_secs < MAX_TICK_SECS {
        Some(current_c + rate_c_per_sec * dt_secs)
    } else {
        debug!("Ramp update skipped: dt={:.3}s outside (0, {MAX_TICK_SECS})", dt_secs);
        None
    }
}

/// Feedforward heater bias.
///
/// The static term covers insulation loss proportional to the temperature
/// already gained since control started; the dynamic term covers the
/// thermal mass being heated while ramping.
pub fn feedforward(
    next_target_c: f32,
    initial_temp_c: f32,
    rate_c_per_sec: f32,
    ff_per_delta_c: f32,
    ff_per_rate: f32,
) -> f32 {
    let static_ff = (next_target_c - initial_temp_c) * ff_per_delta_c;
    let dynamic_ff = rate_c_per_sec * ff_per_rate;
    static_ff + dynamic_ff
}

/// Outcome of one planner step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrajectoryStep {
    pub target_c: f32,
    pub rate_c_per_sec: f32,
    pub feedforward: f32,
}

/// Planner coefficients, lifted from [`ControlConfig`](crate::config::ControlConfig).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RampParams {
    pub goal_c: f32,
    pub limit_c_per_sec: f32,
    pub ff_per_delta_c: f32,
    pub ff_per_rate: f32,
}

impl From<&crate::config::ControlConfig> for RampParams {
    fn from(c: &crate::config::ControlConfig) -> Self {
        Self {
            goal_c: c.setpoint_c,
            limit_c_per_sec: c.ramp_rate_c_per_sec,
            ff_per_delta_c: c.ff_per_delta_c,
            ff_per_rate: c.ff_per_rate,
        }
    }
}

/// Run a full planner update: rate, advanced target, then feedforward.
/// Returns `None` (hold everything) when the tick interval is implausible.
pub fn step(
    params: &RampParams,
    current_target_c: f32,
    initial_temp_c: f32,
    dt_secs: f32,
) -> Option<TrajectoryStep> {
    let rate = plan_rate(params.goal_c, current_target_c, params.limit_c_per_sec);
    let next = advance(current_target_c, rate, dt_secs)?;
    Some(TrajectoryStep {
        target_c: next,
        rate_c_per_sec: rate,
        feedforward: feedforward(
            next,
            initial_temp_c,
            rate,
            params.ff_per_delta_c,
            params.ff_per_rate,
        ),
    })
}

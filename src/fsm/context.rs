//! Shared mutable context threaded through every FSM handler.
//!
//! `FsmContext` is the single struct that state handlers read from and
//! write to.  It owns the controller session, the PID and smoothing
//! filters, the live configuration, and the per-tick inputs and outputs.
//! Think of it as the "blackboard" in a blackboard architecture.

use crate::config::ControlConfig;
use crate::control::filter::{
    DTempFilter, TempFilter, D_TEMP_FILTER_SIGMA_SECS, TEMP_FILTER_SIGMA_SECS,
};
use crate::control::pid::{PidController, PidGains};
use crate::safety::ValidityGate;

use super::StateId;

// ---------------------------------------------------------------------------
// Samples
// ---------------------------------------------------------------------------

/// A temperature sample that passed the validity gate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub temp_c: f32,
    pub at_ms: u64,
}

// ---------------------------------------------------------------------------
// Actuator commands (written by state handlers; consumed by the mediator)
// ---------------------------------------------------------------------------

/// Commands that state handlers write to request actuator actions.
/// The service applies these through the actuation mediator each tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActuatorCommands {
    /// Heater duty fraction (0.0 = off, 1.0 = full).
    pub heater_level: f32,
    /// Fan relay on.
    pub fan_on: bool,
    /// Power/mode LED on (follows "Enabled").
    pub power_led: bool,
}

impl Default for ActuatorCommands {
    fn default() -> Self {
        Self {
            heater_level: 0.0,
            fan_on: false,
            power_led: false,
        }
    }
}

impl ActuatorCommands {
    /// All actuators off — safe default.
    pub fn all_off() -> Self {
        Self::default()
    }
}

// ---------------------------------------------------------------------------
// Controller session
// ---------------------------------------------------------------------------

/// Everything the controller remembers between ticks.
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerSession {
    pub state: StateId,
    /// Time of the last state transition.
    pub entered_state_at_ms: u64,
    /// Enclosure temperature at the first Enabled tick; baseline for the
    /// static feedforward term.  Cleared on every entry to Enabled.
    pub initial_temp: Option<f32>,
    /// Most recent sample that passed the validity gate.
    pub last_sample: Option<Sample>,
    /// Live ramped setpoint handed to the PID (°C).
    pub ramped_target: f32,
    /// Current ramp rate (°C/s).
    pub target_rate: f32,
    pub feedforward_bias: f32,
    pub filtered_temp: Option<f32>,
    pub filtered_d_temp: Option<f32>,
    /// Last commanded outputs.
    pub outputs: ActuatorCommands,
}

impl ControllerSession {
    pub fn new(setpoint_c: f32) -> Self {
        Self {
            state: StateId::Disabled,
            entered_state_at_ms: 0,
            initial_temp: None,
            last_sample: None,
            ramped_target: setpoint_c,
            target_rate: 0.0,
            feedforward_bias: 0.0,
            filtered_temp: None,
            filtered_d_temp: None,
            outputs: ActuatorCommands::all_off(),
        }
    }

    /// Milliseconds since the current state was entered.
    pub fn ms_in_state(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.entered_state_at_ms)
    }
}

// ---------------------------------------------------------------------------
// FsmContext
// ---------------------------------------------------------------------------

/// The shared context passed to every state handler function.
pub struct FsmContext {
    // -- Configuration --
    pub config: ControlConfig,
    pub gate: ValidityGate,

    // -- Session --
    pub session: ControllerSession,

    // -- Control collaborators --
    pub pid: PidController,
    pub temp_filter: TempFilter,
    pub d_temp_filter: DTempFilter,

    // -- Per-tick inputs (set by the engine before dispatch) --
    /// Time of the tick or request being processed.
    pub now_ms: u64,
    /// Fresh gated enclosure temperature, `None` if rejected.
    pub temp_c: Option<f32>,
    /// Filtered temperature derivative for this tick; 0 when no finite
    /// difference was available.
    pub d_temp: f32,

    // -- Per-tick outputs --
    /// Delay before the next tick (ms).
    pub next_tick_ms: u32,
}

impl FsmContext {
    /// Create a new context with the given configuration.
    pub fn new(config: ControlConfig) -> Self {
        Self {
            gate: ValidityGate::from(&config),
            session: ControllerSession::new(config.setpoint_c),
            pid: PidController::new(PidGains::from(&config)),
            temp_filter: TempFilter::new(TEMP_FILTER_SIGMA_SECS),
            d_temp_filter: DTempFilter::new(D_TEMP_FILTER_SIGMA_SECS),
            now_ms: 0,
            temp_c: None,
            d_temp: 0.0,
            next_tick_ms: config.off_period_ms,
            config,
        }
    }

    /// Swap in a new configuration, refreshing derived collaborators.
    pub fn apply_config(&mut self, config: ControlConfig) {
        self.gate = ValidityGate::from(&config);
        self.pid.set_gains(PidGains::from(&config));
        self.config = config;
    }

    /// Milliseconds since the current state was entered.
    pub fn ms_in_state(&self) -> u64 {
        self.session.ms_in_state(self.now_ms)
    }

    pub fn commands(&mut self) -> &mut ActuatorCommands {
        &mut self.session.outputs
    }
}

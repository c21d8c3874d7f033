//! Heater control state machine.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  StateId    │ on_enter        │ on_exit      │ on_update  │
//! ├─────────────┼─────────────────┼──────────────┼────────────┤
//! │  Disabled   │ disabled_enter  │ —            │ disabled_update │
//! │  Enabled    │ enabled_enter   │ enabled_exit │ enabled_update  │
//! │  Cooldown   │ cooldown_enter  │ —            │ cooldown_update │
//! │  Error      │ error_enter     │ error_exit   │ error_update    │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Each tick the engine:
//!
//! 1. pre-arms the next tick at the slow cadence,
//! 2. gates the enclosure sample (a fault outside Disabled → `Error`),
//! 3. advances the setpoint trajectory and the smoothing filters,
//! 4. calls `on_update` for the **current** state.
//!
//! If `on_update` returns `Some(next_id)`, the engine runs `on_exit` for
//! the current state, then `on_enter` for the next.  Every transition
//! resets the state timer and the PID integrator and re-arms the next
//! tick after the short settle delay.

pub mod context;
pub mod states;

use core::fmt;

use context::{ActuatorCommands, ControllerSession, FsmContext, Sample};
use log::{debug, info, warn};

use crate::config::ControlConfig;
use crate::control::planner::{self, RampParams};
use crate::error::{SensorError, SensorFault};
use crate::sensors::ClimateReading;

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

/// Enumeration of all controller states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum StateId {
    Disabled = 0,
    Enabled = 1,
    Cooldown = 2,
    Error = 3,
}

impl StateId {
    /// Total number of states.
    pub const COUNT: usize = 4;

    /// Operator-facing display name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Disabled => "Off",
            Self::Enabled => "Running",
            Self::Cooldown => "Cooling...",
            Self::Error => "Error!",
        }
    }

    /// Climate-entity heater mode string.
    pub fn heater_mode(self) -> &'static str {
        match self {
            Self::Enabled => "heat",
            Self::Disabled | Self::Cooldown | Self::Error => "off",
        }
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A completed state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: StateId,
    pub to: StateId,
}

/// Result of one control tick.
#[derive(Debug, Clone, PartialEq)]
pub struct TickOutcome {
    /// Outputs to apply through the actuation mediator.
    pub commands: ActuatorCommands,
    /// Delay before the next tick (ms).
    pub next_tick_ms: u32,
    /// State changes performed during the tick, in order.
    pub transitions: heapless::Vec<Transition, 2>,
    /// Sample rejection that escalated to `Error`, if any.
    pub fault: Option<SensorFault>,
}

// ---------------------------------------------------------------------------
// FSM engine
// ---------------------------------------------------------------------------

/// The controller state machine.
///
/// Owns an [`FsmContext`] that is threaded through every handler call.
pub struct Fsm {
    ctx: FsmContext,
}

impl Fsm {
    /// Construct a new FSM in `Disabled`.
    pub fn new(config: ControlConfig) -> Self {
        Self {
            ctx: FsmContext::new(config),
        }
    }

    /// Run the initial `on_enter` for the starting state.
    pub fn start(&mut self, now_ms: u64) {
        info!("FSM starting in state: {}", self.current_state());
        self.ctx.now_ms = now_ms;
        self.ctx.session.entered_state_at_ms = now_ms;
        Self::enter(self.current_state(), &mut self.ctx);
    }

    /// Advance the FSM by one tick with a fresh enclosure reading.
    pub fn tick(
        &mut self,
        now_ms: u64,
        enclosure: Result<ClimateReading, SensorError>,
    ) -> TickOutcome {
        self.ctx.now_ms = now_ms;
        // Pre-arm: whatever happens below, a next tick is always pending.
        self.ctx.next_tick_ms = self.ctx.config.off_period_ms;
        let mut transitions: heapless::Vec<Transition, 2> = heapless::Vec::new();
        let mut fault = None;

        // 1. Validity gate
        let checked = self.ctx.gate.check(enclosure);
        self.ctx.temp_c = checked.ok();
        if let Err(f) = checked {
            match self.current_state() {
                StateId::Disabled => {}
                StateId::Error => debug!("Sensor fault persists: {f}"),
                StateId::Enabled | StateId::Cooldown => {
                    warn!("Sensor fault: {f}");
                    fault = Some(f);
                    if let Some(t) = self.transition(StateId::Error) {
                        let _ = transitions.push(t);
                    }
                }
            }
        }

        // 2. Baseline for the static feedforward term
        let ctx = &mut self.ctx;
        if ctx.session.state == StateId::Enabled && ctx.session.initial_temp.is_none() {
            ctx.session.initial_temp = ctx.temp_c;
        }

        // 3. Trajectory and filters (fresh samples only)
        ctx.d_temp = 0.0;
        if let Some(temp) = ctx.temp_c {
            Self::track_sample(ctx, temp);
        }

        // 4. Per-state update
        let next = Self::update(ctx.session.state, ctx);
        if let Some(next_id) = next {
            if let Some(t) = self.transition(next_id) {
                let _ = transitions.push(t);
            }
        }
        if !transitions.is_empty() {
            self.ctx.next_tick_ms = self.ctx.config.settle_delay_ms;
        }

        TickOutcome {
            commands: self.ctx.session.outputs,
            next_tick_ms: self.ctx.next_tick_ms,
            transitions,
            fault,
        }
    }

    /// Enable heating.  `enclosure` is a sample taken at request time and
    /// seeds the ramp when it passes the gate.  No-op while Enabled.
    pub fn request_enable(
        &mut self,
        now_ms: u64,
        enclosure: Result<ClimateReading, SensorError>,
    ) -> Option<Transition> {
        if self.current_state() == StateId::Enabled {
            return None;
        }
        self.ctx.now_ms = now_ms;
        self.ctx.temp_c = self.ctx.gate.check(enclosure).ok();
        self.transition(StateId::Enabled)
    }

    /// Disable heating.  Enabled → Cooldown, Error → Disabled; no-op
    /// otherwise.
    pub fn request_disable(&mut self, now_ms: u64) -> Option<Transition> {
        self.ctx.now_ms = now_ms;
        match self.current_state() {
            StateId::Enabled => self.transition(StateId::Cooldown),
            StateId::Error => self.transition(StateId::Disabled),
            StateId::Disabled | StateId::Cooldown => None,
        }
    }

    /// Button semantics: Enabled → disable, anything else → enable.
    pub fn toggle(
        &mut self,
        now_ms: u64,
        enclosure: Result<ClimateReading, SensorError>,
    ) -> Option<Transition> {
        if self.current_state() == StateId::Enabled {
            self.request_disable(now_ms)
        } else {
            self.request_enable(now_ms, enclosure)
        }
    }

    /// Hot-swap configuration.  Takes effect from the next tick.
    pub fn set_config(&mut self, config: ControlConfig) {
        self.ctx.apply_config(config);
    }

    /// The current state's identity.
    pub fn current_state(&self) -> StateId {
        self.ctx.session.state
    }

    pub fn session(&self) -> &ControllerSession {
        &self.ctx.session
    }

    pub fn config(&self) -> &ControlConfig {
        &self.ctx.config
    }

    /// Last outputs written by a handler.
    pub fn commands(&self) -> ActuatorCommands {
        self.ctx.session.outputs
    }

    /// Contributions of the last PID command, for telemetry.
    pub fn pid_terms(&self) -> crate::control::pid::PidTerms {
        self.ctx.pid.terms()
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    /// Planner step plus filter updates for a gated sample.
    fn track_sample(ctx: &mut FsmContext, temp: f32) {
        let now = ctx.now_ms;
        let dt_secs = ctx
            .session
            .last_sample
            .map(|s| now.saturating_sub(s.at_ms) as f32 * 1.0e-3);

        if ctx.session.state == StateId::Enabled {
            if let (Some(dt), Some(initial)) = (dt_secs, ctx.session.initial_temp) {
                let params = RampParams::from(&ctx.config);
                if let Some(step) = planner::step(&params, ctx.session.ramped_target, initial, dt)
                {
                    ctx.session.ramped_target = step.target_c;
                    ctx.session.target_rate = step.rate_c_per_sec;
                    ctx.session.feedforward_bias = step.feedforward;
                }
            }
        }

        ctx.session.filtered_temp = Some(ctx.temp_filter.add_sample(now, temp));
        if let (Some(dt), Some(last)) = (dt_secs, ctx.session.last_sample) {
            if dt > 0.0 {
                let raw = (temp - last.temp_c) / dt;
                ctx.d_temp = ctx.d_temp_filter.add_sample(now, raw);
                ctx.session.filtered_d_temp = Some(ctx.d_temp);
            }
        }
        ctx.session.last_sample = Some(Sample {
            temp_c: temp,
            at_ms: now,
        });
    }

    fn transition(&mut self, next_id: StateId) -> Option<Transition> {
        let from = self.current_state();
        if from == next_id {
            return None;
        }
        info!("FSM transition: {} -> {}", from, next_id);

        Self::exit(from, &mut self.ctx);

        self.ctx.session.state = next_id;
        self.ctx.session.entered_state_at_ms = self.ctx.now_ms;
        self.ctx.pid.initialize();
        self.ctx.next_tick_ms = self.ctx.config.settle_delay_ms;

        Self::enter(next_id, &mut self.ctx);
        Some(Transition { from, to: next_id })
    }

    fn enter(id: StateId, ctx: &mut FsmContext) {
        match id {
            StateId::Disabled => states::disabled_enter(ctx),
            StateId::Enabled => states::enabled_enter(ctx),
            StateId::Cooldown => states::cooldown_enter(ctx),
            StateId::Error => states::error_enter(ctx),
        }
    }

    fn exit(id: StateId, ctx: &mut FsmContext) {
        match id {
            StateId::Enabled => states::enabled_exit(ctx),
            StateId::Error => states::error_exit(ctx),
            StateId::Disabled | StateId::Cooldown => {}
        }
    }

    fn update(id: StateId, ctx: &mut FsmContext) -> Option<StateId> {
        match id {
            StateId::Disabled => states::disabled_update(ctx),
            StateId::Enabled => states::enabled_update(ctx),
            StateId::Cooldown => states::cooldown_update(ctx),
            StateId::Error => states::error_update(ctx),
        }
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn arb_step() -> impl Strategy<Value = (u8, u32, Option<f32>)> {
        (
            0u8..4,                                // 0 tick, 1 enable, 2 disable, 3 toggle
            1u32..3_000,                           // ms since previous event
            proptest::option::weighted(0.9, 0.0f32..50.0),
        )
    }

    proptest! {
        #[test]
        fn heater_only_runs_while_enabled(steps in proptest::collection::vec(arb_step(), 1..200)) {
            let mut fsm = Fsm::new(ControlConfig::default());
            fsm.start(0);
            let mut now = 0u64;
            for (kind, delta, temp) in steps {
                now += u64::from(delta);
                let r = temp
                    .map(|t| ClimateReading { temperature_c: t, humidity_pct: 50.0 })
                    .ok_or(SensorError::BusError);
                match kind {
                    0 => {
                        let out = fsm.tick(now, r);
                        prop_assert!(out.next_tick_ms > 0);
                    }
                    1 => { fsm.request_enable(now, r); }
                    2 => { fsm.request_disable(now); }
                    _ => { fsm.toggle(now, r); }
                }
                let cmds = fsm.commands();
                prop_assert!((0.0..=1.0).contains(&cmds.heater_level));
                if fsm.current_state() != StateId::Enabled {
                    prop_assert_eq!(cmds.heater_level, 0.0);
                }
                prop_assert_eq!(cmds.power_led, fsm.current_state() == StateId::Enabled);
            }
        }
    }
}

//! Concrete state handler functions.
//!
//! Each state is a set of plain `fn`s.  The engine in [`super::Fsm`] picks the handler with an
//! exhaustive `match` on [`StateId`].
//!
//! ```text
//!  DISABLED ──[enable]──▶ ENABLED ──[disable]──▶ COOLDOWN
//!     ▲  ▲                  ▲  │                    │
//!     │  │                  │  │            [fan run-on done]
//!     │  └──────────────────┼──┼────────────────────┘
//!     │                  [enable]
//!     │                     │  ▼
//!     └────[disable]────── ERROR ◀──[bad sample, any non-Disabled state]
//! ```

use log::{info, warn};

use super::StateId;
use super::context::{FsmContext, Sample};

// ═══════════════════════════════════════════════════════════════════════════
//  DISABLED state — no heating, fan off
// ═══════════════════════════════════════════════════════════════════════════

pub(super) fn disabled_enter(ctx: &mut FsmContext) {
    *ctx.commands() = super::context::ActuatorCommands::all_off();
    info!("DISABLED: heater and fan off");
}

pub(super) fn disabled_update(ctx: &mut FsmContext) -> Option<StateId> {
    let cmds = ctx.commands();
    cmds.heater_level = 0.0;
    cmds.fan_on = false;
    cmds.power_led = false;
    ctx.next_tick_ms = ctx.config.off_period_ms;
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  ENABLED state — ramping the setpoint and running closed-loop control
// ═══════════════════════════════════════════════════════════════════════════

/// Prepare a fresh heating session.  `ctx.temp_c` carries the sample
/// taken when the request was applied, if it passed the gate.
pub(super) fn enabled_enter(ctx: &mut FsmContext) {
    let session = &mut ctx.session;
    session.initial_temp = None;
    session.feedforward_bias = 0.0;
    session.target_rate = 0.0;
    match ctx.temp_c {
        Some(t) => {
            // Ramp starts from where the enclosure actually is.
            session.ramped_target = t;
            session.last_sample = Some(Sample {
                temp_c: t,
                at_ms: ctx.now_ms,
            });
        }
        None => session.ramped_target = ctx.config.setpoint_c,
    }
    ctx.commands().power_led = true;
    info!(
        "ENABLED: ramping {:.2} -> {:.1} C at {:.3} C/s",
        ctx.session.ramped_target, ctx.config.setpoint_c, ctx.config.ramp_rate_c_per_sec
    );
}

pub(super) fn enabled_exit(ctx: &mut FsmContext) {
    // Heater off the moment control stops; the fan keeps running.
    ctx.commands().heater_level = 0.0;
    ctx.commands().power_led = false;
}

pub(super) fn enabled_update(ctx: &mut FsmContext) -> Option<StateId> {
    // The engine only dispatches here with a gated sample.
    let Some(temp) = ctx.temp_c else {
        return Some(StateId::Error);
    };

    ctx.pid.target = ctx.session.ramped_target;
    ctx.pid.d_target = ctx.session.target_rate;
    ctx.pid.feedforward = ctx.session.feedforward_bias;
    let level = ctx.pid.command(temp, ctx.d_temp, ctx.now_ms);

    let cmds = ctx.commands();
    cmds.heater_level = level;
    cmds.fan_on = true;
    cmds.power_led = true;
    ctx.next_tick_ms = ctx.config.on_period_ms;
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  COOLDOWN state — fan run-on after heating
// ═══════════════════════════════════════════════════════════════════════════

pub(super) fn cooldown_enter(ctx: &mut FsmContext) {
    ctx.commands().heater_level = 0.0;
    ctx.commands().fan_on = true;
    info!("COOLDOWN: fan on for {}s", ctx.config.cooldown_ms / 1000);
}

pub(super) fn cooldown_update(ctx: &mut FsmContext) -> Option<StateId> {
    if run_fan_on(ctx) {
        None
    } else {
        info!("COOLDOWN: complete after {}s", ctx.ms_in_state() / 1000);
        Some(StateId::Disabled)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  ERROR state — sensor fault, heater locked off
// ═══════════════════════════════════════════════════════════════════════════

pub(super) fn error_enter(ctx: &mut FsmContext) {
    let cmds = ctx.commands();
    cmds.heater_level = 0.0;
    cmds.fan_on = true;
    cmds.power_led = false;
    warn!("ERROR: heater disabled, waiting for operator");
}

pub(super) fn error_exit(_ctx: &mut FsmContext) {
    info!("ERROR: acknowledged");
}

pub(super) fn error_update(ctx: &mut FsmContext) -> Option<StateId> {
    // Stays until an explicit disable or enable request.
    run_fan_on(ctx);
    None
}

// ── Shared ──────────────────────────────────────────────────────────

/// Heater off; fan on while still inside the cooldown window.
/// Returns whether the fan is still running.
fn run_fan_on(ctx: &mut FsmContext) -> bool {
    let running = ctx.ms_in_state() < u64::from(ctx.config.cooldown_ms);
    let cmds = ctx.commands();
    cmds.heater_level = 0.0;
    cmds.fan_on = running;
    cmds.power_led = false;
    ctx.next_tick_ms = ctx.config.off_period_ms;
    running
}

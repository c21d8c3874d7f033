//! Application service — the hexagonal core.
//!
//! [`AppService`] owns the control FSM, the task scheduler and the
//! actuation mediator.  It exposes a clean, hardware-agnostic API.  All
//! I/O flows through port traits injected at call sites, making the
//! entire service testable with mock adapters.
//!
//! ```text
//!  SensorPort ──▶ ┌─────────────────────────────┐ ──▶ EventSink
//!                 │         AppService           │
//! ActuatorPort ◀──│ Scheduler · FSM · Mediator   │
//!                 └─────────────────────────────┘
//! ```
//!
//! Progress is driven only by [`AppService::poll`]: the control tick is
//! a scheduler deadline that each tick re-arms before doing anything
//! else, and operator requests are deferred by one quantum and applied
//! against the state current at that time.

use log::{info, warn};

use crate::config::ControlConfig;
use crate::error::{CommandError, SensorError};
use crate::fsm::{Fsm, StateId, Transition};
use crate::fsm::context::ControllerSession;
use crate::scheduler::{MIN_DELAY_MS, Scheduler, Task};
use crate::sensors::ClimateReading;

use super::actuation::ActuationMediator;
use super::commands::{AppCommand, FanMode};
use super::events::{AppEvent, TelemetryData};
use super::ports::{ActuatorPort, ConfigPort, EventSink, SensorPort};
use super::status::StatusView;

/// Heater power during a manual test.
pub const HEATER_TEST_LEVEL: f32 = 0.2;
/// Manual heater test duration (ms).
pub const HEATER_TEST_MS: u32 = 10_000;
/// Manual fan test duration (ms).
pub const FAN_TEST_MS: u32 = 60_000;
/// Quiet time after the last config change before it is persisted (ms).
pub const AUTO_SAVE_DELAY_MS: u64 = 5_000;

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all domain logic.
pub struct AppService {
    fsm: Fsm,
    scheduler: Scheduler,
    mediator: ActuationMediator,
    /// Last good enclosure reading.
    enclosure: Option<ClimateReading>,
    /// Last good room reading.
    room: Option<ClimateReading>,
    heater_test: bool,
    fan_test: bool,
    tick_count: u64,
    config_dirty: bool,
    dirty_since_ms: u64,
}

impl AppService {
    /// Construct the service from configuration.
    ///
    /// Does **not** start the FSM — call [`start`](Self::start) next.
    pub fn new(config: ControlConfig) -> Self {
        Self {
            fsm: Fsm::new(config),
            scheduler: Scheduler::new(),
            mediator: ActuationMediator::new(),
            enclosure: None,
            room: None,
            heater_test: false,
            fan_test: false,
            tick_count: 0,
            config_dirty: false,
            dirty_since_ms: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Start the FSM in Disabled with every output off and the first
    /// control tick due immediately.
    pub fn start(&mut self, now_ms: u64, hw: &mut impl ActuatorPort, sink: &mut impl EventSink) {
        self.mediator.all_off(hw);
        self.fsm.start(now_ms);
        self.scheduler.arm_tick(now_ms);
        sink.emit(&AppEvent::Started(self.fsm.current_state()));
        info!("AppService started in {}", self.fsm.current_state());
    }

    /// Queue an operator request.  It is applied on the first
    /// [`poll`](Self::poll) at least one quantum later.
    /// A full queue evicts the oldest pending request, never this one.
    pub fn request(&mut self, cmd: AppCommand, now_ms: u64) -> bool {
        info!("Request queued: {:?}", cmd);
        self.scheduler
            .schedule_in(now_ms, MIN_DELAY_MS, Task::Command(cmd))
    }

    // ── Scheduling ────────────────────────────────────────────

    /// Run every task due at `now_ms`, in deadline order.
    /// Returns the number of tasks executed.
    ///
    /// The `hw` parameter satisfies **both** [`SensorPort`] and
    /// [`ActuatorPort`].
    pub fn poll(
        &mut self,
        now_ms: u64,
        hw: &mut (impl SensorPort + ActuatorPort),
        sink: &mut impl EventSink,
    ) -> usize {
        let mut ran = 0;
        while let Some(task) = self.scheduler.pop_due(now_ms) {
            ran += 1;
            match task {
                Task::ControlTick => self.run_tick(now_ms, hw, sink),
                Task::Command(cmd) => self.handle_command(cmd, now_ms, hw, sink),
                Task::EndHeaterTest => {
                    self.heater_test = false;
                    if self.fsm.current_state() == StateId::Disabled {
                        info!("Heater test finished");
                        self.mediator.heater_off(hw);
                    }
                }
                Task::EndFanTest => {
                    self.fan_test = false;
                    if self.fsm.current_state() == StateId::Disabled {
                        info!("Fan test finished");
                        self.mediator.set_fan(hw, false);
                    }
                }
            }
        }
        ran
    }

    /// Earliest time [`poll`](Self::poll) has work to do.
    pub fn next_deadline(&self) -> Option<u64> {
        self.scheduler.next_deadline()
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// One control cycle: re-arm → read sensors → FSM → actuators → events.
    fn run_tick(
        &mut self,
        now_ms: u64,
        hw: &mut (impl SensorPort + ActuatorPort),
        sink: &mut impl EventSink,
    ) {
        // Re-arm before anything else so no path can leave the loop stalled.
        self.scheduler
            .arm_tick(now_ms + u64::from(self.fsm.config().off_period_ms));
        self.tick_count += 1;

        let enclosure = self.read_enclosure(hw);
        match hw.read_room() {
            Ok(r) => self.room = Some(r),
            Err(e) => warn!("Failed to read room sensor: {e}"),
        }

        let outcome = self.fsm.tick(now_ms, enclosure);
        self.scheduler
            .arm_tick(now_ms + u64::from(outcome.next_tick_ms));

        if let Some(fault) = outcome.fault {
            sink.emit(&AppEvent::SensorFault(fault));
        }
        for t in &outcome.transitions {
            self.on_transition(*t, sink);
        }

        let mut cmds = outcome.commands;
        if self.fsm.current_state() == StateId::Disabled {
            if self.heater_test {
                cmds.heater_level = HEATER_TEST_LEVEL;
            }
            if self.fan_test {
                cmds.fan_on = true;
            }
        }
        self.mediator.apply(hw, &cmds);

        sink.emit(&AppEvent::Telemetry(self.build_telemetry()));
    }

    // ── Command handling ──────────────────────────────────────

    /// Apply an operator command immediately.  Normally reached through
    /// [`request`](Self::request) + [`poll`](Self::poll).
    pub fn handle_command(
        &mut self,
        cmd: AppCommand,
        now_ms: u64,
        hw: &mut (impl SensorPort + ActuatorPort),
        sink: &mut impl EventSink,
    ) {
        match cmd {
            AppCommand::Enable => {
                let reading = self.read_enclosure(hw);
                let t = self.fsm.request_enable(now_ms, reading);
                self.after_request(t, now_ms, hw, sink);
            }
            AppCommand::Disable => {
                let t = self.fsm.request_disable(now_ms);
                self.after_request(t, now_ms, hw, sink);
            }
            AppCommand::Toggle => {
                let t = if self.fsm.current_state() == StateId::Enabled {
                    self.fsm.request_disable(now_ms)
                } else {
                    let reading = self.read_enclosure(hw);
                    self.fsm.request_enable(now_ms, reading)
                };
                self.after_request(t, now_ms, hw, sink);
            }
            AppCommand::SetTarget(requested) => {
                let mut config = self.fsm.config().clone();
                let target = config.clamp_setpoint(requested);
                if target != config.setpoint_c {
                    info!("Target temperature {:.1} -> {:.1} C", config.setpoint_c, target);
                    config.setpoint_c = target;
                    self.fsm.set_config(config);
                    self.mark_config_dirty(now_ms);
                }
            }
            AppCommand::SetFanMode(mode) => {
                info!("Fan mode set to {}", mode.as_str());
                self.mediator.set_fan(hw, mode == FanMode::High);
            }
            AppCommand::TestHeater => {
                if self.reject_unless_disabled(sink) {
                    return;
                }
                info!("Heater test: {:.0}% for {}s", HEATER_TEST_LEVEL * 100.0, HEATER_TEST_MS / 1000);
                self.heater_test = true;
                self.mediator.heater_on(hw, HEATER_TEST_LEVEL);
                self.scheduler.cancel_where(|t| *t == Task::EndHeaterTest);
                self.scheduler
                    .schedule_in(now_ms, HEATER_TEST_MS, Task::EndHeaterTest);
            }
            AppCommand::TestFan => {
                if self.reject_unless_disabled(sink) {
                    return;
                }
                info!("Fan test: on for {}s", FAN_TEST_MS / 1000);
                self.fan_test = true;
                self.mediator.set_fan(hw, true);
                self.scheduler.cancel_where(|t| *t == Task::EndFanTest);
                self.scheduler
                    .schedule_in(now_ms, FAN_TEST_MS, Task::EndFanTest);
            }
            AppCommand::UpdateConfig(new_config) => match new_config.validate() {
                Ok(()) => {
                    self.fsm.set_config(new_config);
                    self.mark_config_dirty(now_ms);
                    info!("Configuration updated at runtime");
                }
                Err(e) => {
                    warn!("Configuration update rejected: {e}");
                    let msg = match e {
                        super::ports::ConfigError::ValidationFailed(m) => m,
                        _ => "invalid configuration",
                    };
                    sink.emit(&AppEvent::CommandRejected(CommandError::InvalidConfig(msg)));
                }
            },
            AppCommand::SaveConfig => {
                self.config_dirty = true;
                self.dirty_since_ms = now_ms.saturating_sub(AUTO_SAVE_DELAY_MS);
                info!("Explicit config save requested (will flush on next auto-save check)");
            }
        }
    }

    // ── Queries ───────────────────────────────────────────────

    /// Build a telemetry snapshot from the current session.
    pub fn build_telemetry(&self) -> TelemetryData {
        let session = self.fsm.session();
        let terms = self.fsm.pid_terms();
        let applied = self.mediator.applied();
        TelemetryData {
            state: session.state,
            set_temp_c: self.fsm.config().setpoint_c,
            target_temp_c: session.ramped_target,
            target_rate: session.target_rate,
            feedforward: session.feedforward_bias,
            enclosure_temp_c: self.enclosure.map(|r| r.temperature_c),
            enclosure_humidity_pct: self.enclosure.map(|r| r.humidity_pct),
            room_temp_c: self.room.map(|r| r.temperature_c),
            room_humidity_pct: self.room.map(|r| r.humidity_pct),
            filtered_temp_c: session.filtered_temp,
            filtered_d_temp: session.filtered_d_temp,
            heater_level: applied.heater_level,
            fan_mode: FanMode::from_on(applied.fan_on),
            cmd_p: terms.p,
            cmd_i: terms.i,
            cmd_d: terms.d,
        }
    }

    /// Text for the on-device display.
    pub fn status_view(&self) -> StatusView {
        StatusView {
            state: self.fsm.current_state(),
            temp_c: self.enclosure.map(|r| r.temperature_c),
            target_c: self.fsm.session().ramped_target,
        }
    }

    /// Current FSM state.
    pub fn state(&self) -> StateId {
        self.fsm.current_state()
    }

    pub fn session(&self) -> &ControllerSession {
        self.fsm.session()
    }

    pub fn config(&self) -> &ControlConfig {
        self.fsm.config()
    }

    /// Total control ticks executed since startup.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Outputs as last written through the mediator.
    pub fn applied_outputs(&self) -> crate::fsm::context::ActuatorCommands {
        self.mediator.applied()
    }

    // ── Internal ──────────────────────────────────────────────

    fn read_enclosure(&mut self, hw: &mut impl SensorPort) -> Result<ClimateReading, SensorError> {
        let reading = hw.read_enclosure();
        match reading {
            Ok(r) => self.enclosure = Some(r),
            Err(e) => warn!("Failed to read enclosure sensor: {e}"),
        }
        reading
    }

    /// Follow-up for a request that may have changed state: settle-tick,
    /// immediate outputs, events.
    fn after_request(
        &mut self,
        transition: Option<Transition>,
        now_ms: u64,
        hw: &mut impl ActuatorPort,
        sink: &mut impl EventSink,
    ) {
        let Some(t) = transition else {
            return;
        };
        self.scheduler
            .arm_tick(now_ms + u64::from(self.fsm.config().settle_delay_ms));
        self.on_transition(t, sink);
        self.mediator.apply(hw, &self.fsm.commands());
    }

    fn on_transition(&mut self, t: Transition, sink: &mut impl EventSink) {
        if t.from == StateId::Disabled {
            // Manual tests only run while Disabled.
            self.heater_test = false;
            self.fan_test = false;
            self.scheduler
                .cancel_where(|task| matches!(task, Task::EndHeaterTest | Task::EndFanTest));
        }
        sink.emit(&AppEvent::StateChanged {
            from: t.from,
            to: t.to,
        });
    }

    fn reject_unless_disabled(&mut self, sink: &mut impl EventSink) -> bool {
        if self.fsm.current_state() == StateId::Disabled {
            return false;
        }
        warn!("Manual test refused in state {}", self.fsm.current_state());
        sink.emit(&AppEvent::CommandRejected(CommandError::NotPermitted));
        true
    }

    // ── Config dirty-flag management ──────────────────────────

    /// Mark the config as modified.  The auto-save timer restarts on
    /// every change.
    pub fn mark_config_dirty(&mut self, now_ms: u64) {
        self.config_dirty = true;
        self.dirty_since_ms = now_ms;
    }

    /// Persist the config once it has been quiet for
    /// [`AUTO_SAVE_DELAY_MS`].  Returns `true` if the config was saved.
    pub fn auto_save_if_needed(&mut self, now_ms: u64, storage: &impl ConfigPort) -> bool {
        if !self.config_dirty {
            return false;
        }
        if now_ms.saturating_sub(self.dirty_since_ms) < AUTO_SAVE_DELAY_MS {
            return false;
        }
        match storage.save(self.fsm.config()) {
            Ok(()) => {
                self.config_dirty = false;
                info!("Config auto-saved to NVS");
                true
            }
            Err(e) => {
                warn!("Config auto-save failed: {}", e);
                false
            }
        }
    }

    /// Force-save if dirty (call before restart).
    pub fn force_save_if_dirty(&mut self, storage: &impl ConfigPort) {
        if !self.config_dirty {
            return;
        }
        match storage.save(self.fsm.config()) {
            Ok(()) => {
                self.config_dirty = false;
                info!("Config force-saved before shutdown");
            }
            Err(e) => {
                warn!("Config force-save failed: {}", e);
            }
        }
    }

    /// Whether the config has unsaved changes.
    pub fn is_config_dirty(&self) -> bool {
        self.config_dirty
    }
}

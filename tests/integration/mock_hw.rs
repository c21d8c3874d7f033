//! Mock hardware adapter for integration tests.
//!
//! Serves scripted enclosure readings and records every actuator call so
//! tests can assert on the full command history without touching real
//! GPIO/PWM registers.

use std::collections::VecDeque;

use proofer::app::events::AppEvent;
use proofer::app::ports::{ActuatorPort, EventSink, SensorPort};
use proofer::app::service::AppService;
use proofer::error::SensorError;
use proofer::sensors::ClimateReading;

// ── Actuator call record ──────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum ActuatorCall {
    HeaterDuty(f32),
    HeaterEnable(bool),
    Fan(bool),
    PowerLed(bool),
    AllOff,
}

// ── MockHardware ──────────────────────────────────────────────

pub struct MockHardware {
    pub calls: Vec<ActuatorCall>,
    /// One-shot readings served before falling back to `steady`.
    pub script: VecDeque<Result<ClimateReading, SensorError>>,
    pub steady: Result<ClimateReading, SensorError>,
    pub room: Result<ClimateReading, SensorError>,
    pub duty: f32,
    pub interlock: bool,
    pub fan: bool,
    pub led: bool,
}

pub fn reading(temp_c: f32) -> ClimateReading {
    ClimateReading {
        temperature_c: temp_c,
        humidity_pct: 60.0,
    }
}

#[allow(dead_code)]
impl MockHardware {
    pub fn new(temp_c: f32) -> Self {
        Self {
            calls: Vec::new(),
            script: VecDeque::new(),
            steady: Ok(reading(temp_c)),
            room: Ok(reading(21.0)),
            duty: 0.0,
            interlock: false,
            fan: false,
            led: false,
        }
    }

    pub fn set_temp(&mut self, temp_c: f32) {
        self.steady = Ok(reading(temp_c));
    }

    pub fn fail_sensor(&mut self) {
        self.steady = Err(SensorError::BusError);
    }

    /// Heater power actually reaching the element: duty counts only
    /// while the interlock is asserted.
    pub fn heating(&self) -> bool {
        self.duty > 0.0 && self.interlock
    }

    /// Duty and interlock agree: non-zero duty exactly while asserted.
    pub fn interlock_consistent(&self) -> bool {
        (self.duty > 0.0) == self.interlock
    }
}

impl SensorPort for MockHardware {
    fn read_enclosure(&mut self) -> Result<ClimateReading, SensorError> {
        self.script.pop_front().unwrap_or(self.steady)
    }

    fn read_room(&mut self) -> Result<ClimateReading, SensorError> {
        self.room
    }
}

impl ActuatorPort for MockHardware {
    fn set_heater_duty(&mut self, level: f32) {
        self.duty = level;
        self.calls.push(ActuatorCall::HeaterDuty(level));
    }

    fn set_heater_enable(&mut self, enabled: bool) {
        self.interlock = enabled;
        self.calls.push(ActuatorCall::HeaterEnable(enabled));
    }

    fn set_fan(&mut self, on: bool) {
        self.fan = on;
        self.calls.push(ActuatorCall::Fan(on));
    }

    fn set_power_led(&mut self, on: bool) {
        self.led = on;
        self.calls.push(ActuatorCall::PowerLed(on));
    }

    fn all_off(&mut self) {
        self.duty = 0.0;
        self.interlock = false;
        self.fan = false;
        self.led = false;
        self.calls.push(ActuatorCall::AllOff);
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transitions(&self) -> Vec<(proofer::fsm::StateId, proofer::fsm::StateId)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                AppEvent::StateChanged { from, to } => Some((*from, *to)),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── Simulation driver ─────────────────────────────────────────

/// Poll the service at every deadline up to and including `end_ms`.
/// Returns the number of polls performed.
pub fn run_until(
    app: &mut AppService,
    hw: &mut MockHardware,
    sink: &mut RecordingSink,
    end_ms: u64,
) -> usize {
    let mut polls = 0;
    while let Some(at) = app.next_deadline() {
        if at > end_ms {
            break;
        }
        app.poll(at, hw, sink);
        polls += 1;
    }
    polls
}

//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them — log to serial, queue for MQTT,
//! refresh the display, etc.

use crate::error::{CommandError, SensorFault};
use crate::fsm::StateId;

use super::commands::FanMode;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// Telemetry snapshot, published after every control tick.
    Telemetry(TelemetryData),

    /// The controller transitioned between states.
    StateChanged { from: StateId, to: StateId },

    /// An enclosure sample was rejected and control escalated to Error.
    SensorFault(SensorFault),

    /// An operator request was refused without changing state.
    CommandRejected(CommandError),

    /// The application service has started (carries initial state).
    Started(StateId),
}

/// A point-in-time telemetry snapshot suitable for logging or transmission.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryData {
    pub state: StateId,
    /// Operator setpoint (°C).
    pub set_temp_c: f32,
    /// Live ramped target (°C).
    pub target_temp_c: f32,
    pub target_rate: f32,
    pub feedforward: f32,
    pub enclosure_temp_c: Option<f32>,
    pub enclosure_humidity_pct: Option<f32>,
    pub room_temp_c: Option<f32>,
    pub room_humidity_pct: Option<f32>,
    pub filtered_temp_c: Option<f32>,
    pub filtered_d_temp: Option<f32>,
    pub heater_level: f32,
    pub fan_mode: FanMode,
    pub cmd_p: f32,
    pub cmd_i: f32,
    pub cmd_d: f32,
}

impl TelemetryData {
    /// Climate-entity heater mode ("heat" / "off").
    pub fn heater_mode(&self) -> &'static str {
        self.state.heater_mode()
    }
}

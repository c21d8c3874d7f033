//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (which goes to UART / USB-CDC in production).
//! The discovery adapter implements the same trait for the remote side.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Render an optional reading for the log line.
fn opt(v: Option<f32>) -> OptF32 {
    OptF32(v)
}

struct OptF32(Option<f32>);

impl core::fmt::Display for OptF32 {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.0 {
            Some(v) => write!(f, "{v:.2}"),
            None => f.write_str("--"),
        }
    }
}

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Telemetry(t) => {
                info!(
                    "TELEM | state={} | T={}\u{00b0}C RH={}% | room T={}\u{00b0}C | \
                     set={:.1} target={:.2} rate={:.3} ff={:.3} | \
                     filt={} d={} | heater={:.2} fan={}",
                    t.state,
                    opt(t.enclosure_temp_c),
                    opt(t.enclosure_humidity_pct),
                    opt(t.room_temp_c),
                    t.set_temp_c,
                    t.target_temp_c,
                    t.target_rate,
                    t.feedforward,
                    opt(t.filtered_temp_c),
                    opt(t.filtered_d_temp),
                    t.heater_level,
                    t.fan_mode.as_str(),
                );
            }
            AppEvent::StateChanged { from, to } => {
                info!("STATE | {} -> {}", from, to);
            }
            AppEvent::SensorFault(fault) => {
                warn!("FAULT | {}", fault);
            }
            AppEvent::CommandRejected(err) => {
                warn!("REJECT | {}", err);
            }
            AppEvent::Started(state) => {
                info!("START | initial_state={}", state);
            }
        }
    }
}

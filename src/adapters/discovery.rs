//! Home-Assistant style climate discovery and remote command adapter.
//!
//! The transport (MQTT client on the device) is outside this crate: it
//! publishes whatever [`DiscoveryAdapter::drain`] yields and feeds every
//! inbound message to [`DiscoveryAdapter::handle_message`].
//!
//! ## Topics (relative to the device base, `~`)
//!
//! | Topic            | Direction | Payload                         |
//! |------------------|-----------|---------------------------------|
//! | `mode/set`       | in        | `off` / `heat`                  |
//! | `fan_mode/set`   | in        | `off` / `high`                  |
//! | `set_temp/set`   | in        | decimal °C, 15–35               |
//! | `status`         | out       | telemetry JSON                  |
//! | `settings`       | out       | `{"set_temp": ..}`              |

use heapless::Deque;
use log::{info, warn};
use serde::Serialize;
use serde_json::{Value, json};

use crate::app::commands::{AppCommand, FanMode};
use crate::app::events::{AppEvent, TelemetryData};
use crate::app::ports::EventSink;
use crate::config::{TARGET_TEMP_MAX_C, TARGET_TEMP_MIN_C};
use crate::error::CommandError;

pub const MODE_SET: &str = "mode/set";
pub const FAN_MODE_SET: &str = "fan_mode/set";
pub const SET_TEMP_SET: &str = "set_temp/set";

const STATUS_TOPIC: &str = "status";
const SETTINGS_TOPIC: &str = "settings";
const ENTITY_NAME: &str = "thermostat";
const TEMP_STEP_C: f32 = 0.5;

/// Outbound messages held until the transport drains them.
pub const OUTBOX_DEPTH: usize = 8;

/// Parse one inbound command.  `topic` is relative to the device base.
///
/// Nothing is mutated here; the caller queues the returned command.
pub fn parse_command(topic: &str, payload: &[u8]) -> Result<AppCommand, CommandError> {
    let text = core::str::from_utf8(payload)
        .map_err(|_| CommandError::Unparseable)?
        .trim();

    match topic {
        MODE_SET => match text {
            "off" => Ok(AppCommand::Disable),
            "heat" => Ok(AppCommand::Enable),
            _ => Err(CommandError::UnknownMode),
        },
        FAN_MODE_SET => match text {
            "off" => Ok(AppCommand::SetFanMode(FanMode::Off)),
            "high" => Ok(AppCommand::SetFanMode(FanMode::High)),
            _ => Err(CommandError::UnknownMode),
        },
        SET_TEMP_SET => {
            let temp: f32 = text.parse().map_err(|_| CommandError::Unparseable)?;
            if !temp.is_finite() {
                Err(CommandError::Unparseable)
            } else if temp > TARGET_TEMP_MAX_C {
                Err(CommandError::TargetTooHigh(temp))
            } else if temp < TARGET_TEMP_MIN_C {
                Err(CommandError::TargetTooLow(temp))
            } else {
                Ok(AppCommand::SetTarget(temp))
            }
        }
        _ => Err(CommandError::UnknownTopic),
    }
}

/// A message ready for the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundMessage {
    pub topic: String,
    pub payload: String,
}

/// Wire form of a telemetry snapshot.
#[derive(Serialize)]
struct StatusPayload<'a> {
    state: &'a str,
    htr_mode: &'a str,
    fan_mode: &'a str,
    target_temp: f32,
    target_rate: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    enclosure_temp: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    enclosure_humidity: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    room_temp: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    room_humidity: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    filt_temp: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    filt_d_temp: Option<f32>,
    heater: f32,
    cmd_p: f32,
    cmd_i: f32,
    cmd_d: f32,
    cmd_ff: f32,
}

impl<'a> From<&'a TelemetryData> for StatusPayload<'a> {
    fn from(t: &'a TelemetryData) -> Self {
        Self {
            state: t.state.name(),
            htr_mode: t.heater_mode(),
            fan_mode: t.fan_mode.as_str(),
            target_temp: t.target_temp_c,
            target_rate: t.target_rate,
            enclosure_temp: t.enclosure_temp_c,
            enclosure_humidity: t.enclosure_humidity_pct,
            room_temp: t.room_temp_c,
            room_humidity: t.room_humidity_pct,
            filt_temp: t.filtered_temp_c,
            filt_d_temp: t.filtered_d_temp,
            heater: t.heater_level,
            cmd_p: t.cmd_p,
            cmd_i: t.cmd_i,
            cmd_d: t.cmd_d,
            cmd_ff: t.feedforward,
        }
    }
}

pub struct DiscoveryAdapter {
    topic_base: String,
    unique_id: String,
    outbox: Deque<OutboundMessage, OUTBOX_DEPTH>,
    dropped: u32,
    rejected: u32,
}

impl DiscoveryAdapter {
    pub fn new(topic_base: &str, unique_id: &str) -> Self {
        Self {
            topic_base: topic_base.to_owned(),
            unique_id: unique_id.to_owned(),
            outbox: Deque::new(),
            dropped: 0,
            rejected: 0,
        }
    }

    /// Retained topic the discovery document is published on.
    pub fn discovery_topic(&self) -> String {
        format!("homeassistant/climate/{}/config", self.unique_id)
    }

    /// Absolute topics the transport must subscribe to.
    pub fn command_topics(&self) -> [String; 3] {
        [MODE_SET, FAN_MODE_SET, SET_TEMP_SET].map(|t| self.topic(t))
    }

    fn topic(&self, relative: &str) -> String {
        format!("{}/{}", self.topic_base, relative)
    }

    /// The climate-entity discovery document.
    pub fn climate_config(&self) -> Value {
        json!({
            "~": self.topic_base,
            "name": ENTITY_NAME,
            "uniq_id": format!("{}_{}", self.unique_id, ENTITY_NAME),
            "mode_cmd_t": format!("~/{MODE_SET}"),
            "mode_stat_t": format!("~/{STATUS_TOPIC}"),
            "mode_stat_tpl": "{{value_json.htr_mode}}",
            "temp_cmd_t": format!("~/{SET_TEMP_SET}"),
            "temp_stat_t": format!("~/{SETTINGS_TOPIC}"),
            "temp_stat_tpl": "{{value_json.set_temp}}",
            "temperature_unit": "C",
            "fan_mode_cmd_t": format!("~/{FAN_MODE_SET}"),
            "fan_mode_stat_t": format!("~/{STATUS_TOPIC}"),
            "fan_mode_stat_tpl": "{{value_json.fan_mode}}",
            "curr_temp_t": format!("~/{STATUS_TOPIC}"),
            "curr_temp_tpl": "{{value_json.filt_temp}}",
            "min_temp": TARGET_TEMP_MIN_C,
            "max_temp": TARGET_TEMP_MAX_C,
            "temp_step": TEMP_STEP_C,
            "modes": ["off", "heat"],
            "fan_modes": [FanMode::Off.as_str(), FanMode::High.as_str()],
        })
    }

    /// Queue the discovery document (call once the transport connects).
    pub fn announce(&mut self) {
        let msg = OutboundMessage {
            topic: self.discovery_topic(),
            payload: self.climate_config().to_string(),
        };
        info!("Discovery: announcing {}", msg.topic);
        self.enqueue(msg);
    }

    /// Route an inbound message.  Invalid payloads are logged and
    /// dropped; nothing is mutated.
    pub fn handle_message(&mut self, topic: &str, payload: &[u8]) -> Option<AppCommand> {
        let relative = topic
            .strip_prefix(self.topic_base.as_str())
            .and_then(|t| t.strip_prefix('/'))
            .unwrap_or(topic);

        match parse_command(relative, payload) {
            Ok(cmd) => {
                info!("Remote command on '{}': {:?}", relative, cmd);
                Some(cmd)
            }
            Err(e) => {
                self.rejected = self.rejected.saturating_add(1);
                warn!(
                    "Remote command on '{}' ({:?}) rejected: {}",
                    relative,
                    String::from_utf8_lossy(payload),
                    e
                );
                None
            }
        }
    }

    fn enqueue(&mut self, msg: OutboundMessage) {
        if self.outbox.is_full() {
            self.outbox.pop_front();
            self.dropped = self.dropped.saturating_add(1);
        }
        // Cannot fail: a slot was just freed.
        let _ = self.outbox.push_back(msg);
    }

    /// Take every queued message, oldest first.
    pub fn drain(&mut self) -> impl Iterator<Item = OutboundMessage> + '_ {
        core::iter::from_fn(move || self.outbox.pop_front())
    }

    pub fn pending(&self) -> usize {
        self.outbox.len()
    }

    /// Messages discarded because the transport fell behind.
    pub fn dropped(&self) -> u32 {
        self.dropped
    }

    pub fn rejected(&self) -> u32 {
        self.rejected
    }

    fn publish_telemetry(&mut self, t: &TelemetryData) {
        match serde_json::to_string(&StatusPayload::from(t)) {
            Ok(payload) => self.enqueue(OutboundMessage {
                topic: self.topic(STATUS_TOPIC),
                payload,
            }),
            Err(e) => warn!("Discovery: telemetry encode failed: {}", e),
        }
        let settings = json!({ "set_temp": t.set_temp_c });
        self.enqueue(OutboundMessage {
            topic: self.topic(SETTINGS_TOPIC),
            payload: settings.to_string(),
        });
    }
}

impl EventSink for DiscoveryAdapter {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Telemetry(t) => self.publish_telemetry(t),
            AppEvent::Started(_) => self.announce(),
            AppEvent::StateChanged { .. }
            | AppEvent::SensorFault(_)
            | AppEvent::CommandRejected(_) => {}
        }
    }
}

//! Inbound commands to the application service.
//!
//! These represent actions requested by the outside world (power button,
//! web UI, remote climate entity) that the
//! [`AppService`](super::service::AppService) interprets and acts upon.
//! Every command is deferred by one scheduling quantum and applied
//! against the state current at that moment.

use crate::config::ControlConfig;

/// Fan mode as exposed on the climate entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FanMode {
    Off,
    High,
}

impl FanMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::High => "high",
        }
    }

    pub fn from_on(on: bool) -> Self {
        if on { Self::High } else { Self::Off }
    }
}

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppCommand {
    /// Start temperature control (no-op while Enabled).
    Enable,

    /// Stop temperature control (no-op while Disabled or cooling).
    Disable,

    /// Power-button semantics: disable if Enabled, otherwise enable.
    Toggle,

    /// Set the operator setpoint (°C).  Clamped to the accepted range.
    SetTarget(f32),

    /// Override the fan until the next control tick.
    SetFanMode(FanMode),

    /// Run the heater at test power for a fixed time (Disabled only).
    TestHeater,

    /// Run the fan for a fixed time (Disabled only).
    TestFan,

    /// Hot-reload configuration (validated before it is accepted).
    UpdateConfig(ControlConfig),

    /// Explicitly persist the current config on the next save check.
    SaveConfig,
}

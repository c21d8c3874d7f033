//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService (domain)
//! ```
//!
//! Driven adapters (sensors, actuators, event sinks, config storage)
//! implement these traits.  The [`AppService`](super::service::AppService)
//! consumes them via generics, so the domain core never touches hardware
//! directly.
//!
//! ## Safety notes
//!
//! - **ActuatorPort** is the only path to the heater and fan outputs.
//! - **ConfigPort** implementations MUST validate before persisting.

use crate::config::ControlConfig;
use crate::error::SensorError;
use crate::sensors::ClimateReading;

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: the domain calls this to obtain climate samples.
///
/// A failed read must leave the driver's last good reading untouched.
pub trait SensorPort {
    /// Sample the enclosure sensor (drives control).
    fn read_enclosure(&mut self) -> Result<ClimateReading, SensorError>;

    /// Sample the room sensor (telemetry only).
    fn read_room(&mut self) -> Result<ClimateReading, SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port: the domain calls this to command actuators.
///
/// Every call must be idempotent; heater and fan writes within one tick
/// may arrive in either order.
pub trait ActuatorPort {
    /// Set heater power as a fraction of full duty (0.0–1.0).
    fn set_heater_duty(&mut self, level: f32);

    /// Assert or release the hardware safety-interlock enable signal.
    fn set_heater_enable(&mut self, enabled: bool);

    /// Switch the circulation fan relay.
    fn set_fan(&mut self, on: bool);

    /// Drive the power/mode indicator LED.
    fn set_power_led(&mut self, on: bool);

    /// Kill every output (heater, interlock, fan, LED) — safe shutdown.
    fn all_off(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go (serial log, MQTT
/// outbox, display, etc.).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists the control configuration.
///
/// # Safety
///
/// Implementations MUST validate config values before persisting.
/// Invalid ranges are rejected with [`ConfigError::ValidationFailed`],
/// not silently clamped.  A widened validity gate or an out-of-range
/// setpoint must never reach flash.
pub trait ConfigPort {
    /// Load configuration from persistent storage.
    /// Returns [`ControlConfig::default()`] if no stored config exists.
    fn load(&self) -> Result<ControlConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&self, config: &ControlConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Stored config failed deserialization.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Underlying storage is full.
    StorageFull,
    /// Generic I/O error from the storage backend.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::StorageFull => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

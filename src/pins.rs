//! GPIO / peripheral pin assignments for the proofer controller board.
//!
//! Single source of truth for pin numbers and PWM timing.  The firmware
//! binary takes the typed `esp-idf-hal` pins that match these numbers;
//! keep the two in step when the board changes.

// ---------------------------------------------------------------------------
// Heater power stage
// ---------------------------------------------------------------------------

/// LEDC PWM output driving the heater MOSFET.
pub const HEATER_PWM_GPIO: i32 = 32;
/// LEDC PWM output feeding the external safety interlock.  The heater
/// only conducts while this signal toggles.
pub const SAFETY_PWM_GPIO: i32 = 19;

// ---------------------------------------------------------------------------
// Relays and indicators
// ---------------------------------------------------------------------------

/// Digital output: circulation fan relay (active HIGH).
pub const FAN_RELAY_GPIO: i32 = 33;
/// Digital output: power / mode LED (active HIGH).
pub const POWER_LED_GPIO: i32 = 4;

// ---------------------------------------------------------------------------
// User button
// ---------------------------------------------------------------------------

/// Momentary push-button on an input-only pin, external pull-down.
pub const BUTTON_GPIO: i32 = 34;

// ---------------------------------------------------------------------------
// I²C buses (SHTC3 climate sensors)
// ---------------------------------------------------------------------------

/// Bus 0: enclosure sensor (ESP32 default I²C pins).
pub const I2C0_SDA_GPIO: i32 = 21;
pub const I2C0_SCL_GPIO: i32 = 22;
/// Bus 1: room sensor.
pub const I2C1_SDA_GPIO: i32 = 23;
pub const I2C1_SCL_GPIO: i32 = 25;
/// Both buses run at standard mode.
pub const I2C_BAUDRATE_HZ: u32 = 100_000;

// ---------------------------------------------------------------------------
// PWM configuration
// ---------------------------------------------------------------------------

/// LEDC timer resolution (bits).
pub const PWM_RESOLUTION_BITS: u32 = 16;
/// Heater power PWM frequency.
pub const HEATER_PWM_FREQ_HZ: u32 = 100;
/// Safety interlock PWM frequency.
pub const SAFETY_PWM_FREQ_HZ: u32 = 200;

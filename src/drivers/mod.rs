//! Actuator and input drivers, generic over `embedded-hal` traits.

pub mod button;
pub mod fan;
pub mod heater;
pub mod status_led;
pub mod watchdog;

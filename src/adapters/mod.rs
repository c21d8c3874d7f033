//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter     | Implements    | Connects to                     |
//! |-------------|---------------|---------------------------------|
//! | `hardware`  | SensorPort    | SHTC3 sensors over I²C          |
//! |             | ActuatorPort  | Heater/interlock PWM, relay, LED|
//! | `log_sink`  | EventSink     | Serial log output               |
//! | `discovery` | EventSink     | Climate entity outbox / commands|
//! | `nvs`       | ConfigPort    | NVS / in-memory store           |
//! | `time`      | —             | ESP32 system timer              |
//! | `device_id` | —             | eFuse MAC                       |

pub mod device_id;
pub mod discovery;
pub mod hardware;
pub mod log_sink;
pub mod nvs;
pub mod time;

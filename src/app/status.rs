//! On-device status text.
//!
//! Two layouts, matching the small OLED:
//!
//! ```text
//!  Running           Off 23.4 C
//!  24.1 -> 24.3
//! ```

use core::fmt;

use crate::fsm::StateId;

/// Everything the display needs for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatusView {
    pub state: StateId,
    /// Last enclosure temperature, if one was ever read.
    pub temp_c: Option<f32>,
    /// Live ramped target.
    pub target_c: f32,
}

impl fmt::Display for StatusView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.state.name();
        match (self.state, self.temp_c) {
            (StateId::Enabled, Some(t)) => write!(f, "{name}\n{t:.1} -> {:.1}", self.target_c),
            (StateId::Enabled, None) => write!(f, "{name}\n-- -> {:.1}", self.target_c),
            (_, Some(t)) => write!(f, "{name} {t:.1} C"),
            (_, None) => write!(f, "{name} -- C"),
        }
    }
}

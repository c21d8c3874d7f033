//! Polled, debounced front-panel button.
//!
//! ## Hardware
//!
//! Momentary switch on an input-only GPIO with an external resistor.
//! Polarity is chosen at construction.  The main loop calls `poll()`
//! every pass; a press is reported once, after the level has been stable
//! for the debounce window, and the button must be released before the
//! next press can be reported.
//!
//! A press toggles temperature control (`AppCommand::Toggle`).

use embedded_hal::digital::InputPin;
use log::warn;

const DEBOUNCE_MS: u64 = 50;

/// Button events emitted after debounce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonEvent {
    Press,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PressState {
    Idle,
    DebounceWait { since_ms: u64 },
    Held,
}

pub struct ButtonDriver<P> {
    pin: P,
    active_high: bool,
    state: PressState,
}

impl<P: InputPin> ButtonDriver<P> {
    pub fn new(pin: P, active_high: bool) -> Self {
        Self {
            pin,
            active_high,
            state: PressState::Idle,
        }
    }

    fn is_pressed(&mut self) -> bool {
        match self.pin.is_high() {
            Ok(high) => high == self.active_high,
            Err(_) => {
                warn!("Button read failed");
                false
            }
        }
    }

    /// Sample the pin.  `now_ms` is the monotonic time in milliseconds.
    pub fn poll(&mut self, now_ms: u64) -> Option<ButtonEvent> {
        let pressed = self.is_pressed();

        match self.state {
            PressState::Idle => {
                if pressed {
                    self.state = PressState::DebounceWait { since_ms: now_ms };
                }
                None
            }

            PressState::DebounceWait { since_ms } => {
                if !pressed {
                    self.state = PressState::Idle;
                    return None;
                }
                if now_ms.saturating_sub(since_ms) >= DEBOUNCE_MS {
                    self.state = PressState::Held;
                    return Some(ButtonEvent::Press);
                }
                None
            }

            PressState::Held => {
                if !pressed {
                    self.state = PressState::Idle;
                }
                None
            }
        }
    }
}

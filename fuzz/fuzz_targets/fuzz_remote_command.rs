//! Fuzz target: remote command parsing
//!
//! The first byte picks a command topic, the rest is the payload.
//!
//! Invariants checked:
//! - No panics under any byte sequence
//! - An accepted setpoint always lies inside 15..=35 °C
//! - Unknown topics are never accepted
//!
//! cargo fuzz run fuzz_remote_command

#![no_main]

use libfuzzer_sys::fuzz_target;
use proofer::adapters::discovery::{FAN_MODE_SET, MODE_SET, SET_TEMP_SET, parse_command};
use proofer::app::commands::AppCommand;

const TOPICS: [&str; 4] = [MODE_SET, FAN_MODE_SET, SET_TEMP_SET, "status"];

fuzz_target!(|data: &[u8]| {
    let Some((&selector, payload)) = data.split_first() else {
        return;
    };
    let topic = TOPICS[usize::from(selector) % TOPICS.len()];

    match parse_command(topic, payload) {
        Ok(AppCommand::SetTarget(t)) => {
            assert_eq!(topic, SET_TEMP_SET);
            assert!((15.0..=35.0).contains(&t), "setpoint {t} accepted");
        }
        Ok(_) => assert!(topic == MODE_SET || topic == FAN_MODE_SET),
        Err(_) => {}
    }
});

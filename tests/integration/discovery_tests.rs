//! Remote command path: discovery adapter → queued request → service.

use proofer::adapters::discovery::DiscoveryAdapter;
use proofer::app::commands::AppCommand;
use proofer::app::ports::EventSink;
use proofer::app::service::AppService;
use proofer::config::ControlConfig;
use proofer::fsm::StateId;

use crate::mock_hw::{MockHardware, RecordingSink, run_until};

const BASE: &str = "proofer/aabbcc";

fn setup() -> (AppService, MockHardware, RecordingSink, DiscoveryAdapter) {
    let mut app = AppService::new(ControlConfig::default());
    let mut hw = MockHardware::new(23.0);
    let mut sink = RecordingSink::new();
    app.start(0, &mut hw, &mut sink);
    run_until(&mut app, &mut hw, &mut sink, 0);
    (app, hw, sink, DiscoveryAdapter::new(BASE, "proofer_aabbcc"))
}

/// Feed one inbound message the way the firmware loop does.
fn deliver(
    app: &mut AppService,
    discovery: &mut DiscoveryAdapter,
    topic: &str,
    payload: &[u8],
    now_ms: u64,
) -> bool {
    match discovery.handle_message(topic, payload) {
        Some(cmd) => app.request(cmd, now_ms),
        None => false,
    }
}

#[test]
fn out_of_range_target_is_rejected_without_mutation() {
    let (mut app, mut hw, mut sink, mut discovery) = setup();
    let before = app.config().clone();
    let deadline = app.next_deadline();

    let queued = deliver(&mut app, &mut discovery, "proofer/aabbcc/set_temp/set", b"50", 100);

    assert!(!queued);
    assert_eq!(discovery.rejected(), 1);
    assert_eq!(app.next_deadline(), deadline, "nothing was queued");
    run_until(&mut app, &mut hw, &mut sink, 20_000);
    assert_eq!(app.config(), &before);
    assert!(!app.is_config_dirty());
}

#[test]
fn valid_target_reaches_config() {
    let (mut app, mut hw, mut sink, mut discovery) = setup();
    assert!(deliver(&mut app, &mut discovery, "proofer/aabbcc/set_temp/set", b"28.5", 100));
    run_until(&mut app, &mut hw, &mut sink, 101);
    assert_eq!(app.config().setpoint_c, 28.5);
    assert!(app.is_config_dirty());
}

#[test]
fn heat_mode_enables_and_off_disables() {
    let (mut app, mut hw, mut sink, mut discovery) = setup();
    deliver(&mut app, &mut discovery, "proofer/aabbcc/mode/set", b"heat", 100);
    run_until(&mut app, &mut hw, &mut sink, 101);
    assert_eq!(app.state(), StateId::Enabled);

    deliver(&mut app, &mut discovery, "proofer/aabbcc/mode/set", b"off", 500);
    run_until(&mut app, &mut hw, &mut sink, 501);
    assert_eq!(app.state(), StateId::Cooldown);
}

#[test]
fn unknown_mode_leaves_state_alone() {
    let (mut app, mut hw, mut sink, mut discovery) = setup();
    assert!(!deliver(&mut app, &mut discovery, "proofer/aabbcc/mode/set", b"cool", 100));
    run_until(&mut app, &mut hw, &mut sink, 101);
    assert_eq!(app.state(), StateId::Disabled);
}

#[test]
fn fan_mode_high_turns_fan_on() {
    let (mut app, mut hw, mut sink, mut discovery) = setup();
    deliver(&mut app, &mut discovery, "proofer/aabbcc/fan_mode/set", b"high", 100);
    run_until(&mut app, &mut hw, &mut sink, 101);
    assert!(hw.fan);
}

#[test]
fn telemetry_reaches_outbox_with_mode_strings() {
    let (mut app, mut hw, mut sink, mut discovery) = setup();
    app.request(AppCommand::Enable, 0);
    run_until(&mut app, &mut hw, &mut sink, 101);

    for event in &sink.events {
        discovery.emit(event);
    }
    let msgs: Vec<_> = discovery.drain().collect();
    // Started → discovery document first.
    assert_eq!(msgs[0].topic, "homeassistant/climate/proofer_aabbcc/config");

    let last_status = msgs
        .iter()
        .rev()
        .find(|m| m.topic == "proofer/aabbcc/status")
        .expect("status published");
    let doc: serde_json::Value = serde_json::from_str(&last_status.payload).unwrap();
    assert_eq!(doc["htr_mode"], "heat");
    assert_eq!(doc["fan_mode"], "high");
    assert_eq!(doc["state"], "Running");
}

#[test]
fn command_topics_cover_all_setters() {
    let discovery = DiscoveryAdapter::new(BASE, "proofer_aabbcc");
    let topics = discovery.command_topics();
    assert!(topics.contains(&"proofer/aabbcc/mode/set".to_owned()));
    assert!(topics.contains(&"proofer/aabbcc/fan_mode/set".to_owned()));
    assert!(topics.contains(&"proofer/aabbcc/set_temp/set".to_owned()));
}

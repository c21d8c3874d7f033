//! Integration tests for the AppService → FSM → actuators pipeline.
//!
//! These run on the host (x86_64) and drive the service purely through
//! its scheduler deadlines, the same way the firmware loop does.

use proofer::adapters::nvs::NvsAdapter;
use proofer::app::commands::{AppCommand, FanMode};
use proofer::app::events::AppEvent;
use proofer::app::ports::ConfigPort;
use proofer::app::service::{AppService, HEATER_TEST_LEVEL};
use proofer::config::ControlConfig;
use proofer::error::{CommandError, SensorFault};
use proofer::fsm::StateId;

use crate::mock_hw::{MockHardware, RecordingSink, run_until};

/// Service started at t=0 with its first Disabled tick already run.
fn started(temp_c: f32) -> (AppService, MockHardware, RecordingSink) {
    let mut app = AppService::new(ControlConfig::default());
    let mut hw = MockHardware::new(temp_c);
    let mut sink = RecordingSink::new();
    app.start(0, &mut hw, &mut sink);
    run_until(&mut app, &mut hw, &mut sink, 0);
    (app, hw, sink)
}

/// Enabled at t=1; the settle tick follows at 101, then every second.
fn enabled(temp_c: f32) -> (AppService, MockHardware, RecordingSink) {
    let (mut app, mut hw, mut sink) = started(temp_c);
    app.request(AppCommand::Enable, 0);
    run_until(&mut app, &mut hw, &mut sink, 1);
    assert_eq!(app.state(), StateId::Enabled);
    (app, hw, sink)
}

// ── Start-up ─────────────────────────────────────────────────

#[test]
fn start_kills_outputs_and_reports_disabled() {
    let (app, hw, sink) = started(22.0);
    assert_eq!(app.state(), StateId::Disabled);
    assert_eq!(hw.calls.first(), Some(&crate::mock_hw::ActuatorCall::AllOff));
    assert!(!hw.heating());
    assert!(!hw.fan);
    assert!(matches!(sink.events.first(), Some(AppEvent::Started(StateId::Disabled))));
    assert_eq!(app.tick_count(), 1);
    assert_eq!(app.next_deadline(), Some(10_000));
}

#[test]
fn every_tick_publishes_telemetry() {
    let (mut app, mut hw, mut sink) = started(22.0);
    run_until(&mut app, &mut hw, &mut sink, 30_000);
    let telem = sink.count(|e| matches!(e, AppEvent::Telemetry(_)));
    assert_eq!(telem as u64, app.tick_count());
}

// ── Scenario A: enable ramps from the current sample ─────────

#[test]
fn enable_ramps_one_step_per_second_from_sample() {
    let (mut app, mut hw, mut sink) = enabled(24.0);
    assert!(hw.led, "power LED follows Enabled");

    run_until(&mut app, &mut hw, &mut sink, 1_101);

    let s = app.session();
    assert!(
        (s.ramped_target - 24.05).abs() < 0.01,
        "ramped target {}",
        s.ramped_target
    );
    assert!((s.target_rate - 0.05).abs() < 1e-6);
    assert!(hw.fan);
    assert!(hw.heating());
    assert!(hw.interlock_consistent());
    assert_eq!(sink.transitions(), vec![(StateId::Disabled, StateId::Enabled)]);
}

#[test]
fn enable_is_idempotent() {
    let (mut app, mut hw, mut sink) = enabled(24.0);
    run_until(&mut app, &mut hw, &mut sink, 3_101);
    let before = app.session().ramped_target;

    app.request(AppCommand::Enable, 3_101);
    run_until(&mut app, &mut hw, &mut sink, 3_102);

    assert_eq!(app.state(), StateId::Enabled);
    assert_eq!(app.session().ramped_target, before);
    assert_eq!(sink.transitions().len(), 1);
}

#[test]
fn toggle_enables_then_cools_down() {
    let (mut app, mut hw, mut sink) = started(24.0);
    app.request(AppCommand::Toggle, 0);
    run_until(&mut app, &mut hw, &mut sink, 1);
    assert_eq!(app.state(), StateId::Enabled);

    app.request(AppCommand::Toggle, 500);
    run_until(&mut app, &mut hw, &mut sink, 501);
    assert_eq!(app.state(), StateId::Cooldown);
    assert!(!hw.heating());
    assert!(hw.fan);
    assert!(!hw.led);
}

#[test]
fn request_burst_ending_in_disable_stops_heating() {
    let (mut app, mut hw, mut sink) = enabled(24.0);
    run_until(&mut app, &mut hw, &mut sink, 1_101);
    assert!(hw.heating());

    for _ in 0..8 {
        assert!(app.request(AppCommand::Enable, 2_000));
    }
    assert!(app.request(AppCommand::Disable, 2_000));
    run_until(&mut app, &mut hw, &mut sink, 2_001);

    assert_eq!(app.state(), StateId::Cooldown);
    assert!(!hw.heating());
    assert!(hw.interlock_consistent());
}

// ── Scenario B: sensor failure while heating ─────────────────

#[test]
fn sensor_failure_while_enabled_enters_error() {
    let (mut app, mut hw, mut sink) = enabled(24.0);
    run_until(&mut app, &mut hw, &mut sink, 1_101);
    assert!(hw.heating());

    hw.fail_sensor();
    run_until(&mut app, &mut hw, &mut sink, 2_101);

    assert_eq!(app.state(), StateId::Error);
    assert_eq!(hw.duty, 0.0);
    assert!(!hw.interlock);
    assert!(hw.fan);
    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::SensorFault(SensorFault::ReadFailed(_)))),
        1
    );
    assert_eq!(sink.transitions().last(), Some(&(StateId::Enabled, StateId::Error)));
}

#[test]
fn lingering_sensor_failure_is_reported_once() {
    let (mut app, mut hw, mut sink) = enabled(24.0);
    hw.fail_sensor();
    run_until(&mut app, &mut hw, &mut sink, 60_000);

    assert_eq!(app.state(), StateId::Error);
    assert!(app.tick_count() > 5);
    assert_eq!(sink.count(|e| matches!(e, AppEvent::SensorFault(_))), 1);
}

#[test]
fn implausible_reading_while_enabled_enters_error() {
    let (mut app, mut hw, mut sink) = enabled(24.0);
    hw.set_temp(55.0);
    run_until(&mut app, &mut hw, &mut sink, 101);
    assert_eq!(app.state(), StateId::Error);
    assert!(!hw.heating());
}

#[test]
fn sensor_failure_while_disabled_is_ignored() {
    let (mut app, mut hw, mut sink) = started(24.0);
    hw.fail_sensor();
    run_until(&mut app, &mut hw, &mut sink, 30_000);
    assert_eq!(app.state(), StateId::Disabled);
    assert_eq!(sink.count(|e| matches!(e, AppEvent::SensorFault(_))), 0);
}

// ── Scenario C: error, fan run-on, then operator clears ──────

#[test]
fn error_clears_on_disable_after_fan_run_on() {
    let (mut app, mut hw, mut sink) = enabled(24.0);
    run_until(&mut app, &mut hw, &mut sink, 1_101);
    hw.fail_sensor();
    run_until(&mut app, &mut hw, &mut sink, 2_101);
    assert_eq!(app.state(), StateId::Error);

    // Still inside the run-on window.
    run_until(&mut app, &mut hw, &mut sink, 91_101);
    assert_eq!(app.state(), StateId::Error);
    assert!(hw.fan);

    app.request(AppCommand::Disable, 91_101);
    run_until(&mut app, &mut hw, &mut sink, 91_102);
    assert_eq!(app.state(), StateId::Disabled);
    assert!(!hw.fan);
    assert!(!hw.heating());
    assert_eq!(sink.transitions().last(), Some(&(StateId::Error, StateId::Disabled)));
}

#[test]
fn error_stops_fan_after_run_on_but_holds_state() {
    let (mut app, mut hw, mut sink) = enabled(24.0);
    hw.fail_sensor();
    run_until(&mut app, &mut hw, &mut sink, 101);
    assert_eq!(app.state(), StateId::Error);

    run_until(&mut app, &mut hw, &mut sink, 101 + 110_000);
    assert_eq!(app.state(), StateId::Error);
    assert!(!hw.fan);
}

#[test]
fn enable_from_error_starts_fresh_session() {
    let (mut app, mut hw, mut sink) = enabled(24.0);
    hw.fail_sensor();
    run_until(&mut app, &mut hw, &mut sink, 101);
    assert_eq!(app.state(), StateId::Error);

    hw.set_temp(25.0);
    app.request(AppCommand::Enable, 5_000);
    run_until(&mut app, &mut hw, &mut sink, 5_001);
    assert_eq!(app.state(), StateId::Enabled);
    assert_eq!(app.session().ramped_target, 25.0);
}

// ── Scenario D: cooldown keeps the fan running ───────────────

#[test]
fn cooldown_keeps_fan_on_until_elapsed() {
    let (mut app, mut hw, mut sink) = enabled(24.0);
    run_until(&mut app, &mut hw, &mut sink, 1_101);
    app.request(AppCommand::Disable, 1_101);
    run_until(&mut app, &mut hw, &mut sink, 1_102);
    assert_eq!(app.state(), StateId::Cooldown);

    run_until(&mut app, &mut hw, &mut sink, 61_102);
    assert_eq!(app.state(), StateId::Cooldown);
    assert!(hw.fan);
    assert!(!hw.heating());
    assert!(hw.interlock_consistent());
}

#[test]
fn cooldown_ends_in_disabled() {
    let (mut app, mut hw, mut sink) = enabled(24.0);
    app.request(AppCommand::Disable, 1);
    run_until(&mut app, &mut hw, &mut sink, 2);
    assert_eq!(app.state(), StateId::Cooldown);

    run_until(&mut app, &mut hw, &mut sink, 2 + 100_200);
    assert_eq!(app.state(), StateId::Disabled);
    assert!(!hw.fan);
    assert_eq!(
        sink.transitions(),
        vec![
            (StateId::Disabled, StateId::Enabled),
            (StateId::Enabled, StateId::Cooldown),
            (StateId::Cooldown, StateId::Disabled),
        ]
    );
}

#[test]
fn disable_is_noop_while_disabled() {
    let (mut app, mut hw, mut sink) = started(24.0);
    app.request(AppCommand::Disable, 10);
    run_until(&mut app, &mut hw, &mut sink, 11);
    assert_eq!(app.state(), StateId::Disabled);
    assert!(sink.transitions().is_empty());
}

// ── Closed loop ──────────────────────────────────────────────

#[test]
fn closed_loop_warms_chamber_without_overshooting_target() {
    let (mut app, mut hw, mut sink) = enabled(24.0);
    let mut temp = 24.0_f32;
    let mut last_target = app.session().ramped_target;

    // Crude first-order chamber: heater power in, loss to a 20 °C room.
    for _ in 0..3_000 {
        let Some(at) = app.next_deadline() else { break };
        app.poll(at, &mut hw, &mut sink);
        assert!(hw.interlock_consistent());

        let target = app.session().ramped_target;
        assert!(target >= last_target - 1e-4, "target went backwards");
        assert!(target <= 27.0 + 1e-3, "target overshot setpoint");
        last_target = target;

        temp += hw.duty * 0.02 - (temp - 20.0) * 0.0005;
        hw.set_temp(temp);
    }

    assert_eq!(app.state(), StateId::Enabled);
    assert!(app.session().ramped_target > 26.0);
    assert!(temp > 25.0, "chamber should have warmed, got {temp}");
}

// ── Manual actuation ─────────────────────────────────────────

#[test]
fn heater_test_runs_for_ten_seconds_while_disabled() {
    let (mut app, mut hw, mut sink) = started(22.0);
    app.request(AppCommand::TestHeater, 0);
    run_until(&mut app, &mut hw, &mut sink, 1);
    assert_eq!(hw.duty, HEATER_TEST_LEVEL);
    assert!(hw.interlock);

    // The regular Disabled tick at 10 s keeps the test running.
    run_until(&mut app, &mut hw, &mut sink, 10_000);
    assert!(hw.heating());

    run_until(&mut app, &mut hw, &mut sink, 10_001);
    assert!(!hw.heating());
    assert!(hw.interlock_consistent());
    assert_eq!(app.state(), StateId::Disabled);
}

#[test]
fn fan_test_runs_for_a_minute() {
    let (mut app, mut hw, mut sink) = started(22.0);
    app.request(AppCommand::TestFan, 0);
    run_until(&mut app, &mut hw, &mut sink, 30_000);
    assert!(hw.fan);
    run_until(&mut app, &mut hw, &mut sink, 60_001);
    assert!(!hw.fan);
}

#[test]
fn manual_test_refused_unless_disabled() {
    let (mut app, mut hw, mut sink) = enabled(24.0);
    app.request(AppCommand::TestHeater, 10);
    run_until(&mut app, &mut hw, &mut sink, 11);
    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::CommandRejected(CommandError::NotPermitted))),
        1
    );
    assert_eq!(app.state(), StateId::Enabled);
}

#[test]
fn fan_mode_override_lasts_until_next_tick() {
    let (mut app, mut hw, mut sink) = started(22.0);
    app.request(AppCommand::SetFanMode(FanMode::High), 100);
    run_until(&mut app, &mut hw, &mut sink, 101);
    assert!(hw.fan);

    run_until(&mut app, &mut hw, &mut sink, 10_000);
    assert!(!hw.fan);
}

// ── Configuration ────────────────────────────────────────────

#[test]
fn set_target_is_clamped_and_auto_saved() {
    let (mut app, mut hw, mut sink) = started(22.0);
    let nvs = NvsAdapter::new().unwrap();

    app.request(AppCommand::SetTarget(50.0), 0);
    run_until(&mut app, &mut hw, &mut sink, 1);
    assert_eq!(app.config().setpoint_c, 35.0);
    assert!(app.is_config_dirty());

    assert!(!app.auto_save_if_needed(5_000, &nvs));
    assert!(app.auto_save_if_needed(5_001, &nvs));
    assert!(!app.is_config_dirty());
    assert_eq!(nvs.load().unwrap().setpoint_c, 35.0);
}

#[test]
fn invalid_config_update_is_rejected() {
    let (mut app, mut hw, mut sink) = started(22.0);
    let bad = ControlConfig {
        min_valid_temp_c: 30.0,
        max_valid_temp_c: 20.0,
        ..ControlConfig::default()
    };
    app.request(AppCommand::UpdateConfig(bad), 0);
    run_until(&mut app, &mut hw, &mut sink, 1);

    assert_eq!(app.config(), &ControlConfig::default());
    assert!(!app.is_config_dirty());
    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::CommandRejected(CommandError::InvalidConfig(_)))),
        1
    );
}

#[test]
fn save_config_flushes_on_next_check() {
    let (mut app, mut hw, mut sink) = started(22.0);
    let nvs = NvsAdapter::new().unwrap();
    let cfg = ControlConfig {
        kp: 0.3,
        ..ControlConfig::default()
    };
    app.request(AppCommand::UpdateConfig(cfg), 6_000);
    app.request(AppCommand::SaveConfig, 6_000);
    run_until(&mut app, &mut hw, &mut sink, 6_001);

    assert!(app.auto_save_if_needed(6_001, &nvs));
    assert_eq!(nvs.load().unwrap().kp, 0.3);
}

#[test]
fn force_save_only_when_dirty() {
    let (mut app, mut hw, mut sink) = started(22.0);
    let nvs = NvsAdapter::new().unwrap();
    app.force_save_if_dirty(&nvs);
    assert_eq!(nvs.load().unwrap(), ControlConfig::default());

    app.request(AppCommand::SetTarget(30.0), 0);
    run_until(&mut app, &mut hw, &mut sink, 1);
    app.force_save_if_dirty(&nvs);
    assert!(!app.is_config_dirty());
    assert_eq!(nvs.load().unwrap().setpoint_c, 30.0);
}

// ── Display ──────────────────────────────────────────────────

#[test]
fn status_view_tracks_state() {
    let (mut app, mut hw, mut sink) = started(22.0);
    assert_eq!(app.status_view().to_string(), "Off 22.0 C");

    app.request(AppCommand::Enable, 0);
    run_until(&mut app, &mut hw, &mut sink, 1);
    assert_eq!(app.status_view().to_string(), "Running\n22.0 -> 22.0");
}

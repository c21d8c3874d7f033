//! Proofer Firmware — Main Entry Point
//!
//! Hexagonal architecture driven by a single cooperative scheduler.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter    LogEventSink   NvsAdapter   MonotonicClock │
//! │  (Sensor+Actuator)  (EventSink)    (Config)     (time base)    │
//! │  DiscoveryAdapter   ButtonDriver   Watchdog                    │
//! │  (EventSink+cmds)   (Toggle)       (TWDT)                      │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              AppService (pure logic)                   │    │
//! │  │  Gate · Planner · PID · FSM · Mediator · Scheduler     │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! No network client is linked into this image.  The discovery outbox is
//! rendered to the debug log each pass, and remote commands enter only
//! through [`DiscoveryAdapter::handle_message`] from whatever transport
//! embeds the library.  The power button is the local operator input.
#![deny(unused_must_use)]

use anyhow::Result;
use esp_idf_hal::delay::{Delay, FreeRtos};
use esp_idf_hal::gpio::PinDriver;
use esp_idf_hal::i2c::{I2cConfig, I2cDriver};
use esp_idf_hal::ledc::config::TimerConfig;
use esp_idf_hal::ledc::{LedcDriver, LedcTimerDriver, Resolution};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::units::Hertz;
use log::{info, warn};

use proofer::adapters::device_id;
use proofer::adapters::discovery::DiscoveryAdapter;
use proofer::adapters::hardware::HardwareAdapter;
use proofer::adapters::log_sink::LogEventSink;
use proofer::adapters::nvs::NvsAdapter;
use proofer::adapters::time::MonotonicClock;
use proofer::app::commands::AppCommand;
use proofer::app::events::AppEvent;
use proofer::app::ports::{ConfigPort, EventSink};
use proofer::app::service::AppService;
use proofer::config::ControlConfig;
use proofer::drivers::button::{ButtonDriver, ButtonEvent};
use proofer::drivers::fan::RelayDriver;
use proofer::drivers::heater::HeaterDriver;
use proofer::drivers::status_led::StatusLed;
use proofer::drivers::watchdog::Watchdog;
use proofer::pins;
use proofer::sensors::shtc3::Shtc3;

/// Longest the loop sleeps between passes, so the button stays responsive.
const MAX_IDLE_MS: u64 = 20;

// ── Event fan-out ─────────────────────────────────────────────
//
// Every event goes to the serial log and to the discovery outbox.

struct Sinks {
    log: LogEventSink,
    discovery: DiscoveryAdapter,
}

impl EventSink for Sinks {
    fn emit(&mut self, event: &AppEvent) {
        self.log.emit(event);
        self.discovery.emit(event);
    }
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Proofer v{}                         ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let clock = MonotonicClock::new();
    let mut watchdog = Watchdog::default();

    // ── 2. Load config from NVS (or defaults) ─────────────────
    let nvs = NvsAdapter::new()
        .map_err(|e| anyhow::anyhow!("NVS init failed: {}", e))?;
    let config = match nvs.load() {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!("NVS config load failed ({}), using defaults", e);
            ControlConfig::default()
        }
    };

    // ── 3. Peripherals ────────────────────────────────────────
    let p = Peripherals::take()?;

    let i2c_cfg = I2cConfig::new().baudrate(Hertz(pins::I2C_BAUDRATE_HZ));
    let bus0 = I2cDriver::new(p.i2c0, p.pins.gpio21, p.pins.gpio22, &i2c_cfg)?;
    let bus1 = I2cDriver::new(p.i2c1, p.pins.gpio23, p.pins.gpio25, &i2c_cfg)?;

    let mut enclosure = Shtc3::new(bus0, Delay::new_default(), "enclosure");
    let mut room = Shtc3::new(bus1, Delay::new_default(), "room");
    for (name, probe) in [("enclosure", enclosure.probe()), ("room", room.probe())] {
        match probe {
            Ok(id) => info!("SHTC3 {} detected (id={:#06x})", name, id),
            Err(e) => warn!("SHTC3 {} probe failed: {}", name, e),
        }
    }

    let heater_timer = LedcTimerDriver::new(
        p.ledc.timer0,
        &TimerConfig::new()
            .frequency(Hertz(pins::HEATER_PWM_FREQ_HZ))
            .resolution(Resolution::Bits16),
    )?;
    let safety_timer = LedcTimerDriver::new(
        p.ledc.timer1,
        &TimerConfig::new()
            .frequency(Hertz(pins::SAFETY_PWM_FREQ_HZ))
            .resolution(Resolution::Bits16),
    )?;
    let heater_pwm = LedcDriver::new(p.ledc.channel0, &heater_timer, p.pins.gpio32)?;
    let safety_pwm = LedcDriver::new(p.ledc.channel1, &safety_timer, p.pins.gpio19)?;

    let fan_pin = PinDriver::output(p.pins.gpio33)?;
    let led_pin = PinDriver::output(p.pins.gpio4)?;
    let mut button = ButtonDriver::new(PinDriver::input(p.pins.gpio34)?, true);

    let mut hw = HardwareAdapter::new(
        enclosure,
        room,
        HeaterDriver::new(heater_pwm, safety_pwm),
        RelayDriver::new(fan_pin, true),
        StatusLed::new(led_pin, false),
    );

    // ── 4. Device identity + discovery ────────────────────────
    let mac = device_id::read_mac();
    let unique_id = device_id::unique_id(&mac);
    let topic_base = device_id::topic_base(&mac);
    info!("Device ID: {} (topics: {}/...)", unique_id, topic_base);

    let mut sinks = Sinks {
        log: LogEventSink::new(),
        discovery: DiscoveryAdapter::new(&topic_base, &unique_id),
    };

    // ── 5. App service ────────────────────────────────────────
    let mut app = AppService::new(config);
    app.start(clock.now_ms(), &mut hw, &mut sinks);

    info!("System ready. Entering control loop.");

    // ── 6. Control loop ───────────────────────────────────────
    loop {
        let now = clock.now_ms();

        if let Some(ButtonEvent::Press) = button.poll(now) {
            info!("Button: press -> toggle");
            app.request(AppCommand::Toggle, now);
        }

        app.poll(now, &mut hw, &mut sinks);

        for msg in sinks.discovery.drain() {
            log::debug!("OUT {} {}", msg.topic, msg.payload);
        }

        app.auto_save_if_needed(now, &nvs);
        watchdog.feed();

        let idle = app
            .next_deadline()
            .map_or(MAX_IDLE_MS, |at| at.saturating_sub(clock.now_ms()))
            .clamp(1, MAX_IDLE_MS);
        FreeRtos::delay_ms(idle as u32);
    }
}

//! Garage door controller firmware: main entry point.
//!
//! Hexagonal architecture with an interrupt-fed control loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter     LogEventSink   NvsAdapter   Esp32Time     │
//! │  (Sensor+Relay)      (EventSink)    (Config)     (uptime)      │
//! │  serial console ──▶ MAILBOX                                    │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │            DoorService (pure logic)                    │    │
//! │  │  Door FSM · Scheduler · RelayActuator                  │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```

use std::io::BufRead;
use std::time::Duration;

use anyhow::{anyhow, Result};
use esp_idf_svc::hal::delay::FreeRtos;
use esp_idf_svc::hal::gpio::{AnyIOPin, AnyOutputPin, PinDriver};
use log::{info, warn, LevelFilter};

use garagedoor::adapters::hardware::HardwareAdapter;
use garagedoor::adapters::log_sink::LogEventSink;
use garagedoor::adapters::nvs::NvsAdapter;
use garagedoor::adapters::time::Esp32TimeAdapter;
use garagedoor::app::commands::{self, DoorCommand};
use garagedoor::app::ports::{ConfigError, ConfigPort};
use garagedoor::app::service::DoorService;
use garagedoor::config::DoorConfig;
use garagedoor::drivers::{isr, relay::RelayDriver};
use garagedoor::events::{self, Event};
use garagedoor::fsm::Sensor;
use garagedoor::sensors::{PositionSensor, SensorMonitor};

/// Loop period.  Well below the debounce window so settling is prompt.
const LOOP_PERIOD_MS: u32 = 10;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  GarageDoor v{}                      ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Configuration ──────────────────────────────────────
    let nvs = NvsAdapter::new()?;
    let config = load_config(&nvs)?;

    log::set_max_level(if config.debug_logging {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    });

    info!("Door '{}'", config.name);
    info!(
        "  relay      GPIO{} {} pulse={}ms",
        config.relay_gpio,
        config.relay_active_level.polarity_name(),
        config.relay_pulse_ms
    );
    info!(
        "  closed     GPIO{} {}",
        config.closed_sensor_gpio,
        config.closed_sensor_active_level.polarity_name()
    );
    info!(
        "  open       GPIO{} {}",
        config.open_sensor_gpio,
        config.open_sensor_active_level.polarity_name()
    );
    info!(
        "  travel={}s debounce={}ms motion-check={}ms",
        config.travel_time_secs, config.debounce_ms, config.motion_check_ms
    );

    // ── 3. Pins ───────────────────────────────────────────────
    // SAFETY: each GPIO number is validated distinct and in range, and
    // nothing else in the firmware claims these pins.
    let relay_pin = PinDriver::output(unsafe { AnyOutputPin::new(config.relay_gpio) })?;
    let closed_pin = PinDriver::input(unsafe { AnyIOPin::new(config.closed_sensor_gpio) })?;
    let open_pin = PinDriver::input(unsafe { AnyIOPin::new(config.open_sensor_gpio) })?;

    let relay = RelayDriver::new(relay_pin, config.relay_active_level)?;
    let monitor = SensorMonitor::new(
        PositionSensor::new(Sensor::Closed, closed_pin, config.closed_sensor_active_level),
        PositionSensor::new(Sensor::Open, open_pin, config.open_sensor_active_level),
        config.debounce_ms,
    );
    let mut hw = HardwareAdapter::new(monitor, relay);
    isr::install_sensor_isrs(config.closed_sensor_gpio, config.open_sensor_gpio)?;

    // ── 4. Core ───────────────────────────────────────────────
    let time = Esp32TimeAdapter::new();
    let mut sink = LogEventSink::new();
    let mut door = DoorService::start(&config, &mut hw, &mut sink);

    spawn_console()?;

    info!("System ready. Entering event loop.");

    // ── 5. Event loop ─────────────────────────────────────────
    loop {
        let now_ms = time.uptime_ms();

        events::drain_events(|event| match event {
            Event::ClosedSensorEdge => hw.note_edge(Sensor::Closed, now_ms),
            Event::OpenSensorEdge => hw.note_edge(Sensor::Open, now_ms),
        });

        while let Some(cmd) = commands::take() {
            info!("Command: {:?}", cmd);
            door.handle_command(cmd, now_ms, &mut hw, &mut sink);
        }

        for (sensor, reading) in hw.settled_edges(now_ms) {
            door.on_sensor_edge(sensor, reading, now_ms, &mut hw, &mut sink);
        }

        door.tick(now_ms, &mut hw, &mut sink);

        FreeRtos::delay_ms(LOOP_PERIOD_MS);
    }
}

/// Stored config, else the build-time JSON (persisted for next boot).
fn load_config(nvs: &NvsAdapter) -> Result<DoorConfig> {
    match nvs.load() {
        Ok(cfg) => {
            info!("Config loaded from NVS");
            return Ok(cfg);
        }
        Err(ConfigError::NotFound) => info!("No stored config"),
        Err(e) => warn!("NVS config load failed ({})", e),
    }

    let json = option_env!("GARAGEDOOR_CONFIG_JSON")
        .ok_or_else(|| anyhow!("no door config in NVS and none built in"))?;
    let cfg = DoorConfig::from_json(json)?;
    if let Err(e) = nvs.save(&cfg) {
        warn!("Config not persisted ({})", e);
    }
    info!("Config taken from build-time JSON");
    Ok(cfg)
}

/// Read `open` / `close` / `refresh` lines from the serial console.
fn spawn_console() -> Result<()> {
    std::thread::Builder::new()
        .name("console".into())
        .stack_size(4096)
        .spawn(|| {
            let stdin = std::io::stdin();
            let mut line = String::new();
            loop {
                line.clear();
                match stdin.lock().read_line(&mut line) {
                    Ok(0) | Err(_) => std::thread::sleep(Duration::from_millis(100)),
                    Ok(_) => match line.parse::<DoorCommand>() {
                        Ok(cmd) => commands::post(cmd),
                        Err(e) => {
                            if !line.trim().is_empty() {
                                warn!("Console: '{}': {}", line.trim(), e);
                            }
                        }
                    },
                }
            }
        })?;
    Ok(())
}

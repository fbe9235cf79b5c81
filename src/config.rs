//! Door configuration parameters
//!
//! Wiring, polarity and timing for one door.  Immutable for the lifetime
//! of a [`Door`](crate::fsm::Door); loaded once at boot from NVS or from the
//! JSON handed over by the automation bridge.

use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;
use crate::pins;

/// Electrical level at which a pin counts as "active".
///
/// Lets relay and sensor wiring polarity vary without touching the logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActiveLevel {
    Low,
    High,
}

impl ActiveLevel {
    /// The other level.
    pub const fn opposite(self) -> Self {
        match self {
            Self::Low => Self::High,
            Self::High => Self::Low,
        }
    }

    /// Level corresponding to a raw `is_high()` pin sample.
    pub const fn from_high(high: bool) -> Self {
        if high { Self::High } else { Self::Low }
    }

    pub const fn is_high(self) -> bool {
        matches!(self, Self::High)
    }

    /// Human-readable polarity tag used in the boot banner.
    pub const fn polarity_name(self) -> &'static str {
        match self {
            Self::Low => "ACTIVE_LOW",
            Self::High => "ACTIVE_HIGH",
        }
    }
}

/// Configuration for one garage door.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoorConfig {
    /// Accessory name shown to the automation host.
    #[serde(default = "default_name")]
    pub name: heapless::String<32>,

    // --- Relay ---
    /// GPIO wired to the door-button relay.
    #[serde(default = "default_relay_gpio")]
    pub relay_gpio: i32,
    /// Level that closes the relay contact.
    #[serde(default = "default_active_level")]
    pub relay_active_level: ActiveLevel,
    /// How long the relay is held closed per activation (ms).
    #[serde(default = "default_relay_pulse_ms")]
    pub relay_pulse_ms: u32,

    // --- Position sensors ---
    /// GPIO of the fully-closed reed switch.
    #[serde(default = "default_closed_sensor_gpio")]
    pub closed_sensor_gpio: i32,
    #[serde(default = "default_active_level")]
    pub closed_sensor_active_level: ActiveLevel,
    /// GPIO of the fully-open reed switch.
    #[serde(default = "default_open_sensor_gpio")]
    pub open_sensor_gpio: i32,
    #[serde(default = "default_active_level")]
    pub open_sensor_active_level: ActiveLevel,

    // --- Timing ---
    /// Seconds a full open or close is expected to take.  Required.
    pub travel_time_secs: u16,
    /// Edge debounce window (ms).
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u32,
    /// Grace period between a relay pulse and the motion-start check (ms).
    #[serde(default = "default_motion_check_ms")]
    pub motion_check_ms: u32,

    // --- Diagnostics ---
    #[serde(default)]
    pub debug_logging: bool,
}

fn default_name() -> heapless::String<32> {
    let mut name = heapless::String::new();
    // Fits: 11 bytes into a 32-byte buffer.
    let _ = name.push_str("Garage Door");
    name
}

fn default_relay_gpio() -> i32 {
    pins::RELAY_GPIO
}

fn default_closed_sensor_gpio() -> i32 {
    pins::CLOSED_SENSOR_GPIO
}

fn default_open_sensor_gpio() -> i32 {
    pins::OPEN_SENSOR_GPIO
}

fn default_active_level() -> ActiveLevel {
    ActiveLevel::High
}

fn default_relay_pulse_ms() -> u32 {
    1000
}

fn default_debounce_ms() -> u32 {
    100
}

fn default_motion_check_ms() -> u32 {
    800
}

impl DoorConfig {
    /// Build a config with every optional field at its default.
    ///
    /// The travel time has no sensible default, so it is the one argument.
    pub fn new(travel_time_secs: u16) -> Self {
        Self {
            name: default_name(),
            relay_gpio: default_relay_gpio(),
            relay_active_level: default_active_level(),
            relay_pulse_ms: default_relay_pulse_ms(),
            closed_sensor_gpio: default_closed_sensor_gpio(),
            closed_sensor_active_level: default_active_level(),
            open_sensor_gpio: default_open_sensor_gpio(),
            open_sensor_active_level: default_active_level(),
            travel_time_secs,
            debounce_ms: default_debounce_ms(),
            motion_check_ms: default_motion_check_ms(),
            debug_logging: false,
        }
    }

    /// Parse and validate the JSON form of the config.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(json).map_err(|_| ConfigError::Corrupted)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Travel-time bound in milliseconds.
    pub fn travel_time_ms(&self) -> u64 {
        u64::from(self.travel_time_secs) * 1000
    }

    /// Range-check every field.  Invalid values are rejected, never clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.relay_gpio == self.closed_sensor_gpio
            || self.relay_gpio == self.open_sensor_gpio
            || self.closed_sensor_gpio == self.open_sensor_gpio
        {
            return Err(ConfigError::ValidationFailed(
                "relay, closed and open sensor GPIOs must be distinct",
            ));
        }
        for gpio in [self.relay_gpio, self.closed_sensor_gpio, self.open_sensor_gpio] {
            if !(0..=pins::MAX_GPIO).contains(&gpio) {
                return Err(ConfigError::ValidationFailed("GPIO number out of range"));
            }
        }
        if !(100..=5000).contains(&self.relay_pulse_ms) {
            return Err(ConfigError::ValidationFailed(
                "relay_pulse_ms must be 100–5000",
            ));
        }
        if !(1..=300).contains(&self.travel_time_secs) {
            return Err(ConfigError::ValidationFailed(
                "travel_time_secs must be 1–300",
            ));
        }
        if !(10..=1000).contains(&self.debounce_ms) {
            return Err(ConfigError::ValidationFailed("debounce_ms must be 10–1000"));
        }
        if self.motion_check_ms == 0 || u64::from(self.motion_check_ms) >= self.travel_time_ms() {
            return Err(ConfigError::ValidationFailed(
                "motion_check_ms must be non-zero and shorter than the travel time",
            ));
        }
        Ok(())
    }
}

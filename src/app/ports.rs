//! Port traits: the hexagonal boundary between the door logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ DoorService (domain)
//! ```
//!
//! Driven adapters (sensor pins, relay pin, event sinks, config storage)
//! implement these traits.  [`DoorService`](super::service::DoorService)
//! consumes them via generics, so the domain core never touches hardware
//! directly.
//!
//! - **ConfigPort** implementations MUST validate before persisting.
//! - All port errors are typed; callers handle every variant explicitly.

use crate::config::DoorConfig;
use crate::error::IoFault;
use crate::fsm::context::{Sample, SensorSnapshot};
use crate::fsm::{Sensor, SensorState};

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: synchronous, polarity-resolved sensor reads.
pub trait SensorPort {
    /// Read one sensor.  A failed pin read is an [`IoFault::SensorRead`].
    fn poll(&mut self, sensor: Sensor) -> Result<SensorState, IoFault>;

    /// Read both sensors back to back.
    fn snapshot(&mut self) -> Sample {
        Ok(SensorSnapshot {
            closed: self.poll(Sensor::Closed)?,
            open: self.poll(Sensor::Open)?,
        })
    }
}

// ───────────────────────────────────────────────────────────────
// Relay port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port for the door-button relay.  Polarity is the adapter's job.
pub trait RelayPort {
    /// Close the relay contact (press the button).
    fn energise(&mut self) -> Result<(), IoFault>;

    /// Open the relay contact (release the button).
    fn release(&mut self) -> Result<(), IoFault>;

    /// Last level successfully written was the active one.
    fn is_energised(&self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / host bridge)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`DoorEvent`](super::events::DoorEvent)s
/// through this port.  Adapters decide where they go (serial log, the
/// automation bridge, a test recorder).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::DoorEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists the door configuration.
///
/// Implementations MUST validate before persisting.  Invalid ranges are
/// rejected with [`ConfigError::ValidationFailed`], never clamped.
pub trait ConfigPort {
    /// Load the stored configuration.
    ///
    /// Returns [`ConfigError::NotFound`] when nothing is stored: the travel
    /// time has no default, so there is no fallback config.
    fn load(&self) -> Result<DoorConfig, ConfigError>;

    /// Validate and persist.
    fn save(&self, config: &DoorConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// No config found in storage (first boot).
    NotFound,
    /// Stored or supplied config failed deserialization.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Underlying storage is full.
    StorageFull,
    /// Generic I/O error from the storage backend.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::StorageFull => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl std::error::Error for ConfigError {}

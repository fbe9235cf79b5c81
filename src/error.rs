//! Unified error types for the garage door firmware.
//!
//! A single `Error` enum that every subsystem converts into, so the event
//! loop and the [`EventSink`](crate::app::ports::EventSink) see one shape.
//! All variants are `Copy` so they travel through the state machine and the
//! event channel without allocation.

use core::fmt;

use crate::fsm::Sensor;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fault the door controller can report.
///
/// None of these are fatal: the door always falls back to `Stopped` and
/// keeps accepting commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A pin read or write failed at the hardware boundary.
    Io(IoFault),
    /// Both position sensors report the door at their end at once.
    InconsistentSensorReading,
    /// The travel-time bound elapsed with neither end reached.
    StallTimeout,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "io: {e}"),
            Self::InconsistentSensorReading => {
                write!(f, "both position sensors active at once")
            }
            Self::StallTimeout => write!(f, "door did not reach an end position in time"),
        }
    }
}

// ---------------------------------------------------------------------------
// I/O faults
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoFault {
    /// Reading a position sensor pin failed.
    SensorRead(Sensor),
    /// Driving the relay pin failed.
    RelayWrite,
}

impl fmt::Display for IoFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SensorRead(sensor) => write!(f, "{sensor} sensor read failed"),
            Self::RelayWrite => write!(f, "relay write failed"),
        }
    }
}

impl std::error::Error for Error {}

impl std::error::Error for IoFault {}

impl From<IoFault> for Error {
    fn from(e: IoFault) -> Self {
        Self::Io(e)
    }
}

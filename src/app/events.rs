//! Outbound door events.
//!
//! The [`DoorService`](super::service::DoorService) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them: log to serial, push a characteristic
//! update to the automation host, record them in a test.

use crate::error::Error;
use crate::fsm::{DoorState, TargetState};

/// Structured events emitted by the door core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoorEvent {
    /// The service has started (carries the seeded states).
    Started {
        current: DoorState,
        target: TargetState,
    },

    /// `current` changed.  Forwarded to the host on every change.
    CurrentStateChanged { from: DoorState, to: DoorState },

    /// `target` was commanded or inferred.
    TargetStateChanged(TargetState),

    /// The relay was pressed.
    RelayPulsed,

    /// A fault for the host's error channel.  Never fatal.
    Fault(Error),
}

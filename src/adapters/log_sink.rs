//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured door events to the
//! ESP-IDF logger (UART / USB-CDC in production).  A bridge to the
//! automation host would implement the same trait.

use log::{error, info, warn};

use crate::app::events::DoorEvent;
use crate::app::ports::EventSink;
use crate::error::Error;

/// Adapter that logs every [`DoorEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &DoorEvent) {
        match event {
            DoorEvent::Started { current, target } => {
                info!("START | current={:?} target={:?} obstruction=false", current, target);
            }
            DoorEvent::CurrentStateChanged { from, to } => {
                info!("STATE | {:?} -> {:?}", from, to);
            }
            DoorEvent::TargetStateChanged(target) => {
                info!("TARGET | {:?}", target);
            }
            DoorEvent::RelayPulsed => {
                info!("RELAY | pulse");
            }
            DoorEvent::Fault(e @ Error::Io(_)) => {
                error!("FAULT | {}", e);
            }
            DoorEvent::Fault(e) => {
                warn!("FAULT | {}", e);
            }
        }
    }
}

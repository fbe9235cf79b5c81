//! Hardware adapter: bridges real pins to the domain port traits.
//!
//! Owns the [`SensorMonitor`] and the [`RelayDriver`], exposing them
//! through [`SensorPort`] and [`RelayPort`].  Generic over the
//! `embedded-hal` pin types, so the same adapter runs on `PinDriver`s on
//! the ESP32 and on mock pins in host tests.

use embedded_hal::digital::{InputPin, OutputPin};

use crate::app::ports::{RelayPort, SensorPort};
use crate::drivers::relay::RelayDriver;
use crate::error::IoFault;
use crate::fsm::{Sensor, SensorState};
use crate::sensors::SensorMonitor;

/// A debounced transition waiting to be fed to the door.
pub type SettledEdge = (Sensor, Result<SensorState, IoFault>);

/// Concrete adapter that combines both sensors and the relay behind port traits.
pub struct HardwareAdapter<C, O, R> {
    monitor: SensorMonitor<C, O>,
    relay: RelayDriver<R>,
}

impl<C: InputPin, O: InputPin, R: OutputPin> HardwareAdapter<C, O, R> {
    /// Build the adapter and seed the debouncers from the current levels.
    pub fn new(monitor: SensorMonitor<C, O>, relay: RelayDriver<R>) -> Self {
        let mut hw = Self { monitor, relay };
        if let Ok(snapshot) = hw.monitor.snapshot() {
            hw.monitor.prime(snapshot);
        }
        hw
    }

    /// Record a raw edge from the ISR queue.
    pub fn note_edge(&mut self, sensor: Sensor, now_ms: u64) {
        self.monitor.note_edge(sensor, now_ms);
    }

    /// Collect every edge that has settled by `now_ms`.
    ///
    /// Returned rather than dispatched so the caller can hand them to the
    /// service while lending it this adapter.
    pub fn settled_edges(&mut self, now_ms: u64) -> heapless::Vec<SettledEdge, 2> {
        let mut out = heapless::Vec::new();
        self.monitor.dispatch_edges(now_ms, |sensor, reading| {
            // At most one per sensor; two fit.
            let _ = out.push((sensor, reading));
        });
        out
    }
}

// ── SensorPort implementation ─────────────────────────────────

impl<C: InputPin, O: InputPin, R: OutputPin> SensorPort for HardwareAdapter<C, O, R> {
    fn poll(&mut self, sensor: Sensor) -> Result<SensorState, IoFault> {
        self.monitor.poll(sensor)
    }
}

// ── RelayPort implementation ──────────────────────────────────

impl<C: InputPin, O: InputPin, R: OutputPin> RelayPort for HardwareAdapter<C, O, R> {
    fn energise(&mut self) -> Result<(), IoFault> {
        self.relay.energise()
    }

    fn release(&mut self) -> Result<(), IoFault> {
        self.relay.release()
    }

    fn is_energised(&self) -> bool {
        self.relay.is_energised()
    }
}

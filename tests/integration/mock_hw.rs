//! Mock hardware for integration tests.
//!
//! [`MockHardware`] implements the port traits directly and records every
//! relay write.  [`MockPin`] implements the `embedded-hal` pin traits so the
//! real drivers and [`HardwareAdapter`](garagedoor::adapters::hardware::HardwareAdapter)
//! can be exercised without GPIO registers.

use std::cell::Cell;
use std::rc::Rc;

use embedded_hal::digital::{ErrorKind, ErrorType, InputPin, OutputPin};

use garagedoor::app::events::DoorEvent;
use garagedoor::app::ports::{EventSink, RelayPort, SensorPort};
use garagedoor::error::{Error, IoFault};
use garagedoor::fsm::{DoorState, Sensor, SensorState};

// ── Relay call record ─────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayCall {
    Energise,
    Release,
}

// ── MockHardware ──────────────────────────────────────────────

pub struct MockHardware {
    pub closed: SensorState,
    pub open: SensorState,
    /// Reads of this sensor fail.
    pub broken_sensor: Option<Sensor>,
    pub relay_broken: bool,
    pub calls: Vec<RelayCall>,
    energised: bool,
}

#[allow(dead_code)]
impl MockHardware {
    fn with(closed: SensorState, open: SensorState) -> Self {
        Self {
            closed,
            open,
            broken_sensor: None,
            relay_broken: false,
            calls: Vec::new(),
            energised: false,
        }
    }

    pub fn at_closed() -> Self {
        Self::with(SensorState::Active, SensorState::Inactive)
    }

    pub fn at_open() -> Self {
        Self::with(SensorState::Inactive, SensorState::Active)
    }

    pub fn between() -> Self {
        Self::with(SensorState::Inactive, SensorState::Inactive)
    }

    pub fn set(&mut self, sensor: Sensor, state: SensorState) {
        match sensor {
            Sensor::Closed => self.closed = state,
            Sensor::Open => self.open = state,
        }
    }

    /// Door leaves the closed end: closed sensor drops.
    pub fn leave_closed(&mut self) {
        self.closed = SensorState::Inactive;
    }

    /// Number of relay presses (energise writes).
    pub fn presses(&self) -> usize {
        self.calls.iter().filter(|c| **c == RelayCall::Energise).count()
    }

    pub fn releases(&self) -> usize {
        self.calls.iter().filter(|c| **c == RelayCall::Release).count()
    }

    pub fn energised(&self) -> bool {
        self.energised
    }
}

impl SensorPort for MockHardware {
    fn poll(&mut self, sensor: Sensor) -> Result<SensorState, IoFault> {
        if self.broken_sensor == Some(sensor) {
            return Err(IoFault::SensorRead(sensor));
        }
        Ok(match sensor {
            Sensor::Closed => self.closed,
            Sensor::Open => self.open,
        })
    }
}

impl RelayPort for MockHardware {
    fn energise(&mut self) -> Result<(), IoFault> {
        if self.relay_broken {
            return Err(IoFault::RelayWrite);
        }
        self.energised = true;
        self.calls.push(RelayCall::Energise);
        Ok(())
    }

    fn release(&mut self) -> Result<(), IoFault> {
        if self.relay_broken {
            return Err(IoFault::RelayWrite);
        }
        self.energised = false;
        self.calls.push(RelayCall::Release);
        Ok(())
    }

    fn is_energised(&self) -> bool {
        self.energised
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<DoorEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `current` value pushed, in order.
    pub fn states(&self) -> Vec<DoorState> {
        self.events
            .iter()
            .filter_map(|e| match e {
                DoorEvent::CurrentStateChanged { to, .. } => Some(*to),
                _ => None,
            })
            .collect()
    }

    pub fn faults(&self) -> Vec<Error> {
        self.events
            .iter()
            .filter_map(|e| match e {
                DoorEvent::Fault(err) => Some(*err),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &DoorEvent) {
        self.events.push(*event);
    }
}

// ── MockPin ───────────────────────────────────────────────────

#[derive(Debug)]
pub struct MockPinError;

impl embedded_hal::digital::Error for MockPinError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

/// Shared-level pin: clones see the same wire, so a test keeps one clone
/// to drive (or inspect) the level after moving the other into a driver.
#[derive(Clone, Default)]
pub struct MockPin {
    high: Rc<Cell<bool>>,
    broken: Rc<Cell<bool>>,
}

#[allow(dead_code)]
impl MockPin {
    pub fn new(high: bool) -> Self {
        let pin = Self::default();
        pin.high.set(high);
        pin
    }

    pub fn drive(&self, high: bool) {
        self.high.set(high);
    }

    pub fn level(&self) -> bool {
        self.high.get()
    }

    pub fn break_pin(&self) {
        self.broken.set(true);
    }

    pub fn repair(&self) {
        self.broken.set(false);
    }

    fn check(&self) -> Result<(), MockPinError> {
        if self.broken.get() {
            Err(MockPinError)
        } else {
            Ok(())
        }
    }
}

impl ErrorType for MockPin {
    type Error = MockPinError;
}

impl InputPin for MockPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        self.check()?;
        Ok(self.high.get())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.check()?;
        Ok(!self.high.get())
    }
}

impl OutputPin for MockPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.check()?;
        self.high.set(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.check()?;
        self.high.set(true);
        Ok(())
    }
}

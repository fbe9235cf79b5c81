//! Position sensors and the aggregating [`SensorMonitor`].
//!
//! Each [`PositionSensor`] turns a raw pin level into
//! [`SensorState::Active`]/[`SensorState::Inactive`] using its configured
//! polarity.  The monitor owns both, debounces their edges, and never
//! touches door state itself: settled transitions are handed to a callback.

pub mod debounce;

use embedded_hal::digital::InputPin;
use log::debug;

use crate::config::ActiveLevel;
use crate::error::IoFault;
use crate::fsm::context::SensorSnapshot;
use crate::fsm::{Sensor, SensorState};
use debounce::EdgeDebouncer;

// ---------------------------------------------------------------------------
// Single sensor
// ---------------------------------------------------------------------------

pub struct PositionSensor<P> {
    sensor: Sensor,
    pin: P,
    active: ActiveLevel,
}

impl<P: InputPin> PositionSensor<P> {
    pub fn new(sensor: Sensor, pin: P, active: ActiveLevel) -> Self {
        Self {
            sensor,
            pin,
            active,
        }
    }

    /// Sample the pin and apply polarity.
    pub fn poll(&mut self) -> Result<SensorState, IoFault> {
        let high = self
            .pin
            .is_high()
            .map_err(|_| IoFault::SensorRead(self.sensor))?;
        Ok(if ActiveLevel::from_high(high) == self.active {
            SensorState::Active
        } else {
            SensorState::Inactive
        })
    }
}

// ---------------------------------------------------------------------------
// Monitor
// ---------------------------------------------------------------------------

pub struct SensorMonitor<C, O> {
    closed: PositionSensor<C>,
    open: PositionSensor<O>,
    closed_debounce: EdgeDebouncer,
    open_debounce: EdgeDebouncer,
}

impl<C: InputPin, O: InputPin> SensorMonitor<C, O> {
    pub fn new(closed: PositionSensor<C>, open: PositionSensor<O>, debounce_ms: u32) -> Self {
        Self {
            closed,
            open,
            closed_debounce: EdgeDebouncer::new(debounce_ms),
            open_debounce: EdgeDebouncer::new(debounce_ms),
        }
    }

    /// Synchronous read of one sensor.
    pub fn poll(&mut self, sensor: Sensor) -> Result<SensorState, IoFault> {
        match sensor {
            Sensor::Closed => self.closed.poll(),
            Sensor::Open => self.open.poll(),
        }
    }

    pub fn snapshot(&mut self) -> Result<SensorSnapshot, IoFault> {
        Ok(SensorSnapshot {
            closed: self.closed.poll()?,
            open: self.open.poll()?,
        })
    }

    /// Seed both debouncers with the boot-time levels so the first real
    /// edge is compared against what the door was seeded from.
    pub fn prime(&mut self, snapshot: SensorSnapshot) {
        self.closed_debounce.prime(snapshot.closed);
        self.open_debounce.prime(snapshot.open);
    }

    /// Record a raw edge reported by the ISR.
    pub fn note_edge(&mut self, sensor: Sensor, now_ms: u64) {
        self.debouncer(sensor).note_edge(now_ms);
    }

    /// Sample every sensor whose edge has settled and hand each real
    /// transition (or read fault) to `handler`, closed sensor first.
    pub fn dispatch_edges(
        &mut self,
        now_ms: u64,
        mut handler: impl FnMut(Sensor, Result<SensorState, IoFault>),
    ) {
        for sensor in [Sensor::Closed, Sensor::Open] {
            if !self.debouncer(sensor).is_settled(now_ms) {
                continue;
            }
            let reading = self.poll(sensor);
            if let Some(transition) = self.debouncer(sensor).settle(reading) {
                debug!("{} sensor settled: {:?}", sensor, transition);
                handler(sensor, transition);
            }
        }
    }

    fn debouncer(&mut self, sensor: Sensor) -> &mut EdgeDebouncer {
        match sensor {
            Sensor::Closed => &mut self.closed_debounce,
            Sensor::Open => &mut self.open_debounce,
        }
    }
}

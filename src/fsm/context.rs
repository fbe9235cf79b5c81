//! Mutable context threaded through every door handler.
//!
//! `DoorContext` is the blackboard the handlers in `handlers.rs` read and
//! write.  It holds the reported state, the commanded intent, the
//! provenance flags and the timer generation counter.

use log::warn;

use super::{DoorState, Effect, Phase, SensorState, TargetState};
use crate::error::{Error, IoFault};

// ---------------------------------------------------------------------------
// Sensor snapshot
// ---------------------------------------------------------------------------

/// Both sensors sampled at one instant, polarity already applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorSnapshot {
    pub closed: SensorState,
    pub open: SensorState,
}

/// Door position as the sensors see it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    Closed,
    Open,
    /// Neither sensor active: mid-travel, or sensors absent.
    Between,
}

impl Position {
    /// The terminal state this position confirms, if any.
    pub const fn terminal(self) -> Option<DoorState> {
        match self {
            Self::Closed => Some(DoorState::Closed),
            Self::Open => Some(DoorState::Open),
            Self::Between => None,
        }
    }
}

impl SensorSnapshot {
    /// Resolve the snapshot.  Both sensors active is a fault, never a guess.
    pub fn position(&self) -> Result<Position, Error> {
        match (self.closed.is_active(), self.open.is_active()) {
            (true, true) => Err(Error::InconsistentSensorReading),
            (true, false) => Ok(Position::Closed),
            (false, true) => Ok(Position::Open),
            (false, false) => Ok(Position::Between),
        }
    }

    pub fn get(&self, sensor: super::Sensor) -> SensorState {
        match sensor {
            super::Sensor::Closed => self.closed,
            super::Sensor::Open => self.open,
        }
    }
}

/// A fresh read of both sensors, or the fault that prevented it.
pub type Sample = Result<SensorSnapshot, IoFault>;

/// Resolve a sample straight to a position.
pub(super) fn resolve(sample: Sample) -> Result<Position, Error> {
    sample.map_err(Error::from).and_then(|s| s.position())
}

// ---------------------------------------------------------------------------
// Effects
// ---------------------------------------------------------------------------

/// Upper bound on effects a single transition produces.
pub const MAX_EFFECTS: usize = 8;

pub type Effects = heapless::Vec<Effect, MAX_EFFECTS>;

pub(super) fn emit(fx: &mut Effects, effect: Effect) {
    if fx.push(effect).is_err() {
        warn!("Effect list full, dropped {:?}", effect);
    }
}

// ---------------------------------------------------------------------------
// DoorContext
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct DoorContext {
    /// Authoritative reported state.
    pub current: DoorState,
    /// Last commanded or inferred intent.
    pub target: TargetState,
    /// Commanded-operation sub-machine.
    pub phase: Phase,
    /// A pulse from this process is the suspected cause of current motion.
    pub software_triggered: bool,
    /// Bumped whenever a motion timer is issued or invalidated.  A timer
    /// firing with any other value is stale.
    pub generation: u32,
}

impl DoorContext {
    pub fn new(current: DoorState, target: TargetState) -> Self {
        Self {
            current,
            target,
            phase: Phase::Idle,
            software_triggered: false,
            generation: 0,
        }
    }

    /// Travel-bound timer outstanding.
    pub fn operating(&self) -> bool {
        self.phase == Phase::AwaitingMotionEnd
    }

    /// Start a new timer generation and return it.
    pub fn next_generation(&mut self) -> u32 {
        self.generation = self.generation.wrapping_add(1);
        self.generation
    }

    /// Set `current`, emitting a change notification when it differs.
    pub fn set_current(&mut self, to: DoorState, fx: &mut Effects) {
        if self.current != to {
            emit(
                fx,
                Effect::CurrentChanged {
                    from: self.current,
                    to,
                },
            );
            self.current = to;
        }
    }

    /// Set `target`, emitting a notification when it differs.
    pub fn set_target(&mut self, to: TargetState, fx: &mut Effects) {
        if self.target != to {
            self.target = to;
            emit(fx, Effect::TargetChanged(to));
        }
    }
}

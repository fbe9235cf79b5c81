//! Door state machine.
//!
//! The [`Door`] aggregate fuses three event sources into one reported
//! [`DoorState`]:
//!
//! ```text
//!   setTarget ──┐
//!               │     ┌─────────────────────────────┐
//!  timer fire ──┼────▶│ Door (current, target,      │──▶ Effects
//!               │     │  phase, software_triggered) │    (relay pulse, timers,
//! sensor edge ──┘     └─────────────────────────────┘     notifications)
//! ```
//!
//! The relay is the only actuator and there is no motor feedback, so
//! commanded motion is tracked by a nested sub-machine:
//!
//! ```text
//!  Idle ──[pulse]──▶ AwaitingMotionStart ──[motion seen]──▶ AwaitingMotionEnd
//!   ▲                        │                                    │
//!   └─────[no motion]────────┘                                    │
//!   └─────────────────[travel bound / end reached]────────────────┘
//! ```
//!
//! The machine does no I/O.  Sensor samples arrive inside each
//! [`DoorInput`]; everything the outside world must do comes back as an
//! [`Effect`] list that [`DoorService`](crate::app::service::DoorService)
//! applies.

pub mod context;
mod handlers;

use core::fmt;

use context::{DoorContext, Effects, Sample};
use log::info;

use crate::error::{Error, IoFault};

// ---------------------------------------------------------------------------
// Reported and commanded states
// ---------------------------------------------------------------------------

/// Observed door state as reported to the automation host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DoorState {
    Open = 0,
    Closed = 1,
    Opening = 2,
    Closing = 3,
    Stopped = 4,
}

impl DoorState {
    /// `Open` or `Closed`: a state a position sensor confirms directly.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Open | Self::Closed)
    }

}

/// Commanded intent.  Callers never command a transient state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TargetState {
    Open = 0,
    Closed = 1,
}

impl TargetState {
    pub const fn opposite(self) -> Self {
        match self {
            Self::Open => Self::Closed,
            Self::Closed => Self::Open,
        }
    }

    /// The terminal state that satisfies this target.
    pub const fn terminal(self) -> DoorState {
        match self {
            Self::Open => DoorState::Open,
            Self::Closed => DoorState::Closed,
        }
    }

    /// The transient state of a door travelling toward this target.
    pub const fn transient(self) -> DoorState {
        match self {
            Self::Open => DoorState::Opening,
            Self::Closed => DoorState::Closing,
        }
    }

    /// Sensor that confirms this target has been reached.
    pub const fn sensor(self) -> Sensor {
        match self {
            Self::Open => Sensor::Open,
            Self::Closed => Sensor::Closed,
        }
    }
}

// ---------------------------------------------------------------------------
// Sensors
// ---------------------------------------------------------------------------

/// The two position sensors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sensor {
    /// Active means the door is fully closed.
    Closed,
    /// Active means the door is fully open.
    Open,
}

impl Sensor {
    /// The end position this sensor guards.
    pub const fn target(self) -> TargetState {
        match self {
            Self::Closed => TargetState::Closed,
            Self::Open => TargetState::Open,
        }
    }
}

impl fmt::Display for Sensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed => write!(f, "closed"),
            Self::Open => write!(f, "open"),
        }
    }
}

/// Semantic state of one sensor after polarity has been applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorState {
    Active,
    Inactive,
}

impl SensorState {
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }
}

// ---------------------------------------------------------------------------
// Commanded-operation sub-machine
// ---------------------------------------------------------------------------

/// Where the door is in a movement cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No motion timer outstanding.
    Idle,
    /// Relay pulsed; grace timer running before the motion check.
    AwaitingMotionStart,
    /// Motion confirmed (or manual motion seen); travel-bound timer running.
    AwaitingMotionEnd,
}

/// Timer classes owned by the door.  At most one of each is outstanding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionTimer {
    /// Short grace period after a pulse.
    MotionCheck,
    /// Expected full-travel time.
    TravelBound,
}

// ---------------------------------------------------------------------------
// Inputs and effects
// ---------------------------------------------------------------------------

/// Everything that can drive the door.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoorInput {
    /// A caller commanded a new target.  `sample` is a fresh read of both sensors.
    SetTarget { target: TargetState, sample: Sample },
    /// The grace timer issued for `generation` fired.
    MotionCheck { generation: u32, sample: Sample },
    /// The travel-bound timer issued for `generation` fired.
    TravelTimeout { generation: u32, sample: Sample },
    /// A debounced sensor edge, or a failed read of that sensor.  `sample`
    /// is a fresh read of both sensors taken alongside it.
    SensorEdge {
        sensor: Sensor,
        reading: Result<SensorState, IoFault>,
        sample: Sample,
    },
    /// The relay could not be driven.
    RelayFault(IoFault),
    /// Re-sample request from the host; reconciles an idle door.
    Refresh(Sample),
}

/// Side effects requested by a transition, applied in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Press the wall button once.
    PulseRelay,
    /// Schedule `timer`, replacing any outstanding timer of that class.
    Arm { timer: MotionTimer, generation: u32 },
    /// Cancel the outstanding timer of that class, if any.
    Disarm(MotionTimer),
    /// `current` changed.
    CurrentChanged { from: DoorState, to: DoorState },
    /// `target` was recorded or inferred and must be pushed to the host.
    TargetChanged(TargetState),
    /// A fault to surface on the host's error channel.
    Fault(Error),
}

// ---------------------------------------------------------------------------
// Door aggregate
// ---------------------------------------------------------------------------

/// The door aggregate.  Single writer: only [`Door::handle`] mutates it.
#[derive(Debug, Clone)]
pub struct Door {
    ctx: DoorContext,
}

impl Door {
    /// Seed `current`/`target` from a start-up sample.
    ///
    /// A door between the ends, or whose sensors cannot be read, starts
    /// `Stopped` with a `Closed` target.  The returned fault, if any, must be
    /// reported by the caller.
    pub fn seed(sample: Sample) -> (Self, Option<Error>) {
        let resolved = sample.map_err(Error::from).and_then(|s| s.position());
        let (current, target, fault) = match resolved {
            Ok(context::Position::Closed) => (DoorState::Closed, TargetState::Closed, None),
            Ok(context::Position::Open) => (DoorState::Open, TargetState::Open, None),
            Ok(context::Position::Between) => (DoorState::Stopped, TargetState::Closed, None),
            Err(e) => (DoorState::Stopped, TargetState::Closed, Some(e)),
        };
        info!("Door seeded: current={:?} target={:?}", current, target);
        (
            Self {
                ctx: DoorContext::new(current, target),
            },
            fault,
        )
    }

    /// Run one transition and return the effects it requests.
    pub fn handle(&mut self, input: DoorInput) -> Effects {
        let mut fx = Effects::new();
        let ctx = &mut self.ctx;
        match input {
            DoorInput::SetTarget { target, sample } => {
                handlers::set_target(ctx, target, sample, &mut fx);
            }
            DoorInput::MotionCheck { generation, sample } => {
                handlers::motion_check(ctx, generation, sample, &mut fx);
            }
            DoorInput::TravelTimeout { generation, sample } => {
                handlers::travel_timeout(ctx, generation, sample, &mut fx);
            }
            DoorInput::SensorEdge {
                sensor,
                reading,
                sample,
            } => {
                handlers::sensor_edge(ctx, sensor, reading, sample, &mut fx);
            }
            DoorInput::RelayFault(fault) => handlers::fault(ctx, fault.into(), &mut fx),
            DoorInput::Refresh(sample) => handlers::refresh(ctx, sample, &mut fx),
        }
        fx
    }

    pub fn current(&self) -> DoorState {
        self.ctx.current
    }

    pub fn target(&self) -> TargetState {
        self.ctx.target
    }

    pub fn phase(&self) -> Phase {
        self.ctx.phase
    }

    /// True while a travel-bound timer is outstanding.
    pub fn is_operating(&self) -> bool {
        self.ctx.operating()
    }

    /// True while a pulse issued by this process is the suspected cause of motion.
    pub fn is_software_triggered(&self) -> bool {
        self.ctx.software_triggered
    }

    /// Generation the currently outstanding motion timer was issued for.
    pub fn generation(&self) -> u32 {
        self.ctx.generation
    }
}

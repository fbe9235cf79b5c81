//! Door service: the hexagonal core.
//!
//! [`DoorService`] owns the [`Door`] state machine, the timer
//! [`Scheduler`] and the [`RelayActuator`].  It exposes a clean,
//! hardware-agnostic API.  All I/O flows through port traits injected at
//! call sites, so the whole service is testable with mock adapters.
//!
//! ```text
//!  SensorPort ──▶ ┌────────────────────────┐ ──▶ EventSink
//!                 │      DoorService        │
//!   RelayPort ◀── │  Door · Scheduler · Relay│
//!                 └────────────────────────┘
//! ```
//!
//! Time is passed in as `now_ms` (monotonic uptime) so tests can drive
//! the clock.

use log::{error, info, warn};

use crate::config::DoorConfig;
use crate::error::IoFault;
use crate::fsm::context::Effects;
use crate::fsm::{Door, DoorInput, DoorState, Effect, MotionTimer, Phase, Sensor, SensorState, TargetState};
use crate::scheduler::{FiredTimer, Scheduler, TimerHandle, TimerKind};

use super::commands::DoorCommand;
use super::events::DoorEvent;
use super::ports::{EventSink, RelayPort, SensorPort};
use super::relay::RelayActuator;

// ───────────────────────────────────────────────────────────────
// DoorService
// ───────────────────────────────────────────────────────────────

pub struct DoorService {
    door: Door,
    timers: Scheduler,
    relay: RelayActuator,
    /// Outstanding grace timer, if any.
    motion_check: Option<TimerHandle>,
    /// Outstanding travel-bound timer, if any.
    travel: Option<TimerHandle>,
    motion_check_ms: u64,
    travel_ms: u64,
}

impl DoorService {
    // ── Lifecycle ─────────────────────────────────────────────

    /// Release the relay, sample both sensors and seed the door from them.
    ///
    /// The `hw` parameter satisfies **both** [`SensorPort`] and
    /// [`RelayPort`], which avoids a double mutable borrow while keeping
    /// the port boundary explicit.
    pub fn start(
        config: &DoorConfig,
        hw: &mut (impl SensorPort + RelayPort),
        sink: &mut impl EventSink,
    ) -> Self {
        if let Err(e) = hw.release() {
            warn!("Relay release at start failed: {}", e);
            sink.emit(&DoorEvent::Fault(e.into()));
        }

        let (door, fault) = Door::seed(hw.snapshot());
        sink.emit(&DoorEvent::Started {
            current: door.current(),
            target: door.target(),
        });
        if let Some(e) = fault {
            sink.emit(&DoorEvent::Fault(e));
        }
        info!(
            "DoorService started: current={:?} target={:?}",
            door.current(),
            door.target()
        );

        Self {
            door,
            timers: Scheduler::new(),
            relay: RelayActuator::new(config.relay_pulse_ms),
            motion_check: None,
            travel: None,
            motion_check_ms: u64::from(config.motion_check_ms),
            travel_ms: config.travel_time_ms(),
        }
    }

    // ── Inputs ────────────────────────────────────────────────

    /// Process an external command.  Returns as soon as the relay (if any)
    /// is energised; completion is reported later through the sink.
    pub fn handle_command(
        &mut self,
        cmd: DoorCommand,
        now_ms: u64,
        hw: &mut (impl SensorPort + RelayPort),
        sink: &mut impl EventSink,
    ) {
        let sample = hw.snapshot();
        let input = match cmd {
            DoorCommand::SetTarget(target) => DoorInput::SetTarget { target, sample },
            DoorCommand::Refresh => DoorInput::Refresh(sample),
        };
        self.dispatch(input, now_ms, hw, sink);
    }

    /// `setTargetState`: shorthand for [`DoorCommand::SetTarget`].
    pub fn set_target_state(
        &mut self,
        target: TargetState,
        now_ms: u64,
        hw: &mut (impl SensorPort + RelayPort),
        sink: &mut impl EventSink,
    ) {
        self.handle_command(DoorCommand::SetTarget(target), now_ms, hw, sink);
    }

    /// Feed one debounced sensor transition (or read fault).  Both sensors
    /// are re-read so an arrival contradicted by the far sensor is caught.
    pub fn on_sensor_edge(
        &mut self,
        sensor: Sensor,
        reading: Result<SensorState, IoFault>,
        now_ms: u64,
        hw: &mut (impl SensorPort + RelayPort),
        sink: &mut impl EventSink,
    ) {
        let sample = hw.snapshot();
        let input = DoorInput::SensorEdge {
            sensor,
            reading,
            sample,
        };
        self.dispatch(input, now_ms, hw, sink);
    }

    /// Fire every timer due at `now_ms`.  Call on every loop iteration.
    pub fn tick(
        &mut self,
        now_ms: u64,
        hw: &mut (impl SensorPort + RelayPort),
        sink: &mut impl EventSink,
    ) {
        while let Some(fired) = self.timers.pop_expired(now_ms) {
            self.on_timer(fired, now_ms, &mut *hw, &mut *sink);
        }
    }

    // ── Queries ───────────────────────────────────────────────

    /// `getCurrentState`.
    pub fn current_state(&self) -> DoorState {
        self.door.current()
    }

    /// `getTargetState`.
    pub fn target_state(&self) -> TargetState {
        self.door.target()
    }

    /// No obstruction sensor is fitted.
    pub fn obstruction_detected(&self) -> bool {
        false
    }

    pub fn is_operating(&self) -> bool {
        self.door.is_operating()
    }

    pub fn is_software_triggered(&self) -> bool {
        self.door.is_software_triggered()
    }

    pub fn phase(&self) -> Phase {
        self.door.phase()
    }

    /// Pending timers of one kind.  Never more than one.
    pub fn pending_timers(&self, kind: TimerKind) -> usize {
        self.timers.pending(kind)
    }

    /// Earliest pending deadline, for sizing the loop's sleep.
    pub fn next_deadline(&self) -> Option<u64> {
        self.timers.next_deadline()
    }

    // ── Internal ──────────────────────────────────────────────

    fn on_timer(
        &mut self,
        fired: FiredTimer,
        now_ms: u64,
        hw: &mut (impl SensorPort + RelayPort),
        sink: &mut impl EventSink,
    ) {
        let input = match fired.kind {
            TimerKind::RelayRelease => match self.relay.on_release(fired.handle, &mut *hw) {
                Ok(()) => return,
                Err(e) => DoorInput::RelayFault(e),
            },
            TimerKind::MotionCheck => {
                if self.motion_check != Some(fired.handle) {
                    return;
                }
                self.motion_check = None;
                DoorInput::MotionCheck {
                    generation: fired.generation,
                    sample: hw.snapshot(),
                }
            }
            TimerKind::TravelBound => {
                if self.travel != Some(fired.handle) {
                    return;
                }
                self.travel = None;
                DoorInput::TravelTimeout {
                    generation: fired.generation,
                    sample: hw.snapshot(),
                }
            }
        };
        self.dispatch(input, now_ms, hw, sink);
    }

    /// Run an input through the door and apply its effects, following up
    /// with any fault the effects themselves raised.
    fn dispatch(
        &mut self,
        input: DoorInput,
        now_ms: u64,
        hw: &mut (impl SensorPort + RelayPort),
        sink: &mut impl EventSink,
    ) {
        let mut next = Some(input);
        while let Some(input) = next.take() {
            let fx = self.door.handle(input);
            next = self.apply(&fx, now_ms, &mut *hw, &mut *sink);
        }
    }

    fn apply(
        &mut self,
        fx: &Effects,
        now_ms: u64,
        hw: &mut (impl SensorPort + RelayPort),
        sink: &mut impl EventSink,
    ) -> Option<DoorInput> {
        let mut follow_up = None;
        for effect in fx {
            match *effect {
                Effect::PulseRelay => {
                    match self.relay.trigger(now_ms, &mut *hw, &mut self.timers) {
                        Ok(()) => sink.emit(&DoorEvent::RelayPulsed),
                        Err(e) => follow_up = Some(DoorInput::RelayFault(e)),
                    }
                }
                // A failed pulse must not leave a grace timer behind.
                Effect::Arm { timer, generation } if follow_up.is_none() => {
                    self.arm(timer, generation, now_ms);
                }
                Effect::Arm { .. } => {}
                Effect::Disarm(timer) => self.disarm(timer),
                Effect::CurrentChanged { from, to } => {
                    sink.emit(&DoorEvent::CurrentStateChanged { from, to });
                }
                Effect::TargetChanged(target) => {
                    sink.emit(&DoorEvent::TargetStateChanged(target));
                }
                Effect::Fault(e) => sink.emit(&DoorEvent::Fault(e)),
            }
        }
        follow_up
    }

    /// Schedule `timer`, cancelling any superseded timer of the same class.
    fn arm(&mut self, timer: MotionTimer, generation: u32, now_ms: u64) {
        let (slot, kind, delay) = match timer {
            MotionTimer::MotionCheck => {
                (&mut self.motion_check, TimerKind::MotionCheck, self.motion_check_ms)
            }
            MotionTimer::TravelBound => (&mut self.travel, TimerKind::TravelBound, self.travel_ms),
        };
        if let Some(old) = slot.take() {
            self.timers.cancel(old);
        }
        *slot = self.timers.after(now_ms, delay, kind, generation);
        if slot.is_none() {
            error!("Scheduler full, {:?} not armed", kind);
        }
    }

    fn disarm(&mut self, timer: MotionTimer) {
        let slot = match timer {
            MotionTimer::MotionCheck => &mut self.motion_check,
            MotionTimer::TravelBound => &mut self.travel,
        };
        if let Some(handle) = slot.take() {
            self.timers.cancel(handle);
        }
    }
}

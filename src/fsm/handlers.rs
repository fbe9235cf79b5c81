//! Transition handlers, one per input kind.
//!
//! Plain functions over [`DoorContext`]: no closures, no ports, no heap.
//! Every handler re-checks `phase` and `generation` before acting, so a
//! timer and a sensor edge may arrive in either order.

use log::{debug, info, warn};

use super::context::{emit, resolve, DoorContext, Effects, Sample};
use super::{DoorState, Effect, MotionTimer, Phase, Sensor, SensorState, TargetState};
use crate::error::{Error, IoFault};

// ═══════════════════════════════════════════════════════════════════════════
//  Shared steps
// ═══════════════════════════════════════════════════════════════════════════

/// Leave the commanded-operation sub-machine without touching timers.
fn go_idle(ctx: &mut DoorContext) {
    ctx.phase = Phase::Idle;
    ctx.software_triggered = false;
    ctx.next_generation();
}

/// Cancel whichever motion timer is outstanding, then go idle.
fn stop_motion(ctx: &mut DoorContext, fx: &mut Effects) {
    match ctx.phase {
        Phase::Idle => {}
        Phase::AwaitingMotionStart => emit(fx, Effect::Disarm(MotionTimer::MotionCheck)),
        Phase::AwaitingMotionEnd => emit(fx, Effect::Disarm(MotionTimer::TravelBound)),
    }
    go_idle(ctx);
}

/// A sensor confirmed an end position.  The target follows it.
fn arrive(ctx: &mut DoorContext, at: TargetState, fx: &mut Effects) {
    ctx.set_current(at.terminal(), fx);
    ctx.set_target(at, fx);
}

fn terminal_target(state: DoorState) -> Option<TargetState> {
    match state {
        DoorState::Closed => Some(TargetState::Closed),
        DoorState::Open => Some(TargetState::Open),
        _ => None,
    }
}

/// Universal fallback: report the fault and park in `Stopped`.
pub(super) fn fault(ctx: &mut DoorContext, error: Error, fx: &mut Effects) {
    warn!("Door fault: {}", error);
    stop_motion(ctx, fx);
    ctx.set_current(DoorState::Stopped, fx);
    emit(fx, Effect::Fault(error));
}

// ═══════════════════════════════════════════════════════════════════════════
//  Commanded target change
// ═══════════════════════════════════════════════════════════════════════════

pub(super) fn set_target(
    ctx: &mut DoorContext,
    target: TargetState,
    sample: Sample,
    fx: &mut Effects,
) {
    ctx.target = target;
    emit(fx, Effect::TargetChanged(target));

    let position = match resolve(sample) {
        Ok(p) => p,
        Err(e) => return fault(ctx, e, fx),
    };

    if position.terminal() == Some(target.terminal()) {
        debug!("SetTarget {:?}: already there, no pulse", target);
        stop_motion(ctx, fx);
        ctx.set_current(target.terminal(), fx);
        return;
    }

    stop_motion(ctx, fx);
    ctx.software_triggered = true;
    ctx.phase = Phase::AwaitingMotionStart;
    let generation = ctx.next_generation();
    info!("SetTarget {:?}: pulsing relay (gen {})", target, generation);
    emit(fx, Effect::PulseRelay);
    emit(
        fx,
        Effect::Arm {
            timer: MotionTimer::MotionCheck,
            generation,
        },
    );
}

// ═══════════════════════════════════════════════════════════════════════════
//  Motion-start confirmation (grace timer)
// ═══════════════════════════════════════════════════════════════════════════

/// Grace timer fired: decide whether the pulse started the door.
///
/// With no motion seen, a door resting at an end is reported at that end
/// rather than left as it was, so a direction shown from before the pulse
/// never outlives its timers.
pub(super) fn motion_check(
    ctx: &mut DoorContext,
    generation: u32,
    sample: Sample,
    fx: &mut Effects,
) {
    if ctx.phase != Phase::AwaitingMotionStart || generation != ctx.generation {
        debug!("Stale motion check (gen {}, now {})", generation, ctx.generation);
        return;
    }

    let snapshot = match sample {
        Ok(s) => s,
        Err(e) => return fault(ctx, e.into(), fx),
    };
    let position = match snapshot.position() {
        Ok(p) => p,
        Err(e) => return fault(ctx, e, fx),
    };

    let target = ctx.target;
    if position.terminal() == Some(target.terminal()) {
        go_idle(ctx);
        arrive(ctx, target, fx);
        return;
    }

    let leaving: Sensor = target.opposite().sensor();
    if snapshot.get(leaving) == SensorState::Inactive {
        let was_stopped = ctx.current == DoorState::Stopped;
        ctx.phase = Phase::AwaitingMotionEnd;
        let generation = ctx.next_generation();
        ctx.set_current(target.transient(), fx);
        info!("Motion confirmed toward {:?} (gen {})", target, generation);
        emit(
            fx,
            Effect::Arm {
                timer: MotionTimer::TravelBound,
                generation,
            },
        );
        if was_stopped {
            emit(fx, Effect::TargetChanged(target));
        }
    } else {
        warn!("No motion after pulse toward {:?}", target);
        go_idle(ctx);
        if let Some(at) = position.terminal() {
            ctx.set_current(at, fx);
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  Travel-bound timeout
// ═══════════════════════════════════════════════════════════════════════════

pub(super) fn travel_timeout(
    ctx: &mut DoorContext,
    generation: u32,
    sample: Sample,
    fx: &mut Effects,
) {
    if ctx.phase != Phase::AwaitingMotionEnd || generation != ctx.generation {
        debug!("Stale travel timer (gen {}, now {})", generation, ctx.generation);
        return;
    }

    go_idle(ctx);
    match resolve(sample) {
        Ok(position) => match position.terminal().and_then(terminal_target) {
            Some(at) => arrive(ctx, at, fx),
            None => {
                warn!("Travel time elapsed between ends (target {:?})", ctx.target);
                ctx.set_current(DoorState::Stopped, fx);
                emit(fx, Effect::Fault(Error::StallTimeout));
            }
        },
        Err(e) => fault(ctx, e, fx),
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  Sensor transition
// ═══════════════════════════════════════════════════════════════════════════

pub(super) fn sensor_edge(
    ctx: &mut DoorContext,
    sensor: Sensor,
    reading: Result<SensorState, IoFault>,
    sample: Sample,
    fx: &mut Effects,
) {
    let state = match reading {
        Ok(s) => s,
        Err(e) => return fault(ctx, e.into(), fx),
    };

    let guarded = sensor.target();
    if state.is_active() {
        // The far sensor must agree before the door is placed at this end.
        let far = guarded.opposite().sensor();
        match sample {
            Ok(s) if s.get(far).is_active() => {
                return fault(ctx, Error::InconsistentSensorReading, fx);
            }
            Ok(_) => {}
            Err(e) => return fault(ctx, e.into(), fx),
        }
        // Arrival wins over anything outstanding, including a missed edge.
        info!("{} sensor active", sensor);
        stop_motion(ctx, fx);
        arrive(ctx, guarded, fx);
        return;
    }

    if ctx.current != guarded.terminal() {
        debug!("{} sensor inactive while {:?}, ignored", sensor, ctx.current);
        return;
    }
    if ctx.software_triggered {
        debug!("{} sensor inactive after pulse, expected", sensor);
        return;
    }

    let inferred = guarded.opposite();
    info!("Manual movement leaving {:?}", guarded);
    ctx.set_current(inferred.transient(), fx);
    ctx.target = inferred;
    emit(fx, Effect::TargetChanged(inferred));
    if !ctx.operating() {
        ctx.phase = Phase::AwaitingMotionEnd;
        let generation = ctx.next_generation();
        emit(
            fx,
            Effect::Arm {
                timer: MotionTimer::TravelBound,
                generation,
            },
        );
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  Host refresh
// ═══════════════════════════════════════════════════════════════════════════

pub(super) fn refresh(ctx: &mut DoorContext, sample: Sample, fx: &mut Effects) {
    let position = match resolve(sample) {
        Ok(p) => p,
        Err(e) => return fault(ctx, e, fx),
    };
    if ctx.phase != Phase::Idle {
        return;
    }
    match position.terminal().and_then(terminal_target) {
        Some(at) => arrive(ctx, at, fx),
        None if ctx.current.is_terminal() => ctx.set_current(DoorState::Stopped, fx),
        None => {}
    }
}

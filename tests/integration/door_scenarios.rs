//! End-to-end door scenarios through `DoorService` with mock ports.
//!
//! The clock is driven explicitly: every call takes `now_ms`, and
//! `tick(now_ms)` fires whatever timers are due.

use crate::mock_hw::{MockHardware, RecordingSink, RelayCall};

use garagedoor::app::commands::DoorCommand;
use garagedoor::app::events::DoorEvent;
use garagedoor::app::service::DoorService;
use garagedoor::config::DoorConfig;
use garagedoor::error::{Error, IoFault};
use garagedoor::fsm::{DoorState, Phase, Sensor, SensorState, TargetState};
use garagedoor::scheduler::TimerKind;

const TRAVEL_SECS: u16 = 10;

fn config() -> DoorConfig {
    DoorConfig::new(TRAVEL_SECS)
}

fn grace_ms() -> u64 {
    u64::from(config().motion_check_ms)
}

fn travel_ms() -> u64 {
    config().travel_time_ms()
}

fn start(hw: &mut MockHardware) -> (DoorService, RecordingSink) {
    let mut sink = RecordingSink::new();
    let door = DoorService::start(&config(), hw, &mut sink);
    (door, sink)
}

/// Command `Open` from `Closed` and let the grace timer confirm motion.
fn opening_door() -> (DoorService, MockHardware, RecordingSink) {
    let mut hw = MockHardware::at_closed();
    let (mut door, mut sink) = start(&mut hw);
    door.set_target_state(TargetState::Open, 0, &mut hw, &mut sink);
    hw.leave_closed();
    door.tick(grace_ms(), &mut hw, &mut sink);
    assert_eq!(door.current_state(), DoorState::Opening);
    (door, hw, sink)
}

// ── Construction ──────────────────────────────────────────────

#[test]
fn closed_at_boot_seeds_closed_with_no_timers() {
    let mut hw = MockHardware::at_closed();
    let (door, sink) = start(&mut hw);

    assert_eq!(door.current_state(), DoorState::Closed);
    assert_eq!(door.target_state(), TargetState::Closed);
    assert!(!door.is_operating());
    assert_eq!(door.next_deadline(), None);
    assert!(!door.obstruction_detected());
    assert_eq!(hw.presses(), 0);
    assert_eq!(
        sink.events,
        vec![DoorEvent::Started {
            current: DoorState::Closed,
            target: TargetState::Closed,
        }]
    );
}

#[test]
fn open_at_boot_seeds_open() {
    let mut hw = MockHardware::at_open();
    let (door, _) = start(&mut hw);
    assert_eq!(door.current_state(), DoorState::Open);
    assert_eq!(door.target_state(), TargetState::Open);
}

#[test]
fn both_sensors_active_at_boot_is_reported() {
    let mut hw = MockHardware::at_closed();
    hw.open = SensorState::Active;
    let (door, sink) = start(&mut hw);

    assert_eq!(door.current_state(), DoorState::Stopped);
    assert_eq!(sink.faults(), vec![Error::InconsistentSensorReading]);
}

#[test]
fn start_releases_relay() {
    let mut hw = MockHardware::at_closed();
    let _ = start(&mut hw);
    assert_eq!(hw.calls, vec![RelayCall::Release]);
}

// ── Commanded operation ───────────────────────────────────────

#[test]
fn open_command_runs_full_cycle() {
    let mut hw = MockHardware::at_closed();
    let (mut door, mut sink) = start(&mut hw);

    door.set_target_state(TargetState::Open, 0, &mut hw, &mut sink);
    assert_eq!(hw.presses(), 1);
    assert_eq!(door.phase(), Phase::AwaitingMotionStart);
    assert!(door.is_software_triggered());
    assert_eq!(door.current_state(), DoorState::Closed);
    assert_eq!(door.target_state(), TargetState::Open);

    // The door starts moving; the closed sensor edge is our own doing.
    hw.leave_closed();
    door.on_sensor_edge(Sensor::Closed, Ok(SensorState::Inactive), 300, &mut hw, &mut sink);
    assert_eq!(door.current_state(), DoorState::Closed);

    door.tick(grace_ms(), &mut hw, &mut sink);
    assert_eq!(door.current_state(), DoorState::Opening);
    assert!(door.is_operating());
    assert_eq!(door.pending_timers(TimerKind::TravelBound), 1);
    assert_eq!(door.pending_timers(TimerKind::MotionCheck), 0);

    hw.open = SensorState::Active;
    door.tick(grace_ms() + travel_ms(), &mut hw, &mut sink);
    assert_eq!(door.current_state(), DoorState::Open);
    assert!(!door.is_operating());
    assert!(!door.is_software_triggered());
    assert_eq!(hw.presses(), 1);
    assert_eq!(hw.releases(), 2); // boot release + pulse release
    assert_eq!(sink.states(), vec![DoorState::Opening, DoorState::Open]);
}

#[test]
fn arrival_edge_completes_before_travel_timer() {
    let (mut door, mut hw, mut sink) = opening_door();

    hw.open = SensorState::Active;
    door.on_sensor_edge(Sensor::Open, Ok(SensorState::Active), 5_000, &mut hw, &mut sink);
    assert_eq!(door.current_state(), DoorState::Open);
    assert!(!door.is_operating());
    assert_eq!(door.pending_timers(TimerKind::TravelBound), 0);

    // Nothing left to fire.
    door.tick(grace_ms() + travel_ms() + 1, &mut hw, &mut sink);
    assert_eq!(door.current_state(), DoorState::Open);
    assert!(sink.faults().is_empty());
}

#[test]
fn relay_is_released_after_pulse_duration() {
    let mut hw = MockHardware::at_closed();
    let (mut door, mut sink) = start(&mut hw);
    let pulse = u64::from(config().relay_pulse_ms);

    door.set_target_state(TargetState::Open, 0, &mut hw, &mut sink);
    assert!(hw.energised());
    door.tick(pulse - 1, &mut hw, &mut sink);
    assert!(hw.energised());
    door.tick(pulse, &mut hw, &mut sink);
    assert!(!hw.energised());
}

#[test]
fn reversal_during_pulse_extends_single_press() {
    let mut hw = MockHardware::between();
    let (mut door, mut sink) = start(&mut hw);
    let pulse = u64::from(config().relay_pulse_ms);
    hw.calls.clear();

    door.set_target_state(TargetState::Open, 0, &mut hw, &mut sink);
    door.set_target_state(TargetState::Closed, 200, &mut hw, &mut sink);

    door.tick(pulse, &mut hw, &mut sink);
    assert!(hw.energised(), "release follows the last trigger");
    door.tick(200 + pulse, &mut hw, &mut sink);
    assert_eq!(hw.calls, vec![RelayCall::Energise, RelayCall::Release]);
    assert_eq!(door.pending_timers(TimerKind::MotionCheck), 0);
}

#[test]
fn commands_arrive_through_handle_command() {
    let mut hw = MockHardware::at_closed();
    let (mut door, mut sink) = start(&mut hw);

    door.handle_command(DoorCommand::SetTarget(TargetState::Open), 0, &mut hw, &mut sink);
    assert_eq!(hw.presses(), 1);
    assert_eq!(door.target_state(), TargetState::Open);
}

// ── Idempotence ───────────────────────────────────────────────

#[test]
fn same_target_at_terminal_is_a_no_op() {
    let mut hw = MockHardware::at_closed();
    let (mut door, mut sink) = start(&mut hw);

    door.set_target_state(TargetState::Closed, 0, &mut hw, &mut sink);
    assert_eq!(hw.presses(), 0);
    assert_eq!(door.next_deadline(), None);
    assert_eq!(door.current_state(), DoorState::Closed);
}

#[test]
fn repeating_target_while_moving_pulses_again() {
    let (mut door, mut hw, mut sink) = opening_door();
    door.tick(2_000, &mut hw, &mut sink);
    assert!(!hw.energised());

    door.set_target_state(TargetState::Open, 2_000, &mut hw, &mut sink);
    assert_eq!(hw.presses(), 2);
    assert_eq!(door.phase(), Phase::AwaitingMotionStart);
    assert!(door.is_software_triggered());
    assert_eq!(door.pending_timers(TimerKind::MotionCheck), 1);
    assert_eq!(door.pending_timers(TimerKind::TravelBound), 0);

    // Door keeps going: the grace timer re-confirms and re-arms the bound.
    door.tick(2_000 + grace_ms(), &mut hw, &mut sink);
    assert_eq!(door.current_state(), DoorState::Opening);
    assert_eq!(door.pending_timers(TimerKind::TravelBound), 1);
}

#[test]
fn repeated_command_within_pulse_extends_release() {
    let mut hw = MockHardware::at_closed();
    let (mut door, mut sink) = start(&mut hw);
    let pulse = u64::from(config().relay_pulse_ms);
    hw.calls.clear();

    door.set_target_state(TargetState::Open, 0, &mut hw, &mut sink);
    door.set_target_state(TargetState::Open, 100, &mut hw, &mut sink);
    assert_eq!(door.pending_timers(TimerKind::MotionCheck), 1);

    door.tick(pulse, &mut hw, &mut sink);
    assert!(hw.energised(), "release follows the second trigger");
    door.tick(100 + pulse, &mut hw, &mut sink);
    assert_eq!(hw.calls, vec![RelayCall::Energise, RelayCall::Release]);
}

// ── Motion start ──────────────────────────────────────────────

#[test]
fn no_motion_after_pulse_goes_idle() {
    let mut hw = MockHardware::at_closed();
    let (mut door, mut sink) = start(&mut hw);

    door.set_target_state(TargetState::Open, 0, &mut hw, &mut sink);
    // Closed sensor never drops.
    door.tick(grace_ms(), &mut hw, &mut sink);

    assert_eq!(door.current_state(), DoorState::Closed);
    assert_eq!(door.phase(), Phase::Idle);
    assert!(!door.is_operating());
    assert!(!door.is_software_triggered());
    assert_eq!(door.next_deadline().map(|d| d > grace_ms()), Some(true)); // relay release only
    assert_eq!(door.pending_timers(TimerKind::TravelBound), 0);
}

// ── Manual movement ───────────────────────────────────────────

#[test]
fn manual_opening_is_detected_without_pulse() {
    let mut hw = MockHardware::at_closed();
    let (mut door, mut sink) = start(&mut hw);
    sink.clear();

    hw.leave_closed();
    door.on_sensor_edge(Sensor::Closed, Ok(SensorState::Inactive), 1_000, &mut hw, &mut sink);

    assert_eq!(door.current_state(), DoorState::Opening);
    assert_eq!(door.target_state(), TargetState::Open);
    assert!(door.is_operating());
    assert!(!door.is_software_triggered());
    assert_eq!(door.pending_timers(TimerKind::TravelBound), 1);
    assert_eq!(hw.presses(), 0);
    assert!(sink.events.contains(&DoorEvent::TargetStateChanged(TargetState::Open)));
}

#[test]
fn manual_motion_resolves_at_travel_bound() {
    let mut hw = MockHardware::at_open();
    let (mut door, mut sink) = start(&mut hw);

    hw.open = SensorState::Inactive;
    door.on_sensor_edge(Sensor::Open, Ok(SensorState::Inactive), 0, &mut hw, &mut sink);
    assert_eq!(door.current_state(), DoorState::Closing);

    hw.closed = SensorState::Active;
    door.tick(travel_ms(), &mut hw, &mut sink);
    assert_eq!(door.current_state(), DoorState::Closed);
    assert_eq!(door.target_state(), TargetState::Closed);
    assert_eq!(hw.presses(), 0);
}

#[test]
fn other_sensor_inactive_edge_is_irrelevant() {
    let mut hw = MockHardware::at_closed();
    let (mut door, mut sink) = start(&mut hw);
    sink.clear();

    door.on_sensor_edge(Sensor::Open, Ok(SensorState::Inactive), 0, &mut hw, &mut sink);

    assert_eq!(door.current_state(), DoorState::Closed);
    assert_eq!(door.target_state(), TargetState::Closed);
    assert_eq!(door.next_deadline(), None);
    assert!(sink.events.is_empty());
}

#[test]
fn missed_edge_arrival_wins_over_outstanding_timer() {
    let mut hw = MockHardware::at_open();
    let (mut door, mut sink) = start(&mut hw);

    // Manual push away from Open arms a travel timer...
    hw.open = SensorState::Inactive;
    door.on_sensor_edge(Sensor::Open, Ok(SensorState::Inactive), 0, &mut hw, &mut sink);
    assert_eq!(door.pending_timers(TimerKind::TravelBound), 1);

    // ...then the door lands closed.
    hw.closed = SensorState::Active;
    door.on_sensor_edge(Sensor::Closed, Ok(SensorState::Active), 4_000, &mut hw, &mut sink);
    assert_eq!(door.current_state(), DoorState::Closed);
    assert!(!door.is_operating());

    door.tick(travel_ms() * 2, &mut hw, &mut sink);
    assert_eq!(door.current_state(), DoorState::Closed);
    assert!(sink.faults().is_empty());
}

#[test]
fn missed_edge_straight_from_open_to_closed() {
    let mut hw = MockHardware::at_open();
    let (mut door, mut sink) = start(&mut hw);

    hw.open = SensorState::Inactive;
    hw.closed = SensorState::Active;
    door.on_sensor_edge(Sensor::Closed, Ok(SensorState::Active), 0, &mut hw, &mut sink);

    assert_eq!(door.current_state(), DoorState::Closed);
    assert_eq!(door.target_state(), TargetState::Closed);
    assert!(!door.is_operating());
}

#[test]
fn arrival_contradicted_by_far_sensor_is_a_fault() {
    let mut hw = MockHardware::at_open();
    let (mut door, mut sink) = start(&mut hw);

    // Open sensor stuck active while the closed sensor reports arrival.
    hw.closed = SensorState::Active;
    door.on_sensor_edge(Sensor::Closed, Ok(SensorState::Active), 0, &mut hw, &mut sink);

    assert_eq!(door.current_state(), DoorState::Stopped);
    assert_eq!(door.target_state(), TargetState::Open);
    assert!(!door.is_operating());
    assert_eq!(sink.faults(), vec![Error::InconsistentSensorReading]);
    assert_eq!(hw.presses(), 0);
}

#[test]
fn arrival_during_grace_period_cancels_motion_check() {
    let mut hw = MockHardware::at_open();
    let (mut door, mut sink) = start(&mut hw);

    door.set_target_state(TargetState::Closed, 0, &mut hw, &mut sink);
    hw.open = SensorState::Inactive;
    hw.closed = SensorState::Active;
    door.on_sensor_edge(Sensor::Closed, Ok(SensorState::Active), 500, &mut hw, &mut sink);
    assert_eq!(door.current_state(), DoorState::Closed);
    assert_eq!(door.pending_timers(TimerKind::MotionCheck), 0);

    door.tick(grace_ms(), &mut hw, &mut sink);
    assert_eq!(door.current_state(), DoorState::Closed);
    assert_eq!(door.phase(), Phase::Idle);
}

// ── Stall ─────────────────────────────────────────────────────

#[test]
fn stall_stops_and_keeps_target() {
    let (mut door, mut hw, mut sink) = opening_door();

    door.tick(grace_ms() + travel_ms(), &mut hw, &mut sink);

    assert_eq!(door.current_state(), DoorState::Stopped);
    assert!(!door.is_operating());
    assert!(!door.is_software_triggered());
    assert_eq!(door.target_state(), TargetState::Open);
    assert_eq!(sink.faults(), vec![Error::StallTimeout]);
}

#[test]
fn stopped_door_accepts_a_fresh_command() {
    let (mut door, mut hw, mut sink) = opening_door();
    let t = grace_ms() + travel_ms();
    door.tick(t, &mut hw, &mut sink);
    assert_eq!(door.current_state(), DoorState::Stopped);

    door.set_target_state(TargetState::Open, t + 100, &mut hw, &mut sink);
    assert_eq!(hw.presses(), 2);

    door.tick(t + 100 + grace_ms(), &mut hw, &mut sink);
    assert_eq!(door.current_state(), DoorState::Opening);
    assert!(sink.events.contains(&DoorEvent::TargetStateChanged(TargetState::Open)));
}

// ── Faults ────────────────────────────────────────────────────

#[test]
fn sensor_fault_stops_door_and_reports() {
    let (mut door, mut hw, mut sink) = opening_door();

    hw.broken_sensor = Some(Sensor::Open);
    door.on_sensor_edge(
        Sensor::Open,
        Err(IoFault::SensorRead(Sensor::Open)),
        2_000,
        &mut hw,
        &mut sink,
    );

    assert_eq!(door.current_state(), DoorState::Stopped);
    assert!(!door.is_operating());
    assert_eq!(door.pending_timers(TimerKind::TravelBound), 0);
    assert_eq!(
        sink.faults(),
        vec![Error::Io(IoFault::SensorRead(Sensor::Open))]
    );
}

#[test]
fn command_with_unreadable_sensor_does_not_pulse() {
    let mut hw = MockHardware::at_closed();
    let (mut door, mut sink) = start(&mut hw);

    hw.broken_sensor = Some(Sensor::Closed);
    door.set_target_state(TargetState::Open, 0, &mut hw, &mut sink);

    assert_eq!(hw.presses(), 0);
    assert_eq!(door.current_state(), DoorState::Stopped);
    assert_eq!(door.target_state(), TargetState::Open);

    // Next good command re-evaluates from fresh reads.
    hw.broken_sensor = None;
    door.set_target_state(TargetState::Closed, 100, &mut hw, &mut sink);
    assert_eq!(door.current_state(), DoorState::Closed);
    assert_eq!(hw.presses(), 0);
}

#[test]
fn relay_fault_is_reported_and_leaves_no_timer() {
    let mut hw = MockHardware::at_closed();
    let (mut door, mut sink) = start(&mut hw);

    hw.relay_broken = true;
    door.set_target_state(TargetState::Open, 0, &mut hw, &mut sink);

    assert_eq!(door.current_state(), DoorState::Stopped);
    assert_eq!(door.pending_timers(TimerKind::MotionCheck), 0);
    assert_eq!(sink.faults(), vec![Error::Io(IoFault::RelayWrite)]);
}

// ── Refresh ───────────────────────────────────────────────────

#[test]
fn refresh_reconciles_idle_door() {
    let mut hw = MockHardware::at_closed();
    let (mut door, mut sink) = start(&mut hw);

    // Edge lost entirely: door is now open.
    hw.closed = SensorState::Inactive;
    hw.open = SensorState::Active;
    door.handle_command(DoorCommand::Refresh, 0, &mut hw, &mut sink);

    assert_eq!(door.current_state(), DoorState::Open);
    assert_eq!(door.target_state(), TargetState::Open);
    assert_eq!(hw.presses(), 0);
}

#[test]
fn refresh_between_ends_stops_terminal_door() {
    let mut hw = MockHardware::at_closed();
    let (mut door, mut sink) = start(&mut hw);

    hw.closed = SensorState::Inactive;
    door.handle_command(DoorCommand::Refresh, 0, &mut hw, &mut sink);
    assert_eq!(door.current_state(), DoorState::Stopped);
}

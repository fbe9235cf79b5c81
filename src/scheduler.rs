//! One-shot timer scheduler.
//!
//! Deadline-based, single-shot, cancellable.  The scheduler knows nothing
//! about the door: it hands back whatever [`TimerKind`] and generation it
//! was given when the deadline passes.  The control loop polls it with the
//! monotonic uptime on every iteration.
//!
//! ```text
//!  after(now, delay) ──▶ [slot 0..MAX_TIMERS] ──pop_expired(now)──▶ FiredTimer
//!                            ▲
//!  cancel(handle) ───────────┘  (no-op once fired)
//! ```
//!
//! Handles carry a serial number, so a handle to a slot that has since
//! been reused never cancels the newer timer.

use log::{debug, warn};

// ═══════════════════════════════════════════════════════════════
//  Timer types
// ═══════════════════════════════════════════════════════════════

/// What a timer is for.  The scheduler only carries it back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// End of the relay pulse.
    RelayRelease,
    /// Post-pulse grace period.
    MotionCheck,
    /// Expected full-travel time.
    TravelBound,
}

/// Cancellation handle returned by [`Scheduler::after`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerHandle {
    slot: u8,
    serial: u32,
}

/// A timer whose deadline has passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FiredTimer {
    pub kind: TimerKind,
    /// Generation the owner attached when scheduling.
    pub generation: u32,
    pub handle: TimerHandle,
}

#[derive(Debug, Clone, Copy)]
struct TimerEntry {
    deadline_ms: u64,
    kind: TimerKind,
    generation: u32,
    serial: u32,
}

// ═══════════════════════════════════════════════════════════════
//  Scheduler engine
// ═══════════════════════════════════════════════════════════════

/// Maximum number of concurrent timers (stack-allocated).
/// One per [`TimerKind`] plus headroom.
pub const MAX_TIMERS: usize = 4;

pub struct Scheduler {
    slots: [Option<TimerEntry>; MAX_TIMERS],
    next_serial: u32,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub const fn new() -> Self {
        Self {
            slots: [None; MAX_TIMERS],
            next_serial: 0,
        }
    }

    /// Schedule `kind` to fire once, `delay_ms` after `now_ms`.
    /// Returns `None` if every slot is taken.
    pub fn after(
        &mut self,
        now_ms: u64,
        delay_ms: u64,
        kind: TimerKind,
        generation: u32,
    ) -> Option<TimerHandle> {
        let Some(slot) = self.slots.iter().position(Option::is_none) else {
            warn!("Scheduler: no free slot for {:?}", kind);
            return None;
        };
        let serial = self.next_serial;
        self.next_serial = self.next_serial.wrapping_add(1);
        self.slots[slot] = Some(TimerEntry {
            deadline_ms: now_ms.saturating_add(delay_ms),
            kind,
            generation,
            serial,
        });
        debug!(
            "Scheduler: {:?} (gen {}) in {} ms at slot {}",
            kind, generation, delay_ms, slot
        );
        Some(TimerHandle {
            slot: slot as u8,
            serial,
        })
    }

    /// Cancel a pending timer.  Returns `false` if it already fired or was
    /// cancelled.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        let Some(slot) = self.slots.get_mut(handle.slot as usize) else {
            return false;
        };
        if slot.is_some_and(|e| e.serial == handle.serial) {
            *slot = None;
            true
        } else {
            false
        }
    }

    /// Remove and return the earliest timer due at `now_ms`.
    ///
    /// Call in a loop until `None`.  Ties fire in scheduling order.
    pub fn pop_expired(&mut self, now_ms: u64) -> Option<FiredTimer> {
        let (slot, entry) = self
            .slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.map(|e| (i, e)))
            .filter(|(_, e)| e.deadline_ms <= now_ms)
            .min_by_key(|(_, e)| (e.deadline_ms, e.serial))?;
        self.slots[slot] = None;
        Some(FiredTimer {
            kind: entry.kind,
            generation: entry.generation,
            handle: TimerHandle {
                slot: slot as u8,
                serial: entry.serial,
            },
        })
    }

    /// Number of pending timers of `kind`.
    pub fn pending(&self, kind: TimerKind) -> usize {
        self.slots
            .iter()
            .filter(|s| s.is_some_and(|e| e.kind == kind))
            .count()
    }

    /// Number of pending timers of any kind.
    pub fn pending_total(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Earliest pending deadline, for sizing the loop's sleep.
    pub fn next_deadline(&self) -> Option<u64> {
        self.slots.iter().flatten().map(|e| e.deadline_ms).min()
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════

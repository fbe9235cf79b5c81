//! Trailing-edge debounce for one sensor.
//!
//! The ISR only records that an edge happened.  Every further edge inside
//! the window restarts it; once the pin has been quiet for the whole
//! window the level is sampled once and reported if it differs from the
//! last reported level.  A burst of contact bounce therefore becomes at
//! most one logical transition.

use crate::error::IoFault;
use crate::fsm::SensorState;

#[derive(Debug, Clone)]
pub struct EdgeDebouncer {
    window_ms: u64,
    /// Time of the most recent raw edge not yet settled.
    last_edge_ms: Option<u64>,
    /// Level last handed to the state machine.
    reported: Option<SensorState>,
}

impl EdgeDebouncer {
    pub fn new(window_ms: u32) -> Self {
        Self {
            window_ms: u64::from(window_ms),
            last_edge_ms: None,
            reported: None,
        }
    }

    /// Seed the reported level from the boot-time read.
    pub fn prime(&mut self, state: SensorState) {
        self.reported = Some(state);
    }

    /// Record a raw edge at `now_ms`, restarting the window.
    pub fn note_edge(&mut self, now_ms: u64) {
        self.last_edge_ms = Some(now_ms);
    }

    /// An edge is pending and the pin has been quiet for the full window.
    pub fn is_settled(&self, now_ms: u64) -> bool {
        self.last_edge_ms
            .is_some_and(|t| now_ms.saturating_sub(t) >= self.window_ms)
    }

    /// Consume the pending edge with a fresh sample.
    ///
    /// Returns the transition to report, or `None` when the level came
    /// back to where it was (pure noise).  A failed read is reported once
    /// and forgets the last level, so the next good read is reported too.
    pub fn settle(
        &mut self,
        reading: Result<SensorState, IoFault>,
    ) -> Option<Result<SensorState, IoFault>> {
        self.last_edge_ms = None;
        match reading {
            Ok(state) if self.reported == Some(state) => None,
            Ok(state) => {
                self.reported = Some(state);
                Some(Ok(state))
            }
            Err(e) => {
                self.reported = None;
                Some(Err(e))
            }
        }
    }
}

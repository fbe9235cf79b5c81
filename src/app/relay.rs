//! Momentary relay pulse.
//!
//! `trigger` writes the active level immediately and schedules the release
//! through the [`Scheduler`]; it never blocks.  A trigger during a pulse
//! re-arms the release instead of stacking a second press, so every
//! energise is followed by exactly one release.

use log::{debug, warn};

use super::ports::RelayPort;
use crate::error::IoFault;
use crate::scheduler::{Scheduler, TimerHandle, TimerKind};

pub struct RelayActuator {
    pulse_ms: u64,
    release: Option<TimerHandle>,
}

impl RelayActuator {
    pub fn new(pulse_ms: u32) -> Self {
        Self {
            pulse_ms: u64::from(pulse_ms),
            release: None,
        }
    }

    /// Press the button.  Last trigger wins on release time.
    pub fn trigger(
        &mut self,
        now_ms: u64,
        relay: &mut impl RelayPort,
        timers: &mut Scheduler,
    ) -> Result<(), IoFault> {
        if relay.is_energised() {
            debug!("Relay already energised, extending pulse");
        } else {
            relay.energise()?;
        }

        if let Some(old) = self.release.take() {
            timers.cancel(old);
        }
        self.release = timers.after(now_ms, self.pulse_ms, TimerKind::RelayRelease, 0);
        if self.release.is_none() {
            // Never leave the button held down.
            warn!("No timer for relay release, releasing now");
            relay.release()?;
        }
        Ok(())
    }

    /// Handle a fired [`TimerKind::RelayRelease`].  Ignores superseded handles.
    pub fn on_release(
        &mut self,
        handle: TimerHandle,
        relay: &mut impl RelayPort,
    ) -> Result<(), IoFault> {
        if self.release != Some(handle) {
            debug!("Superseded relay release ignored");
            return Ok(());
        }
        self.release = None;
        relay.release()
    }
}

//! Door-button relay driver.
//!
//! A single digital output wired across the wall-button terminals of the
//! opener.  Closing the contact is a button press.
//!
//! ## Polarity
//!
//! The active level is configurable ([`ActiveLevel`]); the inactive level
//! is always its `opposite()`.
//!
//! ## Dual-target design
//!
//! Generic over `embedded_hal::digital::OutputPin`: a `PinDriver` on
//! ESP-IDF, a mock pin on host.  This driver is a dumb actuator; pulse
//! timing lives in [`RelayActuator`](crate::app::relay::RelayActuator).

use embedded_hal::digital::{OutputPin, PinState};

use crate::config::ActiveLevel;
use crate::error::IoFault;

pub struct RelayDriver<P> {
    pin: P,
    active: ActiveLevel,
    energised: bool,
}

impl<P: OutputPin> RelayDriver<P> {
    /// Take ownership of the pin and drive it to the inactive level.
    pub fn new(pin: P, active: ActiveLevel) -> Result<Self, IoFault> {
        let mut relay = Self {
            pin,
            active,
            energised: true,
        };
        relay.release()?;
        Ok(relay)
    }

    /// Drive the active level.
    pub fn energise(&mut self) -> Result<(), IoFault> {
        self.write(self.active)?;
        self.energised = true;
        Ok(())
    }

    /// Drive the inactive level.
    pub fn release(&mut self) -> Result<(), IoFault> {
        self.write(self.active.opposite())?;
        self.energised = false;
        Ok(())
    }

    pub fn is_energised(&self) -> bool {
        self.energised
    }

    fn write(&mut self, level: ActiveLevel) -> Result<(), IoFault> {
        self.pin
            .set_state(PinState::from(level.is_high()))
            .map_err(|_| IoFault::RelayWrite)
    }
}

//! Inbound commands to the door service.
//!
//! These represent actions requested by the outside world (the automation
//! bridge, the serial console) that the
//! [`DoorService`](super::service::DoorService) interprets and acts upon.
//!
//! Producers run on other tasks, so commands travel through a static
//! `embassy-sync` channel that the control loop polls every iteration.
//!
//! ```text
//! ┌──────────────┐  DoorCommand  ┌──────────────┐
//! │ Bridge/Console│─────────────▶│ Control Loop │
//! └──────────────┘   MAILBOX     └──────────────┘
//! ```

use core::str::FromStr;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, TrySendError};
use log::warn;

use crate::fsm::TargetState;

/// Commands that external adapters can send into the door core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoorCommand {
    /// `setTargetState`: fire-and-forget, acknowledged immediately.
    SetTarget(TargetState),
    /// Re-sample the sensors and reconcile an idle door.
    Refresh,
}

impl FromStr for DoorCommand {
    type Err = &'static str;

    /// Console syntax: `open`, `close`, `refresh`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "open" => Ok(Self::SetTarget(TargetState::Open)),
            "close" | "closed" => Ok(Self::SetTarget(TargetState::Closed)),
            "refresh" | "status" => Ok(Self::Refresh),
            _ => Err("expected open, close or refresh"),
        }
    }
}

/// Channel depth.  A human cannot usefully queue more presses than this.
const MAILBOX_DEPTH: usize = 4;

/// Inbound command channel: producer tasks → control loop.
pub static MAILBOX: Channel<CriticalSectionRawMutex, DoorCommand, MAILBOX_DEPTH> = Channel::new();

/// Queue a command.  Returns immediately.
///
/// When the mailbox is full the oldest command is discarded: the latest
/// intent wins.
pub fn post(command: DoorCommand) {
    if let Err(TrySendError::Full(command)) = MAILBOX.try_send(command) {
        if let Ok(dropped) = MAILBOX.try_receive() {
            warn!("Command mailbox full, dropped {:?}", dropped);
        }
        if MAILBOX.try_send(command).is_err() {
            warn!("Command mailbox full, dropped {:?}", command);
        }
    }
}

/// Next queued command, if any.  Control loop only.
pub fn take() -> Option<DoorCommand> {
    MAILBOX.try_receive().ok()
}

//! Application core: door logic with zero direct I/O.
//!
//! The [`service::DoorService`] drives the state machine, the timer
//! scheduler and the relay pulse.  All interaction with hardware happens
//! through **port traits** defined in [`ports`], keeping this layer fully
//! testable without real peripherals.

pub mod commands;
pub mod events;
pub mod ports;
pub mod relay;
pub mod service;

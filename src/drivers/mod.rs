//! Peripheral drivers.

pub mod isr;
pub mod relay;

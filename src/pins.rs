//! Default GPIO assignments for the garage door controller board.
//!
//! Every field of [`DoorConfig`](crate::config::DoorConfig) can override
//! these; they are only the factory wiring.

// ---------------------------------------------------------------------------
// Door-button relay
// ---------------------------------------------------------------------------

/// Digital output driving the relay wired across the wall-button terminals.
pub const RELAY_GPIO: i32 = 4;

// ---------------------------------------------------------------------------
// Position sensors (reed switches, external pull-up)
// ---------------------------------------------------------------------------

/// Reed switch at the fully-closed end of travel.
pub const CLOSED_SENSOR_GPIO: i32 = 5;
/// Reed switch at the fully-open end of travel.
pub const OPEN_SENSOR_GPIO: i32 = 6;

/// Highest usable GPIO number on the ESP32-S3.
pub const MAX_GPIO: i32 = 48;

//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements            | Connects to                  |
//! |------------|-----------------------|------------------------------|
//! | `hardware` | SensorPort, RelayPort | embedded-hal GPIO pins       |
//! | `log_sink` | EventSink             | Serial log output            |
//! | `nvs`      | ConfigPort            | NVS / in-memory store        |
//! | `time`     |                       | ESP32 high-resolution timer  |

pub mod hardware;
pub mod log_sink;
pub mod nvs;
pub mod time;

//! Hardware Abstraction Layer for RustIrRepeater.
//!
//! Thin wrappers around ESP-IDF peripherals.
//! Business logic stays in core modules, HAL is just I/O.

pub mod espnow;
pub mod led;
pub mod rmt;

pub use espnow::EspNowTransport;
pub use led::StatusLed;
pub use rmt::{RmtCapture, RmtEmitter};

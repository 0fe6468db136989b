//! # RustIrRepeater
//!
//! Two-node infrared repeater over ESP-NOW.
//!
//! ## Architecture
//!
//! The Receiver decodes IR remote signals and forwards each one as a single
//! fixed-size datagram. The Transmitter takes the newest datagram from a
//! lock-free [`Mailbox`] and replays it. Both nodes exchange heartbeats and
//! show link liveness on an LED.
//!
//! - Radio callbacks only touch [`LinkContext`]: atomics and the mailbox
//! - All decoding, transmitting and logging happens on the main loop
//! - Hardware sits behind the [`Transport`], [`IrDecoder`] and
//!   [`IrEncoder`] traits; the firmware adapters live in `hal`

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod config;
pub mod protocol;
pub mod signal;
pub mod message;
pub mod mailbox;
pub mod health;
pub mod heartbeat;
pub mod transport;
pub mod context;
pub mod ir;
pub mod capture;
pub mod replay;
pub mod sanity;
pub mod logging;
pub mod log_globals;
pub mod serial_log;

#[cfg(target_os = "espidf")]
pub mod hal;

pub use capture::CaptureForwarder;
pub use context::LinkContext;
pub use health::{LinkFault, LinkHealth};
pub use heartbeat::{HeartbeatMonitor, Indicator};
pub use ir::{IrDecoder, IrEncoder};
pub use mailbox::Mailbox;
pub use message::{WireError, WireMessage};
pub use protocol::Protocol;
pub use replay::Replayer;
pub use signal::{DecodedSignal, Payload, RawCapture};
pub use transport::{PeerAddress, Transport, TransportError};

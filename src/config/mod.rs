//! Module: config
//!
//! Purpose: Compile-time configuration for both repeater nodes.
//!
//! Architecture:
//! - One const per node and concern: capture, replay, link
//! - Nothing is persisted and nothing changes at runtime
//! - Pin choices follow the board feature (`esp32c3`)
//!
//! Safety: Safe. Plain consts.

use crate::transport::PeerAddress;

/// IR decoder default matching tolerance (percent).
pub const DEFAULT_TOLERANCE_PERCENT: u8 = 25;

/// Serial diagnostics baud rate.
pub const BAUD_RATE: u32 = 115_200;

/// Heartbeat cadence shared by both nodes.
pub const HEARTBEAT_INTERVAL_MS: u32 = 1000;

/// IR capture parameters (Receiver node).
#[derive(Debug, Clone, Copy)]
pub struct CaptureConfig {
    /// GPIO of the IR demodulator output.
    pub recv_pin: i32,
    /// Capture buffer entries. 1024 is roughly 511 bits.
    pub buffer_size: u16,
    /// Milliseconds of silence that end a capture.
    ///
    /// Longer captures multi-packet A/C frames, shorter avoids gluing
    /// repeats of held buttons together.
    pub timeout_ms: u8,
    /// Matching leeway in percent. Above 50 some protocols stop matching.
    pub tolerance_percent: u8,
    /// Smallest UNKNOWN capture (in pulses) reported as a signal.
    pub min_unknown_size: u16,
}

/// IR replay parameters (Transmitter node).
#[derive(Debug, Clone, Copy)]
pub struct ReplayConfig {
    /// GPIO driving the IR LED circuit.
    pub led_pin: i32,
    /// Capture buffer size used by the sending peer, for diagnostics.
    pub buffer_size: u16,
    /// Inactivity timeout of the sending peer, for diagnostics.
    pub timeout_ms: u8,
    /// Modulation frequency for raw (UNKNOWN) replays.
    pub carrier_hz: u32,
    /// Tolerance the peer decoded with; printed when non-default.
    pub tolerance_percent: u8,
}

/// Wireless link parameters.
#[derive(Debug, Clone, Copy)]
pub struct LinkConfig {
    /// Fixed peer, never discovered.
    pub peer: PeerAddress,
    pub heartbeat_interval_ms: u32,
    /// Consecutive failed heartbeats tolerated before the indicator drops.
    pub fail_threshold: u8,
    /// GPIO of the liveness LED.
    pub status_led_pin: i32,
}

#[cfg(feature = "esp32c3")]
const RECV_PIN: i32 = 10; // 14 on a ESP32-C3 causes a boot loop
#[cfg(not(feature = "esp32c3"))]
const RECV_PIN: i32 = 14;

/// Receiver: capture side.
pub const RECEIVER_CAPTURE: CaptureConfig = CaptureConfig {
    recv_pin: RECV_PIN,
    buffer_size: 1024,
    timeout_ms: 15,
    tolerance_percent: DEFAULT_TOLERANCE_PERCENT,
    min_unknown_size: 12,
};

/// Receiver: link to the Transmitter.
pub const RECEIVER_LINK: LinkConfig = LinkConfig {
    peer: PeerAddress([0x18, 0xFE, 0x34, 0xD9, 0x41, 0x7C]),
    heartbeat_interval_ms: HEARTBEAT_INTERVAL_MS,
    fail_threshold: 10,
    status_led_pin: 0,
};

/// Transmitter: replay side.
pub const TRANSMITTER_REPLAY: ReplayConfig = ReplayConfig {
    led_pin: 14,
    buffer_size: 1024,
    timeout_ms: 50,
    carrier_hz: 38_000,
    tolerance_percent: DEFAULT_TOLERANCE_PERCENT,
};

/// Transmitter: link to the Receiver.
pub const TRANSMITTER_LINK: LinkConfig = LinkConfig {
    peer: PeerAddress([0x50, 0x02, 0x91, 0xEC, 0x18, 0xC5]),
    heartbeat_interval_ms: HEARTBEAT_INTERVAL_MS,
    fail_threshold: 5,
    status_led_pin: 0,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_receiver_tolerates_more_failures() {
        assert!(RECEIVER_LINK.fail_threshold > TRANSMITTER_LINK.fail_threshold);
        assert_eq!(RECEIVER_LINK.heartbeat_interval_ms, TRANSMITTER_LINK.heartbeat_interval_ms);
    }

    #[test]
    fn test_nodes_point_at_each_other() {
        assert_ne!(RECEIVER_LINK.peer, TRANSMITTER_LINK.peer);
    }
}

//! Startup self-check of the wire format.
//!
//! Both nodes run it once before touching the radio. It catches a build
//! whose record layout would not interoperate with the peer.

use core::fmt;

use crate::message::{
    WireMessage, ESPNOW_MAX_PAYLOAD, HEARTBEAT_FRAME_LEN, HEARTBEAT_STATUS, IR_FRAME_LEN,
};
use crate::protocol::Protocol;
use crate::signal::{DecodedSignal, RawCapture};

/// Self-check failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SanityError {
    /// S01: Multi-byte fields are not little-endian on the wire
    ByteOrder,
    /// S02: A record does not fit one ESP-NOW datagram
    FrameTooLarge,
    /// S03: A sample record did not decode back to itself
    RoundTrip,
}

impl SanityError {
    /// Get error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::ByteOrder => "S01",
            Self::FrameTooLarge => "S02",
            Self::RoundTrip => "S03",
        }
    }

    /// Get error message
    pub fn message(&self) -> &'static str {
        match self {
            Self::ByteOrder => "wire integers not little-endian",
            Self::FrameTooLarge => "record exceeds ESP-NOW payload",
            Self::RoundTrip => "sample record did not round-trip",
        }
    }
}

impl fmt::Display for SanityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code(), self.message())
    }
}

/// Run all checks.
pub fn check() -> Result<(), SanityError> {
    if IR_FRAME_LEN > ESPNOW_MAX_PAYLOAD || HEARTBEAT_FRAME_LEN > ESPNOW_MAX_PAYLOAD {
        return Err(SanityError::FrameTooLarge);
    }

    let mut frame = [0u8; IR_FRAME_LEN];
    let sample = WireMessage::IrSignal(DecodedSignal::scalar(
        Protocol(0x0102),
        0x0807_0605_0403_0201,
        0x0304,
    ));
    sample.encode(&mut frame);
    if frame[1..5] != [0x02, 0x01, 0x04, 0x03] || frame[7..15] != [1, 2, 3, 4, 5, 6, 7, 8] {
        return Err(SanityError::ByteOrder);
    }
    if WireMessage::decode(&frame) != Ok(sample) {
        return Err(SanityError::RoundTrip);
    }

    let (raw, _) = RawCapture::from_ticks(&[4500, 2250, 280, u16::MAX]);
    let sample = WireMessage::IrSignal(DecodedSignal::raw(raw, true));
    sample.encode(&mut frame);
    if WireMessage::decode(&frame) != Ok(sample) {
        return Err(SanityError::RoundTrip);
    }

    let heartbeat = WireMessage::heartbeat_frame(HEARTBEAT_STATUS);
    if WireMessage::decode(&heartbeat) != Ok(WireMessage::heartbeat()) {
        return Err(SanityError::RoundTrip);
    }

    Ok(())
}

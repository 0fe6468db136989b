//! Module: message
//!
//! Purpose: Wire records exchanged between the two nodes.
//!
//! Architecture:
//! - One fixed-size record per message type, no framing, no versioning
//! - Little-endian integers, explicit offsets (no `repr(C)` transmute)
//! - Both records fit a single ESP-NOW datagram
//!
//! ```text
//! Heartbeat: [tag=0xFF][status]
//! IrSignal:  [tag=0x00][protocol:2][bits:2][kind][flags][value:8][len:2][payload:232]
//! ```
//!
//! Safety: Safe. No unsafe blocks.

use core::fmt;

use crate::protocol::Protocol;
use crate::signal::{
    DecodedSignal, Payload, PayloadKind, RawCapture, StateBytes, RAW_CAPACITY, STATE_SIZE_MAX,
};

/// ESP-NOW maximum datagram payload.
pub const ESPNOW_MAX_PAYLOAD: usize = 250;

/// Size of an encoded heartbeat.
pub const HEARTBEAT_FRAME_LEN: usize = 2;

/// Size of an encoded IR signal record.
pub const IR_FRAME_LEN: usize = PAYLOAD_OFFSET + PAYLOAD_AREA;

/// Liveness marker carried by every heartbeat.
pub const HEARTBEAT_STATUS: u8 = 0xAA;

const PROTOCOL_OFFSET: usize = 1;
const BITS_OFFSET: usize = 3;
const KIND_OFFSET: usize = 5;
const FLAGS_OFFSET: usize = 6;
const VALUE_OFFSET: usize = 7;
const LEN_OFFSET: usize = 15;
const PAYLOAD_OFFSET: usize = 17;
const PAYLOAD_AREA: usize = RAW_CAPACITY * 2;

const FLAG_OVERFLOW: u8 = 0x01;

/// Fixed buffer holding one IR record.
pub type IrFrame = [u8; IR_FRAME_LEN];

/// Message type tag (first byte of every record).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum MsgType {
    /// Decoded IR signal.
    Ir = 0x00,
    /// Reserved for an acknowledgement scheme. Never sent.
    IrAck = 0x01,
    /// Periodic liveness beacon.
    Heartbeat = 0xFF,
}

impl MsgType {
    /// Convert from raw u8 value.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x00 => Some(MsgType::Ir),
            0x01 => Some(MsgType::IrAck),
            0xFF => Some(MsgType::Heartbeat),
            _ => None,
        }
    }

    /// Encoded record size for this type, if it has one.
    pub fn frame_len(self) -> Option<usize> {
        match self {
            MsgType::Ir => Some(IR_FRAME_LEN),
            MsgType::Heartbeat => Some(HEARTBEAT_FRAME_LEN),
            MsgType::IrAck => None,
        }
    }
}

/// Message carried over the wireless link.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WireMessage {
    Heartbeat { status: u8 },
    IrSignal(DecodedSignal),
}

/// Wire decoding error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireError {
    /// W01: Zero-length datagram
    Empty,
    /// W02: First byte is not a known tag
    UnknownTag(u8),
    /// W03: Tag is reserved and never sent
    Reserved,
    /// W04: Datagram size does not match the tag's record size
    BadLength { tag: u8, len: usize },
    /// W05: Payload kind byte out of range
    BadPayloadKind(u8),
    /// W06: Payload length exceeds the field
    PayloadTooLong(u16),
}

impl WireError {
    /// Get error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::Empty => "W01",
            Self::UnknownTag(_) => "W02",
            Self::Reserved => "W03",
            Self::BadLength { .. } => "W04",
            Self::BadPayloadKind(_) => "W05",
            Self::PayloadTooLong(_) => "W06",
        }
    }

    /// Get error message
    pub fn message(&self) -> &'static str {
        match self {
            Self::Empty => "empty datagram",
            Self::UnknownTag(_) => "unknown message type",
            Self::Reserved => "reserved message type",
            Self::BadLength { .. } => "wrong record size",
            Self::BadPayloadKind(_) => "invalid payload kind",
            Self::PayloadTooLong(_) => "payload length out of range",
        }
    }
}

impl fmt::Display for WireError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code(), self.message())?;
        match *self {
            Self::UnknownTag(tag) => write!(f, " (0x{:02X})", tag),
            Self::BadLength { tag, len } => write!(f, " (tag 0x{:02X}, {} bytes)", tag, len),
            Self::BadPayloadKind(kind) => write!(f, " ({})", kind),
            Self::PayloadTooLong(len) => write!(f, " ({})", len),
            _ => Ok(()),
        }
    }
}

impl WireMessage {
    /// Heartbeat with the standard liveness marker.
    pub const fn heartbeat() -> Self {
        WireMessage::Heartbeat { status: HEARTBEAT_STATUS }
    }

    /// Encoded heartbeat record.
    pub const fn heartbeat_frame(status: u8) -> [u8; HEARTBEAT_FRAME_LEN] {
        [MsgType::Heartbeat as u8, status]
    }

    /// Message type tag.
    pub fn msg_type(&self) -> MsgType {
        match self {
            WireMessage::Heartbeat { .. } => MsgType::Heartbeat,
            WireMessage::IrSignal(_) => MsgType::Ir,
        }
    }

    /// Encode in place into a long-lived buffer.
    ///
    /// Returns the number of bytes to send. The buffer is reused for every
    /// send, heartbeats only touch the first two bytes.
    pub fn encode(&self, buf: &mut IrFrame) -> usize {
        match self {
            WireMessage::Heartbeat { status } => {
                buf[0] = MsgType::Heartbeat as u8;
                buf[1] = *status;
                HEARTBEAT_FRAME_LEN
            }
            WireMessage::IrSignal(signal) => {
                encode_signal(signal, buf);
                IR_FRAME_LEN
            }
        }
    }

    /// Decode one datagram.
    pub fn decode(data: &[u8]) -> Result<Self, WireError> {
        let tag = *data.first().ok_or(WireError::Empty)?;
        let msg_type = MsgType::from_u8(tag).ok_or(WireError::UnknownTag(tag))?;
        let expected = msg_type.frame_len().ok_or(WireError::Reserved)?;
        if data.len() != expected {
            return Err(WireError::BadLength { tag, len: data.len() });
        }

        match msg_type {
            MsgType::Heartbeat => Ok(WireMessage::Heartbeat { status: data[1] }),
            MsgType::Ir => decode_signal(data).map(WireMessage::IrSignal),
            MsgType::IrAck => Err(WireError::Reserved),
        }
    }
}

fn encode_signal(signal: &DecodedSignal, buf: &mut IrFrame) {
    buf.fill(0);
    buf[0] = MsgType::Ir as u8;
    buf[PROTOCOL_OFFSET..BITS_OFFSET].copy_from_slice(&signal.protocol.0.to_le_bytes());
    buf[BITS_OFFSET..KIND_OFFSET].copy_from_slice(&signal.bits.to_le_bytes());
    buf[KIND_OFFSET] = signal.payload.kind() as u8;

    let len = match &signal.payload {
        Payload::Scalar { value } => {
            buf[VALUE_OFFSET..LEN_OFFSET].copy_from_slice(&value.to_le_bytes());
            0
        }
        Payload::State(bytes) => {
            buf[PAYLOAD_OFFSET..PAYLOAD_OFFSET + bytes.len()].copy_from_slice(bytes);
            bytes.len()
        }
        Payload::Raw(raw) => {
            let area = buf[PAYLOAD_OFFSET..].chunks_exact_mut(2);
            for (chunk, tick) in area.zip(raw.ticks()) {
                chunk.copy_from_slice(&tick.to_le_bytes());
            }
            raw.len()
        }
    };

    buf[LEN_OFFSET..PAYLOAD_OFFSET].copy_from_slice(&(len as u16).to_le_bytes());
    if signal.overflow {
        buf[FLAGS_OFFSET] |= FLAG_OVERFLOW;
    }
}

fn decode_signal(data: &[u8]) -> Result<DecodedSignal, WireError> {
    let protocol = Protocol(i16::from_le_bytes([data[PROTOCOL_OFFSET], data[PROTOCOL_OFFSET + 1]]));
    let bits = u16::from_le_bytes([data[BITS_OFFSET], data[BITS_OFFSET + 1]]);
    let kind_byte = data[KIND_OFFSET];
    let kind = PayloadKind::from_u8(kind_byte).ok_or(WireError::BadPayloadKind(kind_byte))?;
    let overflow = data[FLAGS_OFFSET] & FLAG_OVERFLOW != 0;
    let len = u16::from_le_bytes([data[LEN_OFFSET], data[LEN_OFFSET + 1]]);
    let payload = &data[PAYLOAD_OFFSET..];

    let payload = match kind {
        PayloadKind::Scalar => {
            let mut value = [0u8; 8];
            value.copy_from_slice(&data[VALUE_OFFSET..LEN_OFFSET]);
            Payload::Scalar { value: u64::from_le_bytes(value) }
        }
        PayloadKind::State => {
            if len as usize > STATE_SIZE_MAX {
                return Err(WireError::PayloadTooLong(len));
            }
            let bytes = StateBytes::from_slice(&payload[..len as usize])
                .map_err(|_| WireError::PayloadTooLong(len))?;
            Payload::State(bytes)
        }
        PayloadKind::Raw => {
            if len as usize > RAW_CAPACITY {
                return Err(WireError::PayloadTooLong(len));
            }
            let mut raw = RawCapture::new();
            for chunk in payload.chunks_exact(2).take(len as usize) {
                raw.push(u16::from_le_bytes([chunk[0], chunk[1]]));
            }
            Payload::Raw(raw)
        }
    };

    Ok(DecodedSignal { protocol, bits, overflow, payload })
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn test_frames_fit_espnow() {
        assert_eq!(IR_FRAME_LEN, 249);
        assert!(IR_FRAME_LEN <= ESPNOW_MAX_PAYLOAD);
        assert!(STATE_SIZE_MAX <= PAYLOAD_AREA);
    }

    #[test]
    fn test_layout_offsets() {
        let signal = DecodedSignal::scalar(Protocol::NEC, 0x1234ABCD, 32);
        let mut buf = [0u8; IR_FRAME_LEN];
        WireMessage::IrSignal(signal).encode(&mut buf);

        assert_eq!(buf[0], 0x00);
        assert_eq!(&buf[1..3], &[3, 0]);
        assert_eq!(&buf[3..5], &[32, 0]);
        assert_eq!(buf[5], PayloadKind::Scalar as u8);
        assert_eq!(&buf[7..15], &[0xCD, 0xAB, 0x34, 0x12, 0, 0, 0, 0]);
    }

    #[test]
    fn test_heartbeat_encoding() {
        let mut buf = [0u8; IR_FRAME_LEN];
        let len = WireMessage::heartbeat().encode(&mut buf);
        assert_eq!(&buf[..len], &[0xFF, 0xAA]);
        assert_eq!(WireMessage::heartbeat_frame(HEARTBEAT_STATUS), [0xFF, 0xAA]);
    }

    #[test]
    fn test_ack_tag_is_reserved() {
        assert_eq!(WireMessage::decode(&[0x01]), Err(WireError::Reserved));
    }

    #[test]
    fn test_error_display() {
        let e = WireError::BadLength { tag: 0xFF, len: 3 };
        assert!(e.to_string().starts_with("W04: wrong record size"));
    }
}

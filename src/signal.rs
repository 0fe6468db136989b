//! Module: signal
//!
//! Purpose: Decoded IR signal, the unit that travels from capture to replay.
//!
//! Architecture:
//! - `Payload` is decided once, by the decoder: scalar, state bytes or raw
//! - Fixed capacities (heapless), so a signal is never heap allocated
//! - Raw timings stay in decoder ticks until the replay side expands them
//!
//! Safety: Safe. No unsafe blocks.

use alloc::vec::Vec;
use core::fmt;

use crate::protocol::Protocol;

/// Largest A/C state the decoder library produces, in bytes.
pub const STATE_SIZE_MAX: usize = 53;

/// Raw intervals a wire frame can carry (232-byte payload area / 2).
pub const RAW_CAPACITY: usize = 116;

/// Microseconds per raw capture tick.
pub const RAW_TICK_US: u32 = 2;

/// Stateful protocol payload.
pub type StateBytes = heapless::Vec<u8, STATE_SIZE_MAX>;

/// Captured mark/space intervals of an unrecognised signal.
///
/// Ticks exclude the leading gap before the first mark. Index 0 is a mark,
/// then spaces and marks alternate.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawCapture {
    ticks: heapless::Vec<u16, RAW_CAPACITY>,
}

impl RawCapture {
    /// Create an empty capture.
    pub const fn new() -> Self {
        Self { ticks: heapless::Vec::new() }
    }

    /// Build from a tick slice.
    ///
    /// Returns the capture and whether ticks beyond `RAW_CAPACITY` were cut.
    pub fn from_ticks(ticks: &[u16]) -> (Self, bool) {
        let keep = ticks.len().min(RAW_CAPACITY);
        let mut raw = Self::new();
        // Cannot fail: keep <= capacity
        let _ = raw.ticks.extend_from_slice(&ticks[..keep]);
        (raw, keep < ticks.len())
    }

    /// Append one interval. Returns `false` when full.
    #[inline]
    pub fn push(&mut self, tick: u16) -> bool {
        self.ticks.push(tick).is_ok()
    }

    #[inline]
    pub fn ticks(&self) -> &[u16] {
        &self.ticks
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.ticks.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ticks.is_empty()
    }

    /// Length of the microsecond array `to_raw_array` produces.
    ///
    /// Intervals longer than `u16::MAX` µs are split into `65535, 0` pairs
    /// so marks and spaces keep alternating.
    pub fn corrected_len(&self) -> usize {
        self.ticks
            .iter()
            .map(|&t| {
                let usecs = t as u32 * RAW_TICK_US;
                1 + 2 * (usecs.saturating_sub(1) / u16::MAX as u32) as usize
            })
            .sum()
    }

    /// Expand ticks into the microsecond array the IR sender replays.
    ///
    /// The only heap allocation in the pipeline; the caller drops the array
    /// as soon as the replay returns.
    pub fn to_raw_array(&self) -> Vec<u16> {
        let mut out = Vec::with_capacity(self.corrected_len());
        for &tick in self.ticks.iter() {
            let mut usecs = tick as u32 * RAW_TICK_US;
            while usecs > u16::MAX as u32 {
                out.push(u16::MAX);
                out.push(0);
                usecs -= u16::MAX as u32;
            }
            out.push(usecs as u16);
        }
        out
    }
}

/// Protocol-specific content of a decoded signal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Payload {
    /// Simple protocols, `bits <= 64`.
    Scalar { value: u64 },
    /// Stateful (A/C) protocols, `bits / 8` meaningful bytes.
    State(StateBytes),
    /// No protocol matched; replayed from timings.
    Raw(RawCapture),
}

impl Payload {
    /// Payload kind tag used on the wire.
    #[inline]
    pub fn kind(&self) -> PayloadKind {
        match self {
            Payload::Scalar { .. } => PayloadKind::Scalar,
            Payload::State(_) => PayloadKind::State,
            Payload::Raw(_) => PayloadKind::Raw,
        }
    }
}

/// Discriminant of [`Payload`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum PayloadKind {
    Scalar = 0,
    State = 1,
    Raw = 2,
}

impl PayloadKind {
    /// Convert from raw u8 value.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(PayloadKind::Scalar),
            1 => Some(PayloadKind::State),
            2 => Some(PayloadKind::Raw),
            _ => None,
        }
    }
}

/// One completed IR capture.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedSignal {
    pub protocol: Protocol,
    /// Significant bits. For raw captures, the decoder's pulse count.
    pub bits: u16,
    /// The capture filled its buffer; the signal may be truncated.
    pub overflow: bool,
    pub payload: Payload,
}

impl DecodedSignal {
    /// Scalar signal (`bits <= 64`).
    pub fn scalar(protocol: Protocol, value: u64, bits: u16) -> Self {
        Self {
            protocol,
            bits,
            overflow: false,
            payload: Payload::Scalar { value },
        }
    }

    /// Stateful signal.
    ///
    /// Returns `None` unless `protocol` carries state, or if `state`
    /// exceeds `STATE_SIZE_MAX`.
    pub fn stateful(protocol: Protocol, state: &[u8], bits: u16) -> Option<Self> {
        if !protocol.has_state() {
            return None;
        }
        let bytes = StateBytes::from_slice(state).ok()?;
        Some(Self {
            protocol,
            bits,
            overflow: false,
            payload: Payload::State(bytes),
        })
    }

    /// Unrecognised signal kept as timings.
    pub fn raw(raw: RawCapture, overflow: bool) -> Self {
        Self {
            protocol: Protocol::UNKNOWN,
            bits: raw.len() as u16,
            overflow,
            payload: Payload::Raw(raw),
        }
    }

    /// Raw signal from a capture backend's tick stream.
    ///
    /// Ticks are taken up to the first zero (end of capture). Captures
    /// shorter than `min_pulses` are noise and yield `None`. `overflow` is
    /// set when the backend reported it or ticks did not fit the capture.
    pub fn from_capture<I>(ticks: I, backend_overflow: bool, min_pulses: u16) -> Option<Self>
    where
        I: IntoIterator<Item = u16>,
    {
        let mut raw = RawCapture::new();
        let mut overflow = backend_overflow;
        for tick in ticks.into_iter().take_while(|&t| t != 0) {
            if !raw.push(tick) {
                overflow = true;
                break;
            }
        }

        if raw.len() < min_pulses as usize {
            return None;
        }
        Some(Self::raw(raw, overflow))
    }

    /// Builder-style overflow flag.
    pub fn with_overflow(mut self, overflow: bool) -> Self {
        self.overflow = overflow;
        self
    }

    /// State bytes the sender should transmit (`bits / 8`, bounded by the
    /// bytes actually present). Empty for non-stateful payloads.
    pub fn state_bytes(&self) -> &[u8] {
        match &self.payload {
            Payload::State(bytes) => {
                let len = (self.bits as usize / 8).min(bytes.len());
                &bytes[..len]
            }
            _ => &[],
        }
    }

    /// Human-readable decode summary, handed to `line` one line at a time.
    ///
    /// Every line fits one log entry; long states are split over several
    /// hex lines of `HEX_BYTES_PER_LINE` bytes.
    pub fn summary_lines(&self, mut line: impl FnMut(fmt::Arguments<'_>)) {
        line(format_args!("Protocol  : {}", self.protocol));
        match &self.payload {
            Payload::Scalar { value } => {
                line(format_args!("Code      : {:#X} ({} Bits)", value, self.bits))
            }
            Payload::State(_) => {
                let bytes = self.state_bytes();
                line(format_args!("Code      : {} bytes ({} Bits)", bytes.len(), self.bits));
                for chunk in bytes.chunks(HEX_BYTES_PER_LINE) {
                    line(format_args!("            {}", HexBytes(chunk)));
                }
            }
            Payload::Raw(raw) => line(format_args!("Code      : raw, {} intervals", raw.len())),
        }
    }
}

/// State bytes per summary hex line.
pub const HEX_BYTES_PER_LINE: usize = 32;

/// Upper-case hex, no separators.
pub struct HexBytes<'a>(pub &'a [u8]);

impl fmt::Display for HexBytes<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{:02X}", byte)?;
        }
        Ok(())
    }
}

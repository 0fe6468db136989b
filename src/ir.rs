//! IR hardware seams.
//!
//! Protocol tables live outside this crate. A capture backend implements
//! [`IrDecoder`], a transmit backend implements [`IrEncoder`]; the loops
//! only see these traits.

use crate::protocol::Protocol;
use crate::signal::DecodedSignal;

/// Interrupt-driven IR capture with protocol decoding.
pub trait IrDecoder {
    /// Non-blocking: return a completed capture if one is ready.
    ///
    /// A returned signal stops capturing until [`IrDecoder::resume`].
    fn poll(&mut self) -> Option<DecodedSignal>;

    /// Restart capturing after a successful `poll`.
    fn resume(&mut self);

    /// Timing match leeway in percent.
    fn set_tolerance(&mut self, percent: u8);

    /// Ignore UNKNOWN captures with fewer pulses than this.
    fn set_unknown_threshold(&mut self, pulses: u16);
}

/// IR transmission with protocol encoding.
pub trait IrEncoder {
    /// Send a scalar protocol frame. `false` if the protocol is unsupported.
    fn send_scalar(&mut self, protocol: Protocol, value: u64, bits: u16) -> bool;

    /// Send a stateful protocol frame from its state bytes.
    fn send_bytes(&mut self, protocol: Protocol, state: &[u8]) -> bool;

    /// Send raw mark/space durations (µs) on the given carrier.
    fn send_raw(&mut self, timings: &[u16], carrier_hz: u32);
}

/// Carrier high/low durations in source clock cycles.
///
/// `duty_percent` is the high share of one carrier period. Returns `None`
/// for a zero carrier or a period that does not fit the 16-bit registers.
pub fn carrier_cycles(source_hz: u32, carrier_hz: u32, duty_percent: u8) -> Option<(u16, u16)> {
    if carrier_hz == 0 || duty_percent > 100 {
        return None;
    }
    let period = source_hz / carrier_hz;
    let high = period * duty_percent as u32 / 100;
    let low = period - high;
    Some((u16::try_from(high).ok()?, u16::try_from(low).ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_carrier_cycles_38khz() {
        // 80 MHz / 38 kHz = 2105 cycles per period
        assert_eq!(carrier_cycles(80_000_000, 38_000, 33), Some((694, 1411)));
    }

    #[test]
    fn test_carrier_cycles_rejects_out_of_range() {
        assert_eq!(carrier_cycles(80_000_000, 0, 33), None);
        // 80 MHz / 1 kHz = 80000 cycles, too long for the register
        assert_eq!(carrier_cycles(80_000_000, 1_000, 50), None);
        assert_eq!(carrier_cycles(80_000_000, 38_000, 101), None);
    }
}

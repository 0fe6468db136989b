//! RMT-based IR capture and emission.
//!
//! # Hardware Setup
//!
//! ```text
//! IR demodulator OUT ──▶ RECV pin (RMT RX, 2µs ticks, active low)
//! TX pin ──▶ transistor ──▶ IR LED (RMT TX, 1µs ticks, 38kHz carrier)
//! ```
//!
//! Protocol decode/encode tables plug in behind `IrDecoder`/`IrEncoder`;
//! these adapters only move timings.

use alloc::vec;
use alloc::vec::Vec;

use esp_idf_svc::hal::gpio::{InputPin, OutputPin};
use esp_idf_svc::hal::peripheral::Peripheral;
use esp_idf_svc::hal::rmt::config::{CarrierConfig, DutyPercent, ReceiveConfig, TransmitConfig};
use esp_idf_svc::hal::rmt::{
    PinState, Pulse, PulseTicks, Receive, RmtChannel, RxRmtDriver, TxRmtDriver,
    VariableLengthSignal,
};
use esp_idf_svc::hal::units::Hertz;
use esp_idf_svc::sys::{esp, rmt_carrier_level_t_RMT_CARRIER_LEVEL_HIGH, rmt_set_tx_carrier, EspError};

use crate::config::{CaptureConfig, ReplayConfig};
use crate::context::LinkContext;
use crate::diag_error;
use crate::ir::{carrier_cycles, IrDecoder, IrEncoder};
use crate::protocol::Protocol;
use crate::signal::{DecodedSignal, RAW_TICK_US};

/// 80 MHz APB / 160 = 2µs per tick, the wire tick.
const RX_CLOCK_DIVIDER: u8 = 160;
/// 80 MHz APB / 80 = 1µs per tick, the replay array unit.
const TX_CLOCK_DIVIDER: u8 = 80;
/// Longest single RMT item duration.
const PULSE_TICKS_MAX: u32 = 32_767;
/// Carrier counters run on the undivided APB clock.
const APB_CLOCK_HZ: u32 = 80_000_000;
const CARRIER_DUTY_PERCENT: u8 = 33;

/// [`IrDecoder`] reporting every capture as a raw signal.
pub struct RmtCapture {
    rx: RxRmtDriver<'static>,
    items: Vec<(Pulse, Pulse)>,
    halted: bool,
    min_unknown_size: u16,
}

impl RmtCapture {
    pub fn new<C: RmtChannel>(
        channel: impl Peripheral<P = C> + 'static,
        pin: impl Peripheral<P = impl InputPin> + 'static,
        config: &CaptureConfig,
    ) -> Result<Self, EspError> {
        let idle_ticks = (config.timeout_ms as u32 * 1000 / RAW_TICK_US).min(u16::MAX as u32);
        let rx_config = ReceiveConfig::new()
            .clock_divider(RX_CLOCK_DIVIDER)
            .idle_threshold(idle_ticks as u16);

        let pairs = config.buffer_size as usize / 2;
        let mut rx = RxRmtDriver::new(channel, pin, &rx_config, pairs * 4)?;
        rx.start()?;

        Ok(Self {
            rx,
            items: vec![(Pulse::zero(), Pulse::zero()); pairs],
            halted: false,
            min_unknown_size: config.min_unknown_size,
        })
    }
}

impl IrDecoder for RmtCapture {
    fn poll(&mut self) -> Option<DecodedSignal> {
        if self.halted {
            return None;
        }

        // A full item buffer means the backend dropped the tail.
        // Overflow reports the size needed, which can exceed the buffer.
        let (count, overflow) = match self.rx.receive(&mut self.items, 0) {
            Ok(Receive::Read(n)) => (n, n >= self.items.len()),
            Ok(Receive::Overflow(n)) => (n.min(self.items.len()), true),
            Ok(Receive::Timeout) | Err(_) => return None,
        };
        if count == 0 {
            return None;
        }

        let ticks = self.items[..count]
            .iter()
            .flat_map(|(first, second)| [first.ticks.ticks(), second.ticks.ticks()]);
        let signal = DecodedSignal::from_capture(ticks, overflow, self.min_unknown_size)?;
        self.halted = true;
        Some(signal)
    }

    fn resume(&mut self) {
        self.halted = false;
    }

    // Raw capture does no timing matching.
    fn set_tolerance(&mut self, _percent: u8) {}

    fn set_unknown_threshold(&mut self, pulses: u16) {
        self.min_unknown_size = pulses;
    }
}

/// [`IrEncoder`] able to replay raw timings.
///
/// The carrier is set when the driver is built and reprogrammed when a
/// replay asks for a different one.
pub struct RmtEmitter {
    tx: TxRmtDriver<'static>,
    carrier_hz: u32,
    ctx: &'static LinkContext,
}

impl RmtEmitter {
    pub fn new<C: RmtChannel>(
        channel: impl Peripheral<P = C> + 'static,
        pin: impl Peripheral<P = impl OutputPin> + 'static,
        config: &ReplayConfig,
        ctx: &'static LinkContext,
    ) -> Result<Self, EspError> {
        let carrier = CarrierConfig::new()
            .frequency(Hertz(config.carrier_hz))
            .carrier_level(PinState::High)
            .duty_percent(DutyPercent::new(CARRIER_DUTY_PERCENT)?);
        let tx_config = TransmitConfig::new()
            .clock_divider(TX_CLOCK_DIVIDER)
            .carrier(Some(carrier));

        let tx = TxRmtDriver::new(channel, pin, &tx_config)?;
        Ok(Self {
            tx,
            carrier_hz: config.carrier_hz,
            ctx,
        })
    }

    /// Reprogram the carrier if `carrier_hz` differs from the current one.
    fn set_carrier(&mut self, carrier_hz: u32) -> Result<(), EspError> {
        if carrier_hz == self.carrier_hz {
            return Ok(());
        }
        let Some((high, low)) = carrier_cycles(APB_CLOCK_HZ, carrier_hz, CARRIER_DUTY_PERCENT)
        else {
            diag_error!(
                self.ctx.log,
                self.ctx.now_ms(),
                "Carrier {} Hz out of range, keeping {} Hz",
                carrier_hz,
                self.carrier_hz
            );
            return Ok(());
        };
        esp!(unsafe {
            rmt_set_tx_carrier(
                self.tx.channel(),
                true,
                high,
                low,
                rmt_carrier_level_t_RMT_CARRIER_LEVEL_HIGH,
            )
        })?;
        self.carrier_hz = carrier_hz;
        Ok(())
    }

    fn emit(&mut self, timings: &[u16]) -> Result<(), EspError> {
        let mut signal = VariableLengthSignal::new();
        let mut level = PinState::High;
        for &usecs in timings {
            let mut remaining = usecs as u32;
            while remaining > 0 {
                let chunk = remaining.min(PULSE_TICKS_MAX);
                let pulse = Pulse::new(level, PulseTicks::new(chunk as u16)?);
                signal.push([&pulse])?;
                remaining -= chunk;
            }
            level = match level {
                PinState::High => PinState::Low,
                PinState::Low => PinState::High,
            };
        }
        self.tx.start_blocking(&signal)
    }
}

impl IrEncoder for RmtEmitter {
    fn send_scalar(&mut self, _protocol: Protocol, _value: u64, _bits: u16) -> bool {
        false
    }

    fn send_bytes(&mut self, _protocol: Protocol, _state: &[u8]) -> bool {
        false
    }

    fn send_raw(&mut self, timings: &[u16], carrier_hz: u32) {
        let result = self.set_carrier(carrier_hz).and_then(|()| self.emit(timings));
        if let Err(e) = result {
            diag_error!(
                self.ctx.log,
                self.ctx.now_ms(),
                "Raw replay of {} intervals failed: {}",
                timings.len(),
                e
            );
        }
    }
}

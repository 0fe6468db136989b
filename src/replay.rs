//! Module: replay
//!
//! Purpose: Transmitter main loop. Take the newest forwarded signal from the
//! mailbox and re-emit it, keep the heartbeat going.
//!
//! Architecture:
//! - The receive callback only posts into the mailbox; all decoding and
//!   transmitting happens here, on the main loop
//! - One signal per tick, newest wins
//! - Failed replays are reported, never retried
//!
//! Safety: Safe.

use crate::config::{LinkConfig, ReplayConfig, DEFAULT_TOLERANCE_PERCENT};
use crate::context::LinkContext;
use crate::health::LinkFault;
use crate::heartbeat::{HeartbeatMonitor, Indicator};
use crate::ir::IrEncoder;
use crate::message::WireMessage;
use crate::protocol::Protocol;
use crate::signal::{DecodedSignal, Payload, PayloadKind, RAW_CAPACITY};
use crate::transport::{bring_up, Transport};
use crate::{diag_error, diag_info, diag_warn};

/// Result of replaying one signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplayOutcome {
    pub protocol: Protocol,
    pub bits: u16,
    /// Encoder path taken.
    pub kind: PayloadKind,
    pub overflow: bool,
    pub success: bool,
}

/// What happened during one loop iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Tick {
    /// Indicator after a heartbeat, if one was due.
    pub heartbeat: Option<Indicator>,
    pub replayed: Option<ReplayOutcome>,
}

/// Transmitter node: receive and replay.
pub struct Replayer<'c, E: IrEncoder, T: Transport> {
    encoder: E,
    transport: T,
    ctx: &'c LinkContext,
    replay: ReplayConfig,
    link: LinkConfig,
    monitor: HeartbeatMonitor,
    replayed: u32,
    failed: u32,
    malformed: u32,
}

impl<'c, E: IrEncoder, T: Transport> Replayer<'c, E, T> {
    pub fn new(
        encoder: E,
        transport: T,
        ctx: &'c LinkContext,
        replay: ReplayConfig,
        link: LinkConfig,
    ) -> Self {
        Self {
            encoder,
            transport,
            ctx,
            replay,
            link,
            monitor: HeartbeatMonitor::new(link.heartbeat_interval_ms, link.fail_threshold),
            replayed: 0,
            failed: 0,
            malformed: 0,
        }
    }

    /// Bring the link up. Failure is logged and returned, never fatal.
    pub fn setup(&mut self) -> Result<(), LinkFault> {
        let now = self.ctx.now_ms();
        let result = bring_up(&mut self.transport, self.ctx, &self.link.peer);
        match result {
            Ok(()) => diag_info!(self.ctx.log, now, "Peer {} registered", self.link.peer),
            Err(fault) => diag_error!(self.ctx.log, now, "Link bring-up failed: {}", fault),
        }
        result
    }

    /// One loop iteration.
    pub fn tick(&mut self, now_ms: u32) -> Tick {
        let heartbeat =
            self.monitor
                .service(now_ms, &mut self.transport, &self.link.peer, self.ctx);

        let Some(frame) = self.ctx.mailbox.take() else {
            return Tick {
                heartbeat,
                replayed: None,
            };
        };

        let signal = match WireMessage::decode(&frame) {
            Ok(WireMessage::IrSignal(signal)) => signal,
            Ok(other) => {
                self.malformed = self.malformed.wrapping_add(1);
                diag_warn!(
                    self.ctx.log,
                    now_ms,
                    "Ignoring {:?} record in IR mailbox",
                    other.msg_type()
                );
                return Tick {
                    heartbeat,
                    replayed: None,
                };
            }
            Err(e) => {
                self.malformed = self.malformed.wrapping_add(1);
                diag_error!(self.ctx.log, now_ms, "Dropped IR record: {}", e);
                return Tick {
                    heartbeat,
                    replayed: None,
                };
            }
        };

        let replayed = self.replay_signal(now_ms, &signal);
        Tick {
            heartbeat,
            replayed: Some(replayed),
        }
    }

    fn replay_signal(&mut self, now_ms: u32, signal: &DecodedSignal) -> ReplayOutcome {
        let log = self.ctx.log;

        if signal.overflow {
            diag_warn!(
                log,
                now_ms,
                "IR code too big for capture buffer (>= {}) or link frame (> {} intervals). Result untrusted.",
                self.replay.buffer_size,
                RAW_CAPACITY
            );
        }
        diag_info!(log, now_ms, "{}", env!("VERSION_STRING"));
        if self.replay.tolerance_percent != DEFAULT_TOLERANCE_PERCENT {
            diag_info!(
                log,
                now_ms,
                "WARNING: IR decode tolerance changed from {}% to {}%",
                DEFAULT_TOLERANCE_PERCENT,
                self.replay.tolerance_percent
            );
        }
        signal.summary_lines(|line| diag_info!(log, now_ms, "{}", line));

        let success = match &signal.payload {
            Payload::Raw(raw) => {
                let timings = raw.to_raw_array();
                self.encoder.send_raw(&timings, self.replay.carrier_hz);
                true
            }
            Payload::State(_) => self.encoder.send_bytes(signal.protocol, signal.state_bytes()),
            Payload::Scalar { value } => {
                self.encoder.send_scalar(signal.protocol, *value, signal.bits)
            }
        };

        self.replayed = self.replayed.wrapping_add(1);
        if success {
            diag_info!(
                log,
                now_ms,
                "A {}-bit {} message was successfully retransmitted.",
                signal.bits,
                signal.protocol
            );
        } else {
            self.failed = self.failed.wrapping_add(1);
            diag_warn!(
                log,
                now_ms,
                "A {}-bit {} message was unsuccessfully retransmitted.",
                signal.bits,
                signal.protocol
            );
        }

        ReplayOutcome {
            protocol: signal.protocol,
            bits: signal.bits,
            kind: signal.payload.kind(),
            overflow: signal.overflow,
            success,
        }
    }

    /// Current liveness indicator.
    #[inline]
    pub fn indicator(&self) -> Indicator {
        self.monitor.indicator()
    }

    /// Signals replayed since boot, successful or not.
    #[inline]
    pub fn replayed(&self) -> u32 {
        self.replayed
    }

    /// Replays the encoder reported as failed.
    #[inline]
    pub fn failed(&self) -> u32 {
        self.failed
    }

    /// Mailbox records that did not decode to an IR signal.
    #[inline]
    pub fn malformed(&self) -> u32 {
        self.malformed
    }

    pub fn encoder(&self) -> &E {
        &self.encoder
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}

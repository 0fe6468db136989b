//! Module: capture
//!
//! Purpose: Receiver main loop. Decode IR, forward it to the peer, keep the
//! heartbeat going.
//!
//! Architecture:
//! - `tick()` is called once per loop iteration and never blocks
//! - The decoder stays halted from a successful `poll()` until the frame
//!   has been handed to the transport
//! - Send failures are link-health events, never IR events
//!
//! Safety: Safe.

use crate::config::{CaptureConfig, LinkConfig};
use crate::context::LinkContext;
use crate::health::LinkFault;
use crate::heartbeat::{HeartbeatMonitor, Indicator};
use crate::ir::IrDecoder;
use crate::message::{IrFrame, WireMessage, IR_FRAME_LEN};
use crate::protocol::Protocol;
use crate::signal::RAW_CAPACITY;
use crate::transport::{bring_up, Transport};
use crate::{diag_error, diag_info, diag_warn};

/// A signal handed to the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Forwarded {
    pub protocol: Protocol,
    pub bits: u16,
    pub overflow: bool,
    /// The transport accepted the datagram. Delivery is reported later.
    pub queued: bool,
}

/// What happened during one loop iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Tick {
    /// Indicator after a heartbeat, if one was due.
    pub heartbeat: Option<Indicator>,
    pub forwarded: Option<Forwarded>,
}

/// Receiver node: capture and forward.
pub struct CaptureForwarder<'c, D: IrDecoder, T: Transport> {
    decoder: D,
    transport: T,
    ctx: &'c LinkContext,
    capture: CaptureConfig,
    link: LinkConfig,
    monitor: HeartbeatMonitor,
    /// Outgoing record, reused for every signal
    frame: IrFrame,
    forwarded: u32,
    overflows: u32,
}

impl<'c, D: IrDecoder, T: Transport> CaptureForwarder<'c, D, T> {
    pub fn new(
        decoder: D,
        transport: T,
        ctx: &'c LinkContext,
        capture: CaptureConfig,
        link: LinkConfig,
    ) -> Self {
        Self {
            decoder,
            transport,
            ctx,
            capture,
            link,
            monitor: HeartbeatMonitor::new(link.heartbeat_interval_ms, link.fail_threshold),
            frame: [0; IR_FRAME_LEN],
            forwarded: 0,
            overflows: 0,
        }
    }

    /// Configure the decoder and bring the link up.
    ///
    /// A link failure is logged and returned; the caller keeps running so
    /// IR capture still works locally.
    pub fn setup(&mut self) -> Result<(), LinkFault> {
        self.decoder.set_unknown_threshold(self.capture.min_unknown_size);
        self.decoder.set_tolerance(self.capture.tolerance_percent);

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

        let Some(signal) = self.decoder.poll() else {
            return Tick {
                heartbeat,
                forwarded: None,
            };
        };

        let len = WireMessage::IrSignal(signal.clone()).encode(&mut self.frame);
        let queued = self.transport.send(&self.link.peer, &self.frame[..len]).is_ok();
        if !queued {
            self.ctx.health.set_fault(LinkFault::EnqueueFailed);
        }
        self.decoder.resume();

        self.forwarded = self.forwarded.wrapping_add(1);
        if signal.overflow {
            self.overflows = self.overflows.wrapping_add(1);
            diag_warn!(
                self.ctx.log,
                now_ms,
                "IR code too big for capture buffer (>= {}) or link frame (> {} intervals). Result untrusted.",
                self.capture.buffer_size,
                RAW_CAPACITY
            );
        }
        diag_info!(
            self.ctx.log,
            now_ms,
            "A {}-bit {} message was forwarded.",
            signal.bits,
            signal.protocol
        );

        Tick {
            heartbeat,
            forwarded: Some(Forwarded {
                protocol: signal.protocol,
                bits: signal.bits,
                overflow: signal.overflow,
                queued,
            }),
        }
    }

    /// Current liveness indicator.
    #[inline]
    pub fn indicator(&self) -> Indicator {
        self.monitor.indicator()
    }

    /// Signals handed to the transport since boot.
    #[inline]
    pub fn forwarded(&self) -> u32 {
        self.forwarded
    }

    /// Forwarded signals whose capture overflowed.
    #[inline]
    pub fn overflows(&self) -> u32 {
        self.overflows
    }

    pub fn decoder(&self) -> &D {
        &self.decoder
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}

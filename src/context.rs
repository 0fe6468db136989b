//! Module: context
//!
//! Purpose: Everything the transport callbacks share with the main loop.
//!
//! Architecture:
//! - One `LinkContext` per node, usually a `static`
//! - Callbacks get `&'static LinkContext`, never file-scope flags
//! - Receive path: tag check + fixed-size copy into the mailbox, nothing else
//! - Send-completion path: one flag flip in `LinkHealth`
//!
//! Safety: Safe. All shared state is atomic or in `Mailbox`.

use core::sync::atomic::{AtomicU32, Ordering};

use crate::health::LinkHealth;
use crate::logging::LogStream;
use crate::mailbox::Mailbox;
use crate::message::{IrFrame, MsgType, HEARTBEAT_FRAME_LEN, IR_FRAME_LEN};
use crate::transport::PeerAddress;
use crate::{diag_debug, diag_warn};

/// Millisecond clock, free-running and allowed to wrap.
pub type Clock = fn() -> u32;

/// Shared state between the transport callbacks and the main loop.
pub struct LinkContext {
    pub health: LinkHealth,
    pub mailbox: Mailbox,
    pub log: &'static LogStream,
    clock: Clock,
    heartbeats: AtomicU32,
    rejected: AtomicU32,
}

impl LinkContext {
    /// Create a context logging to `log` with timestamps from `clock`.
    pub const fn new(log: &'static LogStream, clock: Clock) -> Self {
        Self {
            health: LinkHealth::new(),
            mailbox: Mailbox::new(),
            log,
            clock,
            heartbeats: AtomicU32::new(0),
            rejected: AtomicU32::new(0),
        }
    }

    /// Current time from the node clock.
    #[inline]
    pub fn now_ms(&self) -> u32 {
        (self.clock)()
    }

    /// Send-completion callback.
    pub fn on_send_complete(&self, peer: &PeerAddress, delivered: bool) {
        self.health.record_delivery(delivered);
        if delivered {
            diag_debug!(self.log, self.now_ms(), "Message sent successfully to {}", peer);
        } else {
            diag_warn!(self.log, self.now_ms(), "Message send error to {}", peer);
        }
    }

    /// Receive callback.
    ///
    /// IR records are copied into the mailbox. Heartbeats are counted and
    /// never touch the mailbox. Anything else is counted and dropped.
    pub fn on_receive(&self, src: &PeerAddress, data: &[u8]) {
        match data.first().copied().and_then(MsgType::from_u8) {
            Some(MsgType::Ir) if data.len() == IR_FRAME_LEN => {
                if let Ok(frame) = <&IrFrame>::try_from(data) {
                    self.mailbox.post(frame);
                }
            }
            Some(MsgType::Heartbeat) if data.len() == HEARTBEAT_FRAME_LEN => {
                self.heartbeats.fetch_add(1, Ordering::Relaxed);
            }
            _ => {
                self.rejected.fetch_add(1, Ordering::Relaxed);
                diag_warn!(
                    self.log,
                    self.now_ms(),
                    "Dropped {}-byte datagram from {} (tag {:?})",
                    data.len(),
                    src,
                    data.first()
                );
            }
        }
    }

    /// Heartbeats received from the peer since boot.
    #[inline]
    pub fn heartbeats_received(&self) -> u32 {
        self.heartbeats.load(Ordering::Relaxed)
    }

    /// Datagrams dropped as malformed or reserved.
    #[inline]
    pub fn rejected(&self) -> u32 {
        self.rejected.load(Ordering::Relaxed)
    }
}

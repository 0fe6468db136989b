//! Heartbeat cadence and liveness indicator state machine.
//!
//! A heartbeat is due once the accumulated loop time exceeds the interval.
//! On every due heartbeat the link flag is sampled: consecutive failures
//! beyond the threshold drop the indicator, one success raises it again.

use crate::context::LinkContext;
use crate::health::LinkFault;
use crate::message::{WireMessage, HEARTBEAT_STATUS};
use crate::transport::{PeerAddress, Transport};
use crate::{diag_error, diag_info};

/// Liveness indicator state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indicator {
    /// Link considered down (LED off)
    Down,
    /// Link confirmed up (LED on)
    Up,
}

impl Indicator {
    #[inline]
    pub fn is_up(self) -> bool {
        self == Indicator::Up
    }
}

/// Heartbeat monitor
///
/// Owned by the main loop; no atomics needed.
#[derive(Debug, Clone)]
pub struct HeartbeatMonitor {
    /// Heartbeat interval in milliseconds
    interval_ms: u32,
    /// Failures tolerated before the indicator drops
    fail_threshold: u8,
    /// Millisecond clock reading at the previous poll
    last_ms: u32,
    /// Time accumulated since the last heartbeat
    elapsed_ms: u32,
    /// Consecutive failed heartbeats
    fail_count: u8,
    /// Current indicator state
    indicator: Indicator,
}

impl HeartbeatMonitor {
    /// Create new monitor
    ///
    /// # Arguments
    /// * `interval_ms` - Heartbeat interval in milliseconds
    /// * `fail_threshold` - Consecutive failures before `Down`
    pub fn new(interval_ms: u32, fail_threshold: u8) -> Self {
        Self {
            interval_ms,
            fail_threshold,
            last_ms: 0,
            elapsed_ms: 0,
            fail_count: 0,
            indicator: Indicator::Down,
        }
    }

    /// Advance the clock, return `true` when a heartbeat is due
    ///
    /// # Arguments
    /// * `now_ms` - Free-running millisecond clock, allowed to wrap
    ///
    /// Call once per loop iteration.
    #[inline]
    pub fn poll(&mut self, now_ms: u32) -> bool {
        self.elapsed_ms = self
            .elapsed_ms
            .saturating_add(now_ms.wrapping_sub(self.last_ms));
        self.last_ms = now_ms;

        if self.elapsed_ms > self.interval_ms {
            self.elapsed_ms = 0;
            true
        } else {
            false
        }
    }

    /// Sample the link flag after a heartbeat went out
    ///
    /// # Arguments
    /// * `link_degraded` - Current link-health flag
    #[inline]
    pub fn record(&mut self, link_degraded: bool) -> Indicator {
        if link_degraded {
            self.fail_count = self.fail_count.saturating_add(1);
            if self.fail_count > self.fail_threshold {
                self.indicator = Indicator::Down;
            }
        } else {
            self.fail_count = 0;
            self.indicator = Indicator::Up;
        }
        self.indicator
    }

    /// Get current indicator state
    #[inline]
    pub fn indicator(&self) -> Indicator {
        self.indicator
    }

    /// Get consecutive failure count
    #[inline]
    pub fn fail_count(&self) -> u8 {
        self.fail_count
    }

    /// Get heartbeat interval
    #[inline]
    pub fn interval_ms(&self) -> u32 {
        self.interval_ms
    }
}

impl HeartbeatMonitor {
    /// Run the heartbeat part of a loop tick
    ///
    /// Sends a heartbeat when due and turns the link flag into the
    /// indicator. A refused enqueue counts as a link fault. Returns the
    /// indicator when a heartbeat went out, `None` otherwise.
    pub fn service<T: Transport>(
        &mut self,
        now_ms: u32,
        transport: &mut T,
        peer: &PeerAddress,
        ctx: &LinkContext,
    ) -> Option<Indicator> {
        if !self.poll(now_ms) {
            return None;
        }

        let frame = WireMessage::heartbeat_frame(HEARTBEAT_STATUS);
        if transport.send(peer, &frame).is_err() {
            ctx.health.set_fault(LinkFault::EnqueueFailed);
        }

        let before = self.indicator;
        let after = self.record(ctx.health.is_degraded());
        match (before, after) {
            (Indicator::Up, Indicator::Down) => {
                let health = ctx.health.snapshot();
                diag_error!(
                    ctx.log,
                    now_ms,
                    "Link to {} down after {} failed heartbeats ({}, {} delivered, {} failures)",
                    peer,
                    self.fail_count,
                    health.fault.code(),
                    health.delivered,
                    health.failures
                )
            }
            (Indicator::Down, Indicator::Up) => {
                diag_info!(ctx.log, now_ms, "Link to {} up", peer)
            }
            _ => {}
        }
        Some(after)
    }
}

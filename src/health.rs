//! Link health for the wireless side of a node.
//!
//! # Philosophy
//!
//! > A dead link degrades the repeater, it never stops it.
//!
//! Every link failure lands here as a flag flip and a counter bump. Nothing
//! is retried and nothing halts: the IR side keeps capturing or replaying
//! while the heartbeat monitor turns this flag into the liveness indicator.

use core::sync::atomic::{AtomicBool, AtomicU32, AtomicU8, Ordering};

/// Reason the link was last marked degraded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum LinkFault {
    /// No fault recorded.
    None = 0,

    /// Wireless stack initialization failed. Not retried.
    InitFailed = 1,

    /// The fixed peer could not be registered. Not retried.
    PeerRegistrationFailed = 2,

    /// The transport refused to queue a datagram.
    EnqueueFailed = 3,

    /// The send-completion callback reported a failed delivery.
    SendFailed = 4,
}

impl LinkFault {
    /// Convert from raw u8 value.
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => LinkFault::InitFailed,
            2 => LinkFault::PeerRegistrationFailed,
            3 => LinkFault::EnqueueFailed,
            4 => LinkFault::SendFailed,
            _ => LinkFault::None,
        }
    }

    /// Get error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::None => "L00",
            Self::InitFailed => "L01",
            Self::PeerRegistrationFailed => "L02",
            Self::EnqueueFailed => "L03",
            Self::SendFailed => "L04",
        }
    }

    /// Get error message
    pub fn message(&self) -> &'static str {
        match self {
            Self::None => "no fault",
            Self::InitFailed => "error initializing ESP-NOW",
            Self::PeerRegistrationFailed => "no peer added",
            Self::EnqueueFailed => "send not queued",
            Self::SendFailed => "message send error",
        }
    }
}

impl core::fmt::Display for LinkFault {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}: {}", self.code(), self.message())
    }
}

/// Thread-safe link health flag.
///
/// Written by the send-completion callback and the bring-up sequence,
/// read by the main loop once per heartbeat.
///
/// # Usage
///
/// ```ignore
/// // In the send callback:
/// HEALTH.record_delivery(status == SendStatus::SUCCESS);
///
/// // In the main loop:
/// let indicator = monitor.record(HEALTH.is_degraded());
/// ```
pub struct LinkHealth {
    /// True while the link is considered broken.
    degraded: AtomicBool,

    /// Last fault code.
    fault: AtomicU8,

    /// Deliveries confirmed by the transport.
    delivered: AtomicU32,

    /// Failures of any kind since boot (never cleared).
    failures: AtomicU32,
}

impl LinkHealth {
    /// Create link health in the degraded state.
    ///
    /// The link is not trusted until the transport says otherwise.
    pub const fn new() -> Self {
        Self {
            degraded: AtomicBool::new(true),
            fault: AtomicU8::new(0),
            delivered: AtomicU32::new(0),
            failures: AtomicU32::new(0),
        }
    }

    /// Record a failure and mark the link degraded.
    #[inline]
    pub fn set_fault(&self, fault: LinkFault) {
        self.fault.store(fault as u8, Ordering::Release);
        self.failures.fetch_add(1, Ordering::Relaxed);
        self.degraded.store(true, Ordering::Release);
    }

    /// Mark the link healthy. The last fault code is kept for diagnostics.
    #[inline]
    pub fn set_ok(&self) {
        self.degraded.store(false, Ordering::Release);
    }

    /// Mark the link degraded without counting a failure.
    ///
    /// Used after bring-up so the indicator starts from "down" instead of
    /// flickering up before the first heartbeat is confirmed.
    #[inline]
    pub fn hold_degraded(&self) {
        self.degraded.store(true, Ordering::Release);
    }

    /// Apply a send-completion outcome.
    #[inline]
    pub fn record_delivery(&self, delivered: bool) {
        if delivered {
            self.delivered.fetch_add(1, Ordering::Relaxed);
            self.set_ok();
        } else {
            self.set_fault(LinkFault::SendFailed);
        }
    }

    /// Check if the link is currently degraded.
    #[inline]
    pub fn is_degraded(&self) -> bool {
        self.degraded.load(Ordering::Acquire)
    }

    /// Get last fault code.
    #[inline]
    pub fn fault(&self) -> LinkFault {
        LinkFault::from_u8(self.fault.load(Ordering::Acquire))
    }

    /// Get confirmed deliveries since boot.
    #[inline]
    pub fn delivered(&self) -> u32 {
        self.delivered.load(Ordering::Relaxed)
    }

    /// Get total failures since boot.
    #[inline]
    pub fn failures(&self) -> u32 {
        self.failures.load(Ordering::Relaxed)
    }

    /// Get a snapshot of the current link health.
    #[inline]
    pub fn snapshot(&self) -> HealthSnapshot {
        HealthSnapshot {
            degraded: self.is_degraded(),
            fault: self.fault(),
            delivered: self.delivered(),
            failures: self.failures(),
        }
    }
}

impl Default for LinkHealth {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of link health at a point in time.
#[derive(Clone, Copy, Debug)]
pub struct HealthSnapshot {
    pub degraded: bool,
    pub fault: LinkFault,
    pub delivered: u32,
    pub failures: u32,
}

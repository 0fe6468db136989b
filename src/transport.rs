//! Datagram transport seam.
//!
//! The radio stack (ESP-NOW on target) is an external capability: it can
//! be initialized, told about a peer, and asked to queue bytes. Delivery is
//! reported later through the send-completion callback on `LinkContext`.

use core::fmt;

use crate::context::LinkContext;
use crate::health::LinkFault;

/// MAC address of a wireless peer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct PeerAddress(pub [u8; 6]);

impl PeerAddress {
    /// Build from a MAC slice. Returns `None` unless it is 6 bytes.
    pub fn from_slice(mac: &[u8]) -> Option<Self> {
        let bytes: [u8; 6] = mac.try_into().ok()?;
        Some(PeerAddress(bytes))
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8; 6] {
        &self.0
    }
}

impl fmt::Display for PeerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = &self.0;
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            m[0], m[1], m[2], m[3], m[4], m[5]
        )
    }
}

/// Transport error (immediate status of a call)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    /// T01: Stack initialization failed
    Init,
    /// T02: Peer could not be registered
    Peer,
    /// T03: Datagram not queued (stack busy, not initialized, too long)
    Send,
}

impl TransportError {
    /// Get error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::Init => "T01",
            Self::Peer => "T02",
            Self::Send => "T03",
        }
    }

    /// Get error message
    pub fn message(&self) -> &'static str {
        match self {
            Self::Init => "transport init failed",
            Self::Peer => "peer registration failed",
            Self::Send => "send not queued",
        }
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code(), self.message())
    }
}

/// Peer-to-peer datagram transport.
pub trait Transport {
    /// Bring up the radio stack.
    fn init(&mut self) -> Result<(), TransportError>;

    /// Register the fixed peer.
    fn register_peer(&mut self, peer: &PeerAddress) -> Result<(), TransportError>;

    /// Queue a datagram. `Ok` only means queued, not delivered.
    fn send(&mut self, peer: &PeerAddress, data: &[u8]) -> Result<(), TransportError>;
}

/// Initialize the transport and register the peer.
///
/// Each step marks the link health. Failures are returned but never
/// retried; the caller keeps running the IR side degraded. On success the
/// flag is held degraded so the indicator comes up with the first
/// confirmed heartbeat rather than immediately.
pub fn bring_up<T: Transport>(
    transport: &mut T,
    ctx: &LinkContext,
    peer: &PeerAddress,
) -> Result<(), LinkFault> {
    if transport.init().is_err() {
        ctx.health.set_fault(LinkFault::InitFailed);
        return Err(LinkFault::InitFailed);
    }
    ctx.health.set_ok();

    if transport.register_peer(peer).is_err() {
        ctx.health.set_fault(LinkFault::PeerRegistrationFailed);
        return Err(LinkFault::PeerRegistrationFailed);
    }
    ctx.health.set_ok();

    ctx.health.hold_degraded();
    Ok(())
}

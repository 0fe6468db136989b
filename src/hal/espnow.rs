//! ESP-NOW datagram transport.
//!
//! WiFi is started in station mode by the caller; this adapter only owns
//! the ESP-NOW layer on top of it. Both ESP-NOW callbacks run on the WiFi
//! task and go straight into the node's [`LinkContext`].

use esp_idf_svc::espnow::{EspNow, PeerInfo, SendStatus};
use esp_idf_svc::sys::wifi_interface_t_WIFI_IF_STA;

use crate::context::LinkContext;
use crate::message::ESPNOW_MAX_PAYLOAD;
use crate::transport::{PeerAddress, Transport, TransportError};

/// [`Transport`] over the ESP-IDF ESP-NOW driver.
pub struct EspNowTransport {
    ctx: &'static LinkContext,
    espnow: Option<EspNow<'static>>,
}

impl EspNowTransport {
    pub fn new(ctx: &'static LinkContext) -> Self {
        Self { ctx, espnow: None }
    }

    /// Register the receive and send-completion callbacks.
    fn attach(&self, espnow: &EspNow<'static>) -> Result<(), TransportError> {
        let ctx = self.ctx;
        espnow
            .register_recv_cb(move |info, data| {
                ctx.on_receive(&PeerAddress(*info.src_addr), data);
            })
            .map_err(|_| TransportError::Init)?;

        espnow
            .register_send_cb(move |mac, status| {
                let peer = PeerAddress::from_slice(mac).unwrap_or_default();
                ctx.on_send_complete(&peer, matches!(status, SendStatus::SUCCESS));
            })
            .map_err(|_| TransportError::Init)?;
        Ok(())
    }
}

impl Transport for EspNowTransport {
    fn init(&mut self) -> Result<(), TransportError> {
        let espnow = EspNow::take().map_err(|_| TransportError::Init)?;
        self.attach(&espnow)?;
        self.espnow = Some(espnow);
        Ok(())
    }

    fn register_peer(&mut self, peer: &PeerAddress) -> Result<(), TransportError> {
        let espnow = self.espnow.as_ref().ok_or(TransportError::Peer)?;
        let info = PeerInfo {
            peer_addr: *peer.as_bytes(),
            channel: 0,
            ifidx: wifi_interface_t_WIFI_IF_STA,
            encrypt: false,
            ..Default::default()
        };
        espnow.add_peer(info).map_err(|_| TransportError::Peer)
    }

    fn send(&mut self, peer: &PeerAddress, data: &[u8]) -> Result<(), TransportError> {
        if data.len() > ESPNOW_MAX_PAYLOAD {
            return Err(TransportError::Send);
        }
        let espnow = self.espnow.as_ref().ok_or(TransportError::Send)?;
        espnow
            .send(*peer.as_bytes(), data)
            .map_err(|_| TransportError::Send)
    }
}

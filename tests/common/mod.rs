//! Host-side doubles for the hardware seams.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use rust_ir_repeater::logging::LogStream;
use rust_ir_repeater::{
    DecodedSignal, IrDecoder, IrEncoder, LinkContext, PeerAddress, Protocol, Transport,
    TransportError,
};

pub const PEER: PeerAddress = PeerAddress([0x18, 0xFE, 0x34, 0xD9, 0x41, 0x7C]);

/// Ordered record of calls across mocks sharing one log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Poll,
    Resume,
    Send(usize),
}

pub type Events = Rc<RefCell<Vec<Event>>>;

pub fn events() -> Events {
    Rc::new(RefCell::new(Vec::new()))
}

fn zero_clock() -> u32 {
    0
}

/// Fresh context with its own log stream.
pub fn context() -> &'static LinkContext {
    let log: &'static LogStream = Box::leak(Box::new(LogStream::new()));
    Box::leak(Box::new(LinkContext::new(log, zero_clock)))
}

/// Drain every pending log line.
pub fn log_lines(ctx: &LinkContext) -> Vec<String> {
    let mut lines = Vec::new();
    while let Some(entry) = ctx.log.drain() {
        lines.push(entry.text().to_string());
    }
    lines
}

#[derive(Default)]
pub struct MockDecoder {
    pub queue: VecDeque<DecodedSignal>,
    pub halted: bool,
    pub tolerance: Option<u8>,
    pub unknown_threshold: Option<u16>,
    pub resumes: u32,
    pub events: Option<Events>,
}

impl MockDecoder {
    pub fn with_events(events: &Events) -> Self {
        Self {
            events: Some(events.clone()),
            ..Default::default()
        }
    }

    pub fn push(&mut self, signal: DecodedSignal) {
        self.queue.push_back(signal);
    }

    fn note(&self, event: Event) {
        if let Some(events) = &self.events {
            events.borrow_mut().push(event);
        }
    }
}

impl IrDecoder for MockDecoder {
    fn poll(&mut self) -> Option<DecodedSignal> {
        if self.halted {
            return None;
        }
        let signal = self.queue.pop_front()?;
        self.note(Event::Poll);
        self.halted = true;
        Some(signal)
    }

    fn resume(&mut self) {
        self.note(Event::Resume);
        self.resumes += 1;
        self.halted = false;
    }

    fn set_tolerance(&mut self, percent: u8) {
        self.tolerance = Some(percent);
    }

    fn set_unknown_threshold(&mut self, pulses: u16) {
        self.unknown_threshold = Some(pulses);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Emitted {
    Scalar { protocol: Protocol, value: u64, bits: u16 },
    Bytes { protocol: Protocol, state: Vec<u8> },
    Raw { timings: Vec<u16>, carrier_hz: u32 },
}

#[derive(Default)]
pub struct MockEncoder {
    pub emitted: Vec<Emitted>,
    /// Protocols the encoder refuses.
    pub unsupported: Vec<Protocol>,
}

impl IrEncoder for MockEncoder {
    fn send_scalar(&mut self, protocol: Protocol, value: u64, bits: u16) -> bool {
        self.emitted.push(Emitted::Scalar { protocol, value, bits });
        !self.unsupported.contains(&protocol)
    }

    fn send_bytes(&mut self, protocol: Protocol, state: &[u8]) -> bool {
        self.emitted.push(Emitted::Bytes {
            protocol,
            state: state.to_vec(),
        });
        !self.unsupported.contains(&protocol)
    }

    fn send_raw(&mut self, timings: &[u16], carrier_hz: u32) {
        self.emitted.push(Emitted::Raw {
            timings: timings.to_vec(),
            carrier_hz,
        });
    }
}

#[derive(Default)]
pub struct MockTransport {
    pub fail_init: bool,
    pub fail_peer: bool,
    pub fail_send: bool,
    pub inits: u32,
    pub peers: Vec<PeerAddress>,
    pub sent: Vec<(PeerAddress, Vec<u8>)>,
    pub events: Option<Events>,
}

impl MockTransport {
    pub fn with_events(events: &Events) -> Self {
        Self {
            events: Some(events.clone()),
            ..Default::default()
        }
    }

    /// Datagrams sent with the given tag.
    pub fn sent_with_tag(&self, tag: u8) -> Vec<Vec<u8>> {
        self.sent
            .iter()
            .filter(|(_, data)| data.first() == Some(&tag))
            .map(|(_, data)| data.clone())
            .collect()
    }
}

impl Transport for MockTransport {
    fn init(&mut self) -> Result<(), TransportError> {
        self.inits += 1;
        if self.fail_init {
            Err(TransportError::Init)
        } else {
            Ok(())
        }
    }

    fn register_peer(&mut self, peer: &PeerAddress) -> Result<(), TransportError> {
        if self.fail_peer {
            return Err(TransportError::Peer);
        }
        self.peers.push(*peer);
        Ok(())
    }

    fn send(&mut self, peer: &PeerAddress, data: &[u8]) -> Result<(), TransportError> {
        if let Some(events) = &self.events {
            events.borrow_mut().push(Event::Send(data.len()));
        }
        if self.fail_send {
            return Err(TransportError::Send);
        }
        self.sent.push((*peer, data.to_vec()));
        Ok(())
    }
}

//! End-to-end: Receiver capture -> datagram -> Transmitter replay

mod common;

use common::{context, Emitted, MockDecoder, MockEncoder, MockTransport, PEER};
use rust_ir_repeater::capture::CaptureForwarder;
use rust_ir_repeater::config::{
    RECEIVER_CAPTURE, RECEIVER_LINK, TRANSMITTER_LINK, TRANSMITTER_REPLAY,
};
use rust_ir_repeater::replay::Replayer;
use rust_ir_repeater::signal::PayloadKind;
use rust_ir_repeater::{DecodedSignal, Indicator, LinkContext, PeerAddress, Protocol, RawCapture};

type Receiver = CaptureForwarder<'static, MockDecoder, MockTransport>;
type Transmitter = Replayer<'static, MockEncoder, MockTransport>;

struct Pair {
    rx_ctx: &'static LinkContext,
    tx_ctx: &'static LinkContext,
    receiver: Receiver,
    transmitter: Transmitter,
    /// Datagrams already carried across
    carried: [usize; 2],
}

impl Pair {
    fn new(decoder: MockDecoder) -> Self {
        let rx_ctx = context();
        let tx_ctx = context();
        let mut receiver = CaptureForwarder::new(
            decoder,
            MockTransport::default(),
            rx_ctx,
            RECEIVER_CAPTURE,
            RECEIVER_LINK,
        );
        let mut transmitter = Replayer::new(
            MockEncoder::default(),
            MockTransport::default(),
            tx_ctx,
            TRANSMITTER_REPLAY,
            TRANSMITTER_LINK,
        );
        receiver.setup().unwrap();
        transmitter.setup().unwrap();
        Self {
            rx_ctx,
            tx_ctx,
            receiver,
            transmitter,
            carried: [0, 0],
        }
    }

    /// Deliver every new datagram to the other node and confirm it.
    fn carry(&mut self) {
        let sent = &self.receiver.transport().sent;
        relay(&sent[self.carried[0]..], self.rx_ctx, self.tx_ctx);
        self.carried[0] = sent.len();

        let sent = &self.transmitter.transport().sent;
        relay(&sent[self.carried[1]..], self.tx_ctx, self.rx_ctx);
        self.carried[1] = sent.len();
    }
}

fn relay(datagrams: &[(PeerAddress, Vec<u8>)], from: &LinkContext, to: &LinkContext) {
    for (_, data) in datagrams {
        to.on_receive(&PEER, data);
        from.on_send_complete(&PEER, true);
    }
}

#[test]
fn test_nec_replayed_exactly_once() {
    let mut decoder = MockDecoder::default();
    decoder.push(DecodedSignal::scalar(Protocol::NEC, 0x1234ABCD, 32));
    let mut pair = Pair::new(decoder);

    let fwd = pair.receiver.tick(10).forwarded.unwrap();
    assert!(fwd.queued);
    pair.carry();

    let outcome = pair.transmitter.tick(12).replayed.unwrap();
    assert!(outcome.success);
    assert_eq!((outcome.protocol, outcome.bits), (Protocol::NEC, 32));

    for now in 13..100 {
        pair.receiver.tick(now);
        pair.carry();
        assert!(pair.transmitter.tick(now).replayed.is_none());
    }
    assert_eq!(
        pair.transmitter.encoder().emitted,
        vec![Emitted::Scalar {
            protocol: Protocol::NEC,
            value: 0x1234ABCD,
            bits: 32
        }]
    );
}

#[test]
fn test_unknown_overflow_preserved() {
    let ticks: Vec<u16> = (0..150).map(|i| 280 + i).collect();
    let (raw, truncated) = RawCapture::from_ticks(&ticks);
    let mut decoder = MockDecoder::default();
    decoder.push(DecodedSignal::raw(raw, truncated));
    let mut pair = Pair::new(decoder);

    assert_eq!(pair.receiver.tick(10).forwarded.map(|f| f.overflow), Some(true));
    pair.carry();

    let outcome = pair.transmitter.tick(11).replayed.unwrap();
    assert_eq!(outcome.kind, PayloadKind::Raw);
    assert_eq!(outcome.protocol, Protocol::UNKNOWN);
    assert!(outcome.overflow);

    match &pair.transmitter.encoder().emitted[..] {
        [Emitted::Raw { timings, carrier_hz }] => {
            assert_eq!(*carrier_hz, 38_000);
            assert_eq!(timings.len(), 116);
            assert_eq!(timings[0], 560);
            assert_eq!(timings[115], (280 + 115) * 2);
        }
        other => panic!("unexpected emission: {:?}", other),
    }
}

#[test]
fn test_stateful_signal_survives() {
    let state = [0x11, 0xDA, 0x27, 0x00, 0xC5, 0x00, 0x00, 0xD7];
    let mut decoder = MockDecoder::default();
    decoder.push(DecodedSignal::stateful(Protocol::DAIKIN, &state, 64).unwrap());
    let mut pair = Pair::new(decoder);

    pair.receiver.tick(10);
    pair.carry();
    pair.transmitter.tick(11);

    assert_eq!(
        pair.transmitter.encoder().emitted,
        vec![Emitted::Bytes {
            protocol: Protocol::DAIKIN,
            state: state.to_vec()
        }]
    );
}

#[test]
fn test_both_indicators_come_up() {
    let mut pair = Pair::new(MockDecoder::default());

    let mut rx = None;
    let mut tx = None;
    for now in (0..=3000).step_by(50) {
        rx = pair.receiver.tick(now).heartbeat.or(rx);
        tx = pair.transmitter.tick(now).heartbeat.or(tx);
        pair.carry();
    }

    assert_eq!(rx, Some(Indicator::Up));
    assert_eq!(tx, Some(Indicator::Up));
    assert!(pair.rx_ctx.heartbeats_received() >= 2);
    assert!(pair.tx_ctx.heartbeats_received() >= 2);
    // Heartbeats never reach the replay path
    assert!(pair.transmitter.encoder().emitted.is_empty());
}

#[test]
fn test_indicator_drops_when_peer_silent() {
    let mut pair = Pair::new(MockDecoder::default());

    let mut now = 0;
    for _ in 0..3 {
        now += 1001;
        pair.receiver.tick(now);
        pair.carry();
    }
    assert_eq!(pair.receiver.indicator(), Indicator::Up);

    // Peer gone: every delivery fails from here on
    for _ in 0..10 {
        now += 1001;
        pair.receiver.tick(now);
        pair.rx_ctx.on_send_complete(&PEER, false);
    }
    // Ten failures tolerated on the Receiver
    now += 1001;
    pair.receiver.tick(now);
    assert_eq!(pair.receiver.indicator(), Indicator::Up);
    now += 1001;
    assert_eq!(pair.receiver.tick(now).heartbeat, Some(Indicator::Down));
}

//! Mailbox integration tests (callback thread vs main loop)

use std::sync::Arc;
use std::thread;

use rust_ir_repeater::message::{IrFrame, IR_FRAME_LEN};
use rust_ir_repeater::Mailbox;

fn frame(seq: u32) -> IrFrame {
    let mut frame = [0u8; IR_FRAME_LEN];
    for chunk in frame.chunks_mut(4) {
        let bytes = seq.to_le_bytes();
        chunk.copy_from_slice(&bytes[..chunk.len()]);
    }
    frame
}

fn seq_of(frame: &IrFrame) -> u32 {
    u32::from_le_bytes([frame[0], frame[1], frame[2], frame[3]])
}

#[test]
fn test_take_clears_flag() {
    let mailbox = Mailbox::new();
    mailbox.post(&frame(7));
    assert!(mailbox.has_new());

    assert_eq!(mailbox.take().map(|f| seq_of(&f)), Some(7));
    assert!(!mailbox.has_new());
    assert!(mailbox.take().is_none());
}

#[test]
fn test_reader_sees_monotonic_untorn_records() {
    let mailbox = Arc::new(Mailbox::new());
    let writer = {
        let mailbox = Arc::clone(&mailbox);
        thread::spawn(move || {
            for seq in 1..=20_000u32 {
                mailbox.post(&frame(seq));
            }
        })
    };

    let mut last = 0;
    let mut taken = 0u32;
    while !writer.is_finished() || mailbox.has_new() {
        if let Some(f) = mailbox.take() {
            let seq = seq_of(&f);
            assert_eq!(f, frame(seq), "torn record");
            assert!(seq > last, "went backwards: {} after {}", seq, last);
            last = seq;
            taken += 1;
        }
    }
    writer.join().unwrap();

    assert_eq!(last, 20_000);
    assert_eq!(mailbox.posted(), 20_000);
    assert_eq!(mailbox.overwritten() + taken, 20_000);
}

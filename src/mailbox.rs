//! Lock-free single-slot mailbox for inbound IR records.
//!
//! # Architecture
//!
//! ```text
//! recv callback            Mailbox                 main loop
//! ─────────────            ───────                 ─────────
//!
//! post(frame) ──────▶ [back][middle][front] ──────▶ take()
//! copy + flag          triple buffer               clear flag, read
//! never blocks         swap on AtomicU8            never torn
//! ```
//!
//! The writer fills its private back slot, then swaps it with the shared
//! middle slot and raises the NEW bit in one atomic operation. The reader
//! swaps the middle slot with its private front slot only when NEW is set.
//! Neither side ever touches a slot the other one owns, so no copy can be
//! observed half-written. A second `post` before `take` simply replaces the
//! middle slot: last writer wins.
//!
//! # Rules
//!
//! - One writer context (the transport receive callback)
//! - One reader context (the main loop)
//! - No locks, no allocation, O(1) on both sides

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicU32, AtomicU8, Ordering};

use crate::message::{IrFrame, IR_FRAME_LEN};

/// Slot index mask inside `shared`.
const INDEX_MASK: u8 = 0b0011;
/// Set when the middle slot holds a record the reader has not taken.
const NEW: u8 = 0b0100;

/// Single-producer single-consumer mailbox holding the newest IR record.
pub struct Mailbox {
    slots: UnsafeCell<[IrFrame; 3]>,
    /// Middle slot index and NEW flag.
    shared: AtomicU8,
    /// Writer-owned slot index.
    back: AtomicU8,
    /// Reader-owned slot index.
    front: AtomicU8,
    posted: AtomicU32,
    overwritten: AtomicU32,
}

// SAFETY: Slot ownership is handed over only through the atomic swap on
// `shared`. The writer touches `slots[back]` only, the reader `slots[front]`
// only, and the three indices are always distinct.
unsafe impl Sync for Mailbox {}
unsafe impl Send for Mailbox {}

impl Mailbox {
    /// Create an empty mailbox.
    pub const fn new() -> Self {
        Self {
            slots: UnsafeCell::new([[0; IR_FRAME_LEN]; 3]),
            shared: AtomicU8::new(1),
            back: AtomicU8::new(0),
            front: AtomicU8::new(2),
            posted: AtomicU32::new(0),
            overwritten: AtomicU32::new(0),
        }
    }

    /// Publish a record (writer side, callback context).
    ///
    /// Unconditionally replaces any record not yet taken.
    #[inline]
    pub fn post(&self, frame: &IrFrame) {
        let back = self.back.load(Ordering::Relaxed);

        // SAFETY: `back` is owned by the single writer until the swap below
        unsafe {
            (*self.slots.get())[back as usize] = *frame;
        }

        // Release: the copy above is visible before the index is
        let prev = self.shared.swap(back | NEW, Ordering::AcqRel);
        self.back.store(prev & INDEX_MASK, Ordering::Relaxed);

        self.posted.fetch_add(1, Ordering::Relaxed);
        if prev & NEW != 0 {
            self.overwritten.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Take the newest record (reader side, main loop).
    ///
    /// The NEW flag is cleared before the record is returned, so the same
    /// record is never handed out twice.
    #[inline]
    pub fn take(&self) -> Option<IrFrame> {
        if self.shared.load(Ordering::Relaxed) & NEW == 0 {
            return None;
        }

        let front = self.front.load(Ordering::Relaxed);
        // Acquire: pairs with the writer's swap
        let prev = self.shared.swap(front, Ordering::AcqRel);
        let front = prev & INDEX_MASK;
        self.front.store(front, Ordering::Relaxed);

        // SAFETY: `front` was just handed over by the swap, the writer can
        // no longer reach it
        Some(unsafe { (*self.slots.get())[front as usize] })
    }

    /// Whether a record is waiting.
    #[inline]
    pub fn has_new(&self) -> bool {
        self.shared.load(Ordering::Acquire) & NEW != 0
    }

    /// Records posted since boot.
    #[inline]
    pub fn posted(&self) -> u32 {
        self.posted.load(Ordering::Relaxed)
    }

    /// Records replaced before the reader took them.
    #[inline]
    pub fn overwritten(&self) -> u32 {
        self.overwritten.load(Ordering::Relaxed)
    }
}

impl Default for Mailbox {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(marker: u8) -> IrFrame {
        let mut f = [0u8; IR_FRAME_LEN];
        f[1] = marker;
        f[IR_FRAME_LEN - 1] = marker;
        f
    }

    #[test]
    fn test_mailbox_empty() {
        let mailbox = Mailbox::new();
        assert!(!mailbox.has_new());
        assert!(mailbox.take().is_none());
    }

    #[test]
    fn test_mailbox_post_take() {
        let mailbox = Mailbox::new();
        mailbox.post(&frame(7));

        assert!(mailbox.has_new());
        let got = mailbox.take().unwrap();
        assert_eq!(got[1], 7);
        assert!(!mailbox.has_new());
        assert!(mailbox.take().is_none());
    }

    #[test]
    fn test_mailbox_last_writer_wins() {
        let mailbox = Mailbox::new();
        mailbox.post(&frame(1));
        mailbox.post(&frame(2));
        mailbox.post(&frame(3));

        assert_eq!(mailbox.take().unwrap()[1], 3);
        assert!(mailbox.take().is_none());
        assert_eq!(mailbox.posted(), 3);
        assert_eq!(mailbox.overwritten(), 2);
    }

    #[test]
    fn test_mailbox_slots_rotate() {
        let mailbox = Mailbox::new();
        for i in 0..20u8 {
            mailbox.post(&frame(i));
            let got = mailbox.take().unwrap();
            assert_eq!(got[1], i);
            assert_eq!(got[IR_FRAME_LEN - 1], i);
        }
        assert_eq!(mailbox.overwritten(), 0);
    }

    #[test]
    fn test_mailbox_concurrent_never_torn() {
        use std::sync::Arc;
        use std::thread;

        let mailbox = Arc::new(Mailbox::new());
        let writer = {
            let mailbox = Arc::clone(&mailbox);
            thread::spawn(move || {
                for i in 1..=5000u32 {
                    let marker = (i % 251) as u8;
                    mailbox.post(&[marker; IR_FRAME_LEN]);
                }
            })
        };

        let mut seen = 0;
        while !writer.is_finished() || mailbox.has_new() {
            if let Some(f) = mailbox.take() {
                // Every byte comes from the same post
                assert!(f.iter().all(|&b| b == f[0]));
                seen += 1;
            }
        }
        writer.join().unwrap();
        assert!(seen > 0);
    }
}

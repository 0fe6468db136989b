//! Callback-safe diagnostics for the repeater nodes.
//!
//! # Architecture
//!
//! ```text
//! main loop ──┐
//!             ├──▶ LogStream ──────▶ serial drain (main loop, budgeted)
//! callbacks ──┘    lock-free ring    UART0 @ 115200
//! ```
//!
//! # Rules
//!
//! - Callbacks and the main loop push, only the drain pops
//! - A push never blocks; when the ring is full the message is dropped
//!   and counted
//! - Formatting happens into a stack buffer, never the heap

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicU32, Ordering};

/// Maximum message length.
pub const MAX_MSG_LEN: usize = 120;

/// Log buffer size (number of entries).
pub const LOG_BUFFER_SIZE: usize = 64;

/// Log level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LogLevel {
    Error = 0,
    Warn = 1,
    Info = 2,
    Debug = 3,
}

impl LogLevel {
    /// Convert to string for output.
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
        }
    }
}

/// A single log entry.
#[derive(Clone, Copy)]
pub struct LogEntry {
    /// Milliseconds since boot.
    pub timestamp_ms: u32,
    pub level: LogLevel,
    /// Message length.
    pub len: u8,
    /// Message bytes (not null-terminated).
    pub msg: [u8; MAX_MSG_LEN],
}

impl LogEntry {
    const EMPTY: LogEntry = LogEntry {
        timestamp_ms: 0,
        level: LogLevel::Info,
        len: 0,
        msg: [0; MAX_MSG_LEN],
    };

    /// Message text. Invalid UTF-8 (a cut multi-byte char) is trimmed.
    pub fn text(&self) -> &str {
        let bytes = &self.msg[..self.len as usize];
        match core::str::from_utf8(bytes) {
            Ok(s) => s,
            Err(e) => core::str::from_utf8(&bytes[..e.valid_up_to()]).unwrap_or(""),
        }
    }
}

impl Default for LogEntry {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Lock-free log stream (multiple producers, single consumer).
///
/// Producers claim a slot with a compare-exchange on `write_idx`, fill it,
/// then publish it through the slot's `ready` sequence. The drain only
/// reads slots whose sequence matches, so a claimed but unfinished slot is
/// never printed.
pub struct LogStream<const N: usize = LOG_BUFFER_SIZE> {
    entries: UnsafeCell<[LogEntry; N]>,
    /// Per slot: write index + 1 of the entry it holds once committed.
    ready: [AtomicU32; N],
    write_idx: AtomicU32,
    read_idx: AtomicU32,
    dropped: AtomicU32,
}

// SAFETY: A slot is written only by the producer that claimed its index and
// read only by the single consumer after the Release store on `ready`.
unsafe impl<const N: usize> Sync for LogStream<N> {}
unsafe impl<const N: usize> Send for LogStream<N> {}

impl<const N: usize> LogStream<N> {
    const MASK: usize = N - 1;

    /// Create a new empty log stream.
    pub const fn new() -> Self {
        assert!(N.is_power_of_two(), "Log buffer size must be power of 2");

        Self {
            entries: UnsafeCell::new([LogEntry::EMPTY; N]),
            ready: [const { AtomicU32::new(0) }; N],
            write_idx: AtomicU32::new(0),
            read_idx: AtomicU32::new(0),
            dropped: AtomicU32::new(0),
        }
    }

    /// Push a log entry (never blocks).
    ///
    /// Returns `true` if message was queued, `false` if dropped (ring full).
    pub fn push(&self, timestamp_ms: u32, level: LogLevel, msg: &[u8]) -> bool {
        let mut write = self.write_idx.load(Ordering::Relaxed);
        loop {
            let read = self.read_idx.load(Ordering::Acquire);
            if write.wrapping_sub(read) >= N as u32 {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                return false;
            }
            match self.write_idx.compare_exchange_weak(
                write,
                write.wrapping_add(1),
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(current) => write = current,
            }
        }

        let idx = (write as usize) & Self::MASK;

        // SAFETY: Index claimed exclusively by the compare-exchange above,
        // and the consumer released it (read_idx checked with Acquire)
        unsafe {
            let entry = &mut (*self.entries.get())[idx];
            entry.timestamp_ms = timestamp_ms;
            entry.level = level;
            entry.len = msg.len().min(MAX_MSG_LEN) as u8;
            entry.msg[..entry.len as usize].copy_from_slice(&msg[..entry.len as usize]);
        }

        self.ready[idx].store(write.wrapping_add(1), Ordering::Release);
        true
    }

    /// Drain next log entry (single consumer).
    ///
    /// Returns `None` if no committed entry is available.
    pub fn drain(&self) -> Option<LogEntry> {
        let read = self.read_idx.load(Ordering::Relaxed);
        let idx = (read as usize) & Self::MASK;

        if self.ready[idx].load(Ordering::Acquire) != read.wrapping_add(1) {
            return None;
        }

        // SAFETY: Committed slot, producers cannot reclaim it until read_idx moves
        let entry = unsafe { (*self.entries.get())[idx] };

        self.read_idx.store(read.wrapping_add(1), Ordering::Release);
        Some(entry)
    }

    /// Get count of dropped messages.
    #[inline]
    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Reset dropped counter and return the previous value.
    #[inline]
    pub fn take_dropped(&self) -> u32 {
        self.dropped.swap(0, Ordering::Relaxed)
    }

    /// Get number of entries claimed but not yet drained.
    #[inline]
    pub fn pending(&self) -> u32 {
        let read = self.read_idx.load(Ordering::Relaxed);
        let write = self.write_idx.load(Ordering::Acquire);
        write.wrapping_sub(read)
    }
}

impl<const N: usize> Default for LogStream<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Format a message into a buffer, truncating at the buffer end.
///
/// Returns the number of bytes written.
#[inline]
pub fn format_to_buffer(buf: &mut [u8], args: core::fmt::Arguments<'_>) -> usize {
    let mut writer = BufWriter { buf, pos: 0 };
    let _ = core::fmt::write(&mut writer, args);
    writer.pos
}

/// `fmt::Write` over a byte slice that silently truncates.
pub(crate) struct BufWriter<'a> {
    pub(crate) buf: &'a mut [u8],
    pub(crate) pos: usize,
}

impl core::fmt::Write for BufWriter<'_> {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        let bytes = s.as_bytes();
        let remaining = self.buf.len() - self.pos;
        let to_write = bytes.len().min(remaining);
        self.buf[self.pos..self.pos + to_write].copy_from_slice(&bytes[..to_write]);
        self.pos += to_write;
        Ok(())
    }
}

/// Diagnostic log macro.
///
/// Safe in the transport callbacks: formats on the stack, never blocks.
///
/// # Example
///
/// ```ignore
/// diag!(LogLevel::Info, ctx.log, now_ms, "A {}-bit {} message", bits, protocol);
/// ```
#[macro_export]
macro_rules! diag {
    ($level:expr, $stream:expr, $timestamp:expr, $($arg:tt)*) => {{
        let mut buf = [0u8; $crate::logging::MAX_MSG_LEN];
        let len = $crate::logging::format_to_buffer(&mut buf, format_args!($($arg)*));
        $stream.push($timestamp, $level, &buf[..len]);
    }};
}

/// Info log.
#[macro_export]
macro_rules! diag_info {
    ($stream:expr, $timestamp:expr, $($arg:tt)*) => {
        $crate::diag!($crate::logging::LogLevel::Info, $stream, $timestamp, $($arg)*)
    };
}

/// Warning log.
#[macro_export]
macro_rules! diag_warn {
    ($stream:expr, $timestamp:expr, $($arg:tt)*) => {
        $crate::diag!($crate::logging::LogLevel::Warn, $stream, $timestamp, $($arg)*)
    };
}

/// Error log.
#[macro_export]
macro_rules! diag_error {
    ($stream:expr, $timestamp:expr, $($arg:tt)*) => {
        $crate::diag!($crate::logging::LogLevel::Error, $stream, $timestamp, $($arg)*)
    };
}

/// Debug log.
#[macro_export]
macro_rules! diag_debug {
    ($stream:expr, $timestamp:expr, $($arg:tt)*) => {
        $crate::diag!($crate::logging::LogLevel::Debug, $stream, $timestamp, $($arg)*)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_stream_basic() {
        let stream = LogStream::<16>::new();

        assert!(stream.push(1000, LogLevel::Info, b"test message"));
        assert_eq!(stream.pending(), 1);

        let entry = stream.drain().unwrap();
        assert_eq!(entry.timestamp_ms, 1000);
        assert_eq!(entry.level, LogLevel::Info);
        assert_eq!(entry.text(), "test message");

        assert!(stream.drain().is_none());
    }

    #[test]
    fn test_log_stream_full() {
        let stream = LogStream::<4>::new();

        assert!(stream.push(1, LogLevel::Info, b"1"));
        assert!(stream.push(2, LogLevel::Info, b"2"));
        assert!(stream.push(3, LogLevel::Info, b"3"));
        assert!(stream.push(4, LogLevel::Info, b"4"));

        // Should drop
        assert!(!stream.push(5, LogLevel::Info, b"5"));
        assert_eq!(stream.dropped(), 1);

        // Drain one, should be able to push again
        assert_eq!(stream.drain().unwrap().text(), "1");
        assert!(stream.push(6, LogLevel::Info, b"6"));

        let rest: std::vec::Vec<u32> = core::iter::from_fn(|| stream.drain())
            .map(|e| e.timestamp_ms)
            .collect();
        assert_eq!(rest, [2, 3, 4, 6]);
    }

    #[test]
    fn test_long_message_truncated() {
        let stream = LogStream::<4>::new();
        let long = [b'x'; MAX_MSG_LEN + 40];
        stream.push(0, LogLevel::Warn, &long);
        assert_eq!(stream.drain().unwrap().len as usize, MAX_MSG_LEN);
    }

    #[test]
    fn test_text_trims_cut_utf8() {
        let mut entry = LogEntry::default();
        entry.msg[..3].copy_from_slice(&[b'a', 0xC2, 0xB5]); // "aµ"
        entry.len = 2;
        assert_eq!(entry.text(), "a");
    }

    #[test]
    fn test_format_to_buffer() {
        let mut buf = [0u8; 32];
        let len = format_to_buffer(&mut buf, format_args!("Hello {}", 42));
        assert_eq!(&buf[..len], b"Hello 42");
    }

    #[test]
    fn test_diag_macro() {
        let stream = LogStream::<8>::new();
        crate::diag_warn!(stream, 77, "{}-bit {}", 32, "NEC");
        let entry = stream.drain().unwrap();
        assert_eq!(entry.level, LogLevel::Warn);
        assert_eq!(entry.text(), "32-bit NEC");
    }

    #[test]
    fn test_concurrent_producers() {
        use std::sync::Arc;
        use std::thread;

        let stream = Arc::new(LogStream::<64>::new());
        let mut handles = vec![];

        for i in 0..4 {
            let stream = Arc::clone(&stream);
            handles.push(thread::spawn(move || {
                for j in 0..10 {
                    let msg = format!("Thread {} msg {}", i, j);
                    stream.push(j, LogLevel::Info, msg.as_bytes());
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        let mut count = 0;
        while let Some(entry) = stream.drain() {
            assert!(entry.text().starts_with("Thread "));
            count += 1;
        }
        assert_eq!(count, 40, "All messages should be present");
    }
}

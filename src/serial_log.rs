//! Serial diagnostics output.
//!
//! Drains the log stream from the main loop, a few entries per tick, so
//! printing never holds the loop long enough to starve the watchdog.
//!
//! # Hardware Setup
//!
//! ```text
//! ESP32 UART0 TX ──────▶ USB-UART bridge ──▶ PC Serial Monitor (115200 8N1)
//! ```

use core::fmt::Write;

use crate::logging::{BufWriter, LogEntry, LogStream};

#[cfg(target_os = "espidf")]
use esp_idf_svc::hal::gpio;
#[cfg(target_os = "espidf")]
use esp_idf_svc::hal::peripheral::Peripheral;
#[cfg(target_os = "espidf")]
use esp_idf_svc::hal::uart::{self, UartTxDriver};

/// Entries written per `drain_to` call by default.
pub const DRAIN_BUDGET: usize = 4;

/// Format log entry to text.
///
/// Format: `[ssssss.mmm] LEVEL: message\n`
pub fn format_log_entry(entry: &LogEntry, buf: &mut [u8]) -> usize {
    let mut writer = BufWriter { buf, pos: 0 };

    let _ = writeln!(
        writer,
        "[{:06}.{:03}] {}: {}",
        entry.timestamp_ms / 1000,
        entry.timestamp_ms % 1000,
        entry.level.as_str(),
        entry.text()
    );

    writer.pos
}

/// Drain up to `budget` entries into `out`.
///
/// Reports dropped messages first, if any. Returns the number of entries
/// written.
pub fn drain_to<const N: usize>(stream: &LogStream<N>, out: &mut dyn Write, budget: usize) -> usize {
    let dropped = stream.take_dropped();
    if dropped > 0 {
        let _ = writeln!(out, "[WARN] Dropped: {} log messages", dropped);
    }

    let mut format_buf = [0u8; 160];
    let mut written = 0;
    while written < budget {
        let Some(entry) = stream.drain() else {
            break;
        };
        let len = format_log_entry(&entry, &mut format_buf);
        // Formatter output is always valid UTF-8
        if let Ok(line) = core::str::from_utf8(&format_buf[..len]) {
            let _ = out.write_str(line);
        }
        written += 1;
    }
    written
}

/// UART configuration for diagnostics.
pub struct SerialLogConfig {
    pub baud_rate: u32,
}

impl Default for SerialLogConfig {
    fn default() -> Self {
        Self {
            baud_rate: crate::config::BAUD_RATE,
        }
    }
}

/// `fmt::Write` over a TX-only UART driver.
#[cfg(target_os = "espidf")]
pub struct UartSink<'d> {
    uart: UartTxDriver<'d>,
}

#[cfg(target_os = "espidf")]
impl Write for UartSink<'_> {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        self.uart
            .write(s.as_bytes())
            .map(|_| ())
            .map_err(|_| core::fmt::Error)
    }
}

/// Initialize UART0 TX-only for diagnostics.
#[cfg(target_os = "espidf")]
pub fn init_serial_log<'d>(
    uart: impl Peripheral<P = uart::UART0> + 'd,
    tx_pin: impl Peripheral<P = impl gpio::OutputPin> + 'd,
    config: &SerialLogConfig,
) -> Result<UartSink<'d>, esp_idf_svc::sys::EspError> {
    let uart_config = uart::config::Config::default()
        .baudrate(esp_idf_svc::hal::units::Hertz(config.baud_rate));

    let uart = UartTxDriver::new(
        uart,
        tx_pin,
        Option::<gpio::AnyIOPin>::None, // CTS
        Option::<gpio::AnyIOPin>::None, // RTS
        &uart_config,
    )?;
    Ok(UartSink { uart })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::LogLevel;

    #[test]
    fn test_format_log_entry() {
        let stream = LogStream::<4>::new();
        stream.push(1_234_567, LogLevel::Info, b"Hello world");
        let entry = stream.drain().unwrap();

        let mut buf = [0u8; 160];
        let len = format_log_entry(&entry, &mut buf);

        let formatted = core::str::from_utf8(&buf[..len]).unwrap();
        assert_eq!(formatted, "[001234.567] INFO: Hello world\n");
    }

    #[test]
    fn test_drain_respects_budget() {
        let stream = LogStream::<8>::new();
        for i in 0..5 {
            stream.push(i, LogLevel::Debug, b"x");
        }

        let mut out = std::string::String::new();
        assert_eq!(drain_to(&stream, &mut out, 3), 3);
        assert_eq!(out.lines().count(), 3);
        assert_eq!(drain_to(&stream, &mut out, 3), 2);
        assert_eq!(drain_to(&stream, &mut out, 3), 0);
    }

    #[test]
    fn test_drain_reports_drops() {
        let stream = LogStream::<2>::new();
        for i in 0..4 {
            stream.push(i, LogLevel::Error, b"boom");
        }

        let mut out = std::string::String::new();
        drain_to(&stream, &mut out, DRAIN_BUDGET);
        assert!(out.starts_with("[WARN] Dropped: 2 log messages"));
        assert!(out.contains("ERROR: boom"));
    }
}

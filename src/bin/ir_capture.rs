//! Receiver node: capture IR remote signals and forward them over ESP-NOW.

#![no_std]
#![no_main]

use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::gpio::{AnyInputPin, AnyOutputPin};
use esp_idf_svc::hal::prelude::Peripherals;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::sys::{self as esp_idf_sys, EspError};
use esp_idf_svc::wifi::{ClientConfiguration, Configuration, EspWifi};

use rust_ir_repeater::config::{RECEIVER_CAPTURE, RECEIVER_LINK};
use rust_ir_repeater::hal::{EspNowTransport, RmtCapture, StatusLed};
use rust_ir_repeater::log_globals::LOG;
use rust_ir_repeater::serial_log::{drain_to, init_serial_log, SerialLogConfig, DRAIN_BUDGET};
use rust_ir_repeater::{diag_info, sanity, CaptureForwarder, LinkContext, PeerAddress};

static CONTEXT: LinkContext = LinkContext::new(&LOG, millis);

fn millis() -> u32 {
    // SAFETY: plain read of the monotonic timer
    (unsafe { esp_idf_sys::esp_timer_get_time() } / 1000) as u32
}

#[no_mangle]
fn main() {
    esp_idf_sys::link_patches();

    if let Err(e) = sanity::check() {
        panic!("wire format self-check failed: {}", e);
    }

    if let Err(e) = run() {
        panic!("Receiver startup failed: {}", e);
    }
}

fn run() -> Result<(), EspError> {
    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;

    #[cfg(feature = "esp32c3")]
    let uart_tx = peripherals.pins.gpio21;
    #[cfg(not(feature = "esp32c3"))]
    let uart_tx = peripherals.pins.gpio1;
    let mut serial = init_serial_log(peripherals.uart0, uart_tx, &SerialLogConfig::default())?;

    // Station mode only, ESP-NOW needs the radio running
    let mut wifi = EspWifi::new(peripherals.modem, sysloop, Some(nvs))?;
    wifi.set_configuration(&Configuration::Client(ClientConfiguration::default()))?;
    wifi.start()?;
    // ESP-NOW needs the radio awake
    esp_idf_sys::esp!(unsafe {
        esp_idf_sys::esp_wifi_set_ps(esp_idf_sys::wifi_ps_type_t_WIFI_PS_NONE)
    })?;
    let mac = wifi.sta_netif().get_mac()?;
    diag_info!(CONTEXT.log, millis(), "IRrecv MAC Address: {}", PeerAddress(mac));

    // SAFETY: pin numbers come from the board config and are not claimed elsewhere
    let recv_pin = unsafe { AnyInputPin::new(RECEIVER_CAPTURE.recv_pin) };
    let led_pin = unsafe { AnyOutputPin::new(RECEIVER_LINK.status_led_pin) };

    let decoder = RmtCapture::new(peripherals.rmt.channel2, recv_pin, &RECEIVER_CAPTURE)?;
    let mut led = StatusLed::new(led_pin)?;

    let mut forwarder = CaptureForwarder::new(
        decoder,
        EspNowTransport::new(&CONTEXT),
        &CONTEXT,
        RECEIVER_CAPTURE,
        RECEIVER_LINK,
    );
    // Link failures are already logged, keep capturing
    let _ = forwarder.setup();
    diag_info!(
        CONTEXT.log,
        millis(),
        "{} waiting for IR input on pin {}",
        env!("VERSION_STRING"),
        RECEIVER_CAPTURE.recv_pin
    );

    loop {
        let tick = forwarder.tick(millis());
        if let Some(indicator) = tick.heartbeat {
            led.show(indicator)?;
        }
        drain_to(&LOG, &mut serial, DRAIN_BUDGET);

        // SAFETY: FreeRTOS delay, yields to the idle task
        unsafe {
            esp_idf_sys::vTaskDelay(1);
        }
    }
}

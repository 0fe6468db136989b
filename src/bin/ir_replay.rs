//! Transmitter node: replay IR signals received over ESP-NOW.

#![no_std]
#![no_main]

use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::gpio::AnyOutputPin;
use esp_idf_svc::hal::prelude::Peripherals;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::sys::{self as esp_idf_sys, EspError};
use esp_idf_svc::wifi::{ClientConfiguration, Configuration, EspWifi};

use rust_ir_repeater::config::{TRANSMITTER_LINK, TRANSMITTER_REPLAY};
use rust_ir_repeater::hal::{EspNowTransport, RmtEmitter, StatusLed};
use rust_ir_repeater::log_globals::LOG;
use rust_ir_repeater::serial_log::{drain_to, init_serial_log, SerialLogConfig, DRAIN_BUDGET};
use rust_ir_repeater::{diag_error, diag_info, sanity, LinkContext, PeerAddress, Replayer};

static CONTEXT: LinkContext = LinkContext::new(&LOG, millis);

fn millis() -> u32 {
    // SAFETY: plain read of the monotonic timer
    (unsafe { esp_idf_sys::esp_timer_get_time() } / 1000) as u32
}

#[no_mangle]
fn main() {
    esp_idf_sys::link_patches();

    if let Err(e) = sanity::check() {
        diag_error!(CONTEXT.log, millis(), "Wire format self-check failed: {}", e);
    }

    if let Err(e) = run() {
        panic!("Transmitter startup failed: {}", e);
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

    let mut wifi = EspWifi::new(peripherals.modem, sysloop, Some(nvs))?;
    wifi.set_configuration(&Configuration::Client(ClientConfiguration::default()))?;
    wifi.start()?;
    // ESP-NOW needs the radio awake
    esp_idf_sys::esp!(unsafe {
        esp_idf_sys::esp_wifi_set_ps(esp_idf_sys::wifi_ps_type_t_WIFI_PS_NONE)
    })?;
    let mac = wifi.sta_netif().get_mac()?;
    diag_info!(CONTEXT.log, millis(), "IRsend MAC Address: {}", PeerAddress(mac));

    // SAFETY: pin numbers come from the board config and are not claimed elsewhere
    let ir_pin = unsafe { AnyOutputPin::new(TRANSMITTER_REPLAY.led_pin) };
    let led_pin = unsafe { AnyOutputPin::new(TRANSMITTER_LINK.status_led_pin) };

    let encoder = RmtEmitter::new(
        peripherals.rmt.channel0,
        ir_pin,
        &TRANSMITTER_REPLAY,
        &CONTEXT,
    )?;
    let mut led = StatusLed::new(led_pin)?;

    let mut replayer = Replayer::new(
        encoder,
        EspNowTransport::new(&CONTEXT),
        &CONTEXT,
        TRANSMITTER_REPLAY,
        TRANSMITTER_LINK,
    );
    let _ = replayer.setup();
    diag_info!(
        CONTEXT.log,
        millis(),
        "{} replaying on pin {}",
        env!("VERSION_STRING"),
        TRANSMITTER_REPLAY.led_pin
    );

    loop {
        let tick = replayer.tick(millis());
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

//! Link liveness LED.

use esp_idf_svc::hal::gpio::{AnyOutputPin, Output, PinDriver};
use esp_idf_svc::sys::EspError;

use crate::heartbeat::Indicator;

/// LED on while the link is up.
pub struct StatusLed {
    pin: PinDriver<'static, AnyOutputPin, Output>,
}

impl StatusLed {
    /// Drive `pin`, starting with the LED off.
    pub fn new(pin: AnyOutputPin) -> Result<Self, EspError> {
        let mut pin = PinDriver::output(pin)?;
        pin.set_low()?;
        Ok(Self { pin })
    }

    pub fn show(&mut self, indicator: Indicator) -> Result<(), EspError> {
        match indicator {
            Indicator::Up => self.pin.set_high(),
            Indicator::Down => self.pin.set_low(),
        }
    }
}

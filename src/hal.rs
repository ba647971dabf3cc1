//! `embedded-hal` adapters
//!
//! [`SpiTransport`] drives the serial interface over an [`SpiBus`] with a
//! dedicated chip-select pin. [`PinControl`] drives RESET, START and PWDN
//! and samples the active-low DRDY line.

use embedded_hal::digital::{Error as _, InputPin, OutputPin, PinState};
use embedded_hal::spi::{Error as _, SpiBus};

use crate::error::TransportError;
use crate::transport::{DigitalControl, Transport};

fn bus_error<E: embedded_hal::spi::Error>(err: E) -> TransportError {
    TransportError::Bus(format!("{:?}", err.kind()))
}

fn pin_error<E: embedded_hal::digital::Error>(line: &'static str, err: E) -> TransportError {
    TransportError::Pin {
        line,
        reason: format!("{:?}", err.kind()),
    }
}

/// [`Transport`] over an SPI bus and a chip-select output
///
/// The bus must be configured for SPI mode 1 (CPOL = 0, CPHA = 1).
pub struct SpiTransport<SPI, CS> {
    spi: SPI,
    cs: CS,
}

impl<SPI, CS> SpiTransport<SPI, CS>
where
    SPI: SpiBus<u8>,
    CS: OutputPin,
{
    /// Wrap a bus and its chip-select pin
    pub fn new(spi: SPI, cs: CS) -> Self {
        Self { spi, cs }
    }

    /// Give back the bus and chip-select pin
    pub fn release(self) -> (SPI, CS) {
        (self.spi, self.cs)
    }
}

impl<SPI, CS> Transport for SpiTransport<SPI, CS>
where
    SPI: SpiBus<u8>,
    CS: OutputPin,
{
    fn init(&mut self) -> Result<(), TransportError> {
        self.cs.set_high().map_err(|e| pin_error("CS", e))?;
        self.spi.flush().map_err(bus_error)
    }

    fn select(&mut self) -> Result<(), TransportError> {
        self.cs.set_low().map_err(|e| pin_error("CS", e))
    }

    fn deselect(&mut self) -> Result<(), TransportError> {
        // Chip select must not rise while bits are still shifting out
        let flushed = self.spi.flush().map_err(bus_error);
        self.cs.set_high().map_err(|e| pin_error("CS", e))?;
        flushed
    }

    fn exchange_byte(&mut self, byte: u8) -> Result<u8, TransportError> {
        let mut buf = [byte];
        self.spi.transfer_in_place(&mut buf).map_err(bus_error)?;
        Ok(buf[0])
    }

    fn exchange(&mut self, buf: &mut [u8]) -> Result<(), TransportError> {
        self.spi.transfer_in_place(buf).map_err(bus_error)
    }
}

/// [`DigitalControl`] over `embedded-hal` pins
pub struct PinControl<RST, START, PWDN, DRDY> {
    reset: RST,
    start: START,
    power_down: PWDN,
    drdy: DRDY,
}

impl<RST, START, PWDN, DRDY> PinControl<RST, START, PWDN, DRDY>
where
    RST: OutputPin,
    START: OutputPin,
    PWDN: OutputPin,
    DRDY: InputPin,
{
    /// Wrap the four control lines
    pub fn new(reset: RST, start: START, power_down: PWDN, drdy: DRDY) -> Self {
        Self {
            reset,
            start,
            power_down,
            drdy,
        }
    }

    /// Give back the pins
    pub fn release(self) -> (RST, START, PWDN, DRDY) {
        (self.reset, self.start, self.power_down, self.drdy)
    }
}

impl<RST, START, PWDN, DRDY> DigitalControl for PinControl<RST, START, PWDN, DRDY>
where
    RST: OutputPin,
    START: OutputPin,
    PWDN: OutputPin,
    DRDY: InputPin,
{
    fn set_reset(&mut self, level: PinState) -> Result<(), TransportError> {
        self.reset.set_state(level).map_err(|e| pin_error("RESET", e))
    }

    fn set_start(&mut self, level: PinState) -> Result<(), TransportError> {
        self.start.set_state(level).map_err(|e| pin_error("START", e))
    }

    fn set_power_down(&mut self, level: PinState) -> Result<(), TransportError> {
        self.power_down.set_state(level).map_err(|e| pin_error("PWDN", e))
    }

    /// DRDY is driven low while a frame is waiting
    fn data_ready(&mut self) -> Result<bool, TransportError> {
        self.drdy.is_low().map_err(|e| pin_error("DRDY", e))
    }
}

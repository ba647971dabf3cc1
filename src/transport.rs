//! Bus and control-line capabilities
//!
//! The driver never owns the physical SPI bus or GPIO pins. It talks to the
//! device through these two traits; [`crate::hal`] implements them over
//! `embedded-hal` and [`crate::mock`] over an in-memory simulator.
//!
//! Timing between transactions is not the transport's job: the protocol
//! layer waits the decode delay itself after every transaction.

use embedded_hal::digital::PinState;

use crate::error::TransportError;

/// Byte-level access to the device's serial interface
pub trait Transport {
    /// Prepare the bus for use
    fn init(&mut self) -> Result<(), TransportError> {
        Ok(())
    }

    /// Assert chip select
    fn select(&mut self) -> Result<(), TransportError>;

    /// Release chip select
    fn deselect(&mut self) -> Result<(), TransportError>;

    /// Clock one byte out and return the byte clocked in
    fn exchange_byte(&mut self, byte: u8) -> Result<u8, TransportError>;

    /// Exchange a buffer in place, byte by byte
    fn exchange(&mut self, buf: &mut [u8]) -> Result<(), TransportError> {
        for byte in buf.iter_mut() {
            *byte = self.exchange_byte(*byte)?;
        }
        Ok(())
    }
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn init(&mut self) -> Result<(), TransportError> {
        T::init(self)
    }

    fn select(&mut self) -> Result<(), TransportError> {
        T::select(self)
    }

    fn deselect(&mut self) -> Result<(), TransportError> {
        T::deselect(self)
    }

    fn exchange_byte(&mut self, byte: u8) -> Result<u8, TransportError> {
        T::exchange_byte(self, byte)
    }

    fn exchange(&mut self, buf: &mut [u8]) -> Result<(), TransportError> {
        T::exchange(self, buf)
    }
}

/// Reset, start and power-down outputs plus the data-ready input
///
/// Levels are the electrical pin levels: RESET and PWDN are active low, so
/// `High` keeps the device running.
pub trait DigitalControl {
    /// Drive the RESET line
    fn set_reset(&mut self, level: PinState) -> Result<(), TransportError>;

    /// Drive the START line
    fn set_start(&mut self, level: PinState) -> Result<(), TransportError>;

    /// Drive the PWDN line
    fn set_power_down(&mut self, level: PinState) -> Result<(), TransportError>;

    /// Whether a new frame is available (DRDY asserted)
    fn data_ready(&mut self) -> Result<bool, TransportError>;
}

impl<C: DigitalControl + ?Sized> DigitalControl for &mut C {
    fn set_reset(&mut self, level: PinState) -> Result<(), TransportError> {
        C::set_reset(self, level)
    }

    fn set_start(&mut self, level: PinState) -> Result<(), TransportError> {
        C::set_start(self, level)
    }

    fn set_power_down(&mut self, level: PinState) -> Result<(), TransportError> {
        C::set_power_down(self, level)
    }

    fn data_ready(&mut self) -> Result<bool, TransportError> {
        C::data_ready(self)
    }
}

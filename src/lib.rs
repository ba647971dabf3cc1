//! ADS1299 Analog Front End Driver for Rust
//!
//! This crate drives the Texas Instruments ADS1299, an 8-channel 24-bit
//! biopotential ADC, over its serial command interface.
//!
//! # Features
//!
//! - Typed register codec for every control register
//! - Command protocol with an explicit idle / continuous-read state machine
//! - Power-up, reset and identification sequence (4, 6 and 8 channel parts)
//! - Default configuration as a plain, inspectable table
//! - 24-bit sample frame decoding with status word and sync check
//! - `embedded-hal` 1.0 adapters and an in-memory device simulator
//!
//! # Example
//!
//! ```no_run
//! use ads1299::hal::{PinControl, SpiTransport};
//! use ads1299::{Ads1299, DefaultConfig};
//! # fn run<SPI, CS, RST, START, PWDN, DRDY, D>(
//! #     spi: SPI, cs: CS, rst: RST, start: START, pwdn: PWDN, drdy: DRDY, delay: D,
//! # ) -> ads1299::Result<()>
//! # where
//! #     SPI: embedded_hal::spi::SpiBus<u8>,
//! #     CS: embedded_hal::digital::OutputPin,
//! #     RST: embedded_hal::digital::OutputPin,
//! #     START: embedded_hal::digital::OutputPin,
//! #     PWDN: embedded_hal::digital::OutputPin,
//! #     DRDY: embedded_hal::digital::InputPin,
//! #     D: embedded_hal::delay::DelayNs,
//! # {
//!
//! let mut adc = Ads1299::new(
//!     SpiTransport::new(spi, cs),
//!     PinControl::new(rst, start, pwdn, drdy),
//!     delay,
//! );
//!
//! let id = adc.power_up()?;
//! println!("{}", id);
//! adc.configure_defaults(&DefaultConfig::default())?;
//! adc.start_streaming()?;
//!
//! loop {
//!     if !adc.data_ready()? {
//!         continue;
//!     }
//!     let frame = adc.read_frame()?;
//!     if frame.is_synced() {
//!         println!("{}", frame);
//!     }
//! }
//! # }
//! ```

pub mod config;
pub mod constants;
pub mod device;
pub mod error;
pub mod frame;
pub mod hal;
pub mod mock;
pub mod protocol;
pub mod registers;
pub mod transport;

// Re-export main types at crate root
pub use constants::{frame_size, MAX_CHANNELS, MAX_FRAME_SIZE, MIN_CHANNELS, REGISTER_COUNT};

pub use config::{DefaultConfig, RegisterWrite, Timing};
pub use device::{Ads1299, DeviceState};
pub use error::{Ads1299Error, Result, TransportError};
pub use frame::{decode_frame, sign_extend_24, SampleFrame, StatusWord};
pub use protocol::{Command, CommandProtocol, ProtocolState};
pub use registers::{
    register_dump, ChannelSettings, Config1, Config2, Config3, Config4, DataRate, DeviceId, Gain,
    GpioConfig, InputMux, LeadOffConfig, LeadOffCurrent, LeadOffFrequency, LeadOffThreshold,
    Misc1, TestFrequency,
};
pub use transport::{DigitalControl, Transport};

//! Error types for the ADS1299 driver
//!
//! This module defines the error types used throughout the library
//! for handling transport failures, invalid arguments and protocol
//! state violations.

use thiserror::Error;

/// Result type alias for ADS1299 operations
pub type Result<T> = std::result::Result<T, Ads1299Error>;

/// Failure reported by a [`Transport`](crate::transport::Transport) or
/// [`DigitalControl`](crate::transport::DigitalControl) implementation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Byte exchange on the serial bus failed
    #[error("Bus error: {0}")]
    Bus(String),

    /// Driving or sampling a control line failed
    #[error("Control line {line} failed: {reason}")]
    Pin { line: &'static str, reason: String },
}

/// Error types for ADS1299 operations
#[derive(Error, Debug)]
pub enum Ads1299Error {
    /// Transport or control-line failure
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Channel index outside the active channel range
    #[error("Invalid channel {channel} (device has {channel_count} channels)")]
    InvalidChannel { channel: u8, channel_count: u8 },

    /// Register address outside the register map
    #[error("Invalid register address 0x{0:02X}")]
    InvalidRegister(u8),

    /// Burst access running past the end of the register map
    #[error("Register burst of {count} at 0x{start:02X} exceeds the register map")]
    InvalidBurst { start: u8, count: usize },

    /// Write attempted on a read-only register
    #[error("Register 0x{0:02X} is read-only")]
    ReadOnlyRegister(u8),

    /// ID register does not carry the ADS1299 family code
    #[error("Device ID mismatch: read 0x{id:02X}, family bits 0b{family:02b}")]
    DeviceMismatch { id: u8, family: u8 },

    /// Register access attempted while the device is streaming
    #[error("Register access not allowed in continuous read mode")]
    StreamingActive,

    /// Streaming frame read attempted while the device is idle
    #[error("Device is not in continuous read mode")]
    NotStreaming,

    /// Byte block does not match the frame size for the channel count
    #[error("Invalid frame length: expected {expected} bytes, got {actual}")]
    InvalidFrameLength { expected: usize, actual: usize },

    /// Unsupported channel count for frame decoding
    #[error("Unsupported channel count: {0}")]
    InvalidChannelCount(u8),

    /// Register holds a value with a reserved field encoding
    #[error("Register 0x{address:02X} holds reserved value 0x{value:02X}")]
    InvalidRegisterValue { address: u8, value: u8 },

    /// Operation requires a completed power-up sequence
    #[error("Device not powered up")]
    NotPoweredUp,
}

impl Ads1299Error {
    /// Check if this error came from the transport or a control line
    pub fn is_transport_error(&self) -> bool {
        matches!(self, Ads1299Error::Transport(_))
    }

    /// Check if this error is a caller argument error (no I/O was performed)
    pub fn is_invalid_argument(&self) -> bool {
        matches!(
            self,
            Ads1299Error::InvalidChannel { .. }
                | Ads1299Error::InvalidRegister(_)
                | Ads1299Error::InvalidBurst { .. }
                | Ads1299Error::ReadOnlyRegister(_)
                | Ads1299Error::InvalidFrameLength { .. }
                | Ads1299Error::InvalidChannelCount(_)
        )
    }

    /// Check if this error is fatal to the session
    pub fn is_fatal(&self) -> bool {
        matches!(self, Ads1299Error::DeviceMismatch { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        let err = Ads1299Error::InvalidChannel {
            channel: 9,
            channel_count: 8,
        };
        assert!(err.is_invalid_argument());
        assert!(!err.is_transport_error());

        let err: Ads1299Error = TransportError::Bus("overrun".into()).into();
        assert!(err.is_transport_error());
        assert!(!err.is_fatal());

        let err = Ads1299Error::DeviceMismatch { id: 0x92, family: 0 };
        assert!(err.is_fatal());
    }

    #[test]
    fn test_error_display() {
        let err = Ads1299Error::DeviceMismatch { id: 0x30, family: 0 };
        assert_eq!(
            err.to_string(),
            "Device ID mismatch: read 0x30, family bits 0b00"
        );
        let err = Ads1299Error::InvalidFrameLength {
            expected: 15,
            actual: 14,
        };
        assert_eq!(
            err.to_string(),
            "Invalid frame length: expected 15 bytes, got 14"
        );
    }
}

//! ADS1299 sample frame decoding
//!
//! Every conversion produces a frame of `3 + 3 * channels` bytes: a 24-bit
//! status word followed by one 24-bit two's-complement sample per channel,
//! all MSB first.

use crate::constants::{
    frame_size, MAX_CHANNELS, SAMPLE_BYTES, STATUS_BYTES, STATUS_GPIO_MASK, STATUS_LOFF_N_SHIFT,
    STATUS_LOFF_P_SHIFT, STATUS_SYNC_MASK, STATUS_SYNC_VALUE,
};
use crate::error::{Ads1299Error, Result};
use crate::registers::channel_bit;

/// Assemble three bytes MSB-first into an unsigned 24-bit value
pub fn be24(bytes: [u8; 3]) -> u32 {
    (bytes[0] as u32) << 16 | (bytes[1] as u32) << 8 | bytes[2] as u32
}

/// Decode a big-endian 24-bit two's-complement sample
pub fn sign_extend_24(bytes: [u8; 3]) -> i32 {
    let raw = be24(bytes);
    if raw & 0x0080_0000 != 0 {
        (raw | 0xFF00_0000) as i32
    } else {
        raw as i32
    }
}

/// Frame status word
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct StatusWord(u32);

impl StatusWord {
    /// Wrap a raw status value (only the low 24 bits are kept)
    pub fn new(raw: u32) -> Self {
        Self(raw & 0x00FF_FFFF)
    }

    /// Raw 24-bit value
    pub fn raw(&self) -> u32 {
        self.0
    }

    /// Top nibble, expected to be `0xC`
    pub fn sync_nibble(&self) -> u8 {
        ((self.0 & STATUS_SYNC_MASK) >> 20) as u8
    }

    /// Check the frame alignment marker
    pub fn has_sync(&self) -> bool {
        self.0 & STATUS_SYNC_MASK == STATUS_SYNC_VALUE
    }

    /// Lead-off mask for positive inputs (bit n-1 = channel n)
    pub fn lead_off_p(&self) -> u8 {
        (self.0 >> STATUS_LOFF_P_SHIFT) as u8
    }

    /// Lead-off mask for negative inputs (bit n-1 = channel n)
    pub fn lead_off_n(&self) -> u8 {
        (self.0 >> STATUS_LOFF_N_SHIFT) as u8
    }

    /// Check if the positive electrode of a channel is off
    pub fn is_lead_off_p(&self, channel: u8) -> bool {
        channel_bit(self.lead_off_p(), channel)
    }

    /// Check if the negative electrode of a channel is off
    pub fn is_lead_off_n(&self, channel: u8) -> bool {
        channel_bit(self.lead_off_n(), channel)
    }

    /// GPIO[4:1] input levels
    pub fn gpio(&self) -> u8 {
        (self.0 & STATUS_GPIO_MASK) as u8
    }
}

impl std::fmt::Debug for StatusWord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusWord")
            .field("raw", &format_args!("0x{:06X}", self.0))
            .field("sync", &self.has_sync())
            .field("lead_off_p", &format_args!("0x{:02X}", self.lead_off_p()))
            .field("lead_off_n", &format_args!("0x{:02X}", self.lead_off_n()))
            .field("gpio", &format_args!("0x{:X}", self.gpio()))
            .finish()
    }
}

/// One decoded conversion: status plus one sample per channel
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SampleFrame {
    pub status: StatusWord,
    pub channels: Vec<i32>,
}

impl SampleFrame {
    /// Decode a frame block for `channel_count` channels
    ///
    /// Fails only if the block length does not match the channel count. A
    /// frame with a bad sync nibble still decodes; check [`Self::is_synced`].
    pub fn from_bytes(data: &[u8], channel_count: u8) -> Result<Self> {
        if channel_count == 0 || channel_count > MAX_CHANNELS {
            return Err(Ads1299Error::InvalidChannelCount(channel_count));
        }
        let expected = frame_size(channel_count);
        if data.len() != expected {
            return Err(Ads1299Error::InvalidFrameLength {
                expected,
                actual: data.len(),
            });
        }

        let status = StatusWord::new(be24([data[0], data[1], data[2]]));
        let channels = data[STATUS_BYTES..]
            .chunks_exact(SAMPLE_BYTES)
            .map(|c| sign_extend_24([c[0], c[1], c[2]]))
            .collect();

        Ok(Self { status, channels })
    }

    /// Check the status word carries the sync pattern
    pub fn is_synced(&self) -> bool {
        self.status.has_sync()
    }

    /// Sample of a 1-based channel
    pub fn channel(&self, channel: u8) -> Option<i32> {
        let index = (channel as usize).checked_sub(1)?;
        self.channels.get(index).copied()
    }

    /// Number of channel samples in the frame
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }
}

/// Decode a frame block and report whether it is in sync
///
/// Values are always returned; a `false` flag means the data is not
/// trustworthy even though the correct number of bytes was consumed.
pub fn decode_frame(data: &[u8], channel_count: u8) -> Result<(SampleFrame, bool)> {
    let frame = SampleFrame::from_bytes(data, channel_count)?;
    let synced = frame.is_synced();
    Ok((frame, synced))
}

impl std::fmt::Display for SampleFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let samples = self
            .channels
            .iter()
            .map(|v| format!("{:>9}", v))
            .collect::<Vec<_>>()
            .join(" ");
        let sync = if self.is_synced() { "" } else { " NOSYNC" };
        write!(f, "S:{:06X}{}  [{}]", self.status.raw(), sync, samples)
    }
}

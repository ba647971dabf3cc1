//! ADS1299 register codec
//!
//! Typed views of the control registers. Every register has a `to_byte`
//! encoder and a `from_byte` decoder; the free functions at the bottom cover
//! channel address arithmetic, channel masks and the field-preserving bit
//! updates used by read-modify-write setters.

use crate::constants::*;
use crate::error::{Ads1299Error, Result};

// ============================================================================
// Field enums
// ============================================================================

/// Programmable gain setting (CHnSET bits [6:4])
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Gain {
    X1 = 0b000,
    X2 = 0b001,
    X4 = 0b010,
    X6 = 0b011,
    X8 = 0b100,
    X12 = 0b101,
    X24 = 0b110,
}

impl Gain {
    /// All gain levels, lowest first
    pub const ALL: [Gain; 7] = [
        Gain::X1,
        Gain::X2,
        Gain::X4,
        Gain::X6,
        Gain::X8,
        Gain::X12,
        Gain::X24,
    ];

    /// Highest gain the PGA supports
    pub const MAX: Gain = Gain::X24;

    /// Decode the 3-bit field; `0b111` is reserved
    pub fn from_bits(bits: u8) -> Option<Self> {
        Self::ALL.get(bits as usize).copied()
    }

    /// Raw 3-bit field value
    pub fn bits(self) -> u8 {
        self as u8
    }

    /// Get the gain multiplier
    pub fn multiplier(self) -> u8 {
        match self {
            Gain::X1 => 1,
            Gain::X2 => 2,
            Gain::X4 => 4,
            Gain::X6 => 6,
            Gain::X8 => 8,
            Gain::X12 => 12,
            Gain::X24 => 24,
        }
    }
}

/// Channel input multiplexer (CHnSET bits [2:0])
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum InputMux {
    /// Normal electrode input
    Normal = 0b000,
    /// Inputs shorted, for offset and noise measurements
    Shorted = 0b001,
    /// BIASIN measured against BIASREF
    BiasMeasure = 0b010,
    /// Supply measurement
    Supply = 0b011,
    /// Temperature sensor
    Temperature = 0b100,
    /// Internal test signal
    TestSignal = 0b101,
    /// Bias drive on the positive input
    BiasDriveP = 0b110,
    /// Bias drive on the negative input
    BiasDriveN = 0b111,
}

impl InputMux {
    /// All multiplexer sources in field order
    pub const ALL: [InputMux; 8] = [
        InputMux::Normal,
        InputMux::Shorted,
        InputMux::BiasMeasure,
        InputMux::Supply,
        InputMux::Temperature,
        InputMux::TestSignal,
        InputMux::BiasDriveP,
        InputMux::BiasDriveN,
    ];

    /// Decode the 3-bit field (every value is defined)
    pub fn from_bits(bits: u8) -> Self {
        Self::ALL[(bits & CH_MUX_MASK) as usize]
    }

    /// Raw 3-bit field value
    pub fn bits(self) -> u8 {
        self as u8
    }
}

/// Output data rate (CONFIG1 bits [2:0])
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DataRate {
    Sps16000 = 0b000,
    Sps8000 = 0b001,
    Sps4000 = 0b010,
    Sps2000 = 0b011,
    Sps1000 = 0b100,
    Sps500 = 0b101,
    Sps250 = 0b110,
}

impl DataRate {
    /// Decode the 3-bit field; `0b111` is reserved
    pub fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            0b000 => Some(DataRate::Sps16000),
            0b001 => Some(DataRate::Sps8000),
            0b010 => Some(DataRate::Sps4000),
            0b011 => Some(DataRate::Sps2000),
            0b100 => Some(DataRate::Sps1000),
            0b101 => Some(DataRate::Sps500),
            0b110 => Some(DataRate::Sps250),
            _ => None,
        }
    }

    /// Raw 3-bit field value
    pub fn bits(self) -> u8 {
        self as u8
    }

    /// Get sample rate in Hz
    pub fn hz(self) -> u32 {
        16_000 >> (self as u32)
    }
}

/// Internal test signal frequency (CONFIG2 bits [1:0])
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TestFrequency {
    /// fCLK / 2^21
    ClkDiv21 = 0b00,
    /// fCLK / 2^20
    ClkDiv20 = 0b01,
    /// DC level
    Dc = 0b11,
}

impl TestFrequency {
    /// Decode the 2-bit field; `0b10` is reserved
    pub fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            0b00 => Some(TestFrequency::ClkDiv21),
            0b01 => Some(TestFrequency::ClkDiv20),
            0b11 => Some(TestFrequency::Dc),
            _ => None,
        }
    }
}

/// Lead-off comparator threshold, positive side (LOFF bits [7:5])
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum LeadOffThreshold {
    Pct95 = 0b000,
    Pct92_5 = 0b001,
    Pct90 = 0b010,
    Pct87_5 = 0b011,
    Pct85 = 0b100,
    Pct80 = 0b101,
    Pct75 = 0b110,
    Pct70 = 0b111,
}

impl LeadOffThreshold {
    /// Decode the 3-bit field (every value is defined)
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x07 {
            0b000 => LeadOffThreshold::Pct95,
            0b001 => LeadOffThreshold::Pct92_5,
            0b010 => LeadOffThreshold::Pct90,
            0b011 => LeadOffThreshold::Pct87_5,
            0b100 => LeadOffThreshold::Pct85,
            0b101 => LeadOffThreshold::Pct80,
            0b110 => LeadOffThreshold::Pct75,
            _ => LeadOffThreshold::Pct70,
        }
    }
}

/// Lead-off excitation current (LOFF bits [3:2])
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum LeadOffCurrent {
    Na6 = 0b00,
    Na24 = 0b01,
    Ua6 = 0b10,
    Ua24 = 0b11,
}

impl LeadOffCurrent {
    /// Decode the 2-bit field
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0b00 => LeadOffCurrent::Na6,
            0b01 => LeadOffCurrent::Na24,
            0b10 => LeadOffCurrent::Ua6,
            _ => LeadOffCurrent::Ua24,
        }
    }
}

/// Lead-off excitation frequency (LOFF bits [1:0])
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum LeadOffFrequency {
    /// DC lead-off detection
    Dc = 0b00,
    /// AC excitation at 7.8 Hz
    Ac7_8Hz = 0b01,
    /// AC excitation at 31.2 Hz
    Ac31_2Hz = 0b10,
    /// AC excitation at fDR / 4
    AcFdrDiv4 = 0b11,
}

impl LeadOffFrequency {
    /// Decode the 2-bit field
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0b00 => LeadOffFrequency::Dc,
            0b01 => LeadOffFrequency::Ac7_8Hz,
            0b10 => LeadOffFrequency::Ac31_2Hz,
            _ => LeadOffFrequency::AcFdrDiv4,
        }
    }
}

// ============================================================================
// Register views
// ============================================================================

/// Channel settings (CHnSET)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelSettings {
    /// Channel powered (PD bit clear)
    pub powered_on: bool,
    /// PGA gain
    pub gain: Gain,
    /// Input multiplexer source
    pub mux: InputMux,
    /// SRB2 routed to the positive input
    pub srb2: bool,
}

impl Default for ChannelSettings {
    fn default() -> Self {
        Self::new(Gain::MAX, InputMux::Normal)
    }
}

impl ChannelSettings {
    /// Powered-on channel with the given gain and input, SRB2 off
    pub fn new(gain: Gain, mux: InputMux) -> Self {
        Self {
            powered_on: true,
            gain,
            mux,
            srb2: false,
        }
    }

    /// Powered-down channel with its inputs shorted
    pub fn powered_down() -> Self {
        Self {
            powered_on: false,
            gain: Gain::X1,
            mux: InputMux::Shorted,
            srb2: false,
        }
    }

    /// Pack into the register byte
    pub fn to_byte(&self) -> u8 {
        let mut value = (self.gain.bits() << 4) | self.mux.bits();
        if !self.powered_on {
            value |= CH_PD;
        }
        if self.srb2 {
            value |= CH_SRB2;
        }
        value
    }

    /// Unpack from the register byte; `None` if the gain field is reserved
    pub fn from_byte(value: u8) -> Option<Self> {
        Some(Self {
            powered_on: value & CH_PD == 0,
            gain: Gain::from_bits((value & CH_GAIN_MASK) >> 4)?,
            mux: InputMux::from_bits(value & CH_MUX_MASK),
            srb2: value & CH_SRB2 != 0,
        })
    }
}

/// Device identification (ID)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceId {
    /// Raw register value
    pub raw: u8,
}

impl DeviceId {
    /// Wrap a raw ID register value
    pub fn from_byte(raw: u8) -> Self {
        Self { raw }
    }

    /// Silicon revision, bits [7:5]
    pub fn revision(&self) -> u8 {
        (self.raw & ID_REV_MASK) >> 5
    }

    /// Device family code, bits [3:2]
    pub fn family(&self) -> u8 {
        (self.raw & ID_DEV_MASK) >> 2
    }

    /// Check the family bits identify an ADS1299
    pub fn is_ads1299(&self) -> bool {
        self.raw & ID_DEV_MASK == ID_DEV_ADS1299
    }

    /// Channel-count selector, bits [1:0]
    pub fn channel_selector(&self) -> u8 {
        self.raw & ID_NU_CH_MASK
    }

    /// Number of channels the device carries; unknown selectors fall back to 4
    pub fn channel_count(&self) -> u8 {
        match self.channel_selector() {
            0b00 => 4,
            0b01 => 6,
            0b10 => 8,
            _ => MIN_CHANNELS,
        }
    }
}

impl std::fmt::Display for DeviceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "ID: 0x{:02X}\nRevision: {}\nFamily: 0b{:02b}\nChannels: {}",
            self.raw,
            self.revision(),
            self.family(),
            self.channel_count()
        )
    }
}

/// Data rate, daisy chain and clock output (CONFIG1)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config1 {
    /// Daisy-chain readback (clear = multiple readback)
    pub daisy_chain: bool,
    /// Oscillator clock driven on the CLK pin
    pub clock_output: bool,
    /// Output data rate
    pub data_rate: DataRate,
}

impl Config1 {
    /// Pack into the register byte
    ///
    /// `DAISY_EN` is active low: the bit is set for multiple readback.
    pub fn to_byte(&self) -> u8 {
        let mut value = CONFIG1_RESERVED | self.data_rate.bits();
        if !self.daisy_chain {
            value |= CONFIG1_DAISY_EN;
        }
        if self.clock_output {
            value |= CONFIG1_CLK_EN;
        }
        value
    }

    /// Unpack from the register byte; `None` if the data rate is reserved
    pub fn from_byte(value: u8) -> Option<Self> {
        Some(Self {
            daisy_chain: value & CONFIG1_DAISY_EN == 0,
            clock_output: value & CONFIG1_CLK_EN != 0,
            data_rate: DataRate::from_bits(value & CONFIG1_DR_MASK)?,
        })
    }
}

/// Test signal generation (CONFIG2)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config2 {
    /// Test signal generated internally
    pub internal_test_signal: bool,
    /// Double test signal amplitude
    pub amplitude_2x: bool,
    /// Test signal frequency
    pub frequency: TestFrequency,
}

impl Config2 {
    /// Test signals off
    pub fn test_off() -> Self {
        Self {
            internal_test_signal: false,
            amplitude_2x: false,
            frequency: TestFrequency::ClkDiv21,
        }
    }

    /// Pack into the register byte
    pub fn to_byte(&self) -> u8 {
        let mut value = CONFIG2_RESERVED | self.frequency as u8;
        if self.internal_test_signal {
            value |= CONFIG2_INT_CAL;
        }
        if self.amplitude_2x {
            value |= CONFIG2_CAL_AMP;
        }
        value
    }

    /// Unpack from the register byte; `None` if the frequency is reserved
    pub fn from_byte(value: u8) -> Option<Self> {
        Some(Self {
            internal_test_signal: value & CONFIG2_INT_CAL != 0,
            amplitude_2x: value & CONFIG2_CAL_AMP != 0,
            frequency: TestFrequency::from_bits(value & CONFIG2_CAL_FREQ_MASK)?,
        })
    }
}

/// Reference buffer and bias (CONFIG3)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config3 {
    /// Internal reference buffer powered
    pub reference_buffer: bool,
    /// BIASIN routed for measurement
    pub bias_measure: bool,
    /// Bias reference generated internally
    pub bias_ref_internal: bool,
    /// Bias buffer powered
    pub bias_buffer: bool,
    /// Bias lead-off sensing
    pub bias_lead_off_sense: bool,
}

impl Config3 {
    /// Pack into the register byte
    pub fn to_byte(&self) -> u8 {
        let mut value = CONFIG3_RESERVED;
        for (on, flag) in [
            (self.reference_buffer, CONFIG3_PD_REFBUF),
            (self.bias_measure, CONFIG3_BIAS_MEAS),
            (self.bias_ref_internal, CONFIG3_BIASREF_INT),
            (self.bias_buffer, CONFIG3_PD_BIAS),
            (self.bias_lead_off_sense, CONFIG3_BIAS_LOFF_SENS),
        ] {
            value = set_flag(value, flag, on);
        }
        value
    }

    /// Unpack from the register byte (the read-only BIAS_STAT bit is ignored)
    pub fn from_byte(value: u8) -> Self {
        Self {
            reference_buffer: value & CONFIG3_PD_REFBUF != 0,
            bias_measure: value & CONFIG3_BIAS_MEAS != 0,
            bias_ref_internal: value & CONFIG3_BIASREF_INT != 0,
            bias_buffer: value & CONFIG3_PD_BIAS != 0,
            bias_lead_off_sense: value & CONFIG3_BIAS_LOFF_SENS != 0,
        }
    }
}

/// Lead-off control (LOFF)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeadOffConfig {
    pub threshold: LeadOffThreshold,
    pub current: LeadOffCurrent,
    pub frequency: LeadOffFrequency,
}

impl LeadOffConfig {
    /// Pack into the register byte
    pub fn to_byte(&self) -> u8 {
        ((self.threshold as u8) << 5) | ((self.current as u8) << 2) | self.frequency as u8
    }

    /// Unpack from the register byte
    pub fn from_byte(value: u8) -> Self {
        Self {
            threshold: LeadOffThreshold::from_bits((value & LOFF_COMP_TH_MASK) >> 5),
            current: LeadOffCurrent::from_bits((value & LOFF_ILEAD_MASK) >> 2),
            frequency: LeadOffFrequency::from_bits(value & LOFF_FLEAD_MASK),
        }
    }
}

/// General purpose I/O (GPIO)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpioConfig {
    /// Output levels / input readback, GPIO4..GPIO1 in bits [3:0]
    pub data: u8,
    /// Direction, GPIO4..GPIO1 in bits [3:0] (1 = input)
    pub direction: u8,
}

impl GpioConfig {
    /// All four pins as inputs, data cleared
    pub fn all_inputs() -> Self {
        Self {
            data: 0,
            direction: GPIO_DIR_ALL_INPUTS,
        }
    }

    /// Pack into the register byte
    pub fn to_byte(&self) -> u8 {
        ((self.data & 0x0F) << 4) | (self.direction & GPIO_DIR_MASK)
    }

    /// Unpack from the register byte
    pub fn from_byte(value: u8) -> Self {
        Self {
            data: (value & GPIO_DATA_MASK) >> 4,
            direction: value & GPIO_DIR_MASK,
        }
    }
}

/// SRB1 routing (MISC1)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Misc1 {
    /// SRB1 connected to all inverting inputs
    pub srb1: bool,
}

impl Misc1 {
    /// Pack into the register byte
    pub fn to_byte(&self) -> u8 {
        set_flag(0, MISC1_SRB1, self.srb1)
    }

    /// Unpack from the register byte
    pub fn from_byte(value: u8) -> Self {
        Self {
            srb1: value & MISC1_SRB1 != 0,
        }
    }
}

/// Conversion mode and lead-off comparators (CONFIG4)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config4 {
    /// Single-shot conversions (false = continuous)
    pub single_shot: bool,
    /// Lead-off comparators running
    pub lead_off_comparators: bool,
}

impl Config4 {
    /// Pack into the register byte
    pub fn to_byte(&self) -> u8 {
        let value = set_flag(0, CONFIG4_SINGLE_SHOT, self.single_shot);
        with_lead_off_comparators(value, self.lead_off_comparators)
    }

    /// Unpack from the register byte
    pub fn from_byte(value: u8) -> Self {
        let bit_set = value & CONFIG4_PD_LOFF_COMP != 0;
        Self {
            single_shot: value & CONFIG4_SINGLE_SHOT != 0,
            lead_off_comparators: bit_set == LOFF_COMP_ENABLED_WHEN_SET,
        }
    }
}

// ============================================================================
// Address arithmetic and masks
// ============================================================================

/// CHnSET address for a channel in the active range `1..=channel_count`
pub fn channel_address(channel: u8, channel_count: u8) -> Result<u8> {
    if channel == 0 || channel > channel_count.min(MAX_CHANNELS) {
        return Err(Ads1299Error::InvalidChannel {
            channel,
            channel_count,
        });
    }
    Ok(REG_CH1SET + (channel - 1))
}

/// Mask with one bit set for each of the first `channel_count` channels
pub fn active_channel_mask(channel_count: u8) -> u8 {
    match channel_count {
        0 => 0,
        n if n >= MAX_CHANNELS => 0xFF,
        n => (1u8 << n) - 1,
    }
}

/// Drop mask bits for channels beyond `channel_count`
pub fn clip_mask_to_channels(mask: u8, channel_count: u8) -> u8 {
    mask & active_channel_mask(channel_count)
}

/// Test the bit for a 1-based channel in a per-channel mask
pub fn channel_bit(mask: u8, channel: u8) -> bool {
    (1..=MAX_CHANNELS).contains(&channel) && (mask >> (channel - 1)) & 0x01 != 0
}

/// Set or clear a single flag, keeping the other bits
pub fn set_flag(value: u8, flag: u8, on: bool) -> u8 {
    if on {
        value | flag
    } else {
        value & !flag
    }
}

/// Replace the bits under `mask` with `field` (already shifted into place)
pub fn replace_field(value: u8, mask: u8, field: u8) -> u8 {
    (value & !mask) | (field & mask)
}

/// Apply the lead-off comparator enable to a CONFIG4 value
pub fn with_lead_off_comparators(value: u8, enabled: bool) -> u8 {
    set_flag(
        value,
        CONFIG4_PD_LOFF_COMP,
        enabled == LOFF_COMP_ENABLED_WHEN_SET,
    )
}

/// Format a register map read from `REG_ID` onwards, one register per line
pub fn register_dump(registers: &[u8]) -> String {
    registers
        .iter()
        .zip(0u8..)
        .map(|(value, address)| {
            format!(
                "0x{:02X} {:<10} 0x{:02X}  {:08b}\n",
                address,
                register_name(address),
                value,
                value
            )
        })
        .collect()
}

//! ADS1299 protocol constants
//!
//! This module contains the wire-level constants of the ADS1299 serial
//! interface: command opcodes, the register map, register bit fields,
//! status word layout and the timing figures the protocol depends on.

// ============================================================================
// Command Opcodes (datasheet 9.5.3)
// ============================================================================

/// Wake up from standby
pub const CMD_WAKEUP: u8 = 0x02;
/// Enter standby
pub const CMD_STANDBY: u8 = 0x04;
/// Reset the digital core and registers
pub const CMD_RESET: u8 = 0x06;
/// Start conversions
pub const CMD_START: u8 = 0x08;
/// Stop conversions
pub const CMD_STOP: u8 = 0x0A;
/// Enter read-data-continuous (streaming) mode
pub const CMD_RDATAC: u8 = 0x10;
/// Stop read-data-continuous mode
pub const CMD_SDATAC: u8 = 0x11;
/// Read one frame on demand
pub const CMD_RDATA: u8 = 0x12;
/// Read registers; OR with the start address
pub const CMD_RREG: u8 = 0x20;
/// Write registers; OR with the start address
pub const CMD_WREG: u8 = 0x40;
/// Filler byte clocked out while reading
pub const CMD_NOP: u8 = 0x00;

/// Address bits carried by the RREG/WREG opcodes
pub const CMD_ADDR_MASK: u8 = 0x1F;

// ============================================================================
// Register Map (datasheet 9.6)
// ============================================================================

/// Device identification (read-only)
pub const REG_ID: u8 = 0x00;
/// Data rate, daisy chain and clock output
pub const REG_CONFIG1: u8 = 0x01;
/// Test signal generation
pub const REG_CONFIG2: u8 = 0x02;
/// Reference buffer and bias
pub const REG_CONFIG3: u8 = 0x03;
/// Lead-off control
pub const REG_LOFF: u8 = 0x04;
/// Channel 1 settings; CH2SET..CH8SET follow contiguously
pub const REG_CH1SET: u8 = 0x05;
/// Channel 8 settings
pub const REG_CH8SET: u8 = 0x0C;
/// Bias derivation from positive inputs
pub const REG_BIAS_SENSP: u8 = 0x0D;
/// Bias derivation from negative inputs
pub const REG_BIAS_SENSN: u8 = 0x0E;
/// Lead-off sensing on positive inputs
pub const REG_LOFF_SENSP: u8 = 0x0F;
/// Lead-off sensing on negative inputs
pub const REG_LOFF_SENSN: u8 = 0x10;
/// Lead-off current direction
pub const REG_LOFF_FLIP: u8 = 0x11;
/// Lead-off status, positive inputs (read-only)
pub const REG_LOFF_STATP: u8 = 0x12;
/// Lead-off status, negative inputs (read-only)
pub const REG_LOFF_STATN: u8 = 0x13;
/// General purpose I/O
pub const REG_GPIO: u8 = 0x14;
/// SRB1 routing
pub const REG_MISC1: u8 = 0x15;
/// Reserved
pub const REG_MISC2: u8 = 0x16;
/// Single-shot mode and lead-off comparator power
pub const REG_CONFIG4: u8 = 0x17;

/// Highest valid register address
pub const REG_LAST: u8 = REG_CONFIG4;
/// Number of registers in the map
pub const REGISTER_COUNT: usize = REG_LAST as usize + 1;

/// Get human-readable name for a register address
pub fn register_name(address: u8) -> &'static str {
    match address {
        REG_ID => "ID",
        REG_CONFIG1 => "CONFIG1",
        REG_CONFIG2 => "CONFIG2",
        REG_CONFIG3 => "CONFIG3",
        REG_LOFF => "LOFF",
        0x05 => "CH1SET",
        0x06 => "CH2SET",
        0x07 => "CH3SET",
        0x08 => "CH4SET",
        0x09 => "CH5SET",
        0x0A => "CH6SET",
        0x0B => "CH7SET",
        0x0C => "CH8SET",
        REG_BIAS_SENSP => "BIAS_SENSP",
        REG_BIAS_SENSN => "BIAS_SENSN",
        REG_LOFF_SENSP => "LOFF_SENSP",
        REG_LOFF_SENSN => "LOFF_SENSN",
        REG_LOFF_FLIP => "LOFF_FLIP",
        REG_LOFF_STATP => "LOFF_STATP",
        REG_LOFF_STATN => "LOFF_STATN",
        REG_GPIO => "GPIO",
        REG_MISC1 => "MISC1",
        REG_MISC2 => "MISC2",
        REG_CONFIG4 => "CONFIG4",
        _ => "UNKNOWN",
    }
}

/// Check whether a register rejects writes
pub fn is_read_only(address: u8) -> bool {
    matches!(address, REG_ID | REG_LOFF_STATP | REG_LOFF_STATN)
}

// ============================================================================
// Channel Counts
// ============================================================================

/// Size of the channel register family
pub const MAX_CHANNELS: u8 = 8;
/// Smallest device in the family, also the fallback for unknown IDs
pub const MIN_CHANNELS: u8 = 4;

// ============================================================================
// ID Register (0x00)
// ============================================================================

/// Silicon revision, bits [7:5]
pub const ID_REV_MASK: u8 = 0xE0;
/// Device family, bits [3:2]
pub const ID_DEV_MASK: u8 = 0x0C;
/// Family code identifying an ADS1299
pub const ID_DEV_ADS1299: u8 = 0x0C;
/// Channel-count selector, bits [1:0]
pub const ID_NU_CH_MASK: u8 = 0x03;

// ============================================================================
// CONFIG1 (0x01)
// ============================================================================

/// Bits that must always be written as 1
pub const CONFIG1_RESERVED: u8 = 0x90;
/// Daisy-chain mode (0 = multiple readback)
pub const CONFIG1_DAISY_EN: u8 = 1 << 6;
/// Oscillator clock output on CLK pin
pub const CONFIG1_CLK_EN: u8 = 1 << 5;
/// Output data rate, bits [2:0]
pub const CONFIG1_DR_MASK: u8 = 0x07;

// ============================================================================
// CONFIG2 (0x02)
// ============================================================================

/// Bits that must always be written as 1
pub const CONFIG2_RESERVED: u8 = 0xC0;
/// Test signals generated internally
pub const CONFIG2_INT_CAL: u8 = 1 << 4;
/// Test signal amplitude 2x
pub const CONFIG2_CAL_AMP: u8 = 1 << 2;
/// Test signal frequency, bits [1:0]
pub const CONFIG2_CAL_FREQ_MASK: u8 = 0x03;

// ============================================================================
// CONFIG3 (0x03)
// ============================================================================

/// Internal reference buffer enabled
pub const CONFIG3_PD_REFBUF: u8 = 1 << 7;
/// Bits that must always be written as 1
pub const CONFIG3_RESERVED: u8 = 0x60;
/// BIASIN routed to channels muxed to bias measurement
pub const CONFIG3_BIAS_MEAS: u8 = 1 << 4;
/// Bias reference generated internally
pub const CONFIG3_BIASREF_INT: u8 = 1 << 3;
/// Bias buffer powered
pub const CONFIG3_PD_BIAS: u8 = 1 << 2;
/// Bias lead-off sense enabled
pub const CONFIG3_BIAS_LOFF_SENS: u8 = 1 << 1;
/// Bias lead-off status (read-only)
pub const CONFIG3_BIAS_STAT: u8 = 1 << 0;

// ============================================================================
// LOFF (0x04)
// ============================================================================

/// Comparator threshold, bits [7:5]
pub const LOFF_COMP_TH_MASK: u8 = 0xE0;
/// Lead-off current magnitude, bits [3:2]
pub const LOFF_ILEAD_MASK: u8 = 0x0C;
/// Lead-off frequency, bits [1:0]
pub const LOFF_FLEAD_MASK: u8 = 0x03;

// ============================================================================
// CHnSET (0x05..0x0C)
// ============================================================================

/// Channel powered down
pub const CH_PD: u8 = 1 << 7;
/// PGA gain, bits [6:4]
pub const CH_GAIN_MASK: u8 = 0x70;
/// SRB2 connected to the positive input
pub const CH_SRB2: u8 = 1 << 3;
/// Input multiplexer, bits [2:0]
pub const CH_MUX_MASK: u8 = 0x07;

// ============================================================================
// GPIO (0x14)
// ============================================================================

/// GPIO data, bits [7:4]
pub const GPIO_DATA_MASK: u8 = 0xF0;
/// GPIO direction, bits [3:0] (1 = input)
pub const GPIO_DIR_MASK: u8 = 0x0F;
/// All four GPIOs as inputs
pub const GPIO_DIR_ALL_INPUTS: u8 = 0x0F;

// ============================================================================
// MISC1 (0x15)
// ============================================================================

/// SRB1 connected to all inverting inputs
pub const MISC1_SRB1: u8 = 1 << 5;

// ============================================================================
// CONFIG4 (0x17)
// ============================================================================

/// Single-shot conversion mode (0 = continuous)
pub const CONFIG4_SINGLE_SHOT: u8 = 1 << 3;
/// Lead-off comparator power bit
pub const CONFIG4_PD_LOFF_COMP: u8 = 1 << 1;

/// Level of `CONFIG4_PD_LOFF_COMP` that turns the lead-off comparators on.
///
/// Datasheet revisions disagree on the sense of this bit. SBAS499 documents
/// `1 = comparators enabled`, which is what this driver writes.
pub const LOFF_COMP_ENABLED_WHEN_SET: bool = true;

// ============================================================================
// Status Word (first 24 bits of every frame)
// ============================================================================

/// Sync nibble, bits [23:20]
pub const STATUS_SYNC_MASK: u32 = 0x00F0_0000;
/// Expected sync nibble value (1100b)
pub const STATUS_SYNC_VALUE: u32 = 0x00C0_0000;
/// Shift of the positive lead-off mask, bits [19:12]
pub const STATUS_LOFF_P_SHIFT: u32 = 12;
/// Shift of the negative lead-off mask, bits [11:4]
pub const STATUS_LOFF_N_SHIFT: u32 = 4;
/// GPIO[4:1] input state, bits [3:0]
pub const STATUS_GPIO_MASK: u32 = 0x0000_000F;

// ============================================================================
// Frame Layout
// ============================================================================

/// Bytes of status at the start of a frame
pub const STATUS_BYTES: usize = 3;
/// Bytes per channel sample
pub const SAMPLE_BYTES: usize = 3;

/// Frame size in bytes for a given channel count
pub const fn frame_size(channel_count: u8) -> usize {
    STATUS_BYTES + SAMPLE_BYTES * channel_count as usize
}

/// Largest frame the device emits (8 channels)
pub const MAX_FRAME_SIZE: usize = frame_size(MAX_CHANNELS);

// ============================================================================
// Timing
// ============================================================================

/// Command decode time after every transaction (tSDECODE = 4 tCLK ~ 2 us)
pub const DECODE_DELAY_US: u32 = 3;
/// Settle time after the RESET command (18 tCLK ~ 9 us)
pub const RESET_COMMAND_DELAY_US: u32 = 20;
/// Width of the active-low RESET pulse
pub const RESET_PULSE_US: u32 = 10;
/// Settle time after releasing RESET
pub const RESET_SETTLE_US: u32 = 20;
/// Supply stabilization wait before the first transaction
pub const POWER_UP_DELAY_MS: u32 = 5;

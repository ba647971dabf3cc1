//! Default register configuration and protocol timing
//!
//! [`DefaultConfig`] describes the register contents applied after power-up
//! as plain data. [`DefaultConfig::register_writes`] expands it into the
//! ordered write plan for a given channel count, so the defaults can be
//! inspected and tested without touching a device.

use crate::constants::*;
use crate::registers::{
    active_channel_mask, ChannelSettings, Config1, Config2, Config3, Config4, DataRate, GpioConfig,
    LeadOffConfig, LeadOffCurrent, LeadOffFrequency, LeadOffThreshold, Misc1,
};

/// Protocol and power-up timing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// Wait after every transaction (tSDECODE)
    pub decode_delay_us: u32,
    /// Wait after the RESET command
    pub reset_command_delay_us: u32,
    /// Width of the RESET pulse
    pub reset_pulse_us: u32,
    /// Wait after releasing RESET
    pub reset_settle_us: u32,
    /// Supply stabilization wait at power-up
    pub power_up_delay_ms: u32,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            decode_delay_us: DECODE_DELAY_US,
            reset_command_delay_us: RESET_COMMAND_DELAY_US,
            reset_pulse_us: RESET_PULSE_US,
            reset_settle_us: RESET_SETTLE_US,
            power_up_delay_ms: POWER_UP_DELAY_MS,
        }
    }
}

/// One entry of a register write plan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterWrite {
    pub address: u8,
    pub value: u8,
}

impl RegisterWrite {
    pub fn new(address: u8, value: u8) -> Self {
        Self { address, value }
    }
}

impl std::fmt::Display for RegisterWrite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:<10} (0x{:02X}) <- 0x{:02X}",
            register_name(self.address),
            self.address,
            self.value
        )
    }
}

/// Register defaults applied by `configure_defaults`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefaultConfig {
    pub config1: Config1,
    pub config2: Config2,
    pub config3: Config3,
    pub lead_off: LeadOffConfig,
    /// Settings for every active channel
    pub channel: ChannelSettings,
    /// Settings for channel slots beyond the device's channel count
    pub unused_channel: ChannelSettings,
    /// Bias derivation, positive inputs (clipped to active channels)
    pub bias_sense_p: u8,
    /// Bias derivation, negative inputs (clipped to active channels)
    pub bias_sense_n: u8,
    pub lead_off_flip: u8,
    pub gpio: GpioConfig,
    pub misc1: Misc1,
    pub config4: Config4,
}

impl Default for DefaultConfig {
    /// 250 SPS, internal reference, bias off, gain 24 on every active
    /// channel, AC lead-off detection on every active channel.
    fn default() -> Self {
        Self {
            config1: Config1 {
                daisy_chain: false,
                clock_output: false,
                data_rate: DataRate::Sps250,
            },
            config2: Config2::test_off(),
            config3: Config3 {
                reference_buffer: true,
                bias_measure: false,
                bias_ref_internal: true,
                bias_buffer: false,
                bias_lead_off_sense: false,
            },
            lead_off: LeadOffConfig {
                threshold: LeadOffThreshold::Pct80,
                current: LeadOffCurrent::Na24,
                frequency: LeadOffFrequency::Ac31_2Hz,
            },
            channel: ChannelSettings::default(),
            unused_channel: ChannelSettings::powered_down(),
            bias_sense_p: 0x00,
            bias_sense_n: 0x00,
            lead_off_flip: 0x00,
            gpio: GpioConfig::all_inputs(),
            misc1: Misc1::default(),
            config4: Config4 {
                single_shot: false,
                lead_off_comparators: true,
            },
        }
    }
}

impl DefaultConfig {
    /// Expand into the ordered register writes for a device with
    /// `channel_count` channels
    ///
    /// Lead-off sensing is requested on exactly the active channels; bias
    /// masks are clipped to them.
    pub fn register_writes(&self, channel_count: u8) -> Vec<RegisterWrite> {
        let channel_count = channel_count.min(MAX_CHANNELS);
        let active = active_channel_mask(channel_count);
        let mut plan = vec![
            RegisterWrite::new(REG_CONFIG1, self.config1.to_byte()),
            RegisterWrite::new(REG_CONFIG2, self.config2.to_byte()),
            RegisterWrite::new(REG_CONFIG3, self.config3.to_byte()),
            RegisterWrite::new(REG_LOFF, self.lead_off.to_byte()),
        ];

        for channel in 1..=MAX_CHANNELS {
            let settings = if channel <= channel_count {
                self.channel
            } else {
                self.unused_channel
            };
            plan.push(RegisterWrite::new(
                REG_CH1SET + (channel - 1),
                settings.to_byte(),
            ));
        }

        plan.extend([
            RegisterWrite::new(REG_BIAS_SENSP, self.bias_sense_p & active),
            RegisterWrite::new(REG_BIAS_SENSN, self.bias_sense_n & active),
            RegisterWrite::new(REG_LOFF_SENSP, active),
            RegisterWrite::new(REG_LOFF_SENSN, active),
            RegisterWrite::new(REG_LOFF_FLIP, self.lead_off_flip & active),
            RegisterWrite::new(REG_GPIO, self.gpio.to_byte()),
            RegisterWrite::new(REG_MISC1, self.misc1.to_byte()),
            RegisterWrite::new(REG_CONFIG4, self.config4.to_byte()),
        ]);
        plan
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value_of(plan: &[RegisterWrite], address: u8) -> u8 {
        plan.iter()
            .find(|w| w.address == address)
            .map(|w| w.value)
            .unwrap()
    }

    #[test]
    fn test_default_plan_order() {
        let plan = DefaultConfig::default().register_writes(8);
        let addresses: Vec<u8> = plan.iter().map(|w| w.address).collect();
        assert_eq!(
            addresses,
            vec![
                REG_CONFIG1,
                REG_CONFIG2,
                REG_CONFIG3,
                REG_LOFF,
                0x05,
                0x06,
                0x07,
                0x08,
                0x09,
                0x0A,
                0x0B,
                0x0C,
                REG_BIAS_SENSP,
                REG_BIAS_SENSN,
                REG_LOFF_SENSP,
                REG_LOFF_SENSN,
                REG_LOFF_FLIP,
                REG_GPIO,
                REG_MISC1,
                REG_CONFIG4,
            ]
        );
        assert!(plan.iter().all(|w| !is_read_only(w.address)));
    }

    #[test]
    fn test_default_values() {
        let plan = DefaultConfig::default().register_writes(8);
        assert_eq!(value_of(&plan, REG_CONFIG1), 0xD6);
        assert_eq!(value_of(&plan, REG_CONFIG2), 0xC0);
        assert_eq!(value_of(&plan, REG_CONFIG3), 0xE8);
        assert_eq!(value_of(&plan, REG_LOFF), 0xA6);
        assert_eq!(value_of(&plan, REG_BIAS_SENSP), 0x00);
        assert_eq!(value_of(&plan, REG_GPIO), 0x0F);
        assert_eq!(value_of(&plan, REG_MISC1), 0x00);
        assert_eq!(value_of(&plan, REG_CONFIG4), 0x02);
        for address in REG_CH1SET..=REG_CH8SET {
            assert_eq!(value_of(&plan, address), 0x60);
        }
    }

    #[test]
    fn test_four_channel_plan() {
        let plan = DefaultConfig::default().register_writes(4);
        for address in REG_CH1SET..REG_CH1SET + 4 {
            assert_eq!(value_of(&plan, address), 0x60);
        }
        for address in REG_CH1SET + 4..=REG_CH8SET {
            assert_eq!(value_of(&plan, address) & CH_PD, CH_PD);
        }
        assert_eq!(value_of(&plan, REG_LOFF_SENSP), 0x0F);
        assert_eq!(value_of(&plan, REG_LOFF_SENSN), 0x0F);
    }

    #[test]
    fn test_bias_masks_clipped() {
        let config = DefaultConfig {
            bias_sense_p: 0xFF,
            bias_sense_n: 0x30,
            ..DefaultConfig::default()
        };
        let plan = config.register_writes(6);
        assert_eq!(value_of(&plan, REG_BIAS_SENSP), 0x3F);
        assert_eq!(value_of(&plan, REG_BIAS_SENSN), 0x30);
        assert_eq!(value_of(&plan, REG_LOFF_SENSP), 0x3F);
    }

    #[test]
    fn test_timing_defaults() {
        let timing = Timing::default();
        assert_eq!(timing.decode_delay_us, 3);
        assert!(timing.reset_settle_us > timing.reset_pulse_us);
    }
}

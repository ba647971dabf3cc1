//! ADS1299 device controller
//!
//! This module provides the [`Ads1299`] struct, which owns the command
//! protocol and the control lines and implements the power-up sequence,
//! default configuration and the per-feature register setters.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::PinState;
use log::{debug, info, warn};

use crate::config::{DefaultConfig, Timing};
use crate::constants::*;
use crate::error::{Ads1299Error, Result};
use crate::frame::SampleFrame;
use crate::protocol::{CommandProtocol, ProtocolState};
use crate::registers::{
    channel_address, clip_mask_to_channels, replace_field, set_flag, with_lead_off_comparators,
    ChannelSettings, Config1, Config2, DataRate, DeviceId, Gain, GpioConfig, InputMux,
    LeadOffConfig,
};
use crate::transport::{DigitalControl, Transport};

/// Snapshot of what the controller knows about the device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceState {
    /// Channels reported by the ID register (8 until identified)
    pub channel_count: u8,
    /// Read-data-continuous mode active
    pub streaming: bool,
}

/// ADS1299 driver
///
/// Generic over the serial transport, the control lines and the delay
/// provider. All access is through `&mut self`.
///
/// # Example
///
/// ```
/// use ads1299::mock::{RecordingDelay, SimulatedAds1299, SimulatedControl};
/// use ads1299::{Ads1299, DefaultConfig, Gain};
///
/// let mut adc = Ads1299::new(
///     SimulatedAds1299::new(0x3E),
///     SimulatedControl::new(),
///     RecordingDelay::new(),
/// );
/// let id = adc.power_up()?;
/// assert_eq!(id.channel_count(), 8);
///
/// adc.configure_defaults(&DefaultConfig::default())?;
/// adc.set_channel_gain(1, Gain::X8)?;
///
/// adc.start_streaming()?;
/// let frame = adc.read_frame()?;
/// assert!(frame.is_synced());
/// # Ok::<(), ads1299::Ads1299Error>(())
/// ```
pub struct Ads1299<T, C, D> {
    protocol: CommandProtocol<T, D>,
    control: C,
    channel_count: u8,
    powered_up: bool,
}

impl<T, C, D> Ads1299<T, C, D>
where
    T: Transport,
    C: DigitalControl,
    D: DelayNs,
{
    /// Create a driver with datasheet timing
    pub fn new(transport: T, control: C, delay: D) -> Self {
        Self::with_timing(transport, control, delay, Timing::default())
    }

    /// Create a driver with custom timing
    pub fn with_timing(transport: T, control: C, delay: D, timing: Timing) -> Self {
        Self {
            protocol: CommandProtocol::new(transport, delay, timing),
            control,
            channel_count: MAX_CHANNELS,
            powered_up: false,
        }
    }

    /// Number of active channels
    pub fn channel_count(&self) -> u8 {
        self.channel_count
    }

    /// Check if the power-up sequence completed
    pub fn is_powered_up(&self) -> bool {
        self.powered_up
    }

    /// Check if continuous read mode is active
    pub fn is_streaming(&self) -> bool {
        self.protocol.is_streaming()
    }

    /// Current command protocol state
    pub fn protocol_state(&self) -> ProtocolState {
        self.protocol.state()
    }

    /// Snapshot of the channel count and streaming flag
    pub fn state(&self) -> DeviceState {
        DeviceState {
            channel_count: self.channel_count,
            streaming: self.is_streaming(),
        }
    }

    /// Direct access to the command protocol
    pub fn protocol(&mut self) -> &mut CommandProtocol<T, D> {
        &mut self.protocol
    }

    /// Borrow the transport
    pub fn transport(&self) -> &T {
        self.protocol.transport()
    }

    /// Mutably borrow the transport
    pub fn transport_mut(&mut self) -> &mut T {
        self.protocol.transport_mut()
    }

    /// Borrow the control lines
    pub fn control(&self) -> &C {
        &self.control
    }

    /// Mutably borrow the control lines
    pub fn control_mut(&mut self) -> &mut C {
        &mut self.control
    }

    /// Give back the transport, control lines and delay provider
    pub fn release(self) -> (T, C, D) {
        let (transport, delay) = self.protocol.release();
        (transport, self.control, delay)
    }

    // ========================================================================
    // Power-up and configuration
    // ========================================================================

    /// Run the power-up, reset and identification sequence
    ///
    /// On success the channel count reflects the device and the protocol is
    /// idle. A device whose family bits are not `11` fails the whole
    /// sequence with [`Ads1299Error::DeviceMismatch`].
    pub fn power_up(&mut self) -> Result<DeviceId> {
        let timing = *self.protocol.timing();
        info!("Powering up ADS1299");
        self.powered_up = false;

        self.protocol.release_bus()?;
        self.control.set_start(PinState::Low)?;
        self.control.set_reset(PinState::High)?;
        self.control.set_power_down(PinState::High)?;
        self.protocol.delay_mut().delay_ms(timing.power_up_delay_ms);

        self.protocol.init_transport()?;
        self.reset_pulse()?;

        // RESET leaves the device converting into continuous read mode
        self.protocol.reset()?;
        self.protocol.stop()?;
        self.protocol.stop_continuous()?;

        let id = self.read_device_id()?;
        if !id.is_ads1299() {
            warn!("Unexpected device ID 0x{:02X}", id.raw);
            return Err(Ads1299Error::DeviceMismatch {
                id: id.raw,
                family: id.family(),
            });
        }

        self.channel_count = id.channel_count();
        self.powered_up = true;
        info!(
            "Found ADS1299 (ID 0x{:02X}, revision {}, {} channels)",
            id.raw,
            id.revision(),
            self.channel_count
        );
        Ok(id)
    }

    /// Power up and apply the stock defaults
    pub fn begin(&mut self) -> Result<DeviceId> {
        let id = self.power_up()?;
        self.configure_defaults(&DefaultConfig::default())?;
        Ok(id)
    }

    /// Stop conversions and apply `config`
    ///
    /// Writes are issued in plan order; the first failure aborts with no
    /// rollback of earlier writes.
    pub fn configure_defaults(&mut self, config: &DefaultConfig) -> Result<()> {
        if !self.powered_up {
            return Err(Ads1299Error::NotPoweredUp);
        }
        self.protocol.stop()?;
        self.protocol.stop_continuous()?;

        let plan = config.register_writes(self.channel_count);
        info!(
            "Applying {} register defaults for {} channels",
            plan.len(),
            self.channel_count
        );
        for write in &plan {
            debug!("{}", write);
            self.protocol.write_register(write.address, write.value)?;
        }
        Ok(())
    }

    /// Leave streaming, stop conversions and park START low
    pub fn shutdown(&mut self) -> Result<()> {
        self.protocol.stop()?;
        self.protocol.stop_continuous()?;
        self.control.set_start(PinState::Low)?;
        info!("ADS1299 stopped");
        Ok(())
    }

    /// Read and decode the ID register
    pub fn read_device_id(&mut self) -> Result<DeviceId> {
        Ok(DeviceId::from_byte(self.read_raw_id()?))
    }

    /// Raw ID register value
    pub fn read_raw_id(&mut self) -> Result<u8> {
        self.protocol.read_register(REG_ID)
    }

    // ========================================================================
    // Commands and control lines
    // ========================================================================

    /// Leave standby
    pub fn wakeup(&mut self) -> Result<()> {
        self.protocol.wakeup()
    }

    /// Enter low-power standby
    pub fn standby(&mut self) -> Result<()> {
        self.protocol.standby()
    }

    /// Start conversions with the START command
    pub fn start_conversions(&mut self) -> Result<()> {
        self.protocol.start()
    }

    /// Stop conversions with the STOP command
    pub fn stop_conversions(&mut self) -> Result<()> {
        self.protocol.stop()
    }

    /// Enter continuous read mode and start converting
    pub fn start_streaming(&mut self) -> Result<()> {
        self.protocol.start_continuous()?;
        self.protocol.start()?;
        debug!("Streaming {} channels", self.channel_count);
        Ok(())
    }

    /// Stop converting and leave continuous read mode
    pub fn stop_streaming(&mut self) -> Result<()> {
        self.protocol.stop()?;
        self.protocol.stop_continuous()
    }

    /// Drive START high to begin conversions
    pub fn start_pin_high(&mut self) -> Result<()> {
        self.control.set_start(PinState::High)?;
        Ok(())
    }

    /// Drive START low
    pub fn start_pin_low(&mut self) -> Result<()> {
        self.control.set_start(PinState::Low)?;
        Ok(())
    }

    /// Drive PWDN; `asserted` powers the device down (line low)
    pub fn set_power_down_pin(&mut self, asserted: bool) -> Result<()> {
        let level = if asserted { PinState::Low } else { PinState::High };
        self.control.set_power_down(level)?;
        Ok(())
    }

    /// Pulse RESET low and wait for the device to settle
    pub fn reset_pulse(&mut self) -> Result<()> {
        let timing = *self.protocol.timing();
        self.control.set_reset(PinState::Low)?;
        self.protocol.delay_mut().delay_us(timing.reset_pulse_us);
        self.control.set_reset(PinState::High)?;
        self.protocol.delay_mut().delay_us(timing.reset_settle_us);
        Ok(())
    }

    // ========================================================================
    // Register access
    // ========================================================================

    /// Read one register
    pub fn read_register(&mut self, address: u8) -> Result<u8> {
        self.protocol.read_register(address)
    }

    /// Write one register
    pub fn write_register(&mut self, address: u8, value: u8) -> Result<()> {
        self.protocol.write_register(address, value)
    }

    /// Read consecutive registers starting at `start`
    pub fn read_registers(&mut self, start: u8, buf: &mut [u8]) -> Result<()> {
        self.protocol.read_registers(start, buf)
    }

    /// Write consecutive registers starting at `start`
    pub fn write_registers(&mut self, start: u8, data: &[u8]) -> Result<()> {
        self.protocol.write_registers(start, data)
    }

    /// Read the whole register map in one burst
    pub fn read_all_registers(&mut self) -> Result<[u8; REGISTER_COUNT]> {
        let mut registers = [0u8; REGISTER_COUNT];
        self.protocol.read_registers(REG_ID, &mut registers)?;
        Ok(registers)
    }

    /// Read a register, apply `update` and write the result back
    fn modify_register(&mut self, address: u8, update: impl FnOnce(u8) -> u8) -> Result<()> {
        let current = self.protocol.read_register(address)?;
        let value = update(current);
        debug!(
            "{} 0x{:02X} -> 0x{:02X}",
            register_name(address),
            current,
            value
        );
        self.protocol.write_register(address, value)
    }

    /// Clip a per-channel mask to the active channels
    fn active_mask(&self, register: u8, mask: u8) -> u8 {
        let clipped = clip_mask_to_channels(mask, self.channel_count);
        if clipped != mask {
            warn!(
                "{} mask 0x{:02X} clipped to 0x{:02X} ({} channels)",
                register_name(register),
                mask,
                clipped,
                self.channel_count
            );
        }
        clipped
    }

    fn write_channel_mask(&mut self, address: u8, mask: u8) -> Result<()> {
        let mask = self.active_mask(address, mask);
        self.protocol.write_register(address, mask)
    }

    // ========================================================================
    // CONFIG1 / CONFIG2
    // ========================================================================

    /// Set the output data rate
    pub fn set_data_rate(&mut self, rate: DataRate) -> Result<()> {
        self.modify_register(REG_CONFIG1, |v| {
            replace_field(v, CONFIG1_DR_MASK, rate.bits()) | CONFIG1_RESERVED
        })
    }

    /// Current output data rate
    pub fn data_rate(&mut self) -> Result<DataRate> {
        let value = self.protocol.read_register(REG_CONFIG1)?;
        Config1::from_byte(value)
            .map(|c| c.data_rate)
            .ok_or(Ads1299Error::InvalidRegisterValue {
                address: REG_CONFIG1,
                value,
            })
    }

    /// Drive the oscillator clock on the CLK pin
    pub fn set_clock_output(&mut self, enable: bool) -> Result<()> {
        self.modify_register(REG_CONFIG1, |v| {
            set_flag(v, CONFIG1_CLK_EN, enable) | CONFIG1_RESERVED
        })
    }

    /// Select daisy-chain (`true`) or multiple readback (`false`)
    pub fn set_daisy_chain(&mut self, enable: bool) -> Result<()> {
        // DAISY_EN is active low
        self.modify_register(REG_CONFIG1, |v| {
            set_flag(v, CONFIG1_DAISY_EN, !enable) | CONFIG1_RESERVED
        })
    }

    /// Configure the internal test signal
    pub fn set_test_signal(&mut self, config: Config2) -> Result<()> {
        self.protocol.write_register(REG_CONFIG2, config.to_byte())
    }

    // ========================================================================
    // Channels
    // ========================================================================

    /// Write a whole CHnSET register
    pub fn set_channel(&mut self, channel: u8, settings: ChannelSettings) -> Result<()> {
        let address = channel_address(channel, self.channel_count)?;
        self.protocol.write_register(address, settings.to_byte())
    }

    /// Decode the current CHnSET register
    pub fn channel_settings(&mut self, channel: u8) -> Result<ChannelSettings> {
        let address = channel_address(channel, self.channel_count)?;
        let value = self.protocol.read_register(address)?;
        ChannelSettings::from_byte(value)
            .ok_or(Ads1299Error::InvalidRegisterValue { address, value })
    }

    /// Power a channel down (`true`) or up (`false`)
    pub fn power_down_channel(&mut self, channel: u8, down: bool) -> Result<()> {
        let address = channel_address(channel, self.channel_count)?;
        self.modify_register(address, |v| set_flag(v, CH_PD, down))
    }

    /// Set a channel's PGA gain
    pub fn set_channel_gain(&mut self, channel: u8, gain: Gain) -> Result<()> {
        let address = channel_address(channel, self.channel_count)?;
        self.modify_register(address, |v| replace_field(v, CH_GAIN_MASK, gain.bits() << 4))
    }

    /// Select a channel's input source
    pub fn set_channel_mux(&mut self, channel: u8, mux: InputMux) -> Result<()> {
        let address = channel_address(channel, self.channel_count)?;
        self.modify_register(address, |v| replace_field(v, CH_MUX_MASK, mux.bits()))
    }

    /// Route SRB2 to the channel's positive input
    pub fn set_srb2(&mut self, channel: u8, enable: bool) -> Result<()> {
        let address = channel_address(channel, self.channel_count)?;
        self.modify_register(address, |v| set_flag(v, CH_SRB2, enable))
    }

    /// Connect SRB1 to every inverting input
    pub fn enable_srb1(&mut self, enable: bool) -> Result<()> {
        self.modify_register(REG_MISC1, |v| set_flag(v, MISC1_SRB1, enable))
    }

    // ========================================================================
    // Reference and bias (CONFIG3)
    // ========================================================================

    /// Power the internal reference buffer
    pub fn use_internal_reference(&mut self, enable: bool) -> Result<()> {
        self.modify_config3(CONFIG3_PD_REFBUF, enable)
    }

    /// Generate BIASREF internally
    pub fn use_bias_internal_reference(&mut self, enable: bool) -> Result<()> {
        self.modify_config3(CONFIG3_BIASREF_INT, enable)
    }

    /// Power the bias buffer
    pub fn enable_bias_buffer(&mut self, enable: bool) -> Result<()> {
        self.modify_config3(CONFIG3_PD_BIAS, enable)
    }

    /// Enable bias sense for lead-off detection
    pub fn route_bias_sense(&mut self, enable: bool) -> Result<()> {
        self.modify_config3(CONFIG3_BIAS_LOFF_SENS, enable)
    }

    /// Route BIASIN to the channels muxed for bias measurement
    pub fn enable_bias_measure(&mut self, enable: bool) -> Result<()> {
        self.modify_config3(CONFIG3_BIAS_MEAS, enable)
    }

    fn modify_config3(&mut self, flag: u8, enable: bool) -> Result<()> {
        // BIAS_STAT is read-only and reads back the comparator state
        self.modify_register(REG_CONFIG3, |v| {
            (set_flag(v, flag, enable) | CONFIG3_RESERVED) & !CONFIG3_BIAS_STAT
        })
    }

    /// Channels whose positive inputs drive the bias derivation
    pub fn set_bias_derive_p(&mut self, mask: u8) -> Result<()> {
        self.write_channel_mask(REG_BIAS_SENSP, mask)
    }

    /// Channels whose negative inputs drive the bias derivation
    pub fn set_bias_derive_n(&mut self, mask: u8) -> Result<()> {
        self.write_channel_mask(REG_BIAS_SENSN, mask)
    }

    // ========================================================================
    // Lead-off detection
    // ========================================================================

    /// Write the LOFF register
    pub fn configure_lead_off(&mut self, config: LeadOffConfig) -> Result<()> {
        self.protocol.write_register(REG_LOFF, config.to_byte())
    }

    /// Channels with lead-off sensing on the positive input
    pub fn enable_lead_off_sense_p(&mut self, mask: u8) -> Result<()> {
        self.write_channel_mask(REG_LOFF_SENSP, mask)
    }

    /// Channels with lead-off sensing on the negative input
    pub fn enable_lead_off_sense_n(&mut self, mask: u8) -> Result<()> {
        self.write_channel_mask(REG_LOFF_SENSN, mask)
    }

    /// Swap the lead-off current direction on the masked channels
    pub fn set_lead_off_flip(&mut self, mask: u8) -> Result<()> {
        self.write_channel_mask(REG_LOFF_FLIP, mask)
    }

    /// Select single-shot (`true`) or continuous conversion
    pub fn set_single_shot(&mut self, single_shot: bool) -> Result<()> {
        self.modify_register(REG_CONFIG4, |v| set_flag(v, CONFIG4_SINGLE_SHOT, single_shot))
    }

    /// Turn the lead-off comparators on or off
    pub fn enable_lead_off_comparators(&mut self, enable: bool) -> Result<()> {
        self.modify_register(REG_CONFIG4, |v| with_lead_off_comparators(v, enable))
    }

    /// Read LOFF_STATP and LOFF_STATN
    pub fn lead_off_status(&mut self) -> Result<(u8, u8)> {
        let mut status = [0u8; 2];
        self.protocol.read_registers(REG_LOFF_STATP, &mut status)?;
        Ok((status[0], status[1]))
    }

    // ========================================================================
    // GPIO
    // ========================================================================

    /// Write the GPIO register
    pub fn set_gpio(&mut self, gpio: GpioConfig) -> Result<()> {
        self.protocol.write_register(REG_GPIO, gpio.to_byte())
    }

    /// Read the GPIO register
    pub fn gpio(&mut self) -> Result<GpioConfig> {
        Ok(GpioConfig::from_byte(self.protocol.read_register(REG_GPIO)?))
    }

    // ========================================================================
    // Acquisition
    // ========================================================================

    /// Check whether DRDY signals a new frame
    pub fn data_ready(&mut self) -> Result<bool> {
        Ok(self.control.data_ready()?)
    }

    /// Read and decode one frame in continuous read mode
    ///
    /// A frame without the sync pattern is still returned; check
    /// [`SampleFrame::is_synced`] before using its samples.
    pub fn read_frame(&mut self) -> Result<SampleFrame> {
        let mut buf = [0u8; MAX_FRAME_SIZE];
        let len = frame_size(self.channel_count);
        self.protocol.read_frame(&mut buf[..len])?;
        self.decode(&buf[..len])
    }

    /// Request one frame with RDATA and decode it
    pub fn read_data_on_demand(&mut self) -> Result<SampleFrame> {
        let mut buf = [0u8; MAX_FRAME_SIZE];
        let len = frame_size(self.channel_count);
        self.protocol.read_data_on_demand(&mut buf[..len])?;
        self.decode(&buf[..len])
    }

    fn decode(&self, data: &[u8]) -> Result<SampleFrame> {
        let frame = SampleFrame::from_bytes(data, self.channel_count)?;
        if !frame.is_synced() {
            warn!(
                "Frame out of sync (status 0x{:06X})",
                frame.status.raw()
            );
        }
        Ok(frame)
    }
}

impl<T, C, D> std::fmt::Debug for Ads1299<T, C, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ads1299")
            .field("channel_count", &self.channel_count)
            .field("powered_up", &self.powered_up)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{encode_frame, RecordingDelay, SimulatedAds1299, SimulatedControl};

    type SimDevice = Ads1299<SimulatedAds1299, SimulatedControl, RecordingDelay>;

    fn device(id: u8) -> SimDevice {
        Ads1299::new(
            SimulatedAds1299::new(id),
            SimulatedControl::new(),
            RecordingDelay::new(),
        )
    }

    fn configured(id: u8) -> SimDevice {
        let mut dev = device(id);
        dev.power_up().unwrap();
        dev.configure_defaults(&DefaultConfig::default()).unwrap();
        dev
    }

    #[test]
    fn test_power_up_sequence() {
        let mut dev = device(0x3E);
        let id = dev.power_up().unwrap();
        assert_eq!(id.raw, 0x3E);
        assert_eq!(dev.channel_count(), 8);
        assert_eq!(dev.protocol_state(), ProtocolState::Idle);
        assert!(dev.is_powered_up());

        let (sim, control, delay) = dev.release();
        assert!(sim.is_initialized());
        assert!(!sim.is_streaming());
        assert!(!sim.is_converting());
        assert_eq!(
            sim.transactions(),
            &[
                vec![CMD_RESET],
                vec![CMD_STOP],
                vec![CMD_SDATAC],
                vec![CMD_RREG | REG_ID, 0x00, 0x00],
            ]
        );

        assert_eq!(control.reset_pulses(), 1);
        assert_eq!(control.reset_level(), PinState::High);
        assert_eq!(control.power_down_level(), PinState::High);
        assert_eq!(control.start_level(), PinState::Low);
        assert_eq!(delay.calls_us(), vec![5_000, 10, 20, 20, 3, 3, 3]);
    }

    #[test]
    fn test_power_up_channel_counts() {
        for (id, channels) in [(0x3C, 4), (0x3D, 6), (0x3E, 8), (0x3F, 4)] {
            let mut dev = device(id);
            dev.power_up().unwrap();
            assert_eq!(dev.channel_count(), channels, "id 0x{:02X}", id);
        }
    }

    #[test]
    fn test_power_up_rejects_other_family() {
        let mut dev = device(0x92);
        let err = dev.power_up().unwrap_err();
        assert!(matches!(
            err,
            Ads1299Error::DeviceMismatch { id: 0x92, family: 0 }
        ));
        assert!(!dev.is_powered_up());
        assert_eq!(dev.channel_count(), MAX_CHANNELS);
    }

    #[test]
    fn test_defaults_require_power_up() {
        let mut dev = device(0x3E);
        assert!(matches!(
            dev.configure_defaults(&DefaultConfig::default()),
            Err(Ads1299Error::NotPoweredUp)
        ));
        assert!(dev.transport().transactions().is_empty());
    }

    #[test]
    fn test_defaults_on_eight_channels() {
        let dev = configured(0x3E);
        let sim = dev.transport();
        for address in REG_CH1SET..=REG_CH8SET {
            assert_eq!(sim.register(address), 0x60);
        }
        assert_eq!(sim.register(REG_CONFIG1), 0xD6);
        assert_eq!(sim.register(REG_CONFIG3), 0xE8);
        assert_eq!(sim.register(REG_LOFF_SENSP), 0xFF);
        assert_eq!(sim.register(REG_CONFIG4), 0x02);
    }

    #[test]
    fn test_defaults_on_four_channels() {
        let dev = configured(0x3C);
        let sim = dev.transport();
        for address in REG_CH1SET..REG_CH1SET + 4 {
            assert_eq!(sim.register(address), 0x60);
        }
        for address in REG_CH1SET + 4..=REG_CH8SET {
            assert_eq!(sim.register(address), 0x81);
        }
        assert_eq!(sim.register(REG_LOFF_SENSP), 0x0F);
        assert_eq!(sim.register(REG_LOFF_SENSN), 0x0F);
    }

    #[test]
    fn test_defaults_leave_streaming() {
        let mut dev = configured(0x3E);
        dev.start_streaming().unwrap();
        dev.configure_defaults(&DefaultConfig::default()).unwrap();
        assert!(!dev.is_streaming());
        assert!(!dev.transport().is_streaming());
    }

    #[test]
    fn test_channel_read_modify_write() {
        let mut dev = configured(0x3E);
        dev.set_channel_gain(1, Gain::X2).unwrap();
        assert_eq!(dev.transport().register(REG_CH1SET), 0x10);
        dev.set_srb2(1, true).unwrap();
        dev.set_channel_mux(1, InputMux::TestSignal).unwrap();
        dev.power_down_channel(1, true).unwrap();
        assert_eq!(dev.transport().register(REG_CH1SET), 0x9D);

        let settings = dev.channel_settings(1).unwrap();
        assert!(!settings.powered_on);
        assert!(settings.srb2);
        assert_eq!(settings.gain, Gain::X2);
        assert_eq!(settings.mux, InputMux::TestSignal);
        // Neighbouring channel untouched
        assert_eq!(dev.transport().register(REG_CH1SET + 1), 0x60);
    }

    #[test]
    fn test_invalid_channel_does_no_io() {
        let mut dev = configured(0x3C);
        dev.transport_mut().clear_transactions();
        assert!(matches!(
            dev.set_channel_gain(5, Gain::X2),
            Err(Ads1299Error::InvalidChannel {
                channel: 5,
                channel_count: 4
            })
        ));
        assert!(dev.set_channel(0, ChannelSettings::default()).is_err());
        assert!(dev.channel_settings(9).is_err());
        assert!(dev.transport().transactions().is_empty());
    }

    #[test]
    fn test_reserved_gain_reported() {
        let mut dev = configured(0x3E);
        dev.transport_mut().set_register(REG_CH1SET + 2, 0x70);
        assert!(matches!(
            dev.channel_settings(3),
            Err(Ads1299Error::InvalidRegisterValue {
                address: 0x07,
                value: 0x70
            })
        ));
    }

    #[test]
    fn test_config1_setters_keep_reserved_bits() {
        let mut dev = configured(0x3E);
        dev.set_data_rate(DataRate::Sps1000).unwrap();
        assert_eq!(dev.transport().register(REG_CONFIG1), 0xD4);
        assert_eq!(dev.data_rate().unwrap().hz(), 1_000);
        dev.set_clock_output(true).unwrap();
        dev.set_daisy_chain(true).unwrap();
        assert_eq!(dev.transport().register(REG_CONFIG1), 0xB4);
    }

    #[test]
    fn test_config3_setters() {
        let mut dev = configured(0x3E);
        dev.enable_bias_buffer(true).unwrap();
        dev.route_bias_sense(true).unwrap();
        assert_eq!(dev.transport().register(REG_CONFIG3), 0xEE);
        dev.use_internal_reference(false).unwrap();
        dev.enable_bias_measure(true).unwrap();
        assert_eq!(dev.transport().register(REG_CONFIG3), 0x7E);
    }

    #[test]
    fn test_masks_clipped_to_active_channels() {
        let mut dev = configured(0x3C);
        dev.set_bias_derive_p(0xFF).unwrap();
        dev.set_bias_derive_n(0x30).unwrap();
        dev.enable_lead_off_sense_p(0x03).unwrap();
        dev.set_lead_off_flip(0x81).unwrap();
        let sim = dev.transport();
        assert_eq!(sim.register(REG_BIAS_SENSP), 0x0F);
        assert_eq!(sim.register(REG_BIAS_SENSN), 0x00);
        assert_eq!(sim.register(REG_LOFF_SENSP), 0x03);
        assert_eq!(sim.register(REG_LOFF_FLIP), 0x01);
    }

    #[test]
    fn test_config4_setters() {
        let mut dev = configured(0x3E);
        dev.set_single_shot(true).unwrap();
        assert_eq!(dev.transport().register(REG_CONFIG4), 0x0A);
        dev.enable_lead_off_comparators(false).unwrap();
        assert_eq!(dev.transport().register(REG_CONFIG4), 0x08);
    }

    #[test]
    fn test_misc_registers() {
        let mut dev = configured(0x3E);
        dev.enable_srb1(true).unwrap();
        assert_eq!(dev.transport().register(REG_MISC1), 0x20);

        dev.set_gpio(GpioConfig {
            data: 0x5,
            direction: 0x0,
        })
        .unwrap();
        assert_eq!(dev.gpio().unwrap().data, 0x5);

        dev.transport_mut().set_lead_off_status(0x05, 0x80);
        assert_eq!(dev.lead_off_status().unwrap(), (0x05, 0x80));
        assert_eq!(dev.read_all_registers().unwrap()[REG_ID as usize], 0x3E);
    }

    #[test]
    fn test_register_access_while_streaming() {
        let mut dev = configured(0x3E);
        dev.start_streaming().unwrap();
        assert!(matches!(
            dev.set_data_rate(DataRate::Sps500),
            Err(Ads1299Error::StreamingActive)
        ));
        assert!(matches!(
            dev.set_channel_gain(1, Gain::X1),
            Err(Ads1299Error::StreamingActive)
        ));
        dev.stop_streaming().unwrap();
        dev.set_data_rate(DataRate::Sps500).unwrap();
    }

    #[test]
    fn test_streaming_frames() {
        let mut dev = configured(0x3C);
        assert!(matches!(dev.read_frame(), Err(Ads1299Error::NotStreaming)));

        dev.start_streaming().unwrap();
        assert!(dev.transport().is_converting());
        dev.transport_mut().queue_samples(&[1, -1, -8_388_608, 8_388_607]);
        let frame = dev.read_frame().unwrap();
        assert!(frame.is_synced());
        assert_eq!(frame.channels, vec![1, -1, -8_388_608, 8_388_607]);

        dev.transport_mut()
            .queue_frame(&encode_frame(0x40_0000, &[5, 6, 7, 8]));
        let frame = dev.read_frame().unwrap();
        assert!(!frame.is_synced());
        assert_eq!(frame.channel(4), Some(8));
    }

    #[test]
    fn test_on_demand_read() {
        let mut dev = configured(0x3D);
        dev.transport_mut().queue_samples(&[10, 20, 30, 40, 50, 60]);
        let frame = dev.read_data_on_demand().unwrap();
        assert_eq!(frame.channel_count(), 6);
        assert_eq!(frame.channel(6), Some(60));
        assert!(!dev.is_streaming());
    }

    #[test]
    fn test_failed_default_write_aborts_without_rollback() {
        let mut dev = device(0x3E);
        dev.power_up().unwrap();
        // STOP and SDATAC are one byte each, every register write is three;
        // fail on the opcode of the fourth write (LOFF)
        dev.transport_mut().inject_bus_fault_after(2 + 3 * 3);
        let err = dev
            .configure_defaults(&DefaultConfig::default())
            .unwrap_err();
        assert!(err.is_transport_error());

        let sim = dev.transport();
        assert_eq!(sim.register(REG_CONFIG1), 0xD6);
        assert_eq!(sim.register(REG_CONFIG2), 0xC0);
        assert_eq!(sim.register(REG_CONFIG3), 0xE8);
        assert_eq!(sim.register(REG_LOFF), 0x00);
        assert_eq!(sim.register(REG_CH1SET), 0x61);
        assert_eq!(sim.register(REG_CONFIG4), 0x00);
        assert!(!sim.was_sent(&[CMD_WREG | REG_CH1SET]));
        assert!(!sim.is_selected());
    }

    #[test]
    fn test_on_demand_read_while_streaming() {
        let mut dev = configured(0x3C);
        dev.start_streaming().unwrap();
        dev.transport_mut().queue_samples(&[1, 2, 3, 4]);
        let frame = dev.read_data_on_demand().unwrap();
        assert!(frame.is_synced());
        assert_eq!(frame.channels, vec![1, 2, 3, 4]);
        assert!(dev.is_streaming());
        assert!(dev.transport().was_sent(&[CMD_RDATA]));
    }

    #[test]
    fn test_standby_and_wakeup() {
        let mut dev = configured(0x3E);
        dev.standby().unwrap();
        assert!(dev.transport().is_standby());
        dev.wakeup().unwrap();
        assert!(!dev.transport().is_standby());
        assert_eq!(dev.protocol_state(), ProtocolState::Idle);
    }

    #[test]
    fn test_pins_and_shutdown() {
        let mut dev = configured(0x3E);
        assert!(!dev.data_ready().unwrap());
        dev.control_mut().set_data_ready(true);
        assert!(dev.data_ready().unwrap());

        dev.start_pin_high().unwrap();
        assert_eq!(dev.control().start_level(), PinState::High);
        dev.set_power_down_pin(true).unwrap();
        assert_eq!(dev.control().power_down_level(), PinState::Low);
        dev.set_power_down_pin(false).unwrap();

        dev.start_streaming().unwrap();
        dev.shutdown().unwrap();
        assert!(!dev.is_streaming());
        assert_eq!(dev.control().start_level(), PinState::Low);
        assert!(!dev.transport().is_converting());
        assert!(!dev.transport().is_streaming());
    }
}

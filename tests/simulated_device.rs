//! End-to-end scenarios against the simulated ADS1299

use ads1299::constants::*;
use ads1299::mock::{encode_frame, RecordingDelay, SimulatedAds1299, SimulatedControl};
use ads1299::registers::channel_address;
use ads1299::{
    decode_frame, Ads1299, Ads1299Error, ChannelSettings, DefaultConfig, DeviceId, Gain, InputMux,
    ProtocolState, Timing,
};

type SimDevice = Ads1299<SimulatedAds1299, SimulatedControl, RecordingDelay>;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn device(id: u8) -> SimDevice {
    init_logger();
    Ads1299::new(
        SimulatedAds1299::new(id),
        SimulatedControl::new(),
        RecordingDelay::new(),
    )
}

#[test]
fn power_up_identifies_eight_channel_part() {
    let mut adc = device(0x3E);
    let id = adc.power_up().unwrap();
    assert_eq!(id.channel_selector(), 0b10);
    assert_eq!(adc.channel_count(), 8);
    assert_eq!(adc.protocol_state(), ProtocolState::Idle);
    assert!(!adc.state().streaming);
}

#[test]
fn selector_maps_to_channel_count() {
    for (selector, channels) in [(0b00, 4), (0b01, 6), (0b10, 8), (0b11, 4)] {
        assert_eq!(DeviceId::from_byte(0x3C | selector).channel_count(), channels);
    }
}

#[test]
fn power_up_fails_on_foreign_device() {
    let mut adc = device(0x33);
    let err = adc.power_up().unwrap_err();
    assert!(err.is_fatal());
    assert!(matches!(
        adc.configure_defaults(&DefaultConfig::default()),
        Err(Ads1299Error::NotPoweredUp)
    ));
}

#[test]
fn defaults_on_eight_channels() {
    let mut adc = device(0x3E);
    adc.begin().unwrap();
    for channel in 1..=8 {
        let settings = adc.channel_settings(channel).unwrap();
        assert!(settings.powered_on);
        assert_eq!(settings.gain, Gain::X24);
        assert_eq!(settings.mux, InputMux::Normal);
        assert!(!settings.srb2);
    }
}

#[test]
fn defaults_on_four_channels() {
    let mut adc = device(0x3C);
    adc.begin().unwrap();
    assert_eq!(adc.channel_count(), 4);

    let registers = adc.read_all_registers().unwrap();
    for address in REG_CH1SET + 4..=REG_CH8SET {
        let settings = ChannelSettings::from_byte(registers[address as usize]).unwrap();
        assert!(!settings.powered_on, "CH{} left on", address - REG_CH1SET + 1);
    }
    assert_eq!(registers[REG_LOFF_SENSP as usize], 0x0F);
    assert_eq!(registers[REG_LOFF_SENSN as usize], 0x0F);
    assert_eq!(registers[REG_BIAS_SENSP as usize], 0x00);
}

#[test]
fn defaults_are_written_in_order() {
    let mut adc = device(0x3D);
    adc.power_up().unwrap();
    adc.transport_mut().clear_transactions();
    adc.configure_defaults(&DefaultConfig::default()).unwrap();

    let plan = DefaultConfig::default().register_writes(6);
    let sim = adc.transport();
    let transactions = sim.transactions();
    assert_eq!(transactions[0], vec![CMD_STOP]);
    assert_eq!(transactions[1], vec![CMD_SDATAC]);
    assert_eq!(transactions.len(), 2 + plan.len());
    for (sent, write) in transactions[2..].iter().zip(&plan) {
        assert_eq!(sent, &vec![CMD_WREG | write.address, 0x00, write.value]);
    }
}

#[test]
fn channel_address_range() {
    for channel in 1..=6 {
        assert_eq!(channel_address(channel, 6).unwrap(), 0x05 + channel - 1);
    }
    assert!(channel_address(7, 6).is_err());

    let mut adc = device(0x3D);
    adc.begin().unwrap();
    adc.transport_mut().clear_transactions();
    let err = adc.set_channel(7, ChannelSettings::default()).unwrap_err();
    assert!(err.is_invalid_argument());
    assert!(adc.transport().transactions().is_empty());
}

#[test]
fn streaming_frames_decode() {
    let mut adc = device(0x3C);
    adc.begin().unwrap();
    adc.start_streaming().unwrap();

    adc.transport_mut().set_lead_off_status(0x02, 0x00);
    adc.transport_mut().queue_samples(&[1, -1, -8_388_608, 42]);
    let frame = adc.read_frame().unwrap();
    assert!(frame.is_synced());
    assert_eq!(frame.channels, vec![1, -1, -8_388_608, 42]);
    assert!(frame.status.is_lead_off_p(2));
    assert!(!frame.status.is_lead_off_p(1));

    // Register access is refused until streaming stops
    assert!(matches!(
        adc.set_channel_gain(1, Gain::X1),
        Err(Ads1299Error::StreamingActive)
    ));
    adc.stop_streaming().unwrap();
    adc.set_channel_gain(1, Gain::X1).unwrap();
}

#[test]
fn desynchronized_frame_is_flagged_not_dropped() {
    let mut adc = device(0x3C);
    adc.begin().unwrap();
    adc.start_streaming().unwrap();
    adc.transport_mut()
        .queue_frame(&encode_frame(0x80_0000, &[7, 8, 9, 10]));
    adc.transport_mut().queue_samples(&[0, 0, 0, 1]);

    let bad = adc.read_frame().unwrap();
    assert!(!bad.is_synced());
    assert_eq!(bad.channels, vec![7, 8, 9, 10]);
    let good = adc.read_frame().unwrap();
    assert!(good.is_synced());
    assert_eq!(good.channel(4), Some(1));
    assert_eq!(adc.transport().frames_read(), 2);
}

#[test]
fn fifteen_byte_frame() {
    let data = [
        0xC0, 0x00, 0x00, 0x00, 0x00, 0x01, 0xFF, 0xFF, 0xFF, 0x80, 0x00, 0x00, 0x7F, 0xFF, 0xFF,
    ];
    let (frame, synced) = decode_frame(&data, 4).unwrap();
    assert!(synced);
    assert_eq!(frame.channels, vec![1, -1, -8_388_608, 8_388_607]);
}

#[test]
fn custom_timing_is_honored() {
    init_logger();
    let timing = Timing {
        decode_delay_us: 5,
        power_up_delay_ms: 150,
        ..Timing::default()
    };
    let mut adc = Ads1299::with_timing(
        SimulatedAds1299::new(0x3E),
        SimulatedControl::new(),
        RecordingDelay::new(),
        timing,
    );
    adc.power_up().unwrap();
    let (_, _, delay) = adc.release();
    let calls = delay.calls_us();
    assert_eq!(calls[0], 150_000);
    assert_eq!(calls.last(), Some(&5));
}

#[test]
fn transport_fault_propagates() {
    let mut adc = device(0x3E);
    adc.begin().unwrap();
    adc.transport_mut().inject_bus_fault();
    let err = adc.set_channel_gain(2, Gain::X4).unwrap_err();
    assert!(err.is_transport_error());
    assert!(!adc.transport().is_selected());
    // The next access goes through
    adc.set_channel_gain(2, Gain::X4).unwrap();
    assert_eq!(adc.channel_settings(2).unwrap().gain, Gain::X4);
}

#[test]
fn on_demand_read_while_streaming() {
    let mut adc = device(0x3C);
    adc.begin().unwrap();
    adc.start_streaming().unwrap();
    adc.transport_mut().set_lead_off_status(0x02, 0x00);
    adc.transport_mut().queue_samples(&[-1, 0, 1, 0x7F_FFFF]);

    let frame = adc.read_data_on_demand().unwrap();
    assert!(frame.is_synced());
    assert_eq!(frame.status.lead_off_p(), 0x02);
    assert_eq!(frame.channels, vec![-1, 0, 1, 0x7F_FFFF]);
    assert_eq!(adc.protocol_state(), ProtocolState::Streaming);
    assert!(adc.transport().is_streaming());
}

#[test]
fn failed_default_write_aborts_without_rollback() {
    let mut adc = device(0x3E);
    adc.power_up().unwrap();
    adc.transport_mut().clear_transactions();
    // STOP, SDATAC, then three WREGs before the LOFF write fails
    adc.transport_mut().inject_bus_fault_after(2 + 3 * 3);

    let err = adc
        .configure_defaults(&DefaultConfig::default())
        .unwrap_err();
    assert!(matches!(err, Ads1299Error::Transport(_)));

    let sim = adc.transport();
    assert_eq!(sim.transactions().len(), 6);
    assert!(sim.transactions()[5].is_empty());
    assert_eq!(sim.register(REG_CONFIG1), 0xD6);
    assert_eq!(sim.register(REG_CONFIG2), 0xC0);
    assert_eq!(sim.register(REG_CONFIG3), 0xE8);
    assert_eq!(sim.register(REG_LOFF), 0x00);
    assert_eq!(sim.registers()[REG_CH1SET as usize], 0x61);
    assert!(!sim.is_selected());
}

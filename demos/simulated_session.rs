//! Simulated Acquisition Session
//!
//! Runs a complete session against the in-memory ADS1299 simulator:
//!
//! 1. Power-up, reset and identification
//! 2. Default configuration
//! 3. Per-channel adjustments (gain, test signal input)
//! 4. Continuous read of a handful of frames
//! 5. Shutdown
//!
//! Run with `RUST_LOG=debug` to see every command and register transaction.

use ads1299::mock::{encode_frame, RecordingDelay, SimulatedAds1299, SimulatedControl};
use ads1299::{register_dump, Ads1299, Ads1299Error, DefaultConfig, Gain, InputMux};

type SimDevice = Ads1299<SimulatedAds1299, SimulatedControl, RecordingDelay>;

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn power_up(adc: &mut SimDevice) -> Result<(), Ads1299Error> {
    println!("=== Step 1: Power-up ===");
    let id = adc.power_up()?;
    println!("{}", id);
    println!();
    Ok(())
}

fn configure(adc: &mut SimDevice) -> Result<(), Ads1299Error> {
    println!("=== Step 2: Default configuration ===");
    let config = DefaultConfig::default();
    for write in config.register_writes(adc.channel_count()) {
        println!("  {}", write);
    }
    adc.configure_defaults(&config)?;
    println!();

    println!("=== Step 3: Channel adjustments ===");
    adc.set_channel_gain(1, Gain::X12)?;
    adc.set_channel_mux(2, InputMux::TestSignal)?;
    for channel in 1..=adc.channel_count() {
        let settings = adc.channel_settings(channel)?;
        println!(
            "  CH{}: {} gain x{:<2} {:?}{}",
            channel,
            if settings.powered_on { "on " } else { "off" },
            settings.gain.multiplier(),
            settings.mux,
            if settings.srb2 { " SRB2" } else { "" }
        );
    }
    println!();

    print!("{}", register_dump(&adc.read_all_registers()?));
    println!();
    Ok(())
}

fn stream(adc: &mut SimDevice) -> Result<(), Ads1299Error> {
    println!("=== Step 4: Streaming ===");
    let channels = adc.channel_count() as i32;
    let sim = adc.transport_mut();
    for n in 0..4 {
        let samples: Vec<i32> = (0..channels).map(|c| (c + 1) * 1000 * (n - 2)).collect();
        sim.queue_samples(&samples);
    }
    // One frame without the sync pattern
    sim.queue_frame(&encode_frame(0x40_0000, &vec![0; channels as usize]));

    adc.start_streaming()?;
    for _ in 0..5 {
        let frame = adc.read_frame()?;
        if frame.is_synced() {
            println!("  {}", frame);
        } else {
            println!("  dropped frame (status 0x{:06X})", frame.status.raw());
        }
    }
    println!();
    Ok(())
}

fn run() -> Result<(), Ads1299Error> {
    let mut adc = Ads1299::new(
        SimulatedAds1299::new(0x3E),
        SimulatedControl::new(),
        RecordingDelay::new(),
    );

    power_up(&mut adc)?;
    configure(&mut adc)?;
    stream(&mut adc)?;

    println!("=== Step 5: Shutdown ===");
    adc.shutdown()?;

    let (sim, _, delay) = adc.release();
    println!(
        "{} transactions, {} us spent waiting",
        sim.transactions().len(),
        delay.total_ns() / 1_000
    );
    Ok(())
}

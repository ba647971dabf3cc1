//! Simulated ADS1299 for testing without hardware
//!
//! [`SimulatedAds1299`] decodes the wire protocol against an in-memory
//! register file and records every chip-select window. [`SimulatedControl`]
//! stands in for the control lines and [`RecordingDelay`] records every wait
//! the driver makes.

use std::collections::VecDeque;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::PinState;

use crate::constants::*;
use crate::error::TransportError;
use crate::registers::DeviceId;
use crate::transport::{DigitalControl, Transport};

/// Build a frame block from a status word and samples
pub fn encode_frame(status: u32, samples: &[i32]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(STATUS_BYTES + SAMPLE_BYTES * samples.len());
    frame.extend_from_slice(&status.to_be_bytes()[1..]);
    for sample in samples {
        frame.extend_from_slice(&sample.to_be_bytes()[1..]);
    }
    frame
}

/// Where the simulator is inside the current chip-select window
#[derive(Debug, Clone, Copy)]
enum Phase {
    Opcode,
    Count { write: bool, start: u8 },
    Registers { write: bool, address: u8, remaining: usize },
    Frame { position: usize },
    Done,
}

/// In-memory ADS1299 speaking the serial protocol
#[derive(Debug)]
pub struct SimulatedAds1299 {
    id: u8,
    registers: [u8; REGISTER_COUNT],
    streaming: bool,
    converting: bool,
    standby: bool,
    initialized: bool,
    selected: bool,
    phase: Phase,
    frames: VecDeque<Vec<u8>>,
    current_frame: Vec<u8>,
    frames_read: usize,
    transactions: Vec<Vec<u8>>,
    current: Vec<u8>,
    fault_countdown: Option<usize>,
    select_fault: bool,
}

impl SimulatedAds1299 {
    /// Create a simulator reporting `id` in the ID register
    ///
    /// Like the real part after power-on it starts in continuous read mode.
    pub fn new(id: u8) -> Self {
        Self {
            id,
            registers: Self::reset_values(id),
            streaming: true,
            converting: false,
            standby: false,
            initialized: false,
            selected: false,
            phase: Phase::Opcode,
            frames: VecDeque::new(),
            current_frame: Vec::new(),
            frames_read: 0,
            transactions: Vec::new(),
            current: Vec::new(),
            fault_countdown: None,
            select_fault: false,
        }
    }

    fn reset_values(id: u8) -> [u8; REGISTER_COUNT] {
        let mut registers = [0u8; REGISTER_COUNT];
        registers[REG_ID as usize] = id;
        registers[REG_CONFIG1 as usize] = 0x96;
        registers[REG_CONFIG2 as usize] = 0xC0;
        registers[REG_CONFIG3 as usize] = 0x60;
        for address in REG_CH1SET..=REG_CH8SET {
            registers[address as usize] = 0x61;
        }
        registers
    }

    /// Number of channels the simulated part reports
    pub fn channel_count(&self) -> u8 {
        DeviceId::from_byte(self.id).channel_count()
    }

    /// Current register value
    pub fn register(&self, address: u8) -> u8 {
        self.registers[address as usize]
    }

    /// Whole register file
    pub fn registers(&self) -> &[u8; REGISTER_COUNT] {
        &self.registers
    }

    /// Set a register directly, bypassing the protocol
    pub fn set_register(&mut self, address: u8, value: u8) {
        self.registers[address as usize] = value;
    }

    /// Set the lead-off status registers and the status word masks
    pub fn set_lead_off_status(&mut self, positive: u8, negative: u8) {
        self.registers[REG_LOFF_STATP as usize] = positive;
        self.registers[REG_LOFF_STATN as usize] = negative;
    }

    /// Queue a raw frame block for the next frame read
    pub fn queue_frame(&mut self, frame: &[u8]) {
        self.frames.push_back(frame.to_vec());
    }

    /// Queue an in-sync frame carrying `samples`
    pub fn queue_samples(&mut self, samples: &[i32]) {
        let status = self.status_word();
        self.frames.push_back(encode_frame(status, samples));
    }

    /// Leave continuous read mode without a command
    pub fn stop_streaming(&mut self) {
        self.streaming = false;
    }

    /// Make the next byte exchange fail
    pub fn inject_bus_fault(&mut self) {
        self.inject_bus_fault_after(0);
    }

    /// Let `exchanges` bytes through, then fail the next exchange
    pub fn inject_bus_fault_after(&mut self, exchanges: usize) {
        self.fault_countdown = Some(exchanges);
    }

    /// Make the next chip-select assertion fail
    pub fn inject_select_fault(&mut self) {
        self.select_fault = true;
    }

    pub fn is_streaming(&self) -> bool {
        self.streaming
    }

    pub fn is_converting(&self) -> bool {
        self.converting
    }

    pub fn is_standby(&self) -> bool {
        self.standby
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn is_selected(&self) -> bool {
        self.selected
    }

    /// Bytes written during each completed chip-select window
    pub fn transactions(&self) -> &[Vec<u8>] {
        &self.transactions
    }

    /// Forget recorded transactions
    pub fn clear_transactions(&mut self) {
        self.transactions.clear();
    }

    /// Check if a window started with the given bytes
    pub fn was_sent(&self, expected: &[u8]) -> bool {
        self.transactions.iter().any(|t| t.starts_with(expected))
    }

    /// Number of frames clocked out so far
    pub fn frames_read(&self) -> usize {
        self.frames_read
    }

    fn status_word(&self) -> u32 {
        STATUS_SYNC_VALUE
            | (self.registers[REG_LOFF_STATP as usize] as u32) << STATUS_LOFF_P_SHIFT
            | (self.registers[REG_LOFF_STATN as usize] as u32) << STATUS_LOFF_N_SHIFT
            | (self.registers[REG_GPIO as usize] >> 4) as u32
    }

    fn load_frame(&mut self) {
        self.current_frame = match self.frames.pop_front() {
            Some(frame) => frame,
            None => {
                let samples = vec![0; self.channel_count() as usize];
                encode_frame(self.status_word(), &samples)
            }
        };
    }

    fn decode_opcode(&mut self, opcode: u8) -> u8 {
        if self.streaming && opcode == CMD_NOP {
            self.load_frame();
            self.phase = Phase::Frame { position: 1 };
            return self.current_frame.first().copied().unwrap_or(0);
        }

        self.phase = Phase::Done;
        match opcode {
            CMD_WAKEUP => self.standby = false,
            CMD_STANDBY => self.standby = true,
            CMD_RESET => {
                self.registers = Self::reset_values(self.id);
                self.streaming = true;
                self.converting = false;
            }
            CMD_START => self.converting = true,
            CMD_STOP => self.converting = false,
            CMD_RDATAC => self.streaming = true,
            CMD_SDATAC => self.streaming = false,
            CMD_RDATA => {
                self.load_frame();
                self.phase = Phase::Frame { position: 0 };
            }
            // Register opcodes are ignored in continuous read mode
            op if op & 0xE0 == CMD_RREG && !self.streaming => {
                self.phase = Phase::Count {
                    write: false,
                    start: op & CMD_ADDR_MASK,
                };
            }
            op if op & 0xE0 == CMD_WREG && !self.streaming => {
                self.phase = Phase::Count {
                    write: true,
                    start: op & CMD_ADDR_MASK,
                };
            }
            _ => {}
        }
        0
    }
}

impl Transport for SimulatedAds1299 {
    fn init(&mut self) -> Result<(), TransportError> {
        self.initialized = true;
        self.selected = false;
        Ok(())
    }

    fn select(&mut self) -> Result<(), TransportError> {
        if self.select_fault {
            self.select_fault = false;
            return Err(TransportError::Pin {
                line: "CS",
                reason: "injected fault".into(),
            });
        }
        if !self.selected {
            self.selected = true;
            self.phase = Phase::Opcode;
            self.current.clear();
        }
        Ok(())
    }

    fn deselect(&mut self) -> Result<(), TransportError> {
        if self.selected {
            if let Phase::Frame { position } = self.phase {
                if position > 0 {
                    self.frames_read += 1;
                }
            }
            self.selected = false;
            self.phase = Phase::Opcode;
            self.transactions.push(std::mem::take(&mut self.current));
        }
        Ok(())
    }

    fn exchange_byte(&mut self, byte: u8) -> Result<u8, TransportError> {
        if let Some(remaining) = self.fault_countdown {
            if remaining == 0 {
                self.fault_countdown = None;
                return Err(TransportError::Bus("injected fault".into()));
            }
            self.fault_countdown = Some(remaining - 1);
        }
        if !self.selected {
            return Err(TransportError::Bus("exchange without chip select".into()));
        }
        self.current.push(byte);

        let miso = match self.phase {
            Phase::Opcode => self.decode_opcode(byte),
            Phase::Count { write, start } => {
                self.phase = Phase::Registers {
                    write,
                    address: start,
                    remaining: byte as usize + 1,
                };
                0
            }
            Phase::Registers {
                write,
                address,
                remaining,
            } => {
                let index = address as usize;
                let miso = if write {
                    if index < REGISTER_COUNT && !is_read_only(address) {
                        self.registers[index] = byte;
                    }
                    0
                } else {
                    self.registers.get(index).copied().unwrap_or(0)
                };
                self.phase = if remaining > 1 {
                    Phase::Registers {
                        write,
                        address: address.wrapping_add(1),
                        remaining: remaining - 1,
                    }
                } else {
                    Phase::Done
                };
                miso
            }
            Phase::Frame { position } => {
                self.phase = Phase::Frame {
                    position: position + 1,
                };
                self.current_frame.get(position).copied().unwrap_or(0)
            }
            Phase::Done => 0,
        };
        Ok(miso)
    }
}

/// Simulated RESET, START and PWDN lines plus DRDY
#[derive(Debug)]
pub struct SimulatedControl {
    reset: PinState,
    start: PinState,
    power_down: PinState,
    data_ready: bool,
    reset_pulses: usize,
    history: Vec<(&'static str, PinState)>,
}

impl Default for SimulatedControl {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedControl {
    /// All lines low, no frame pending
    pub fn new() -> Self {
        Self {
            reset: PinState::Low,
            start: PinState::Low,
            power_down: PinState::Low,
            data_ready: false,
            reset_pulses: 0,
            history: Vec::new(),
        }
    }

    /// Set what `data_ready` reports
    pub fn set_data_ready(&mut self, ready: bool) {
        self.data_ready = ready;
    }

    pub fn reset_level(&self) -> PinState {
        self.reset
    }

    pub fn start_level(&self) -> PinState {
        self.start
    }

    pub fn power_down_level(&self) -> PinState {
        self.power_down
    }

    /// Number of times RESET was driven from high to low
    pub fn reset_pulses(&self) -> usize {
        self.reset_pulses
    }

    /// Every level change in order, tagged with the line name
    pub fn history(&self) -> &[(&'static str, PinState)] {
        &self.history
    }
}

impl DigitalControl for SimulatedControl {
    fn set_reset(&mut self, level: PinState) -> Result<(), TransportError> {
        if self.reset == PinState::High && level == PinState::Low {
            self.reset_pulses += 1;
        }
        self.reset = level;
        self.history.push(("RESET", level));
        Ok(())
    }

    fn set_start(&mut self, level: PinState) -> Result<(), TransportError> {
        self.start = level;
        self.history.push(("START", level));
        Ok(())
    }

    fn set_power_down(&mut self, level: PinState) -> Result<(), TransportError> {
        self.power_down = level;
        self.history.push(("PWDN", level));
        Ok(())
    }

    fn data_ready(&mut self) -> Result<bool, TransportError> {
        Ok(self.data_ready)
    }
}

/// Delay provider that records instead of waiting
#[derive(Debug, Clone, Default)]
pub struct RecordingDelay {
    calls_ns: Vec<u64>,
}

impl RecordingDelay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every requested wait in microseconds, in order
    pub fn calls_us(&self) -> Vec<u32> {
        self.calls_ns.iter().map(|ns| (ns / 1_000) as u32).collect()
    }

    /// Sum of all requested waits
    pub fn total_ns(&self) -> u64 {
        self.calls_ns.iter().sum()
    }

    pub fn clear(&mut self) {
        self.calls_ns.clear();
    }
}

impl DelayNs for RecordingDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.calls_ns.push(ns as u64);
    }

    fn delay_us(&mut self, us: u32) {
        self.calls_ns.push(us as u64 * 1_000);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.calls_ns.push(ms as u64 * 1_000_000);
    }
}

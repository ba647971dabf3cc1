//! ADS1299 command protocol
//!
//! This module provides [`CommandProtocol`], which frames opcodes and
//! register accesses into chip-select transactions and tracks whether the
//! device is idle or in read-data-continuous (streaming) mode.
//!
//! Every transaction is followed by the command decode delay, whether it
//! succeeded or not. Register access is refused while streaming because
//! register opcodes and frame data share the same byte stream.

use embedded_hal::delay::DelayNs;
use log::{debug, trace};

use crate::config::Timing;
use crate::constants::*;
use crate::error::{Ads1299Error, Result, TransportError};
use crate::transport::Transport;

/// Single-byte commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Wakeup,
    Standby,
    Reset,
    Start,
    Stop,
    /// Enter read-data-continuous mode
    ReadDataContinuous,
    /// Leave read-data-continuous mode
    StopDataContinuous,
    /// Read one frame on demand
    ReadData,
}

impl Command {
    /// Wire opcode
    pub fn opcode(self) -> u8 {
        match self {
            Command::Wakeup => CMD_WAKEUP,
            Command::Standby => CMD_STANDBY,
            Command::Reset => CMD_RESET,
            Command::Start => CMD_START,
            Command::Stop => CMD_STOP,
            Command::ReadDataContinuous => CMD_RDATAC,
            Command::StopDataContinuous => CMD_SDATAC,
            Command::ReadData => CMD_RDATA,
        }
    }

    /// Datasheet mnemonic
    pub fn name(self) -> &'static str {
        match self {
            Command::Wakeup => "WAKEUP",
            Command::Standby => "STANDBY",
            Command::Reset => "RESET",
            Command::Start => "START",
            Command::Stop => "STOP",
            Command::ReadDataContinuous => "RDATAC",
            Command::StopDataContinuous => "SDATAC",
            Command::ReadData => "RDATA",
        }
    }
}

/// Which kind of bytes the device puts on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProtocolState {
    /// Register access and single commands
    #[default]
    Idle,
    /// Frames clocked out on every data-ready without opcodes
    Streaming,
}

/// Opcode and register transactions over a [`Transport`]
pub struct CommandProtocol<T, D> {
    transport: T,
    delay: D,
    timing: Timing,
    state: ProtocolState,
}

impl<T: Transport, D: DelayNs> CommandProtocol<T, D> {
    /// Create a protocol handler in the `Idle` state
    pub fn new(transport: T, delay: D, timing: Timing) -> Self {
        Self {
            transport,
            delay,
            timing,
            state: ProtocolState::Idle,
        }
    }

    /// Current protocol state
    pub fn state(&self) -> ProtocolState {
        self.state
    }

    /// Check if read-data-continuous mode is active
    pub fn is_streaming(&self) -> bool {
        self.state == ProtocolState::Streaming
    }

    /// Timing in use
    pub fn timing(&self) -> &Timing {
        &self.timing
    }

    /// Initialize the underlying transport
    pub fn init_transport(&mut self) -> Result<()> {
        self.transport.init()?;
        Ok(())
    }

    /// Release chip select without a transaction
    pub fn release_bus(&mut self) -> Result<()> {
        self.transport.deselect()?;
        Ok(())
    }

    /// Delay provider shared with the pin sequencing
    pub fn delay_mut(&mut self) -> &mut D {
        &mut self.delay
    }

    /// Borrow the transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Mutably borrow the transport
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Give back the transport and delay
    pub fn release(self) -> (T, D) {
        (self.transport, self.delay)
    }

    /// Send a single-byte command
    ///
    /// `ReadDataContinuous` and `StopDataContinuous` switch the protocol
    /// state; every other command leaves it alone. Use
    /// [`Self::read_data_on_demand`] for `ReadData`, which must be followed
    /// by a frame in the same transaction.
    pub fn send_command(&mut self, command: Command) -> Result<()> {
        debug!("-> {} (0x{:02X})", command.name(), command.opcode());
        let settle_us = match command {
            Command::Reset => self.timing.reset_command_delay_us,
            _ => self.timing.decode_delay_us,
        };
        self.transaction(settle_us, |t| t.exchange_byte(command.opcode()).map(|_| ()))?;

        match command {
            Command::ReadDataContinuous => self.state = ProtocolState::Streaming,
            Command::StopDataContinuous => self.state = ProtocolState::Idle,
            _ => {}
        }
        Ok(())
    }

    /// Leave standby (WAKEUP)
    pub fn wakeup(&mut self) -> Result<()> {
        self.send_command(Command::Wakeup)
    }

    /// Enter low-power standby (STANDBY)
    pub fn standby(&mut self) -> Result<()> {
        self.send_command(Command::Standby)
    }

    /// Reset registers to their power-on values (RESET)
    pub fn reset(&mut self) -> Result<()> {
        self.send_command(Command::Reset)
    }

    /// Start conversions (START)
    pub fn start(&mut self) -> Result<()> {
        self.send_command(Command::Start)
    }

    /// Stop conversions (STOP)
    pub fn stop(&mut self) -> Result<()> {
        self.send_command(Command::Stop)
    }

    /// Enter streaming mode (RDATAC)
    pub fn start_continuous(&mut self) -> Result<()> {
        self.send_command(Command::ReadDataContinuous)
    }

    /// Leave streaming mode (SDATAC)
    pub fn stop_continuous(&mut self) -> Result<()> {
        self.send_command(Command::StopDataContinuous)
    }

    /// Read one register
    pub fn read_register(&mut self, address: u8) -> Result<u8> {
        let mut value = [0u8];
        self.read_registers(address, &mut value)?;
        Ok(value[0])
    }

    /// Write one register
    pub fn write_register(&mut self, address: u8, value: u8) -> Result<()> {
        self.write_registers(address, &[value])
    }

    /// Read `buf.len()` consecutive registers starting at `start`
    pub fn read_registers(&mut self, start: u8, buf: &mut [u8]) -> Result<()> {
        self.check_register_access(start, buf.len())?;
        let count = (buf.len() - 1) as u8;
        let settle_us = self.timing.decode_delay_us;

        self.transaction(settle_us, |t| {
            t.exchange_byte(CMD_RREG | start)?;
            t.exchange_byte(count)?;
            for value in buf.iter_mut() {
                *value = t.exchange_byte(CMD_NOP)?;
            }
            Ok(())
        })?;

        debug!("RREG 0x{:02X} ({}): {:02X?}", start, register_name(start), buf);
        Ok(())
    }

    /// Write `data` to consecutive registers starting at `start`
    pub fn write_registers(&mut self, start: u8, data: &[u8]) -> Result<()> {
        self.check_register_access(start, data.len())?;
        if let Some(address) = (start..start + data.len() as u8).find(|a| is_read_only(*a)) {
            return Err(Ads1299Error::ReadOnlyRegister(address));
        }
        let count = (data.len() - 1) as u8;
        let settle_us = self.timing.decode_delay_us;

        debug!("WREG 0x{:02X} ({}): {:02X?}", start, register_name(start), data);
        self.transaction(settle_us, |t| {
            t.exchange_byte(CMD_WREG | start)?;
            t.exchange_byte(count)?;
            for &value in data {
                t.exchange_byte(value)?;
            }
            Ok(())
        })
    }

    /// Clock one streaming frame into `buf`
    pub fn read_frame(&mut self, buf: &mut [u8]) -> Result<()> {
        if !self.is_streaming() {
            return Err(Ads1299Error::NotStreaming);
        }
        buf.fill(CMD_NOP);
        let settle_us = self.timing.decode_delay_us;
        self.transaction(settle_us, |t| t.exchange(buf))?;
        trace!("frame: {:02X?}", buf);
        Ok(())
    }

    /// Send RDATA and clock exactly one frame into `buf`
    ///
    /// Valid in either protocol state.
    pub fn read_data_on_demand(&mut self, buf: &mut [u8]) -> Result<()> {
        debug!("-> RDATA (0x{:02X}), {} bytes", CMD_RDATA, buf.len());
        buf.fill(CMD_NOP);
        let settle_us = self.timing.decode_delay_us;
        self.transaction(settle_us, |t| {
            t.exchange_byte(CMD_RDATA)?;
            t.exchange(buf)
        })?;
        trace!("frame: {:02X?}", buf);
        Ok(())
    }

    /// Validate a register range and the protocol state before any I/O
    fn check_register_access(&self, start: u8, count: usize) -> Result<()> {
        if start > REG_LAST {
            return Err(Ads1299Error::InvalidRegister(start));
        }
        if count == 0 || start as usize + count > REGISTER_COUNT {
            return Err(Ads1299Error::InvalidBurst { start, count });
        }
        if self.is_streaming() {
            return Err(Ads1299Error::StreamingActive);
        }
        Ok(())
    }

    /// Run `f` inside a chip-select window, then wait `settle_us`
    ///
    /// The bus is released and the wait is honored even when selecting the
    /// device or `f` fails. `f` only runs once chip select is asserted.
    fn transaction<R>(
        &mut self,
        settle_us: u32,
        f: impl FnOnce(&mut T) -> std::result::Result<R, TransportError>,
    ) -> Result<R> {
        let result = match self.transport.select() {
            Ok(()) => f(&mut self.transport),
            Err(e) => Err(e),
        };
        let released = self.transport.deselect();
        self.delay.delay_us(settle_us);

        let value = result?;
        released?;
        Ok(value)
    }
}

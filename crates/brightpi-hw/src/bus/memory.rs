//! In-memory register file standing in for the SC620.

use super::RegisterBus;
use crate::registers::{DEFAULT_GAIN, GAIN_REGISTER, REGISTER_COUNT};
use crate::{Error, Result};
use std::io;
use tracing::debug;

/// Simulated register bus.
///
/// Starts in the power-on state, records every write and can be switched
/// offline to exercise the error path.
#[derive(Debug, Clone)]
pub struct MemoryBus {
    registers: [u8; REGISTER_COUNT],
    writes: Vec<(u8, u8)>,
    available: bool,
    /// Writes left before the bus goes offline; `None` means unlimited.
    writes_left: Option<usize>,
}

impl Default for MemoryBus {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBus {
    /// Creates a bus holding the power-on register values.
    pub fn new() -> Self {
        let mut registers = [0u8; REGISTER_COUNT];
        registers[GAIN_REGISTER as usize] = DEFAULT_GAIN;
        Self {
            registers,
            writes: Vec::new(),
            available: true,
            writes_left: None,
        }
    }

    /// Returns the current value of a register.
    pub fn register(&self, reg: u8) -> Option<u8> {
        self.registers.get(reg as usize).copied()
    }

    /// Returns every `(register, value)` write in order.
    pub fn writes(&self) -> &[(u8, u8)] {
        &self.writes
    }

    /// Forgets the recorded writes.
    pub fn clear_writes(&mut self) {
        self.writes.clear();
    }

    /// Makes subsequent transfers fail (or succeed again).
    pub fn set_available(&mut self, available: bool) {
        self.available = available;
        self.writes_left = None;
    }

    /// Lets `writes` more writes succeed, then takes the bus offline.
    pub fn fail_after(&mut self, writes: usize) {
        self.available = true;
        self.writes_left = Some(writes);
    }

    fn check(&self, reg: u8) -> Result<usize> {
        if !self.available {
            return Err(Error::unavailable(
                "simulated bus",
                io::Error::new(io::ErrorKind::NotConnected, "bus offline"),
            ));
        }
        let index = reg as usize;
        if index >= REGISTER_COUNT {
            return Err(Error::unavailable(
                "simulated bus",
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("no register 0x{:02X}", reg),
                ),
            ));
        }
        Ok(index)
    }
}

impl RegisterBus for MemoryBus {
    fn write_register(&mut self, reg: u8, value: u8) -> Result<()> {
        if self.writes_left == Some(0) {
            self.available = false;
        }
        let index = self.check(reg)?;
        if let Some(left) = self.writes_left.as_mut() {
            *left -= 1;
        }
        debug!("simulated write: [{:02X}] = {:02X}", reg, value);
        self.registers[index] = value;
        self.writes.push((reg, value));
        Ok(())
    }

    fn read_register(&mut self, reg: u8) -> Result<u8> {
        let index = self.check(reg)?;
        Ok(self.registers[index])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_power_on_state() {
        let bus = MemoryBus::new();
        assert_eq!(bus.register(0x00), Some(0));
        assert_eq!(bus.register(GAIN_REGISTER), Some(DEFAULT_GAIN));
        assert_eq!(bus.register(0x0A), None);
    }

    #[test]
    fn test_write_log() {
        let mut bus = MemoryBus::new();
        bus.write_register(0x00, 0xA5).unwrap();
        bus.write_register(0x09, 0x0F).unwrap();
        assert_eq!(bus.writes(), &[(0x00, 0xA5), (0x09, 0x0F)]);
        assert_eq!(bus.read_register(0x00).unwrap(), 0xA5);
    }

    #[test]
    fn test_offline() {
        let mut bus = MemoryBus::new();
        bus.set_available(false);
        assert!(bus.write_register(0x00, 0x01).unwrap_err().is_hardware());
        assert!(bus.read_register(0x00).is_err());
        assert!(bus.writes().is_empty());
    }

    #[test]
    fn test_fail_after() {
        let mut bus = MemoryBus::new();
        bus.fail_after(2);
        bus.write_register(0x01, 0x01).unwrap();
        bus.write_register(0x02, 0x02).unwrap();
        assert!(bus.write_register(0x03, 0x03).unwrap_err().is_hardware());
        assert!(bus.read_register(0x01).is_err());
        assert_eq!(bus.writes().len(), 2);

        bus.set_available(true);
        bus.write_register(0x03, 0x03).unwrap();
    }

    #[test]
    fn test_unknown_register() {
        let mut bus = MemoryBus::new();
        assert!(bus.write_register(0x20, 0x01).is_err());
    }
}

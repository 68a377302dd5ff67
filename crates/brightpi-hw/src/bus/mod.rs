//! Register bus abstraction.
//!
//! The controller never talks to hardware directly; it writes and reads
//! single-byte registers through a [`RegisterBus`].

mod i2c;
mod memory;
mod shared;

pub use i2c::I2cDevBus;
pub use memory::MemoryBus;
pub use shared::SharedBus;

use crate::Result;

/// Byte-wide register access to the LED driver.
pub trait RegisterBus {
    /// Writes `value` to register `reg`.
    fn write_register(&mut self, reg: u8, value: u8) -> Result<()>;

    /// Reads register `reg`.
    fn read_register(&mut self, reg: u8) -> Result<u8>;
}

impl<B: RegisterBus + ?Sized> RegisterBus for &mut B {
    fn write_register(&mut self, reg: u8, value: u8) -> Result<()> {
        (**self).write_register(reg, value)
    }

    fn read_register(&mut self, reg: u8) -> Result<u8> {
        (**self).read_register(reg)
    }
}

impl<B: RegisterBus + ?Sized> RegisterBus for Box<B> {
    fn write_register(&mut self, reg: u8, value: u8) -> Result<()> {
        (**self).write_register(reg, value)
    }

    fn read_register(&mut self, reg: u8) -> Result<u8> {
        (**self).read_register(reg)
    }
}

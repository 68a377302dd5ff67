//! Bright Pi Hardware Library
//!
//! Provides hardware abstraction for the Bright Pi illumination board: four
//! white and four infrared LEDs driven by an SC620 LED driver over Linux I2C.

pub mod bus;
pub mod controller;
pub mod effects;
pub mod error;
pub mod led;
pub mod registers;

pub use bus::{I2cDevBus, MemoryBus, RegisterBus, SharedBus};
pub use controller::{BrightPi, GroupState, LedControl, Status};
pub use effects::{Effect, Frame, SpecialEffects};
pub use error::{Error, Result};
pub use led::{Led, LedGroup, LedSet, LedState};

/// Default I2C bus device on a Raspberry Pi.
pub const DEFAULT_BUS_DEVICE: &str = "/dev/i2c-1";

/// I2C slave address of the SC620 on the Bright Pi.
pub const DEFAULT_ADDRESS: u16 = 0x70;

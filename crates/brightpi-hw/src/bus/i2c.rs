//! Linux i2c-dev bus.

use super::RegisterBus;
use crate::{Error, Result};
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::os::unix::io::AsRawFd;
use tracing::{debug, info};

/// ioctl request selecting the slave address for subsequent transfers.
const I2C_SLAVE: u16 = 0x0703;

/// Register bus backed by a `/dev/i2c-N` character device.
pub struct I2cDevBus {
    file: File,
    path: String,
    address: u16,
}

impl I2cDevBus {
    /// Opens the bus device and selects the slave at `address`.
    pub fn open(path: &str, address: u16) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|e| Error::unavailable(format!("open {}", path), e))?;

        // SAFETY: the fd is owned by `file` and stays open for the call.
        let rc = unsafe {
            libc::ioctl(
                file.as_raw_fd(),
                I2C_SLAVE as _,
                libc::c_ulong::from(address),
            )
        };
        if rc < 0 {
            return Err(Error::unavailable(
                format!("select slave 0x{:02X} on {}", address, path),
                io::Error::last_os_error(),
            ));
        }

        info!("I2C bus opened at {} (slave 0x{:02X})", path, address);

        Ok(Self {
            file,
            path: path.to_string(),
            address,
        })
    }

    /// Returns the device path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the selected slave address.
    pub fn address(&self) -> u16 {
        self.address
    }

    fn transfer_error(&self, what: &str, reg: u8, e: io::Error) -> Error {
        Error::unavailable(
            format!("{} register 0x{:02X} on {}", what, reg, self.path),
            e,
        )
    }
}

fn check_len(done: usize, expected: usize) -> io::Result<()> {
    if done != expected {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("short transfer: {} of {} bytes", done, expected),
        ));
    }
    Ok(())
}

impl RegisterBus for I2cDevBus {
    fn write_register(&mut self, reg: u8, value: u8) -> Result<()> {
        let buffer = [reg, value];
        debug!("I2C write {}: {:02X?}", self.path, buffer);

        self.file
            .write(&buffer)
            .and_then(|n| check_len(n, buffer.len()))
            .map_err(|e| self.transfer_error("write", reg, e))
    }

    fn read_register(&mut self, reg: u8) -> Result<u8> {
        self.file
            .write(&[reg])
            .and_then(|n| check_len(n, 1))
            .map_err(|e| self.transfer_error("address", reg, e))?;

        let mut value = [0u8; 1];
        self.file
            .read(&mut value)
            .and_then(|n| check_len(n, 1))
            .map_err(|e| self.transfer_error("read", reg, e))?;

        debug!("I2C read {}: [{:02X}] = {:02X}", self.path, reg, value[0]);
        Ok(value[0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_len() {
        assert!(check_len(2, 2).is_ok());
        let err = check_len(1, 2).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_open_missing_device() {
        let err = I2cDevBus::open("/dev/i2c-does-not-exist", 0x70)
            .err()
            .expect("opening a missing device must fail");
        assert!(err.is_hardware());
    }
}

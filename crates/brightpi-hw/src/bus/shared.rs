//! Bus handle shared between controllers in one process.

use super::RegisterBus;
use crate::{Error, Result};
use std::io;
use std::sync::{Arc, Mutex, MutexGuard};

/// Clonable handle that serialises access to one underlying bus.
///
/// Each transfer holds the lock for a single register access.
pub struct SharedBus<B> {
    inner: Arc<Mutex<B>>,
}

impl<B> Clone for SharedBus<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<B: RegisterBus> SharedBus<B> {
    /// Wraps `bus` for sharing.
    pub fn new(bus: B) -> Self {
        Self {
            inner: Arc::new(Mutex::new(bus)),
        }
    }

    /// Locks the underlying bus.
    pub fn lock(&self) -> Result<MutexGuard<'_, B>> {
        self.inner
            .lock()
            .map_err(|_| Error::unavailable("shared bus", io::Error::other("bus lock poisoned")))
    }
}

impl<B: RegisterBus> RegisterBus for SharedBus<B> {
    fn write_register(&mut self, reg: u8, value: u8) -> Result<()> {
        self.lock()?.write_register(reg, value)
    }

    fn read_register(&mut self, reg: u8) -> Result<u8> {
        self.lock()?.read_register(reg)
    }
}

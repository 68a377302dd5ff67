//! Error types for the Bright Pi hardware library.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when interacting with the hardware.
#[derive(Error, Debug)]
pub enum Error {
    /// Unrecognized LED, group or state, or an otherwise unusable argument.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Register value outside what the device accepts.
    #[error("{what} out of range (must be 0-{max}): {value}")]
    OutOfRange {
        what: &'static str,
        value: u32,
        max: u8,
    },

    /// The register bus could not be reached or a transfer failed.
    #[error("Hardware unavailable ({context}): {source}")]
    HardwareUnavailable {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Wraps an I/O error from the bus layer.
    pub fn unavailable(context: impl Into<String>, source: std::io::Error) -> Self {
        Error::HardwareUnavailable {
            context: context.into(),
            source,
        }
    }

    /// Returns true for errors raised by the bus rather than by validation.
    pub fn is_hardware(&self) -> bool {
        matches!(self, Error::HardwareUnavailable { .. })
    }
}

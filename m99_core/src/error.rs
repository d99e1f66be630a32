//! Driver error types

use crate::config::ConfigError;
use hal::{SignalError, StreamError};
use thiserror::Error;

/// Result type for driver operations
pub type Result<T> = core::result::Result<T, DriverError>;

/// Errors returned by the timer driver
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DriverError {
    /// Reload value outside 1..=0xFFFFFF
    #[error("Reload value out of range: {0} (expected 1..=0xFFFFFF)")]
    ReloadOutOfRange(u32),

    /// SRAM block larger than the SRAM
    #[error("Block of {0} bytes exceeds SRAM size")]
    BlockTooLarge(usize),

    /// Notification slot index out of range
    #[error("Invalid notification slot: {0}")]
    InvalidSlot(usize),

    /// Notification slot is already bound
    #[error("Notification slot {0} already bound")]
    SlotAlreadyBound(usize),

    /// Notification slot is not bound
    #[error("Notification slot {0} not bound")]
    SlotNotBound(usize),

    /// Status code not recognized for this direction
    #[error("Unknown status code: 0x{0:04X}")]
    UnknownCode(u32),

    /// Counter bytes never read back consistently
    #[error("Counter readout unstable after {0} retries")]
    CounterUnstable(u32),

    /// Stream buffer failure
    #[error("Stream buffer error: {0}")]
    Stream(#[from] StreamError),

    /// Signal service failure
    #[error("Signal error: {0}")]
    Signal(#[from] SignalError),

    /// Configuration rejected
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// One or more signals could not be released at shutdown
    #[error("Failed to release {failed} signal(s) at shutdown: {first}")]
    Teardown {
        /// Number of failed releases
        failed: usize,
        /// First failure seen
        first: SignalError,
    },
}

/// Broad classification of a [`DriverError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caller passed a bad value
    Validation,
    /// Request conflicts with current slot state
    Conflict,
    /// Status code not recognized
    UnknownOperation,
    /// Hardware misbehaved
    HardwareFault,
    /// An OS service failed
    Collaborator,
    /// Cleanup failed at shutdown
    Teardown,
}

impl DriverError {
    /// Returns the classification of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ReloadOutOfRange(_)
            | Self::BlockTooLarge(_)
            | Self::InvalidSlot(_)
            | Self::Config(_) => ErrorKind::Validation,
            Self::SlotAlreadyBound(_) | Self::SlotNotBound(_) => ErrorKind::Conflict,
            Self::UnknownCode(_) => ErrorKind::UnknownOperation,
            Self::CounterUnstable(_) => ErrorKind::HardwareFault,
            Self::Stream(_) | Self::Signal(_) => ErrorKind::Collaborator,
            Self::Teardown { .. } => ErrorKind::Teardown,
        }
    }
}

//! Event signal abstraction
//!
//! Signals are the OS service a driver uses to notify a waiting process.
//! A driver never waits on a signal itself; it only fires them.

use std::sync::Arc;
use thiserror::Error;

/// Errors raised by the signal service
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SignalError {
    /// The requested signal number is not usable
    #[error("Invalid signal number: {0}")]
    InvalidSignal(u32),

    /// The service could not allocate a new signal
    #[error("Signal service exhausted")]
    Exhausted,

    /// Releasing a signal failed
    #[error("Failed to release signal {0}")]
    ReleaseFailed(u32),
}

/// A signal that can be delivered to its owner
pub trait Notifier: Send + Sync {
    /// Delivers the signal
    ///
    /// Must not block; delivery is fire-and-forget.
    fn notify(&self);

    /// Returns the signal number this handle delivers
    fn signal_number(&self) -> u32;

    /// Releases OS resources held by the signal
    fn release(&self) -> Result<(), SignalError>;
}

/// Creates signals on behalf of the calling process
pub trait SignalFactory: Send + Sync {
    /// Creates a signal delivering `signal` to the caller
    fn create(&self, signal: u32) -> Result<Arc<dyn Notifier>, SignalError>;
}

//! # Hardware Abstraction Layer (HAL)
//!
//! This crate defines the hardware and OS service traits a low-level driver
//! is written against.
//!
//! ## Philosophy
//!
//! **A driver owns its device, not the machine.**
//!
//! Everything a driver borrows from its surroundings (interrupt masking,
//! the device address window, signals, queued buffers) is reached through a
//! trait defined here, so the driver core never names a platform.
//!
//! ## Design Principles
//!
//! 1. **Trait-based**: All hardware and OS operations go through traits
//! 2. **Minimal unsafe**: Raw access lives in the implementing crates
//! 3. **Testable**: Every trait can be simulated for tests
//! 4. **Non-blocking at the edges**: Anything callable from interrupt context
//!    must return without waiting

pub mod interrupts;
pub mod register_access;
pub mod signal;
pub mod stream;

pub use interrupts::{InterruptMask, IrqGuard, IrqState};
pub use register_access::RegisterAccess;
pub use signal::{Notifier, SignalError, SignalFactory};
pub use stream::{BufferMode, NoBuffer, StreamBuffer, StreamError};

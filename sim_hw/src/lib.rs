//! # Simulated M99 Hardware
//!
//! Deterministic stand-ins for the module and the OS services around it.
//!
//! ## Philosophy
//!
//! **Determinism enables thorough testing.**
//!
//! Time only moves when a test calls [`SimBoard::advance_ticks`]. Faults
//! happen only where a [`CounterFaultPlan`] says they do. Every signal
//! delivery is recorded in order.
//!
//! ## Contents
//!
//! - [`board`]: counting MC68230 timer plus SRAM behind [`hal::RegisterAccess`]
//! - [`fault_injection`]: ticks injected between counter byte reads
//! - [`irq_line`]: [`hal::InterruptMask`] with nesting and call counting
//! - [`signal`]: [`hal::SignalFactory`] recording deliveries
//! - [`stream`]: in-memory [`hal::StreamBuffer`]

pub mod board;
pub mod fault_injection;
pub mod irq_line;
pub mod signal;
pub mod stream;

pub use board::SimBoard;
pub use fault_injection::{CounterFault, CounterFaultPlan};
pub use irq_line::SimIrqLine;
pub use signal::{SimSignal, SimSignalFactory};
pub use stream::{SimStreamBuffer, StreamDirection};

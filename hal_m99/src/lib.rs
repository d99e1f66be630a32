//! # M99 Hardware Abstraction Layer
//!
//! This crate implements the HAL traits for the M99 counter/timer module.
//!
//! ## Scope
//!
//! - [`registers`]: typed facade over the module's MC68230 timer and SRAM
//! - [`access`]: memory-mapped and scripted [`hal::RegisterAccess`]
//! - [`CpuIrqMask`]: interrupt masking for the module's interrupt line
//!
//! The mask is a skeleton: masking is tracked in software. On a real target
//! it would program the interrupt controller.

use core::sync::atomic::{AtomicBool, Ordering};
use hal::{InterruptMask, IrqState};

pub mod access;
pub mod registers;

pub use access::{FakeRegisterAccess, MmioAccess};
pub use registers::{CounterSnapshot, M99Registers, TimerControl, MAX_COUNT};

/// Interrupt mask for the module's line (skeleton)
#[derive(Debug, Default)]
pub struct CpuIrqMask {
    masked: AtomicBool,
}

impl CpuIrqMask {
    /// Creates an unmasked line
    pub fn new() -> Self {
        Self {
            masked: AtomicBool::new(false),
        }
    }

    /// Returns whether the line is currently masked
    pub fn is_masked(&self) -> bool {
        self.masked.load(Ordering::Acquire)
    }
}

impl InterruptMask for CpuIrqMask {
    fn mask(&self) -> IrqState {
        // In real implementation: set the line's bit in the controller mask
        let was_masked = self.masked.swap(true, Ordering::AcqRel);
        IrqState::from_raw(u32::from(was_masked))
    }

    fn restore(&self, state: IrqState) {
        // In real implementation: write the saved controller mask back
        self.masked.store(state.raw() != 0, Ordering::Release);
    }
}

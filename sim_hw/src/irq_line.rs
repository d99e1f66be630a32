//! Simulated interrupt line mask

use hal::{InterruptMask, IrqState};
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

/// Interrupt mask that counts nesting depth and calls
///
/// Masking here does not stop another thread from calling the driver's
/// interrupt entry point; tests use [`SimIrqLine::is_masked`] to check that
/// control paths run masked.
#[derive(Debug, Default)]
pub struct SimIrqLine {
    depth: AtomicU32,
    mask_calls: AtomicUsize,
    max_depth: AtomicU32,
}

impl SimIrqLine {
    /// Creates an unmasked line
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true while at least one critical section is open
    pub fn is_masked(&self) -> bool {
        self.depth.load(Ordering::Acquire) > 0
    }

    /// Returns the current nesting depth
    pub fn depth(&self) -> u32 {
        self.depth.load(Ordering::Acquire)
    }

    /// Returns the deepest nesting seen
    pub fn max_depth(&self) -> u32 {
        self.max_depth.load(Ordering::Acquire)
    }

    /// Returns how many times the line was masked
    pub fn mask_calls(&self) -> usize {
        self.mask_calls.load(Ordering::Acquire)
    }
}

impl InterruptMask for SimIrqLine {
    fn mask(&self) -> IrqState {
        self.mask_calls.fetch_add(1, Ordering::AcqRel);
        let prev = self.depth.fetch_add(1, Ordering::AcqRel);
        self.max_depth.fetch_max(prev + 1, Ordering::AcqRel);
        IrqState::from_raw(prev)
    }

    fn restore(&self, state: IrqState) {
        self.depth.store(state.raw(), Ordering::Release);
    }
}

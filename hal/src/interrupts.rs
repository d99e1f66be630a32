//! Interrupt masking abstraction
//!
//! Process-context code that shares state with an interrupt handler must
//! present an atomic view to that handler. This module provides the masking
//! primitive and a scoped guard around it.

/// Interrupt state captured by [`InterruptMask::mask`]
///
/// Opaque to callers; it only travels back into [`InterruptMask::restore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IrqState(u32);

impl IrqState {
    /// Wraps a raw, implementation-defined state word
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw state word
    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// Interrupt masking for one interrupt line
///
/// Calls nest: every `mask` must be paired with a `restore` of the state it
/// returned, in reverse order. Implementations take `&self` because the mask
/// is shared between every caller of the owning device.
pub trait InterruptMask {
    /// Masks the interrupt and returns the previous state
    fn mask(&self) -> IrqState;

    /// Restores the state returned by the matching `mask`
    fn restore(&self, state: IrqState);
}

impl<M: InterruptMask + ?Sized> InterruptMask for &M {
    fn mask(&self) -> IrqState {
        (**self).mask()
    }

    fn restore(&self, state: IrqState) {
        (**self).restore(state)
    }
}

/// Scoped critical section
///
/// Masks on creation and restores the captured state when dropped, so every
/// exit path (including `?` early returns) leaves the mask as it was found.
///
/// # Examples
///
/// ```
/// use core::cell::Cell;
/// use hal::{InterruptMask, IrqGuard, IrqState};
///
/// struct Line(Cell<u32>);
///
/// impl InterruptMask for Line {
///     fn mask(&self) -> IrqState {
///         let prev = self.0.get();
///         self.0.set(prev + 1);
///         IrqState::from_raw(prev)
///     }
///
///     fn restore(&self, state: IrqState) {
///         self.0.set(state.raw());
///     }
/// }
///
/// let line = Line(Cell::new(0));
/// {
///     let _guard = IrqGuard::new(&line);
///     assert_eq!(line.0.get(), 1);
/// }
/// assert_eq!(line.0.get(), 0);
/// ```
#[must_use = "the critical section ends as soon as the guard is dropped"]
pub struct IrqGuard<'a, M: InterruptMask + ?Sized> {
    mask: &'a M,
    state: IrqState,
}

impl<'a, M: InterruptMask + ?Sized> IrqGuard<'a, M> {
    /// Masks the line and returns the guard
    pub fn new(mask: &'a M) -> Self {
        let state = mask.mask();
        Self { mask, state }
    }
}

impl<M: InterruptMask + ?Sized> Drop for IrqGuard<'_, M> {
    fn drop(&mut self) {
        self.mask.restore(self.state);
    }
}

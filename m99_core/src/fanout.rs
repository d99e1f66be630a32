//! Event fan-out
//!
//! Four notification slots. Each interrupt fires the slot selected by the
//! interrupt count modulo four, if something is bound there.

use crate::error::{DriverError, Result};
use core::fmt;
use hal::Notifier;
use std::sync::Arc;

/// Number of notification slots
pub const SLOT_COUNT: usize = 4;

/// Index of a notification slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlotId(usize);

impl SlotId {
    /// Creates a slot id, rejecting indices of 4 and above
    pub fn new(index: usize) -> Result<Self> {
        if index < SLOT_COUNT {
            Ok(Self(index))
        } else {
            Err(DriverError::InvalidSlot(index))
        }
    }

    /// Returns the slot fired for interrupt number `count`
    pub fn for_count(count: u32) -> Self {
        Self(count as usize % SLOT_COUNT)
    }

    /// Returns the slot index
    pub fn index(self) -> usize {
        self.0
    }

    /// Returns all slots in order
    pub fn all() -> impl Iterator<Item = Self> {
        (0..SLOT_COUNT).map(Self)
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// State of one notification slot
#[derive(Clone, Default)]
pub enum Slot {
    /// Nothing to notify
    #[default]
    Unbound,
    /// Notified when selected
    Bound(Arc<dyn Notifier>),
}

impl fmt::Debug for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unbound => write!(f, "Unbound"),
            Self::Bound(notifier) => write!(f, "Bound({})", notifier.signal_number()),
        }
    }
}

/// The slot table
#[derive(Debug, Default)]
pub struct SignalSlots {
    slots: [Slot; SLOT_COUNT],
}

impl SignalSlots {
    /// Creates a table with every slot unbound
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `notifier` to `slot`
    ///
    /// Hands the notifier back if the slot is already bound, so the caller
    /// can release it outside the critical section.
    pub fn bind(
        &mut self,
        slot: SlotId,
        notifier: Arc<dyn Notifier>,
    ) -> core::result::Result<(), Arc<dyn Notifier>> {
        match self.slots[slot.0] {
            Slot::Bound(_) => Err(notifier),
            Slot::Unbound => {
                self.slots[slot.0] = Slot::Bound(notifier);
                Ok(())
            }
        }
    }

    /// Unbinds `slot`, returning its notifier
    pub fn unbind(&mut self, slot: SlotId) -> Result<Arc<dyn Notifier>> {
        match core::mem::take(&mut self.slots[slot.0]) {
            Slot::Bound(notifier) => Ok(notifier),
            Slot::Unbound => Err(DriverError::SlotNotBound(slot.0)),
        }
    }

    /// Returns the signal number bound to `slot`, or 0
    pub fn signal_number(&self, slot: SlotId) -> u32 {
        match &self.slots[slot.0] {
            Slot::Bound(notifier) => notifier.signal_number(),
            Slot::Unbound => 0,
        }
    }

    /// Notifies the slot selected by `count`, returning it if bound
    pub fn fire(&self, count: u32) -> Option<SlotId> {
        let slot = SlotId::for_count(count);
        match &self.slots[slot.0] {
            Slot::Bound(notifier) => {
                notifier.notify();
                Some(slot)
            }
            Slot::Unbound => None,
        }
    }

    /// Unbinds every slot, returning the notifiers in slot order
    pub fn take_all(&mut self) -> Vec<Arc<dyn Notifier>> {
        self.slots
            .iter_mut()
            .filter_map(|slot| match core::mem::take(slot) {
                Slot::Bound(notifier) => Some(notifier),
                Slot::Unbound => None,
            })
            .collect()
    }
}

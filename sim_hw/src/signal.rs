//! Simulated signal service
//!
//! Signals record how often they were delivered and whether they were
//! released. The factory keeps one delivery log shared by every signal it
//! creates, so tests can check the order in which signals fired.

use hal::{Notifier, SignalError, SignalFactory};
use spin::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

type DeliveryLog = Arc<Mutex<Vec<u32>>>;

/// A signal created by [`SimSignalFactory`]
#[derive(Debug)]
pub struct SimSignal {
    number: u32,
    notified: AtomicUsize,
    released: AtomicBool,
    fail_release: bool,
    deliveries: DeliveryLog,
}

impl SimSignal {
    /// Returns how many times the signal was delivered
    pub fn notified(&self) -> usize {
        self.notified.load(Ordering::Acquire)
    }

    /// Returns true once the signal was released
    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }
}

impl Notifier for SimSignal {
    fn notify(&self) {
        self.notified.fetch_add(1, Ordering::AcqRel);
        self.deliveries.lock().push(self.number);
    }

    fn signal_number(&self) -> u32 {
        self.number
    }

    fn release(&self) -> Result<(), SignalError> {
        self.released.store(true, Ordering::Release);
        if self.fail_release {
            return Err(SignalError::ReleaseFailed(self.number));
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct FactoryState {
    created: Vec<Arc<SimSignal>>,
    failing_release: Vec<u32>,
    exhausted: bool,
}

/// Signal factory recording everything it creates
///
/// Clones share state, so a test keeps one handle while the driver owns
/// another.
#[derive(Debug, Clone, Default)]
pub struct SimSignalFactory {
    state: Arc<Mutex<FactoryState>>,
    deliveries: DeliveryLog,
}

impl SimSignalFactory {
    /// Creates a factory with no signals
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every signal created for `number` from now on fail to release
    pub fn fail_release_of(&self, number: u32) {
        self.state.lock().failing_release.push(number);
    }

    /// Makes every further `create` fail with [`SignalError::Exhausted`]
    pub fn exhaust(&self) {
        self.state.lock().exhausted = true;
    }

    /// Returns every signal created, oldest first
    pub fn created(&self) -> Vec<Arc<SimSignal>> {
        self.state.lock().created.clone()
    }

    /// Returns the most recent signal created for `number`
    pub fn signal(&self, number: u32) -> Option<Arc<SimSignal>> {
        self.state
            .lock()
            .created
            .iter()
            .rev()
            .find(|signal| signal.number == number)
            .cloned()
    }

    /// Returns the signal numbers delivered so far, in delivery order
    pub fn deliveries(&self) -> Vec<u32> {
        self.deliveries.lock().clone()
    }
}

impl SignalFactory for SimSignalFactory {
    fn create(&self, signal: u32) -> Result<Arc<dyn Notifier>, SignalError> {
        if signal == 0 {
            return Err(SignalError::InvalidSignal(signal));
        }
        let mut state = self.state.lock();
        if state.exhausted {
            return Err(SignalError::Exhausted);
        }
        let created = Arc::new(SimSignal {
            number: signal,
            notified: AtomicUsize::new(0),
            released: AtomicBool::new(false),
            fail_release: state.failing_release.contains(&signal),
            deliveries: Arc::clone(&self.deliveries),
        });
        state.created.push(Arc::clone(&created));
        Ok(created)
    }
}

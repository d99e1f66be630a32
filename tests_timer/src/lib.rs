//! Timer Test Utilities
//!
//! This crate provides shared utilities for M99 timer integration tests.
//!
//! ## Test Philosophy
//!
//! - **Hardware-faithful**: The driver runs against a simulated module that
//!   counts, reloads and raises status like the real part
//! - **Deterministic timing**: Ticks only advance when a test says so
//! - **Observable side effects**: Signal deliveries, LEDs and SRAM are all
//!   inspected from outside the driver

use m99_core::{ConfigError, DriverError, IrqOutcome, M99Config, M99Timer, OsServices};
use sim_hw::{SimBoard, SimIrqLine, SimSignalFactory};

/// Driver type used throughout the tests
pub type TestTimer = M99Timer<SimBoard, SimIrqLine>;

/// Everything a test needs to drive and observe one module
pub struct TestRig {
    /// The driver under test
    pub timer: TestTimer,
    /// Handle onto the simulated module
    pub board: SimBoard,
    /// Handle onto the signal service
    pub signals: SimSignalFactory,
}

/// Bootstrap helper for tests
///
/// Brings a driver up on a fresh simulated module with `config` and no
/// stream buffers.
pub fn test_bootstrap(config: &M99Config) -> Result<TestRig, DriverError> {
    let signals = SimSignalFactory::new();
    test_bootstrap_with(config, OsServices::new(signals.clone()), signals)
}

/// Bootstrap helper taking explicit services
///
/// `signals` must be the factory handed to `services`.
pub fn test_bootstrap_with(
    config: &M99Config,
    services: OsServices,
    signals: SimSignalFactory,
) -> Result<TestRig, DriverError> {
    let board = SimBoard::new();
    let timer = M99Timer::init(board.clone(), SimIrqLine::new(), config, services)?;
    Ok(TestRig {
        timer,
        board,
        signals,
    })
}

/// Builds a config from a JSON descriptor
pub fn config_from_descriptor(descriptor: serde_json::Value) -> Result<M99Config, ConfigError> {
    M99Config::from_json(&descriptor.to_string())
}

impl TestRig {
    /// Runs the module to its next underflow and enters the handler
    ///
    /// `delay` extra ticks pass between the underflow and the handler
    /// running; that is the latency the handler should measure.
    pub fn run_cycle(&self, delay: u32) -> IrqOutcome {
        let remaining = u64::from(self.board.counter());
        self.board.advance_ticks(remaining + u64::from(delay));
        self.timer.irq()
    }

    /// Runs `cycles` interrupt cycles with the same delay
    pub fn run_cycles(&self, cycles: usize, delay: u32) -> Vec<IrqOutcome> {
        (0..cycles).map(|_| self.run_cycle(delay)).collect()
    }
}

//! # M99 Periodic Timer Core
//!
//! Interrupt-driven core of the M99 counter/timer module driver.
//!
//! ## Philosophy
//!
//! **One interrupt context, many callers, one lock.**
//!
//! Each interrupt the core measures how late it is, fires the next of four
//! notification slots, moves one unit through each SRAM mailbox ring and,
//! in jitter mode, nudges the reload value. Control calls from process
//! context run concurrently with that and always mask the interrupt before
//! touching shared state.
//!
//! ## Design Principles
//!
//! 1. **Typed first**: every control operation is a method; the numeric
//!    status codes in [`stat`] are a thin dispatch layer on top
//! 2. **Validate before touching hardware**: bad input changes nothing
//! 3. **Never wait in the interrupt handler**: contended buffers and logs are
//!    skipped, not waited for
//! 4. **Collaborators behind traits**: registers, masking, signals and
//!    buffers all come from [`hal`]
//!
//! ## Example
//!
//! ```
//! use m99_core::{M99Config, M99Timer, OsServices, SlotId};
//! use sim_hw::{SimBoard, SimIrqLine, SimSignalFactory};
//!
//! let board = SimBoard::new();
//! let signals = SimSignalFactory::new();
//! let timer = M99Timer::init(
//!     board.clone(),
//!     SimIrqLine::new(),
//!     &M99Config::default(),
//!     OsServices::new(signals.clone()),
//! )?;
//!
//! timer.bind_signal(SlotId::new(0)?, 10)?;
//! timer.set_irq_enabled(true);
//! board.advance_ticks(250_000);
//! timer.irq();
//!
//! assert_eq!(timer.irq_count(), 1);
//! assert_eq!(signals.deliveries(), vec![10]);
//! # Ok::<(), m99_core::DriverError>(())
//! ```

pub mod config;
pub mod device;
pub mod error;
pub mod fanout;
pub mod irq;
pub mod jitter;
pub mod latency;
pub mod mailbox;
pub mod readout;
pub mod reload;
pub mod stat;

pub use config::{BindMasking, ConfigError, M99Config};
pub use device::{M99Timer, OsServices};
pub use error::{DriverError, ErrorKind, Result};
pub use fanout::{Slot, SlotId, SLOT_COUNT};
pub use irq::IrqOutcome;
pub use stat::{codes, StatCode};

//! # M99 Timer Device
//!
//! The device object and its process-context operations.
//!
//! ## Locking
//!
//! All shared state sits behind one spin lock. Process-context calls mask
//! the interrupt first and take the lock second; the interrupt handler only
//! takes the lock. With the interrupt masked the handler cannot run on the
//! caller's CPU, so it never spins on a lock held beneath it.
//!
//! The slot table has a lock of its own, taken after the device lock.
//! Bind and unbind normally mask too. With
//! [`BindMasking::UnmaskedForLatencyTest`] they take the slot lock unmasked,
//! and the interrupt handler only `try_lock`s it, skipping that interrupt's
//! notification when the table is busy.
//!
//! Stream buffers synchronize themselves and are never held across a wait,
//! so a blocked `block_read` or `block_write` does not stop the interrupt
//! side from moving units.

use crate::config::{log_level_code, BindMasking, M99Config};
use crate::error::{DriverError, Result};
use crate::fanout::{SignalSlots, SlotId};
use crate::jitter::JitterStepper;
use crate::latency::LatencyTracker;
use crate::mailbox::{MailboxRing, WRITE_FILL};
use crate::readout::CounterReadout;
use crate::reload::ReloadEngine;
use driver_log::{DebugLog, LogEntry, LogLevel};
use hal::{BufferMode, InterruptMask, IrqGuard, NoBuffer, RegisterAccess, SignalFactory, StreamBuffer};
use hal_m99::registers::offsets;
use hal_m99::{M99Registers, TimerControl};
use spin::Mutex;

/// Log source for every entry the driver records
pub(crate) const LOG_SOURCE: &str = "m99";

/// OS services handed to the driver at start-up
pub struct OsServices {
    /// Creates signals for notification slots
    pub signals: Box<dyn SignalFactory>,
    /// Queue filled by interrupt read transfers
    pub read_buffer: Box<dyn StreamBuffer>,
    /// Queue drained by interrupt write transfers
    pub write_buffer: Box<dyn StreamBuffer>,
}

impl OsServices {
    /// Creates services with no stream buffers (user-control mode)
    pub fn new(signals: impl SignalFactory + 'static) -> Self {
        Self {
            signals: Box::new(signals),
            read_buffer: Box::new(NoBuffer),
            write_buffer: Box::new(NoBuffer),
        }
    }

    /// Sets the read-side buffer
    pub fn with_read_buffer(mut self, buffer: impl StreamBuffer + 'static) -> Self {
        self.read_buffer = Box::new(buffer);
        self
    }

    /// Sets the write-side buffer
    pub fn with_write_buffer(mut self, buffer: impl StreamBuffer + 'static) -> Self {
        self.write_buffer = Box::new(buffer);
        self
    }
}

/// State shared between control calls and the interrupt handler
#[derive(Debug)]
pub(crate) struct DeviceState<A: RegisterAccess> {
    pub(crate) regs: M99Registers<A>,
    pub(crate) readout: CounterReadout,
    pub(crate) reload: ReloadEngine,
    pub(crate) jitter: JitterStepper,
    pub(crate) latency: LatencyTracker,
    pub(crate) read_ring: MailboxRing,
    pub(crate) write_ring: MailboxRing,
    pub(crate) irq_count: u32,
}

impl<A: RegisterAccess> DeviceState<A> {
    /// Writes `unit` through the write ring and shows its low byte on the LEDs
    pub(crate) fn put_unit(&mut self, unit: u16) {
        self.write_ring.write(&mut self.regs, unit);
        self.regs.set_leds((unit & 0xFF) as u8);
    }
}

/// One M99 timer module
pub struct M99Timer<A: RegisterAccess, M: InterruptMask> {
    pub(crate) mask: M,
    pub(crate) bind_masking: BindMasking,
    pub(crate) signals: Box<dyn SignalFactory>,
    pub(crate) log: DebugLog,
    pub(crate) state: Mutex<DeviceState<A>>,
    pub(crate) slots: Mutex<SignalSlots>,
    pub(crate) read_buffer: Box<dyn StreamBuffer>,
    pub(crate) write_buffer: Box<dyn StreamBuffer>,
}

impl<A: RegisterAccess, M: InterruptMask> M99Timer<A, M> {
    /// Brings the module up
    ///
    /// Validates `config`, puts the ports in their reset configuration,
    /// fills both mailbox rings, loads the preload and starts the counter
    /// with the interrupt disabled.
    pub fn init(access: A, mask: M, config: &M99Config, services: OsServices) -> Result<Self> {
        config.validate()?;

        let log = DebugLog::new(config.log_level());
        log.record(
            LogEntry::new(LogLevel::Info, LOG_SOURCE, "init")
                .with_field("preload", config.counter_preload)
                .with_field("ring_size", config.sram_rw_buf_size)
                .with_field("jitter", config.irq_jitter),
        );

        let mut regs = M99Registers::new(access);
        regs.init_ports();

        let read_ring = MailboxRing::read_side(config.sram_rw_buf_size);
        let write_ring = MailboxRing::write_side(config.sram_rw_buf_size);
        read_ring.fill_sequence(&mut regs);
        write_ring.fill(&mut regs, WRITE_FILL);

        let mut reload = ReloadEngine::new(config.counter_preload);
        reload.load(&mut regs, config.counter_preload);
        regs.set_timer_control(TimerControl::IRQ_DISABLED);

        let state = DeviceState {
            regs,
            readout: CounterReadout::new(config.counter_retry_limit),
            reload,
            jitter: JitterStepper::new(config.irq_jitter),
            latency: LatencyTracker::new(),
            read_ring,
            write_ring,
            irq_count: 0,
        };

        Ok(Self {
            mask,
            bind_masking: config.bind_masking,
            signals: services.signals,
            log,
            state: Mutex::new(state),
            slots: Mutex::new(SignalSlots::new()),
            read_buffer: services.read_buffer,
            write_buffer: services.write_buffer,
        })
    }

    /// Runs `f` with the interrupt masked and the device locked
    pub(crate) fn with_state<R>(&self, f: impl FnOnce(&mut DeviceState<A>) -> R) -> R {
        let _irq = IrqGuard::new(&self.mask);
        let mut state = self.state.lock();
        f(&mut state)
    }

    fn with_slots<R>(&self, f: impl FnOnce(&mut SignalSlots) -> R) -> R {
        match self.bind_masking {
            BindMasking::Masked => {
                let _irq = IrqGuard::new(&self.mask);
                f(&mut *self.slots.lock())
            }
            BindMasking::UnmaskedForLatencyTest => f(&mut *self.slots.lock()),
        }
    }

    fn debug(&self, message: &'static str, key: &'static str, value: impl ToString) {
        if self.log.enabled(LogLevel::Debug) {
            self.log
                .record(LogEntry::new(LogLevel::Debug, LOG_SOURCE, message).with_field(key, value));
        }
    }

    /// Returns the driver's debug log
    pub fn debug_log(&self) -> &DebugLog {
        &self.log
    }

    /// Returns the debug level code
    pub fn debug_level(&self) -> u32 {
        log_level_code(self.log.threshold())
    }

    /// Sets the debug log threshold
    pub fn set_debug_level(&self, level: LogLevel) {
        self.log.set_threshold(level);
    }

    /// Returns the number of channels on the module
    pub fn channel_count(&self) -> u32 {
        1
    }

    /// Restarts the timer with a new reload value
    ///
    /// `value` also becomes the nominal preload for jitter mode, and the
    /// jitter direction is forgotten. Out-of-range values change nothing.
    pub fn set_reload(&self, value: u32) -> Result<()> {
        let value = ReloadEngine::validate(value)?;
        self.debug("set_reload", "value", value);
        self.with_state(|state| {
            state.jitter.reset();
            state.reload.reprogram(&mut state.regs, value);
        });
        Ok(())
    }

    /// Returns the active reload value
    pub fn reload(&self) -> u32 {
        self.with_state(|state| state.reload.timerval())
    }

    /// Switches jitter mode
    ///
    /// Either way the last step is forgotten and the active reload value is
    /// written back to the preload.
    pub fn set_jitter(&self, enabled: bool) {
        self.debug("set_jitter", "enabled", enabled);
        self.with_state(|state| {
            state.jitter.set_enabled(enabled);
            let current = state.reload.timerval();
            state.reload.load(&mut state.regs, current);
        });
    }

    /// Returns true if jitter mode is on
    pub fn jitter(&self) -> bool {
        self.with_state(|state| state.jitter.is_enabled())
    }

    /// Enables or disables interrupt generation
    pub fn set_irq_enabled(&self, enabled: bool) {
        self.debug("set_irq_enabled", "enabled", enabled);
        self.with_state(|state| {
            if enabled {
                state.regs.set_timer_control(TimerControl::IRQ_ENABLED);
            } else {
                state.regs.set_timer_control(TimerControl::IRQ_DISABLED);
                state.regs.clear_irq();
            }
        });
    }

    /// Returns the number of interrupts serviced since the last reset
    pub fn irq_count(&self) -> u32 {
        self.with_state(|state| state.irq_count)
    }

    /// Resets the interrupt count to zero
    pub fn reset_irq_count(&self) {
        self.with_state(|state| state.irq_count = 0);
    }

    /// Returns the latency seen by the last interrupt
    pub fn last_latency(&self) -> Option<u32> {
        self.with_state(|state| state.latency.last())
    }

    /// Returns the largest latency seen
    pub fn max_latency(&self) -> Option<u32> {
        self.with_state(|state| state.latency.max())
    }

    /// Overrides the maximum latency; `None` clears it
    pub fn set_max_latency(&self, max: Option<u32>) {
        self.with_state(|state| state.latency.set_max(max));
    }

    /// Returns the ticks elapsed since the counter last reloaded
    pub fn elapsed_since_reload(&self) -> Result<u32> {
        self.with_state(|state| state.reload.elapsed(&mut state.regs, &state.readout))
    }

    /// Binds `slot` to a new signal delivering `signal`
    ///
    /// The signal is created before the slot table is touched. If the slot
    /// turns out to be bound already, the new signal is released again.
    pub fn bind_signal(&self, slot: SlotId, signal: u32) -> Result<()> {
        self.log.record(
            LogEntry::new(LogLevel::Info, LOG_SOURCE, "bind_signal")
                .with_field("slot", slot)
                .with_field("signal", signal),
        );
        let notifier = self.signals.create(signal)?;
        if let Err(rejected) = self.with_slots(|slots| slots.bind(slot, notifier)) {
            if let Err(err) = rejected.release() {
                self.log.record(
                    LogEntry::new(LogLevel::Warn, LOG_SOURCE, "release of rejected signal failed")
                        .with_field("error", err),
                );
            }
            return Err(DriverError::SlotAlreadyBound(slot.index()));
        }
        Ok(())
    }

    /// Unbinds `slot` and releases its signal
    ///
    /// The slot is empty afterwards even if the release fails.
    pub fn unbind_signal(&self, slot: SlotId) -> Result<()> {
        self.log
            .record(LogEntry::new(LogLevel::Info, LOG_SOURCE, "unbind_signal").with_field("slot", slot));
        let notifier = self.with_slots(|slots| slots.unbind(slot))?;
        notifier.release()?;
        Ok(())
    }

    /// Returns the signal bound to `slot`, or 0
    pub fn bound_signal(&self, slot: SlotId) -> u32 {
        self.with_slots(|slots| slots.signal_number(slot))
    }

    /// Copies SRAM starting at its base into `buf`
    pub fn read_sram(&self, buf: &mut [u8]) -> Result<usize> {
        check_block(buf.len())?;
        self.with_state(|state| state.regs.sram_read_block(buf));
        Ok(buf.len())
    }

    /// Copies `data` into SRAM starting at its base
    pub fn write_sram(&self, data: &[u8]) -> Result<()> {
        check_block(data.len())?;
        self.debug("write_sram", "len", data.len());
        self.with_state(|state| state.regs.sram_write_block(data));
        Ok(())
    }

    /// Reads one unit at the read-ring cursor
    pub fn read_unit(&self) -> u16 {
        self.with_state(|state| state.read_ring.read(&mut state.regs))
    }

    /// Writes one unit at the write-ring cursor and mirrors it to the LEDs
    pub fn write_unit(&self, unit: u16) {
        self.with_state(|state| state.put_unit(unit));
    }

    /// Returns the read-ring and write-ring cursors as SRAM byte offsets
    pub fn ring_cursors(&self) -> (usize, usize) {
        self.with_state(|state| (state.read_ring.cursor(), state.write_ring.cursor()))
    }

    /// Reads a block
    ///
    /// In user-control mode `buf.len() / 2` units come straight from the read
    /// ring. Otherwise the read-side stream buffer supplies the data.
    pub fn block_read(&self, buf: &mut [u8]) -> Result<usize> {
        if self.read_buffer.mode() != BufferMode::UserControl {
            return Ok(self.read_buffer.read(buf)?);
        }

        let done = self.with_state(|state| {
            let mut done = 0;
            for pair in buf.chunks_exact_mut(2) {
                pair.copy_from_slice(&state.read_ring.read(&mut state.regs).to_be_bytes());
                done += 2;
            }
            done
        });
        Ok(done)
    }

    /// Writes a block
    ///
    /// In user-control mode all `data.len() / 2` units go straight into the
    /// write ring. Otherwise the data is queued on the write-side stream
    /// buffer.
    pub fn block_write(&self, data: &[u8]) -> Result<usize> {
        if self.write_buffer.mode() != BufferMode::UserControl {
            return Ok(self.write_buffer.write(data)?);
        }

        let done = self.with_state(|state| {
            let mut done = 0;
            for pair in data.chunks_exact(2) {
                state.put_unit(u16::from_be_bytes([pair[0], pair[1]]));
                done += 2;
            }
            done
        });
        Ok(done)
    }

    /// Shuts the module down and hands back the register access
    ///
    /// Stops interrupt generation, turns the LEDs off, drops the stream
    /// buffers and releases every bound signal. Every release is attempted;
    /// failures are reported afterwards.
    pub fn shutdown(self) -> Result<A> {
        self.log
            .record(LogEntry::new(LogLevel::Info, LOG_SOURCE, "shutdown"));
        let notifiers = self.with_state(|state| {
            state.regs.set_timer_control(TimerControl::IRQ_DISABLED);
            state.regs.set_leds(0xFF);
            self.slots.lock().take_all()
        });

        let mut failures = notifiers.iter().filter_map(|notifier| notifier.release().err());
        let first = failures.next();
        let failed = usize::from(first.is_some()) + failures.count();

        let Self {
            state,
            read_buffer,
            write_buffer,
            ..
        } = self;
        drop(read_buffer);
        drop(write_buffer);
        let state = state.into_inner();

        match first {
            Some(first) => Err(DriverError::Teardown { failed, first }),
            None => Ok(state.regs.into_inner()),
        }
    }
}

fn check_block(len: usize) -> Result<()> {
    if len > offsets::SRAM_SIZE {
        return Err(DriverError::BlockTooLarge(len));
    }
    Ok(())
}

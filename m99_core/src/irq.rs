//! Interrupt service routine

use crate::config::BindMasking;
use crate::device::{DeviceState, M99Timer, LOG_SOURCE};
use crate::fanout::{SignalSlots, SlotId};
use driver_log::{LogEntry, LogLevel};
use hal::{InterruptMask, RegisterAccess, StreamBuffer};
use spin::MutexGuard;

/// Result of one interrupt entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IrqOutcome {
    /// The module raised the interrupt and it was handled
    Serviced,
    /// The module had nothing pending; the interrupt belongs to someone else
    NotMine,
}

impl<A: RegisterAccess, M: InterruptMask> M99Timer<A, M> {
    /// Services one interrupt
    ///
    /// Waits only on the device lock, which process context holds with this
    /// interrupt masked. The slot table is waited on only when bind and
    /// unbind are masked as well; in the unmasked bind mode a busy table
    /// costs this interrupt its notification. Stream buffers are never
    /// waited on.
    pub fn irq(&self) -> IrqOutcome {
        let mut guard = self.state.lock();
        let state = &mut *guard;

        if !state.regs.irq_pending() {
            return IrqOutcome::NotMine;
        }
        state.reload.promote();

        let latency = match state.reload.elapsed(&mut state.regs, &state.readout) {
            Ok(ticks) => {
                state.latency.record(ticks);
                Some(ticks)
            }
            Err(err) => {
                self.log.record_nowait(
                    LogEntry::new(LogLevel::Error, LOG_SOURCE, "latency readout failed")
                        .with_field("error", err),
                );
                None
            }
        };

        state.regs.clear_irq();
        let fired = self.fire_slot(state.irq_count);

        let filled = fill_read_buffer(state, self.read_buffer.as_ref());
        let drained = drain_write_buffer(state, self.write_buffer.as_ref());
        if !filled && !drained {
            let heartbeat = !(state.irq_count as u8);
            state.regs.set_leds(heartbeat);
        }

        if state.jitter.is_enabled() {
            let next = state
                .jitter
                .next_reload(state.reload.timerval(), state.reload.nominal());
            state.reload.load(&mut state.regs, next);
        }

        if self.log.enabled(LogLevel::Trace) {
            let mut entry = LogEntry::new(LogLevel::Trace, LOG_SOURCE, "irq")
                .with_field("count", state.irq_count)
                .with_field("reload", state.reload.timerval());
            if let Some(ticks) = latency {
                entry = entry.with_field("latency", ticks);
            }
            if let Some(slot) = fired {
                entry = entry.with_field("slot", slot);
            }
            self.log.record_nowait(entry);
        }

        state.irq_count = state.irq_count.wrapping_add(1);
        IrqOutcome::Serviced
    }

    fn fire_slot(&self, count: u32) -> Option<SlotId> {
        let slots: Option<MutexGuard<'_, SignalSlots>> = match self.bind_masking {
            BindMasking::Masked => Some(self.slots.lock()),
            BindMasking::UnmaskedForLatencyTest => self.slots.try_lock(),
        };
        match slots {
            Some(slots) => slots.fire(count),
            None => {
                self.log.record_nowait(
                    LogEntry::new(LogLevel::Warn, LOG_SOURCE, "notification skipped")
                        .with_field("count", count),
                );
                None
            }
        }
    }
}

/// Moves one unit from the read ring into the read-side buffer
fn fill_read_buffer<A: RegisterAccess>(
    state: &mut DeviceState<A>,
    buffer: &dyn StreamBuffer,
) -> bool {
    let mut moved = false;
    buffer.next_buf(1, &mut |units| {
        if let Some(unit) = units.first_mut() {
            *unit = state.read_ring.read(&mut state.regs);
            moved = true;
        }
    });
    moved
}

/// Moves one unit from the write-side buffer into the write ring
fn drain_write_buffer<A: RegisterAccess>(
    state: &mut DeviceState<A>,
    buffer: &dyn StreamBuffer,
) -> bool {
    let mut moved = false;
    buffer.next_buf(1, &mut |units| {
        if let Some(&unit) = units.first() {
            state.put_unit(unit);
            moved = true;
        }
    });
    moved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::M99Config;
    use crate::device::OsServices;
    use hal::{BufferMode, StreamError};
    use sim_hw::{SimBoard, SimIrqLine, SimSignalFactory, SimStreamBuffer};

    fn armed(config: &M99Config, services: OsServices) -> (M99Timer<SimBoard, SimIrqLine>, SimBoard) {
        let board = SimBoard::new();
        let timer = M99Timer::init(board.clone(), SimIrqLine::new(), config, services).unwrap();
        timer.set_irq_enabled(true);
        (timer, board)
    }

    #[test]
    fn test_not_mine_when_nothing_pending() {
        let (timer, board) = armed(&M99Config::default(), OsServices::new(SimSignalFactory::new()));
        assert_eq!(timer.irq(), IrqOutcome::NotMine);
        assert_eq!(timer.irq_count(), 0);
        assert_eq!(board.led_history(), vec![0xAA]);
    }

    #[test]
    fn test_serviced_records_latency_and_clears() {
        let (timer, board) = armed(&M99Config::default(), OsServices::new(SimSignalFactory::new()));
        board.advance_ticks(250_000 + 17);

        assert_eq!(timer.irq(), IrqOutcome::Serviced);
        assert_eq!(timer.last_latency(), Some(17));
        assert_eq!(timer.max_latency(), Some(17));
        assert_eq!(timer.irq_count(), 1);
        assert!(!board.irq_asserted());
    }

    #[test]
    fn test_heartbeat_without_buffers() {
        let (timer, board) = armed(&M99Config::default(), OsServices::new(SimSignalFactory::new()));
        for _ in 0..3 {
            board.advance_ticks(250_000);
            timer.irq();
        }
        assert_eq!(board.led_history()[1..], [0xFF, 0xFE, 0xFD]);
    }

    #[test]
    fn test_buffered_transfers() {
        let services = OsServices::new(SimSignalFactory::new())
            .with_read_buffer(SimStreamBuffer::input(BufferMode::Ring, 8))
            .with_write_buffer(SimStreamBuffer::output(BufferMode::Ring, 8));
        let (timer, board) = armed(&M99Config::default(), services);
        assert_eq!(timer.block_write(&[0x12, 0x34]), Ok(2));

        for _ in 0..2 {
            board.advance_ticks(250_000);
            timer.irq();
        }

        let mut buf = [0u8; 8];
        assert_eq!(timer.block_read(&mut buf), Ok(4));
        assert_eq!(buf[..4], [0x00, 0x00, 0x00, 0x01]);
        assert_eq!(board.sram_word(64), 0x1234);
        assert_eq!(timer.ring_cursors(), (4, 66));
        // second interrupt still filled the read side, so no heartbeat
        assert_eq!(board.led_history(), vec![0xAA, 0x34]);
    }

    #[test]
    fn test_jitter_updates_preload() {
        let config = M99Config {
            counter_preload: 1000,
            irq_jitter: true,
            ..M99Config::default()
        };
        let (timer, board) = armed(&config, OsServices::new(SimSignalFactory::new()));
        board.advance_ticks(1000);
        timer.irq();

        assert_eq!(timer.reload(), 750);
        assert_eq!(board.preload(), 750);
    }

    #[test]
    fn test_trace_entries() {
        let config = M99Config {
            debug_level: 5,
            ..M99Config::default()
        };
        let (timer, board) = armed(&config, OsServices::new(SimSignalFactory::new()));
        timer.bind_signal(SlotId::new(0).unwrap(), 3).unwrap();
        timer.debug_log().drain();

        board.advance_ticks(250_000);
        timer.irq();

        let entries = timer.debug_log().drain();
        let irq = entries.iter().find(|e| e.message == "irq").unwrap();
        assert_eq!(irq.field("count"), Some("0"));
        assert_eq!(irq.field("latency"), Some("0"));
        assert_eq!(irq.field("slot"), Some("0"));
    }

    /// Hands out empty buffers
    struct EmptyBuffer;

    impl StreamBuffer for EmptyBuffer {
        fn mode(&self) -> BufferMode {
            BufferMode::Ring
        }

        fn next_buf(&self, _units: usize, transfer: &mut dyn FnMut(&mut [u16])) -> bool {
            transfer(&mut []);
            true
        }

        fn read(&self, _buf: &mut [u8]) -> Result<usize, StreamError> {
            Err(StreamError::Timeout)
        }

        fn write(&self, _buf: &[u8]) -> Result<usize, StreamError> {
            Err(StreamError::Timeout)
        }
    }

    #[test]
    fn test_empty_buffers_count_as_no_transfer() {
        let services = OsServices::new(SimSignalFactory::new())
            .with_read_buffer(EmptyBuffer)
            .with_write_buffer(EmptyBuffer);
        let (timer, board) = armed(&M99Config::default(), services);
        board.advance_ticks(250_000);

        assert_eq!(timer.irq(), IrqOutcome::Serviced);
        assert_eq!(timer.ring_cursors(), (0, 64));
        assert_eq!(board.led_history(), vec![0xAA, 0xFF]);
    }

    #[test]
    fn test_unmasked_mode_skips_busy_slot_table() {
        let config = M99Config {
            bind_masking: BindMasking::UnmaskedForLatencyTest,
            ..M99Config::default()
        };
        let signals = SimSignalFactory::new();
        let (timer, board) = armed(&config, OsServices::new(signals.clone()));
        timer.bind_signal(SlotId::new(0).unwrap(), 7).unwrap();
        timer.bind_signal(SlotId::new(1).unwrap(), 8).unwrap();

        // a bind interrupted on this CPU would hold the table like this
        {
            let _held = timer.slots.lock();
            board.advance_ticks(250_000);
            assert_eq!(timer.irq(), IrqOutcome::Serviced);
        }
        board.advance_ticks(250_000);
        assert_eq!(timer.irq(), IrqOutcome::Serviced);

        assert_eq!(timer.irq_count(), 2);
        assert_eq!(signals.deliveries(), vec![8]);
    }

    #[test]
    fn test_elapsed_after_downward_jitter_step() {
        let config = M99Config {
            counter_preload: 1000,
            irq_jitter: true,
            ..M99Config::default()
        };
        let (timer, board) = armed(&config, OsServices::new(SimSignalFactory::new()));
        board.advance_ticks(1000);
        timer.irq();
        assert_eq!(timer.reload(), 750);

        board.advance_ticks(10);
        assert_eq!(board.counter(), 990);
        assert_eq!(timer.elapsed_since_reload(), Ok(10));

        // the next cycle runs with 750 and is measured against it
        board.advance_ticks(990 + 4);
        timer.irq();
        assert_eq!(timer.last_latency(), Some(4));
        assert_eq!(timer.max_latency(), Some(4));
    }
}

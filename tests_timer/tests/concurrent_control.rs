//! Concurrent Control Tests
//!
//! Runs the interrupt handler on its own thread while process-context
//! threads hammer the control surface, then checks that no state was torn.

use hal::BufferMode;
use m99_core::{DriverError, IrqOutcome, M99Config, OsServices, SlotId};
use sim_hw::{SimSignalFactory, SimStreamBuffer};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tests_timer::{test_bootstrap, test_bootstrap_with, TestRig};

const INTERRUPTS: u32 = 2_000;

/// Test: Bind/unbind churn never loses an interrupt or tears the slot table
///
/// This validates that:
/// 1. Every underflow raised by the "interrupt" thread is serviced
/// 2. Bind/unbind results are always Ok or the expected conflict
/// 3. After the churn the slot table is consistent with the last operation
#[test]
fn test_bind_churn_against_interrupts() {
    let rig = Arc::new(test_bootstrap(&M99Config::default()).expect("Failed to bootstrap"));
    rig.timer.set_reload(100).expect("Failed to set reload");
    rig.timer.set_irq_enabled(true);
    let done = Arc::new(AtomicBool::new(false));

    let irq_thread = {
        let rig = Arc::clone(&rig);
        let done = Arc::clone(&done);
        thread::spawn(move || {
            let mut serviced = 0;
            while serviced < INTERRUPTS {
                rig.board.advance_ticks(u64::from(rig.board.counter()));
                if rig.timer.irq() == IrqOutcome::Serviced {
                    serviced += 1;
                }
            }
            done.store(true, Ordering::Release);
            serviced
        })
    };

    let control_threads: Vec<_> = (0..2)
        .map(|index| {
            let rig = Arc::clone(&rig);
            let done = Arc::clone(&done);
            thread::spawn(move || {
                let slot = SlotId::new(index).unwrap();
                let mut cycles = 0u32;
                while !done.load(Ordering::Acquire) {
                    match rig.timer.bind_signal(slot, 10 + index as u32) {
                        Ok(()) | Err(DriverError::SlotAlreadyBound(_)) => {}
                        Err(err) => panic!("Unexpected bind error: {err}"),
                    }
                    match rig.timer.unbind_signal(slot) {
                        Ok(()) | Err(DriverError::SlotNotBound(_)) => {}
                        Err(err) => panic!("Unexpected unbind error: {err}"),
                    }
                    cycles += 1;
                }
                cycles
            })
        })
        .collect();

    let serviced = irq_thread.join().expect("Interrupt thread panicked");
    for handle in control_threads {
        handle.join().expect("Control thread panicked");
    }

    assert_eq!(serviced, INTERRUPTS);
    assert_eq!(rig.timer.irq_count(), INTERRUPTS);
    for index in 0..2 {
        assert_eq!(rig.timer.bound_signal(SlotId::new(index).unwrap()), 0);
    }
    // every signal created was either rejected or unbound, so all are released
    assert!(rig.signals.created().iter().all(|s| s.is_released()));
}

/// Test: Reprogramming races with jitter updates without tearing the preload
#[test]
fn test_set_reload_against_jitter() {
    let rig = Arc::new(test_bootstrap(&M99Config::default()).expect("Failed to bootstrap"));
    rig.timer.set_reload(1_000).expect("Failed to set reload");
    rig.timer.set_jitter(true);
    rig.timer.set_irq_enabled(true);
    let done = Arc::new(AtomicBool::new(false));

    let irq_thread = {
        let rig = Arc::clone(&rig);
        let done = Arc::clone(&done);
        thread::spawn(move || {
            for _ in 0..INTERRUPTS {
                rig.board.advance_ticks(u64::from(rig.board.counter()));
                rig.timer.irq();
            }
            done.store(true, Ordering::Release);
        })
    };

    let control_thread = {
        let rig = Arc::clone(&rig);
        let done = Arc::clone(&done);
        thread::spawn(move || {
            let mut value = 1_000u32;
            while !done.load(Ordering::Acquire) {
                value = if value == 1_000 { 3_000 } else { 1_000 };
                rig.timer.set_reload(value).expect("Failed to set reload");
            }
        })
    };

    irq_thread.join().expect("Interrupt thread panicked");
    control_thread.join().expect("Control thread panicked");

    // whatever the final nominal value, the reload is inside its window
    let t = rig.timer.reload();
    assert!((500..=6_000).contains(&t), "t={t}");
    assert_eq!(rig.board.preload(), t);
}

/// Runs interrupt cycles until `waiter` finishes
fn service_until_done<T>(rig: &TestRig, waiter: &thread::JoinHandle<T>) {
    // let the waiter reach its wait on an empty or full queue first
    thread::sleep(Duration::from_millis(50));
    while !waiter.is_finished() {
        rig.run_cycle(0);
        thread::yield_now();
    }
}

/// Test: A block read waiting on an empty buffer is filled by interrupts
///
/// This validates that:
/// 1. The waiting reader does not keep the interrupt side out of the buffer
/// 2. The reader gets the first unit of the read ring
#[test]
fn test_waiting_block_read_filled_by_interrupts() {
    let signals = SimSignalFactory::new();
    let services = OsServices::new(signals.clone()).with_read_buffer(
        SimStreamBuffer::input(BufferMode::Ring, 16).with_wait(Duration::from_secs(5)),
    );
    let rig = Arc::new(
        test_bootstrap_with(&M99Config::default(), services, signals).expect("Failed to bootstrap"),
    );
    rig.timer.set_irq_enabled(true);

    let reader = {
        let rig = Arc::clone(&rig);
        thread::spawn(move || {
            let mut buf = [0xFFu8; 2];
            rig.timer.block_read(&mut buf).map(|n| (n, buf))
        })
    };
    service_until_done(&rig, &reader);

    let read = reader.join().expect("Reader panicked");
    assert_eq!(read, Ok((2, [0x00, 0x00])));
    assert!(rig.timer.irq_count() >= 1);
}

/// Test: A block write waiting on a full buffer completes as interrupts drain it
#[test]
fn test_waiting_block_write_drained_by_interrupts() {
    let signals = SimSignalFactory::new();
    let services = OsServices::new(signals.clone()).with_write_buffer(
        SimStreamBuffer::output(BufferMode::Ring, 1).with_wait(Duration::from_secs(5)),
    );
    let rig = Arc::new(
        test_bootstrap_with(&M99Config::default(), services, signals).expect("Failed to bootstrap"),
    );
    rig.timer.set_irq_enabled(true);
    assert_eq!(rig.timer.block_write(&[0x12, 0x34]), Ok(2));

    let writer = {
        let rig = Arc::clone(&rig);
        thread::spawn(move || rig.timer.block_write(&[0x56, 0x78]))
    };
    service_until_done(&rig, &writer);
    assert_eq!(writer.join().expect("Writer panicked"), Ok(2));

    rig.run_cycle(0);
    assert_eq!(rig.board.sram_word(64), 0x1234);
    assert_eq!(rig.board.sram_word(66), 0x5678);
    assert_eq!(rig.timer.ring_cursors().1, 68);
}

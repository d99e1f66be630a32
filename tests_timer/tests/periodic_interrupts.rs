//! Periodic Interrupt Tests
//!
//! Validates the steady-state interrupt cycle: counting, latency
//! measurement, fan-out order and the LED heartbeat.

use m99_core::{IrqOutcome, M99Config, SlotId};
use tests_timer::test_bootstrap;

/// Test: Ten interrupts at the default reload
///
/// This validates that:
/// 1. Every underflow is serviced and counted
/// 2. Maximum latency never exceeds the injected delay
/// 3. Slots fire 0,1,2,3,0,1,2,3,0,1
#[test]
fn test_ten_interrupts_default_reload() {
    let rig = test_bootstrap(&M99Config::default()).expect("Failed to bootstrap");
    for (index, signal) in [(0, 100), (1, 101), (2, 102), (3, 103)] {
        rig.timer
            .bind_signal(SlotId::new(index).unwrap(), signal)
            .expect("Failed to bind");
    }
    rig.timer.set_irq_enabled(true);

    let delays = [3, 0, 12, 7, 1, 25, 4, 4, 9, 2];
    for delay in delays {
        assert_eq!(rig.run_cycle(delay), IrqOutcome::Serviced);
    }

    assert_eq!(rig.timer.irq_count(), 10);
    assert_eq!(rig.timer.max_latency(), Some(25));
    assert_eq!(rig.timer.last_latency(), Some(2));
    assert_eq!(
        rig.signals.deliveries(),
        vec![100, 101, 102, 103, 100, 101, 102, 103, 100, 101]
    );
    assert_eq!(rig.timer.reload(), 250_000);
    assert_eq!(rig.board.underflows(), 10);
}

/// Test: Interrupt period follows the reload value
#[test]
fn test_period_matches_reload() {
    let rig = test_bootstrap(&M99Config::default()).expect("Failed to bootstrap");
    rig.timer.set_reload(1_000).expect("Failed to set reload");
    rig.timer.set_irq_enabled(true);

    rig.board.advance_ticks(999);
    assert_eq!(rig.timer.irq(), IrqOutcome::NotMine);

    rig.board.advance_ticks(1);
    assert_eq!(rig.timer.irq(), IrqOutcome::Serviced);
    assert_eq!(rig.timer.last_latency(), Some(0));
}

/// Test: A handler entry with nothing pending is not counted
#[test]
fn test_shared_line_not_mine() {
    let rig = test_bootstrap(&M99Config::default()).expect("Failed to bootstrap");
    rig.timer.set_irq_enabled(true);

    assert_eq!(rig.timer.irq(), IrqOutcome::NotMine);
    assert_eq!(rig.run_cycle(0), IrqOutcome::Serviced);
    assert_eq!(rig.timer.irq(), IrqOutcome::NotMine);
    assert_eq!(rig.timer.irq_count(), 1);
}

/// Test: Without stream buffers the LEDs show the inverted count
#[test]
fn test_led_heartbeat() {
    let rig = test_bootstrap(&M99Config::default()).expect("Failed to bootstrap");
    rig.timer.set_irq_enabled(true);
    rig.run_cycles(4, 0);

    assert_eq!(rig.board.led_history(), vec![0xAA, 0xFF, 0xFE, 0xFD, 0xFC]);
}

/// Test: Reprogramming restarts the count from the new reload
#[test]
fn test_set_reload_then_elapsed_is_zero() {
    let rig = test_bootstrap(&M99Config::default()).expect("Failed to bootstrap");
    rig.timer.set_irq_enabled(true);
    rig.board.advance_ticks(123_456);

    for value in [1, 2, 77, 65_535, 250_000, 0xFF_FFFF] {
        rig.timer.set_reload(value).expect("Failed to set reload");
        assert_eq!(rig.timer.elapsed_since_reload(), Ok(0));
        assert_eq!(rig.board.preload(), value);
    }
}

/// Test: Resetting the interrupt count restarts fan-out at slot 0
#[test]
fn test_count_reset_restarts_fanout() {
    let rig = test_bootstrap(&M99Config::default()).expect("Failed to bootstrap");
    rig.timer
        .bind_signal(SlotId::new(0).unwrap(), 1)
        .expect("Failed to bind");
    rig.timer.set_irq_enabled(true);

    rig.run_cycles(2, 0);
    rig.timer.reset_irq_count();
    rig.run_cycle(0);

    assert_eq!(rig.timer.irq_count(), 1);
    assert_eq!(rig.signals.deliveries(), vec![1, 1]);
}

/// Test: Disabling interrupts stops new interrupts from being raised
#[test]
fn test_disable_stops_interrupts() {
    let rig = test_bootstrap(&M99Config::default()).expect("Failed to bootstrap");
    rig.timer.set_irq_enabled(true);
    rig.run_cycle(0);

    rig.timer.set_irq_enabled(false);
    rig.board.advance_ticks(1_000_000);
    assert!(!rig.board.irq_asserted());
    assert_eq!(rig.timer.irq_count(), 1);
}

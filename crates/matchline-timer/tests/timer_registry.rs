//! Integration tests for the timer registry.
//!
//! Uses `start_paused = true` so Tokio auto-advances the clock whenever
//! every task is idle; sleeps resolve instantly and deterministically.

use std::time::Duration;

use matchline_timer::{TimerConfig, TimerFired, TimerName, TimerRegistry};
use tokio::sync::mpsc;

#[derive(Debug, PartialEq, Eq)]
enum Signal {
    Tick(u32),
    Zero,
    Fallback,
}

fn registry(scope: u64) -> (TimerRegistry<Signal>, mpsc::UnboundedReceiver<TimerFired<Signal>>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (TimerRegistry::new(scope, TimerConfig::default(), tx), rx)
}

async fn next_accepted(
    reg: &mut TimerRegistry<Signal>,
    rx: &mut mpsc::UnboundedReceiver<TimerFired<Signal>>,
) -> Option<Signal> {
    let fired = rx.recv().await?;
    reg.accept(fired)
}

// =========================================================================
// TimerConfig
// =========================================================================

#[test]
fn test_default_tick_is_one_second() {
    assert_eq!(TimerConfig::default().tick_interval, Duration::from_secs(1));
}

#[test]
fn test_validated_clamps_interval() {
    let cfg = TimerConfig {
        tick_interval: Duration::ZERO,
    }
    .validated();
    assert_eq!(cfg.tick_interval, TimerConfig::MIN_TICK_INTERVAL);

    let cfg = TimerConfig {
        tick_interval: Duration::from_secs(3600),
    }
    .validated();
    assert_eq!(cfg.tick_interval, TimerConfig::MAX_TICK_INTERVAL);
}

// =========================================================================
// Countdown behaviour
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_countdown_ticks_then_zero() {
    let (mut reg, mut rx) = registry(1);
    reg.start(TimerName::Accept, 3, Signal::Tick, || Signal::Zero);
    assert!(reg.is_active(TimerName::Accept));

    assert_eq!(next_accepted(&mut reg, &mut rx).await, Some(Signal::Tick(2)));
    assert_eq!(next_accepted(&mut reg, &mut rx).await, Some(Signal::Tick(1)));
    assert_eq!(next_accepted(&mut reg, &mut rx).await, Some(Signal::Zero));

    // The final signal retires the timer.
    assert!(!reg.is_active(TimerName::Accept));
    assert_eq!(reg.active_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_ticks_are_one_interval_apart() {
    let (mut reg, mut rx) = registry(1);
    let start = tokio::time::Instant::now();
    reg.start(TimerName::Countdown, 2, Signal::Tick, || Signal::Zero);

    next_accepted(&mut reg, &mut rx).await;
    assert_eq!(start.elapsed(), Duration::from_secs(1));
    next_accepted(&mut reg, &mut rx).await;
    assert_eq!(start.elapsed(), Duration::from_secs(2));
}

#[tokio::test(start_paused = true)]
async fn test_zero_ticks_fires_immediately() {
    let (mut reg, mut rx) = registry(1);
    reg.start(TimerName::Countdown, 0, Signal::Tick, || Signal::Zero);
    assert_eq!(next_accepted(&mut reg, &mut rx).await, Some(Signal::Zero));
}

#[tokio::test(start_paused = true)]
async fn test_one_shot_fires_after_delay() {
    let (mut reg, mut rx) = registry(1);
    let start = tokio::time::Instant::now();
    reg.start_once(TimerName::Requeue, Duration::from_secs(5), || Signal::Fallback);

    assert_eq!(next_accepted(&mut reg, &mut rx).await, Some(Signal::Fallback));
    assert_eq!(start.elapsed(), Duration::from_secs(5));
    assert!(!reg.is_active(TimerName::Requeue));
}

// =========================================================================
// Cancellation
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_cancel_stops_signals() {
    let (mut reg, mut rx) = registry(1);
    reg.start(TimerName::Accept, 5, Signal::Tick, || Signal::Zero);
    assert!(reg.cancel(TimerName::Accept));
    assert!(!reg.is_active(TimerName::Accept));

    let result = tokio::time::timeout(Duration::from_secs(30), rx.recv()).await;
    assert!(result.is_err(), "canceled timer should post nothing");
}

#[tokio::test]
async fn test_cancel_unknown_name_is_false() {
    let (mut reg, _rx) = registry(1);
    assert!(!reg.cancel(TimerName::Countdown));
}

#[tokio::test(start_paused = true)]
async fn test_queued_signal_rejected_after_cancel() {
    let (mut reg, mut rx) = registry(1);
    reg.start(TimerName::Accept, 5, Signal::Tick, || Signal::Zero);

    // Signal already delivered to the channel but not yet handled.
    let pending = rx.recv().await.unwrap();
    reg.cancel(TimerName::Accept);

    assert_eq!(reg.accept(pending), None);
}

#[tokio::test(start_paused = true)]
async fn test_restart_supersedes_previous_timer() {
    let (mut reg, mut rx) = registry(1);
    let first = reg.start(TimerName::Countdown, 5, Signal::Tick, || Signal::Zero);
    let stale = rx.recv().await.unwrap();

    let second = reg.start(TimerName::Countdown, 5, Signal::Tick, || Signal::Zero);
    assert!(!reg.is_current(&first));
    assert!(reg.is_current(&second));
    assert_eq!(reg.active_count(), 1);

    assert_eq!(reg.accept(stale), None);
    // The replacement counts down from the top again.
    assert_eq!(next_accepted(&mut reg, &mut rx).await, Some(Signal::Tick(4)));
}

#[tokio::test(start_paused = true)]
async fn test_signal_from_other_scope_rejected() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut old = TimerRegistry::new(1, TimerConfig::default(), tx.clone());
    old.start(TimerName::Accept, 5, Signal::Tick, || Signal::Zero);
    let stale = rx.recv().await.unwrap();
    drop(old);

    // A fresh registry for the next session shares the channel and even
    // hands out the same generation numbers.
    let mut fresh = TimerRegistry::new(2, TimerConfig::default(), tx);
    fresh.start(TimerName::Accept, 5, Signal::Tick, || Signal::Zero);
    assert_eq!(stale.generation, 1);
    assert_eq!(fresh.accept(stale), None);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_all_and_drop_abort_tasks() {
    let (mut reg, mut rx) = registry(1);
    reg.start(TimerName::Accept, 5, Signal::Tick, || Signal::Zero);
    reg.start_once(TimerName::Requeue, Duration::from_secs(5), || Signal::Fallback);
    assert_eq!(reg.cancel_all(), 2);
    assert_eq!(reg.active_count(), 0);

    reg.start(TimerName::Countdown, 5, Signal::Tick, || Signal::Zero);
    drop(reg);

    // Every sender is gone once the tasks are aborted and the registry dropped.
    let result = tokio::time::timeout(Duration::from_secs(30), rx.recv()).await;
    assert!(matches!(result, Ok(None)) || result.is_err());
}

#[tokio::test(start_paused = true)]
async fn test_independent_names_run_concurrently() {
    let (mut reg, mut rx) = registry(1);
    reg.start(TimerName::Countdown, 3, Signal::Tick, || Signal::Zero);
    reg.start_once(TimerName::Requeue, Duration::from_millis(1500), || Signal::Fallback);
    assert_eq!(reg.active_count(), 2);

    let mut seen = Vec::new();
    while reg.active_count() > 0 {
        if let Some(sig) = next_accepted(&mut reg, &mut rx).await {
            seen.push(sig);
        }
    }
    assert_eq!(
        seen,
        vec![Signal::Tick(2), Signal::Fallback, Signal::Tick(1), Signal::Zero]
    );
}

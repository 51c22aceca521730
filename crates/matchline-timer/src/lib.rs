//! Named, cancelable countdown timers for Matchline.
//!
//! A [`TimerRegistry`] owns at most one running timer per [`TimerName`].
//! Each timer is a small Tokio task that sleeps in fixed intervals and
//! posts a [`TimerFired`] signal into the owning actor's channel. The actor
//! hands every signal back to [`TimerRegistry::accept`] before acting on it;
//! signals from a canceled or superseded timer are rejected there.
//!
//! # Integration
//!
//! The registry is meant to sit next to an actor's `tokio::select!` loop:
//!
//! ```ignore
//! let (timer_tx, mut timer_rx) = mpsc::unbounded_channel();
//! let mut timers = TimerRegistry::new(epoch, TimerConfig::default(), timer_tx);
//! timers.start(TimerName::Accept, 15, Signal::AcceptTick, || Signal::AcceptExpired);
//!
//! loop {
//!     tokio::select! {
//!         Some(cmd) = cmd_rx.recv() => { /* handle commands */ }
//!         Some(fired) = timer_rx.recv() => {
//!             if let Some(signal) = timers.accept(fired) {
//!                 /* act on signal */
//!             }
//!         }
//!     }
//! }
//! ```

use std::collections::HashMap;
use std::time::Duration;

pub use matchline_protocol::TimerName;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tracing::{debug, trace, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Timer settings shared by every timer in a registry.
#[derive(Debug, Clone)]
pub struct TimerConfig {
    /// Length of one countdown tick. Default: 1 second.
    pub tick_interval: Duration,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(1),
        }
    }
}

impl TimerConfig {
    /// Shortest tick interval accepted.
    pub const MIN_TICK_INTERVAL: Duration = Duration::from_millis(10);
    /// Longest tick interval accepted.
    pub const MAX_TICK_INTERVAL: Duration = Duration::from_secs(60);

    /// Clamp out-of-range values so the config is safe to use.
    ///
    /// Called automatically by [`TimerRegistry::new`].
    pub fn validated(mut self) -> Self {
        let clamped = self
            .tick_interval
            .clamp(Self::MIN_TICK_INTERVAL, Self::MAX_TICK_INTERVAL);
        if clamped != self.tick_interval {
            warn!(
                requested_ms = self.tick_interval.as_millis() as u64,
                clamped_ms = clamped.as_millis() as u64,
                "tick_interval out of range, clamping"
            );
            self.tick_interval = clamped;
        }
        self
    }
}

// ---------------------------------------------------------------------------
// Names, handles, signals
// ---------------------------------------------------------------------------

/// Identifies one started timer. A handle stays valid only until its timer
/// finishes, is canceled, or is replaced under the same name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerHandle {
    name: TimerName,
    scope: u64,
    generation: u64,
}

impl TimerHandle {
    pub fn name(&self) -> TimerName {
        self.name
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// A signal posted by a timer task.
///
/// Carries the scope and generation of the timer that produced it so the
/// registry can tell live signals from stale ones.
#[derive(Debug)]
pub struct TimerFired<E> {
    pub name: TimerName,
    pub scope: u64,
    pub generation: u64,
    /// `true` for the final signal of the timer.
    pub last: bool,
    pub event: E,
}

struct ActiveTimer {
    generation: u64,
    task: JoinHandle<()>,
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Owns the named timers of one matchmaking session.
///
/// `scope` ties the registry to the session that created it; signals
/// carrying another scope are never accepted. Dropping the registry aborts
/// every timer it still owns.
///
/// ## Trait bounds explained
///
/// - `E: Send` → events are built inside spawned timer tasks and travel
///   through an mpsc channel to the actor, which may run on another
///   worker thread.
/// - `E: 'static` → `tokio::spawn` requires the task to own everything it
///   touches, so the event type may not borrow anything.
/// - The `on_tick` closure is `Fn` (called once per tick) while `on_zero`
///   is `FnOnce` (called exactly once, so it may move captured values out).
pub struct TimerRegistry<E: Send + 'static> {
    scope: u64,
    config: TimerConfig,
    sender: mpsc::UnboundedSender<TimerFired<E>>,
    timers: HashMap<TimerName, ActiveTimer>,
    next_generation: u64,
}

impl<E: Send + 'static> TimerRegistry<E> {
    /// Create an empty registry posting signals into `sender`.
    pub fn new(scope: u64, config: TimerConfig, sender: mpsc::UnboundedSender<TimerFired<E>>) -> Self {
        let config = config.validated();
        debug!(
            scope,
            tick_ms = config.tick_interval.as_millis() as u64,
            "timer registry created"
        );
        Self {
            scope,
            config,
            sender,
            timers: HashMap::new(),
            next_generation: 1,
        }
    }

    /// Start a countdown of `ticks` intervals under `name`.
    ///
    /// After each interval but the last, `on_tick(remaining)` is posted;
    /// after the last, `on_zero()` is posted and the timer finishes. A timer
    /// already running under `name` is canceled first. `ticks == 0` posts
    /// `on_zero()` immediately.
    pub fn start<T, Z>(&mut self, name: TimerName, ticks: u32, on_tick: T, on_zero: Z) -> TimerHandle
    where
        T: Fn(u32) -> E + Send + 'static,
        Z: FnOnce() -> E + Send + 'static,
    {
        let interval = self.config.tick_interval;
        self.start_with_interval(name, ticks, interval, on_tick, on_zero)
    }

    /// Like [`start`](Self::start) with an explicit interval.
    pub fn start_with_interval<T, Z>(
        &mut self,
        name: TimerName,
        ticks: u32,
        interval: Duration,
        on_tick: T,
        on_zero: Z,
    ) -> TimerHandle
    where
        T: Fn(u32) -> E + Send + 'static,
        Z: FnOnce() -> E + Send + 'static,
    {
        self.cancel(name);

        let handle = self.next_handle(name);
        let sender = self.sender.clone();
        let task = tokio::spawn(async move {
            let mut next = Instant::now();
            for remaining in (0..ticks).rev() {
                next += interval;
                time::sleep_until(next).await;
                if remaining == 0 {
                    break;
                }
                trace!(timer = %name, remaining, "timer tick");
                if sender.send(fired(handle, false, on_tick(remaining))).is_err() {
                    return;
                }
            }
            let _ = sender.send(fired(handle, true, on_zero()));
        });

        self.timers.insert(
            name,
            ActiveTimer {
                generation: handle.generation,
                task,
            },
        );
        debug!(scope = self.scope, timer = %name, ticks, "timer started");
        handle
    }

    /// Start a one-shot timer that posts `on_fire()` once after `delay`.
    pub fn start_once<F>(&mut self, name: TimerName, delay: Duration, on_fire: F) -> TimerHandle
    where
        F: FnOnce() -> E + Send + 'static,
    {
        self.cancel(name);

        let handle = self.next_handle(name);
        let sender = self.sender.clone();
        let task = tokio::spawn(async move {
            time::sleep(delay).await;
            let _ = sender.send(fired(handle, true, on_fire()));
        });

        self.timers.insert(
            name,
            ActiveTimer {
                generation: handle.generation,
                task,
            },
        );
        debug!(
            scope = self.scope,
            timer = %name,
            delay_ms = delay.as_millis() as u64,
            "one-shot timer started"
        );
        handle
    }

    /// Cancel the timer running under `name`. Returns `false` if none was.
    ///
    /// Takes effect immediately: any signal the timer already posted but
    /// that has not been accepted yet will be rejected.
    pub fn cancel(&mut self, name: TimerName) -> bool {
        match self.timers.remove(&name) {
            Some(active) => {
                active.task.abort();
                debug!(scope = self.scope, timer = %name, "timer canceled");
                true
            }
            None => false,
        }
    }

    /// Cancel every running timer. Returns how many were running.
    pub fn cancel_all(&mut self) -> usize {
        let count = self.timers.len();
        for (name, active) in self.timers.drain() {
            active.task.abort();
            trace!(scope = self.scope, timer = %name, "timer canceled");
        }
        count
    }

    /// Whether a timer is running under `name`.
    pub fn is_active(&self, name: TimerName) -> bool {
        self.timers.contains_key(&name)
    }

    /// Whether `handle` still refers to the running timer for its name.
    pub fn is_current(&self, handle: &TimerHandle) -> bool {
        handle.scope == self.scope
            && self
                .timers
                .get(&handle.name)
                .is_some_and(|active| active.generation == handle.generation)
    }

    /// Number of running timers.
    pub fn active_count(&self) -> usize {
        self.timers.len()
    }

    /// The session scope this registry belongs to.
    pub fn scope(&self) -> u64 {
        self.scope
    }

    /// Check a posted signal against the live timers.
    ///
    /// Returns the signal's event if it came from the timer currently
    /// running under its name, `None` otherwise. Accepting the final signal
    /// of a timer retires it.
    ///
    /// ## How stale signals are caught
    ///
    /// `JoinHandle::abort` stops a timer task, but a signal the task already
    /// pushed into the channel stays there. Every start hands out a fresh
    /// generation number, and every signal carries the generation (and
    /// scope) of the task that sent it. A signal is live only if its
    /// generation matches the timer the registry still holds under that
    /// name. After a cancel there is no entry at all; after a restart the
    /// entry has a newer generation. Either way the old signal is dropped
    /// here, before the actor ever sees its event.
    pub fn accept(&mut self, fired: TimerFired<E>) -> Option<E> {
        let live = fired.scope == self.scope
            && self
                .timers
                .get(&fired.name)
                .is_some_and(|active| active.generation == fired.generation);

        if !live {
            trace!(
                scope = self.scope,
                signal_scope = fired.scope,
                timer = %fired.name,
                generation = fired.generation,
                "dropping stale timer signal"
            );
            return None;
        }

        if fired.last {
            self.timers.remove(&fired.name);
            trace!(scope = self.scope, timer = %fired.name, "timer finished");
        }
        Some(fired.event)
    }

    fn next_handle(&mut self, name: TimerName) -> TimerHandle {
        let generation = self.next_generation;
        self.next_generation += 1;
        TimerHandle {
            name,
            scope: self.scope,
            generation,
        }
    }
}

impl<E: Send + 'static> Drop for TimerRegistry<E> {
    fn drop(&mut self) {
        let canceled = self.cancel_all();
        if canceled > 0 {
            debug!(scope = self.scope, canceled, "timer registry dropped");
        }
    }
}

fn fired<E>(handle: TimerHandle, last: bool, event: E) -> TimerFired<E> {
    TimerFired {
        name: handle.name,
        scope: handle.scope,
        generation: handle.generation,
        last,
        event,
    }
}
